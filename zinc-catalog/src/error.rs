//! Error taxonomy for the catalog write pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Storage(#[from] zinc_storage::Error),

    #[error(transparent)]
    Coordinator(#[from] zinc_coordinator::Error),

    #[error(transparent)]
    Core(#[from] zinc_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage inconsistent: missing object for sha={sha} format={format}")]
    StorageInconsistent { sha: String, format: String },

    #[error("task cancelled before commit")]
    Cancelled,
}

impl Error {
    /// Exit code mapping for the CLI front-end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            Error::Coordinator(zinc_coordinator::Error::LockUnavailable { .. }) => 3,
            Error::Storage(_) | Error::Io(_) | Error::StorageInconsistent { .. } => 4,
            Error::Core(zinc_core::Error::UnsupportedIndex { .. }) => 5,
            Error::Coordinator(_) => 4,
            Error::Core(_) => 2,
            Error::Cancelled => 4,
        }
    }
}
