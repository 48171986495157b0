//! Error types for catalog coordination

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("lock unavailable for {domain:?} after {timeout_secs}s")]
    LockUnavailable { domain: String, timeout_secs: u64 },

    #[error("lock lease lost for {domain:?}")]
    LeaseLost { domain: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
