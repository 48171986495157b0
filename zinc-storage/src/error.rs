//! Error types for storage backend operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage is read-only")]
    ReadOnly,

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}
