//! Error types for the Zinc HTTP consumer client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog handshake failed: expected x-zinc-api-version \"1.0\", got {0:?}")]
    UnsupportedApiVersion(Option<String>),

    #[error(transparent)]
    Core(#[from] zinc_core::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}
