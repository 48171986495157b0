//! Top-level CLI error, mapping to the process exit codes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Catalog(#[from] zinc_catalog::Error),

    #[error(transparent)]
    Client(#[from] zinc_client::Error),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Config(_) => 2,
            CliError::Catalog(err) => err.exit_code(),
            CliError::Client(_) => 4,
        }
    }
}
