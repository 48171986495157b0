//! Error types for the Zinc content-addressing and manifest primitives

use thiserror::Error;

/// Result type for `zinc-core` operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest invalid: {0}")]
    ManifestInvalid(String),

    #[error("unsupported index format: found {found}, expected {expected}")]
    UnsupportedIndex { found: u32, expected: u32 },

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("invalid bundle descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("unknown bundle: {0}")]
    UnknownBundle(String),

    #[error("unknown version {version} for bundle {bundle}")]
    UnknownVersion { bundle: String, version: u32 },

    #[error("version {version} of bundle {bundle} is in use by distribution {distro:?}")]
    InUse {
        bundle: String,
        version: u32,
        distro: Vec<String>,
    },

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(#[from] glob::PatternError),

    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}
