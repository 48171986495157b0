//! Pluggable object storage for the Zinc asset catalog.
//!
//! Only the interface contract and a filesystem driver are shipped here;
//! S3 and other remote drivers are left to register against the same
//! [`StorageBackend`] trait.

pub mod backend;
pub mod error;
pub mod fs;

pub use backend::{ObjectMeta, StorageBackend};
pub use error::{Error, Result};
pub use fs::FsStorageBackend;
