//! The `StorageBackend` capability set: per-object get/put/list/delete,
//! implemented by pluggable drivers.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Metadata about a stored object, returned without reading its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMeta {
    pub size: u64,
}

/// Blob get/put/list/delete keyed by subpath, plus catalog-scoping and a
/// class-level URL probe used by driver registration.
///
/// All methods may fail with [`crate::error::Error`]; `get`/`get_meta`
/// return `Ok(None)` (never an error) when the subpath is simply absent.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read an object's full content. `Ok(None)` iff absent.
    async fn get(&self, subpath: &str) -> Result<Option<Bytes>>;

    /// Read an object's metadata without its content. `Ok(None)` iff absent.
    async fn get_meta(&self, subpath: &str) -> Result<Option<ObjectMeta>>;

    /// Overwrite-or-create. Durable on return.
    async fn put(&self, subpath: &str, data: Bytes) -> Result<()>;

    /// List subpaths under `prefix`. Excludes synthetic directory markers.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Idempotent delete; succeeds whether or not the object existed.
    async fn delete(&self, subpath: &str) -> Result<()>;

    /// Return a view whose subpaths are implicitly prefixed by `{id}/`.
    fn bind_to_catalog(&self, catalog_id: &str) -> Box<dyn StorageBackend>;
}
