//! Filesystem `StorageBackend` driver: `file:///path` or a bare path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::backend::{ObjectMeta, StorageBackend};
use crate::error::Result;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores every object as a file at `base_dir/{subpath}`.
#[derive(Debug, Clone)]
pub struct FsStorageBackend {
    base_dir: PathBuf,
}

impl FsStorageBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn full_path(&self, subpath: &str) -> PathBuf {
        self.base_dir.join(subpath)
    }

    /// Whether `url` names a filesystem catalog reference: `file://...` or
    /// a bare path with no recognized scheme.
    pub fn valid_url(url: &str) -> bool {
        url.starts_with("file://") || !url.contains("://")
    }
}

#[async_trait]
impl StorageBackend for FsStorageBackend {
    async fn get(&self, subpath: &str) -> Result<Option<Bytes>> {
        let path = self.full_path(subpath);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_meta(&self, subpath: &str) -> Result<Option<ObjectMeta>> {
        let path = self.full_path(subpath);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(ObjectMeta { size: meta.len() })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, subpath: &str, data: Bytes) -> Result<()> {
        let path = self.full_path(subpath);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-temp-then-rename: the closest the filesystem contract
        // (put is overwrite-or-create, durable on return) gets to an
        // atomic PUT without backend-native support for one.
        let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let temp_name = format!(".{file_name}.tmp-{}-{unique}", std::process::id());
        let temp_path = path.with_file_name(temp_name);
        tokio::fs::write(&temp_path, &data).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        trace!(subpath, bytes = data.len(), "wrote object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.full_path(prefix);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let base_dir = self.base_dir.clone();
        let entries = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| {
                    !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with('.'))
                })
                .filter_map(|entry| {
                    entry
                        .path()
                        .strip_prefix(&base_dir)
                        .ok()
                        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

        Ok(entries)
    }

    async fn delete(&self, subpath: &str) -> Result<()> {
        let path = self.full_path(subpath);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(subpath, "deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn bind_to_catalog(&self, catalog_id: &str) -> Box<dyn StorageBackend> {
        Box::new(Self::new(self.base_dir.join(catalog_id)))
    }
}
