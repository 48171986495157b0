//! The `Catalog` facade: binds an `Index` to a `StorageBackend` and a
//! `Coordinator`, and provides read access plus the verify/repair pass.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;
use zinc_core::{Format, Index, Manifest, make_bundle_id, pathmap};
use zinc_coordinator::Coordinator;
use zinc_storage::StorageBackend;

use crate::error::{Error, Result};

/// One discrepancy found by [`Catalog::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingObject { bundle: String, version: u32, path: String, sha: String, format: String },
    MissingManifest { bundle: String, version: u32 },
    OrphanedManifest { bundle: String, version: u32 },
    OrphanedObject { subpath: String },
}

pub struct Catalog {
    catalog_id: String,
    storage: Box<dyn StorageBackend>,
    coordinator: Arc<dyn Coordinator>,
    lock_timeout: Option<Duration>,
}

impl Catalog {
    /// Load the index at the storage root, or initialize a fresh one
    /// (format 1, no bundles) if none exists yet.
    pub async fn open_or_create(
        catalog_id: impl Into<String>,
        storage: Box<dyn StorageBackend>,
        coordinator: Arc<dyn Coordinator>,
        lock_timeout: Option<Duration>,
    ) -> Result<Self> {
        let catalog_id = catalog_id.into();
        let catalog = Self { catalog_id, storage, coordinator, lock_timeout };
        if catalog.storage.get(pathmap::INDEX_PATH).await?.is_none() {
            let index = Index::new(catalog.catalog_id.clone());
            catalog.write_index(&index).await?;
            debug!(catalog_id = %catalog.catalog_id, "initialized fresh catalog index");
        }
        Ok(catalog)
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn bundle_id(&self, bundle_name: &str) -> String {
        make_bundle_id(&self.catalog_id, bundle_name)
    }

    pub(crate) fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub(crate) fn coordinator(&self) -> &dyn Coordinator {
        self.coordinator.as_ref()
    }

    pub(crate) fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    pub(crate) async fn read_index(&self) -> Result<Index> {
        match self.storage.get(pathmap::INDEX_PATH).await? {
            Some(bytes) => Ok(Index::deserialize(&bytes)?),
            None => Ok(Index::new(self.catalog_id.clone())),
        }
    }

    pub(crate) async fn write_index(&self, index: &Index) -> Result<()> {
        self.storage.put(pathmap::INDEX_PATH, Bytes::from(index.serialize()?)).await?;
        Ok(())
    }

    pub async fn format(&self) -> Result<u32> {
        Ok(self.read_index().await?.format)
    }

    pub async fn bundle_names(&self) -> Result<Vec<String>> {
        Ok(self.read_index().await?.bundle_names())
    }

    pub async fn versions_for_bundle(&self, bundle_name: &str) -> Result<Vec<u32>> {
        Ok(self.read_index().await?.versions_for_bundle(bundle_name))
    }

    pub async fn distribution(&self, bundle_name: &str, distro: &str) -> Result<Option<u32>> {
        Ok(self.read_index().await?.distribution(bundle_name, distro))
    }

    pub async fn manifest_for_bundle(&self, bundle_name: &str, version: u32) -> Result<Option<Manifest>> {
        let path = pathmap::manifest_path(bundle_name, version);
        match self.storage.get(&path).await? {
            Some(bytes) => Ok(Some(Manifest::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn with_lock<F, Fut, T>(&self, bundle_name: &str, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let bundle_id = self.bundle_id(bundle_name);
        let mut lock = self.coordinator.get_index_lock(&bundle_id).await?;
        lock.acquire(self.lock_timeout).await?;
        let result = body().await;
        lock.release();
        result
    }

    /// Update `distro` to point at `version`, recording the previous
    /// value under `prev:{distro}`.
    pub async fn update_distribution(&self, distro: &str, bundle_name: &str, version: u32) -> Result<()> {
        self.with_lock(bundle_name, || async {
            let mut index = self.read_index().await?;
            index.update_distribution(distro, bundle_name, version)?;
            self.write_index(&index).await?;
            Ok(())
        })
        .await
    }

    pub async fn delete_distribution(&self, distro: &str, bundle_name: &str) -> Result<()> {
        self.with_lock(bundle_name, || async {
            let mut index = self.read_index().await?;
            index.delete_distribution(distro, bundle_name);
            self.write_index(&index).await?;
            Ok(())
        })
        .await
    }

    /// Fails `InUse` (via `zinc_core::Error`) if a distribution still
    /// targets `version`.
    pub async fn delete_version(&self, bundle_name: &str, version: u32) -> Result<()> {
        self.with_lock(bundle_name, || async {
            let mut index = self.read_index().await?;
            index.del_version_for_bundle(bundle_name, version)?;
            self.write_index(&index).await?;
            self.storage.delete(&pathmap::manifest_path(bundle_name, version)).await?;
            Ok(())
        })
        .await
    }

    /// Under a read lock, walk `index.bundles` and confirm every manifest
    /// and every object it names is present. Never mutates.
    pub async fn verify(&self, full_sweep: bool) -> Result<Vec<Finding>> {
        let index = self.read_index().await?;
        let mut findings = Vec::new();
        let mut live_manifest_paths = std::collections::HashSet::new();

        for (bundle, versions) in &index.bundles {
            for &version in versions {
                let manifest_path = pathmap::manifest_path(bundle, version);
                live_manifest_paths.insert(manifest_path.clone());

                let Some(bytes) = self.storage.get(&manifest_path).await? else {
                    findings.push(Finding::MissingManifest { bundle: bundle.clone(), version });
                    continue;
                };

                let manifest = match Manifest::deserialize(&bytes) {
                    Ok(manifest) => manifest,
                    Err(_) => {
                        findings.push(Finding::MissingManifest { bundle: bundle.clone(), version });
                        continue;
                    }
                };

                for (path, entry) in &manifest.files {
                    for format_name in entry.formats.keys() {
                        let format = Format::parse(format_name)?;
                        let object_path = pathmap::object_path(&entry.sha, format);
                        if self.storage.get_meta(&object_path).await?.is_none() {
                            findings.push(Finding::MissingObject {
                                bundle: bundle.clone(),
                                version,
                                path: path.clone(),
                                sha: entry.sha.clone(),
                                format: format_name.clone(),
                            });
                        }
                    }
                }
            }
        }

        for manifest_subpath in self.storage.list("manifests").await? {
            if !live_manifest_paths.contains(&manifest_subpath) {
                if let Some((bundle, version)) = parse_manifest_subpath(&manifest_subpath) {
                    findings.push(Finding::OrphanedManifest { bundle, version });
                }
            }
        }

        if full_sweep {
            let referenced: std::collections::HashSet<String> = self
                .collect_referenced_object_paths(&index)
                .await?
                .into_iter()
                .collect();
            for object_subpath in self.storage.list("objects").await? {
                if !referenced.contains(&object_subpath) {
                    findings.push(Finding::OrphanedObject { subpath: object_subpath });
                }
            }
        }

        Ok(findings)
    }

    async fn collect_referenced_object_paths(&self, index: &Index) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for (bundle, versions) in &index.bundles {
            for &version in versions {
                let manifest_path = pathmap::manifest_path(bundle, version);
                let Some(bytes) = self.storage.get(&manifest_path).await? else { continue };
                let Ok(manifest) = Manifest::deserialize(&bytes) else { continue };
                for entry in manifest.files.values() {
                    for format_name in entry.formats.keys() {
                        let format = Format::parse(format_name)?;
                        paths.push(pathmap::object_path(&entry.sha, format));
                    }
                }
            }
        }
        Ok(paths)
    }
}

fn parse_manifest_subpath(subpath: &str) -> Option<(String, u32)> {
    let rest = subpath.strip_prefix("manifests/")?;
    let (bundle, file_name) = rest.rsplit_once('/')?;
    let version = file_name.strip_suffix(".json")?.parse().ok()?;
    Some((bundle.to_string(), version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zinc_coordinator::InProcessCoordinator;
    use zinc_storage::FsStorageBackend;

    async fn open_catalog(dir: &TempDir) -> Catalog {
        Catalog::open_or_create(
            "com.example.test",
            Box::new(FsStorageBackend::new(dir.path())),
            Arc::new(InProcessCoordinator::new()),
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn empty_catalog_has_no_bundles_and_passes_verify() {
        let dir = TempDir::new().unwrap();
        let catalog = open_catalog(&dir).await;
        assert_eq!(catalog.format().await.unwrap(), 1);
        assert!(catalog.bundle_names().await.unwrap().is_empty());
        assert!(catalog.verify(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopening_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let catalog = open_catalog(&dir).await;
            let mut index = catalog.read_index().await.unwrap();
            index.add_version_for_bundle("meep", 1);
            catalog.write_index(&index).await.unwrap();
        }
        let catalog = open_catalog(&dir).await;
        assert_eq!(catalog.versions_for_bundle("meep").await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn verify_reports_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let catalog = open_catalog(&dir).await;
        let mut index = catalog.read_index().await.unwrap();
        index.add_version_for_bundle("meep", 1);
        catalog.write_index(&index).await.unwrap();

        let findings = catalog.verify(false).await.unwrap();
        assert_eq!(findings, vec![Finding::MissingManifest { bundle: "meep".to_string(), version: 1 }]);
    }

    #[tokio::test]
    async fn verify_reports_orphaned_manifest() {
        let dir = TempDir::new().unwrap();
        let catalog = open_catalog(&dir).await;
        let manifest = Manifest::create("com.example.test", "meep", 1);
        catalog
            .storage()
            .put(&pathmap::manifest_path("meep", 1), Bytes::from(manifest.serialize().unwrap()))
            .await
            .unwrap();

        let findings = catalog.verify(false).await.unwrap();
        assert_eq!(findings, vec![Finding::OrphanedManifest { bundle: "meep".to_string(), version: 1 }]);
    }

    #[tokio::test]
    async fn distribution_lifecycle_matches_spec_scenario_s5() {
        let dir = TempDir::new().unwrap();
        let catalog = open_catalog(&dir).await;
        let mut index = catalog.read_index().await.unwrap();
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 2);
        catalog.write_index(&index).await.unwrap();

        catalog.update_distribution("live", "meep", 1).await.unwrap();
        catalog.update_distribution("live", "meep", 2).await.unwrap();

        assert_eq!(catalog.distribution("meep", "live").await.unwrap(), Some(2));
        assert_eq!(catalog.distribution("meep", "prev:live").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn delete_version_in_use_by_distribution_fails() {
        let dir = TempDir::new().unwrap();
        let catalog = open_catalog(&dir).await;
        let mut index = catalog.read_index().await.unwrap();
        index.add_version_for_bundle("meep", 1);
        catalog.write_index(&index).await.unwrap();
        catalog.update_distribution("live", "meep", 1).await.unwrap();

        let err = catalog.delete_version("meep", 1).await.unwrap_err();
        assert!(matches!(err, Error::Core(zinc_core::Error::InUse { .. })));
    }
}
