//! `BundleUpdateTask`: the write pipeline behind [`crate::Catalog`]'s
//! publish operation.
//!
//! Scan -> lock -> load index -> hash -> assign flavors -> dedup against
//! the latest version -> assign a new version -> encode and upload
//! variants -> write the manifest -> verify the writes -> commit the
//! index -> (optionally) build the master archive -> release the lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use zinc_core::{CompressionPolicy, Format, FlavorSpec, Manifest, assign_flavors, encode_gz, hash_bytes, pathmap};
use zinc_storage::StorageBackend;

use crate::archive::build_archive;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::scan::scan_source_dir;

const DEFAULT_CONCURRENCY: usize = 8;

/// Outcome of a successful [`BundleUpdateTask::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub version: u32,
    /// `true` if this published version is a prior version reused verbatim
    /// because its file set was byte-for-byte, flavor-for-flavor equivalent.
    pub deduped: bool,
    /// Set if the master archive step failed; the version is still published.
    pub archive_warning: Option<String>,
}

/// A scanned file after hashing and (optional) gzip encoding, held in
/// memory so a dedup match can be detected before any storage write.
struct HashedFile {
    rel_path: String,
    sha: String,
    raw_bytes: Bytes,
    raw_size: u64,
    gz_encoded: Option<Bytes>,
    gz_size: Option<u64>,
}

pub struct BundleUpdateTask {
    bundle_name: String,
    src_dir: PathBuf,
    flavor_specs: Vec<FlavorSpec>,
    compression_policy: CompressionPolicy,
    skip_master_archive: bool,
    force: bool,
    concurrency: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl BundleUpdateTask {
    pub fn new(bundle_name: impl Into<String>, src_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            src_dir: src_dir.into(),
            flavor_specs: Vec::new(),
            compression_policy: CompressionPolicy::default(),
            skip_master_archive: false,
            force: false,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: None,
        }
    }

    pub fn flavor_specs(mut self, specs: Vec<FlavorSpec>) -> Self {
        self.flavor_specs = specs;
        self
    }

    pub fn compression_policy(mut self, policy: CompressionPolicy) -> Self {
        self.compression_policy = policy;
        self
    }

    pub fn skip_master_archive(mut self, skip: bool) -> Self {
        self.skip_master_archive = skip;
        self
    }

    /// Bypass the dedup-against-latest check and always publish a new version.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Checked cooperatively between steps; has no effect once the index
    /// commit (step 11) has happened.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    pub async fn run(self, catalog: &Catalog) -> Result<PublishOutcome> {
        let scanned = scan_source_dir(&self.src_dir)?;

        let bundle_id = catalog.bundle_id(&self.bundle_name);
        let mut lock = catalog.coordinator().get_index_lock(&bundle_id).await?;
        lock.acquire(catalog.lock_timeout()).await?;

        let outcome = self.run_locked(catalog, &lock, scanned).await;
        lock.release();
        outcome
    }

    async fn run_locked(
        &self,
        catalog: &Catalog,
        lock: &zinc_coordinator::Lock,
        scanned: Vec<crate::scan::ScannedFile>,
    ) -> Result<PublishOutcome> {
        self.check_cancelled()?;
        let mut index = catalog.read_index().await?;
        let candidate_version = index.next_version_for_bundle(&self.bundle_name);

        let policy = self.compression_policy;
        let hashed: Vec<Result<HashedFile>> = stream::iter(scanned.into_iter())
            .map(move |file| async move { Self::hash_file(file, policy).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        let hashed = hashed.into_iter().collect::<Result<Vec<HashedFile>>>()?;

        let mut candidate = Manifest::create(catalog.catalog_id(), &self.bundle_name, candidate_version);
        candidate.flavors = self.flavor_specs.iter().map(|spec| spec.name.clone()).collect();
        for file in &hashed {
            candidate.add_file(file.rel_path.clone(), file.sha.clone(), file.raw_size);
            if let Some(gz_size) = file.gz_size {
                candidate.add_format(&file.rel_path, Format::Gz, gz_size)?;
            }
        }

        let paths: Vec<String> = candidate.files.keys().cloned().collect();
        for path in paths {
            let flavors = assign_flavors(&self.flavor_specs, &path)?;
            candidate.set_file_flavors(&path, flavors)?;
        }

        // Dedup check happens before any storage write: hashing and gzip
        // encoding above only touch memory, never `storage`.
        if !self.force {
            if let Some(&prev_version) = index.versions_for_bundle(&self.bundle_name).iter().max() {
                if let Some(prev_manifest) = catalog.manifest_for_bundle(&self.bundle_name, prev_version).await? {
                    if candidate.files_are_equivalent(&prev_manifest) {
                        info!(bundle = %self.bundle_name, version = prev_version, "dedup: reusing prior version");
                        return Ok(PublishOutcome { version: prev_version, deduped: true, archive_warning: None });
                    }
                }
            }
        }

        self.check_cancelled()?;

        let storage = catalog.storage();
        let put_results: Vec<Result<()>> = stream::iter(hashed.iter())
            .map(move |file| async move { Self::put_file(file, storage).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for result in put_results {
            result?;
        }

        let manifest_path = pathmap::manifest_path(&self.bundle_name, candidate_version);
        catalog.storage().put(&manifest_path, Bytes::from(candidate.serialize()?)).await?;

        for entry in candidate.files.values() {
            for format_name in entry.formats.keys() {
                let format = Format::parse(format_name)?;
                let object_path = pathmap::object_path(&entry.sha, format);
                if catalog.storage().get_meta(&object_path).await?.is_none() {
                    let _ = catalog.storage().delete(&manifest_path).await;
                    return Err(Error::StorageInconsistent { sha: entry.sha.clone(), format: format_name.clone() });
                }
            }
        }

        // The hash/upload fan-out above may have taken a while; confirm
        // the lease is still ours before committing the index. A lost
        // lease must abort here without retrying.
        lock.renew().await?;

        index.add_version_for_bundle(&self.bundle_name, candidate_version);
        catalog.write_index(&index).await?;

        let archive_warning = if self.skip_master_archive {
            None
        } else {
            match build_archive(&candidate, catalog.storage()).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(bundle = %self.bundle_name, version = candidate_version, error = %err, "master archive build failed");
                    Some(err.to_string())
                }
            }
        };

        Ok(PublishOutcome { version: candidate_version, deduped: false, archive_warning })
    }

    /// Hash and (conditionally) gzip-encode one scanned file. Does not
    /// touch `storage` — safe to run before a dedup decision is made.
    async fn hash_file(file: crate::scan::ScannedFile, policy: CompressionPolicy) -> Result<HashedFile> {
        let bytes = Bytes::from(tokio::fs::read(&file.abs_path).await?);
        let sha = hash_bytes(&bytes);
        let raw_size = bytes.len() as u64;

        let encoded = encode_gz(&bytes)?;
        let (gz_encoded, gz_size) = if policy.accepts(raw_size, encoded.len() as u64) {
            let size = encoded.len() as u64;
            (Some(Bytes::from(encoded)), Some(size))
        } else {
            (None, None)
        };

        Ok(HashedFile { rel_path: file.rel_path, sha, raw_bytes: bytes, raw_size, gz_encoded, gz_size })
    }

    /// Upload one hashed file's raw (and optional gzip) variant, skipping
    /// objects already present. Only reached once divergence from the
    /// prior version is confirmed.
    async fn put_file(file: &HashedFile, storage: &dyn StorageBackend) -> Result<()> {
        let raw_path = pathmap::object_path(&file.sha, Format::Raw);
        if storage.get_meta(&raw_path).await?.is_none() {
            storage.put(&raw_path, file.raw_bytes.clone()).await?;
        }

        if let Some(encoded) = &file.gz_encoded {
            let gz_path = pathmap::object_path(&file.sha, Format::Gz);
            if storage.get_meta(&gz_path).await?.is_none() {
                storage.put(&gz_path, encoded.clone()).await?;
            }
        }

        Ok(())
    }
}
