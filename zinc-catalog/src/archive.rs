//! Master archive assembly: a POSIX tar of a manifest's `raw` objects,
//! written to `archives/{bundle}-{version}.tar`.

use bytes::Bytes;
use tar::{Builder, Header};
use zinc_core::{Format, Manifest, pathmap};
use zinc_storage::StorageBackend;

use crate::error::{Error, Result};

/// Stream a finalized manifest's raw objects into a tar at the archive
/// path. Entries are sorted by name (the manifest's `BTreeMap` ordering
/// already guarantees this) with mtime/uid/gid zeroed for determinism.
/// A missing raw object is fatal.
pub async fn build_archive(manifest: &Manifest, storage: &dyn StorageBackend) -> Result<()> {
    let mut builder = Builder::new(Vec::new());

    for (path, entry) in &manifest.files {
        let object_path = pathmap::object_path(&entry.sha, Format::Raw);
        let data = storage.get(&object_path).await?.ok_or_else(|| Error::StorageInconsistent {
            sha: entry.sha.clone(),
            format: Format::Raw.name().to_string(),
        })?;

        append_entry(&mut builder, path, &data)?;
    }

    let bytes = builder.into_inner()?;
    let archive_path = pathmap::archive_path(&manifest.bundle_name, manifest.version);
    storage.put(&archive_path, Bytes::from(bytes)).await?;
    Ok(())
}

fn append_entry(builder: &mut Builder<Vec<u8>>, path: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, data)?;
    Ok(())
}
