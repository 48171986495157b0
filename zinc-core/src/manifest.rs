//! Per-(bundle, version) file inventory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::{Format, FormatEntry};

/// One file's entry in a manifest: its content hash, the formats it was
/// encoded into, and any flavors it was tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub sha: String,
    pub formats: BTreeMap<String, FormatEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flavors: Vec<String>,
}

impl FileEntry {
    pub fn new(sha: String, raw_size: u64) -> Self {
        let mut formats = BTreeMap::new();
        formats.insert(Format::Raw.name().to_string(), FormatEntry { size: raw_size });
        Self { sha, formats, flavors: Vec::new() }
    }

    pub fn add_format(&mut self, format: Format, size: u64) {
        self.formats.insert(format.name().to_string(), FormatEntry { size });
    }
}

/// The immutable per-(bundle, version) file inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub catalog_id: String,
    pub bundle_name: String,
    pub version: u32,
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flavors: Vec<String>,
}

impl Manifest {
    pub fn create(catalog_id: impl Into<String>, bundle_name: impl Into<String>, version: u32) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            bundle_name: bundle_name.into(),
            version,
            files: BTreeMap::new(),
            flavors: Vec::new(),
        }
    }

    /// Add (or overwrite) a file entry's `raw` format size; `sha` is the
    /// raw content hash.
    pub fn add_file(&mut self, path: impl Into<String>, sha: impl Into<String>, raw_size: u64) {
        self.files.insert(path.into(), FileEntry::new(sha.into(), raw_size));
    }

    /// Record an additional encoded format for an already-added file.
    pub fn add_format(&mut self, path: &str, format: Format, size: u64) -> Result<()> {
        let entry = self.files.get_mut(path).ok_or_else(|| {
            Error::ManifestInvalid(format!("cannot add format to unknown path {path:?}"))
        })?;
        entry.add_format(format, size);
        Ok(())
    }

    /// Attach flavor tags to an already-added file entry.
    pub fn set_file_flavors(&mut self, path: &str, flavors: Vec<String>) -> Result<()> {
        let entry = self.files.get_mut(path).ok_or_else(|| {
            Error::ManifestInvalid(format!("cannot set flavors on unknown path {path:?}"))
        })?;
        entry.flavors = flavors;
        Ok(())
    }

    /// File-equivalence for dedup: same set of paths, and for each path
    /// the same raw sha, the same flavor set, and the same size.
    pub fn files_are_equivalent(&self, other: &Manifest) -> bool {
        if self.files.len() != other.files.len() {
            return false;
        }
        for (path, entry) in &self.files {
            let Some(other_entry) = other.files.get(path) else {
                return false;
            };
            if entry.sha != other_entry.sha || entry.flavors != other_entry.flavors {
                return false;
            }
            let raw_name = Format::Raw.name();
            if entry.formats.get(raw_name) != other_entry.formats.get(raw_name) {
                return false;
            }
        }
        true
    }

    /// Canonical JSON: sorted keys (via `BTreeMap`), stable formatting,
    /// trailing newline.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        if manifest.files.values().any(|entry| !entry.formats.contains_key(Format::Raw.name())) {
            return Err(Error::ManifestInvalid("file entry missing raw format".to_string()));
        }
        for entry in manifest.files.values() {
            for format_name in entry.formats.keys() {
                Format::parse(format_name)?;
            }
        }
        Ok(manifest)
    }
}
