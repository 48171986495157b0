//! The single mutable per-catalog registry of bundle versions and
//! distributions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::previous_distro_name;
use crate::error::{Error, Result};

/// Current on-disk index format. A mismatch on load is always fatal.
pub const CURRENT_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub format: u32,
    pub id: String,
    #[serde(default)]
    pub bundles: BTreeMap<String, BTreeSet<u32>>,
    #[serde(default)]
    pub distributions: BTreeMap<String, BTreeMap<String, u32>>,
}

impl Index {
    pub fn new(catalog_id: impl Into<String>) -> Self {
        Self {
            format: CURRENT_FORMAT,
            id: catalog_id.into(),
            bundles: BTreeMap::new(),
            distributions: BTreeMap::new(),
        }
    }

    pub fn bundle_names(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    /// Never throws; empty if the bundle is unknown.
    pub fn versions_for_bundle(&self, bundle: &str) -> Vec<u32> {
        self.bundles
            .get(bundle)
            .map(|versions| versions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// `max(existing)+1`, or `1` if none.
    pub fn next_version_for_bundle(&self, bundle: &str) -> u32 {
        self.bundles
            .get(bundle)
            .and_then(|versions| versions.iter().max())
            .map_or(1, |max| max + 1)
    }

    /// Idempotent: adding an existing version is a no-op.
    pub fn add_version_for_bundle(&mut self, bundle: &str, version: u32) {
        self.bundles.entry(bundle.to_string()).or_default().insert(version);
    }

    /// No-op if `(bundle, version)` is absent. Fails `InUse` if any
    /// distribution still targets the version.
    pub fn del_version_for_bundle(&mut self, bundle: &str, version: u32) -> Result<()> {
        let Some(versions) = self.bundles.get(bundle) else {
            return Ok(());
        };
        if !versions.contains(&version) {
            return Ok(());
        }

        let pointing: Vec<String> = self
            .distributions
            .get(bundle)
            .map(|distros| {
                distros
                    .iter()
                    .filter(|(name, v)| !name.starts_with("prev:") && **v == version)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();

        if !pointing.is_empty() {
            return Err(Error::InUse { bundle: bundle.to_string(), version, distro: pointing });
        }

        if let Some(versions) = self.bundles.get_mut(bundle) {
            versions.remove(&version);
        }
        debug!(bundle, version, "deleted bundle version from index");
        Ok(())
    }

    /// Sets `distributions[bundle][distro] = version`, recording the prior
    /// value under `prev:{distro}` if one existed.
    pub fn update_distribution(&mut self, distro: &str, bundle: &str, version: u32) -> Result<()> {
        let versions = self
            .bundles
            .get(bundle)
            .ok_or_else(|| Error::UnknownBundle(bundle.to_string()))?;
        if !versions.contains(&version) {
            return Err(Error::UnknownVersion { bundle: bundle.to_string(), version });
        }

        let entry = self.distributions.entry(bundle.to_string()).or_default();
        if let Some(previous) = entry.insert(distro.to_string(), version) {
            entry.insert(previous_distro_name(distro), previous);
        }
        debug!(bundle, distro, version, "updated distribution");
        Ok(())
    }

    /// Removes `distro`; leaves `prev:{distro}` intact.
    pub fn delete_distribution(&mut self, distro: &str, bundle: &str) {
        if let Some(entry) = self.distributions.get_mut(bundle) {
            entry.remove(distro);
        }
    }

    pub fn distribution(&self, bundle: &str, distro: &str) -> Option<u32> {
        self.distributions.get(bundle)?.get(distro).copied()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Fails `UnsupportedIndex` if `format != 1`.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let index: Index = serde_json::from_slice(bytes)?;
        if index.format != CURRENT_FORMAT {
            return Err(Error::UnsupportedIndex { found: index.format, expected: CURRENT_FORMAT });
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn versions_for_unknown_bundle_is_empty() {
        let index = Index::new("com.example.test");
        assert!(index.versions_for_bundle("meep").is_empty());
    }

    #[test]
    fn add_version_is_idempotent() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 1);
        assert_eq!(index.versions_for_bundle("meep"), vec![1]);
    }

    #[test]
    fn next_version_increments_from_max() {
        let mut index = Index::new("com.example.test");
        assert_eq!(index.next_version_for_bundle("meep"), 1);
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 2);
        assert_eq!(index.next_version_for_bundle("meep"), 3);
    }

    #[test]
    fn del_version_is_noop_when_absent() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.del_version_for_bundle("meep", 2).unwrap();
        assert_eq!(index.versions_for_bundle("meep"), vec![1]);
    }

    #[test]
    fn del_version_removes_present_version() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 2);
        index.del_version_for_bundle("meep", 1).unwrap();
        assert_eq!(index.versions_for_bundle("meep"), vec![2]);
    }

    #[test]
    fn del_version_fails_when_distribution_points_at_it() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.update_distribution("live", "meep", 1).unwrap();
        let err = index.del_version_for_bundle("meep", 1).unwrap_err();
        assert!(matches!(err, Error::InUse { .. }));
    }

    #[test]
    fn update_distribution_requires_known_bundle() {
        let mut index = Index::new("com.example.test");
        let err = index.update_distribution("live", "beep", 1).unwrap_err();
        assert!(matches!(err, Error::UnknownBundle(_)));
    }

    #[test]
    fn update_distribution_requires_known_version() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("beep", 1);
        let err = index.update_distribution("live", "beep", 2).unwrap_err();
        assert!(matches!(err, Error::UnknownVersion { .. }));
    }

    #[test]
    fn update_distribution_records_previous_value() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 2);
        index.update_distribution("live", "meep", 1).unwrap();
        index.update_distribution("live", "meep", 2).unwrap();
        assert_eq!(index.distribution("meep", "live"), Some(2));
        assert_eq!(index.distribution("meep", "prev:live"), Some(1));
    }

    #[test]
    fn delete_distribution_leaves_prev_intact() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.add_version_for_bundle("meep", 2);
        index.update_distribution("live", "meep", 1).unwrap();
        index.update_distribution("live", "meep", 2).unwrap();
        index.delete_distribution("live", "meep");
        assert_eq!(index.distribution("meep", "live"), None);
        assert_eq!(index.distribution("meep", "prev:live"), Some(1));
    }

    #[test]
    fn deserialize_rejects_unsupported_format() {
        let index = Index::new("com.example.test");
        let mut bytes = index.serialize().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap().replace("\"format\": 1", "\"format\": 2");
        bytes = text.into_bytes();
        let err = Index::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnsupportedIndex { .. }));
    }

    #[test]
    fn serialize_round_trips() {
        let mut index = Index::new("com.example.test");
        index.add_version_for_bundle("meep", 1);
        index.update_distribution("live", "meep", 1).unwrap();
        let bytes = index.serialize().unwrap();
        assert!(bytes.ends_with(b"\n"));
        assert_eq!(Index::deserialize(&bytes).unwrap(), index);
    }
}
