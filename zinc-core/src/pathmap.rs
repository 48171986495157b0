//! Contractual subpath layout for objects, manifests, the index, and archives.
//!
//! These paths are part of the wire contract: consumers (including the
//! HTTP read-only client) read objects and manifests by these exact
//! subpaths, so changing the shape here is a breaking change.

use crate::formats::Format;

/// Subpath for the catalog index, rooted at the catalog's storage prefix.
pub const INDEX_PATH: &str = "index.json";

/// `objects/{sha[0:2]}/{sha[2:4]}/{sha}[.{ext}]`
pub fn object_path(sha: &str, format: Format) -> String {
    let shard_a = &sha[0..2];
    let shard_b = &sha[2..4];
    match format.extension() {
        Some(ext) => format!("objects/{shard_a}/{shard_b}/{sha}.{ext}"),
        None => format!("objects/{shard_a}/{shard_b}/{sha}"),
    }
}

/// `manifests/{bundle_name}/{version}.json`
pub fn manifest_path(bundle_name: &str, version: u32) -> String {
    format!("manifests/{bundle_name}/{version}.json")
}

/// `archives/{bundle_name}-{version}.tar`
pub fn archive_path(bundle_name: &str, version: u32) -> String {
    format!("archives/{bundle_name}-{version}.tar")
}
