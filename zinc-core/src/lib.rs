//! Content-addressing, manifest, and index primitives for the Zinc asset
//! catalog.
//!
//! This crate is deliberately storage- and concurrency-agnostic: it has no
//! knowledge of the `StorageBackend` or `Coordinator` traits that
//! `zinc-storage`, `zinc-coordinator`, and `zinc-catalog` build on top of.
//! Everything here is a pure function or a plain, serializable data type.

pub mod descriptor;
pub mod error;
pub mod flavor;
pub mod formats;
pub mod hash;
pub mod index;
pub mod manifest;
pub mod pathmap;

pub use descriptor::{
    bundle_id_from_descriptor, bundle_version_from_descriptor, make_bundle_descriptor,
    make_bundle_id, previous_distro_name,
};
pub use error::{Error, Result};
pub use flavor::{FlavorSpec, Matcher, assign_flavors};
pub use formats::{CompressionPolicy, Format, FormatEntry, decode_gz, encode_gz};
pub use hash::{StreamingHasher, hash_bytes, hash_reader};
pub use index::Index;
pub use manifest::{FileEntry, Manifest};
