//! Bundle id / descriptor construction and parsing.
//!
//! A `bundle_id` is `{catalog_id}.{bundle_name}`, and a *descriptor* is a
//! printable composite `{bundle_id}-{version}` optionally suffixed by
//! `~{flavor}`.

use crate::error::{Error, Result};

pub fn make_bundle_id(catalog_id: &str, bundle_name: &str) -> String {
    format!("{catalog_id}.{bundle_name}")
}

pub fn make_bundle_descriptor(bundle_id: &str, version: u32, flavor: Option<&str>) -> String {
    let mut descriptor = format!("{bundle_id}-{version}");
    if let Some(flavor) = flavor {
        descriptor.push('~');
        descriptor.push_str(flavor);
    }
    descriptor
}

/// Strip an optional trailing `~flavor` suffix.
fn without_flavor(descriptor: &str) -> &str {
    match descriptor.rfind('~') {
        Some(index) => &descriptor[..index],
        None => descriptor,
    }
}

pub fn bundle_id_from_descriptor(descriptor: &str) -> Result<String> {
    let without_flavor = without_flavor(descriptor);
    let dash = without_flavor.rfind('-').ok_or_else(|| {
        Error::InvalidDescriptor(format!("missing version separator in {descriptor:?}"))
    })?;
    Ok(without_flavor[..dash].to_string())
}

pub fn bundle_version_from_descriptor(descriptor: &str) -> Result<u32> {
    let without_flavor = without_flavor(descriptor);
    let dash = without_flavor.rfind('-').ok_or_else(|| {
        Error::InvalidDescriptor(format!("missing version separator in {descriptor:?}"))
    })?;
    without_flavor[dash + 1..]
        .parse()
        .map_err(|_| Error::InvalidDescriptor(format!("non-numeric version in {descriptor:?}")))
}

/// The distribution key recording a prior value before an overwrite:
/// `previous_name_for_distro`.
pub fn previous_distro_name(distro: &str) -> String {
    format!("prev:{distro}")
}
