//! Subcommand handlers. Each returns the process exit code directly so
//! `main` can special-case verify's "discrepancies found" code (6) without
//! treating it as an error.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use zinc_catalog::{BundleUpdateTask, Catalog};
use zinc_client::Client;

use crate::catalog_ref::{self, CatalogRef};
use crate::config::Config;
use crate::error::{CliError, Result};

async fn open_catalog_for_write(catalog_ref: &CatalogRef, catalog_id: &str, lock_timeout: Option<Duration>) -> Result<Catalog> {
    match catalog_ref {
        CatalogRef::File(dir) => {
            let (storage, coordinator) = catalog_ref::open_file_backend(dir)?;
            Ok(Catalog::open_or_create(catalog_id, storage, coordinator, lock_timeout).await?)
        }
        CatalogRef::S3 { .. } => {
            Err(CliError::Usage("s3:// catalogs require a driver not shipped in this build".to_string()))
        }
        CatalogRef::Http(_) => {
            Err(CliError::Usage("http(s):// catalogs are read-only; publish against a file reference".to_string()))
        }
    }
}

pub async fn publish(
    config: &Config,
    catalog: &str,
    catalog_id: &str,
    bundle: &str,
    src: PathBuf,
    force: bool,
    skip_master_archive: bool,
    lock_timeout: Option<Duration>,
) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let handle = open_catalog_for_write(&catalog_ref, catalog_id, lock_timeout).await?;

    let outcome =
        BundleUpdateTask::new(bundle, src).force(force).skip_master_archive(skip_master_archive).run(&handle).await?;

    if outcome.deduped {
        println!("{bundle}: version {} unchanged (deduped)", outcome.version);
    } else {
        println!("{bundle}: published version {}", outcome.version);
    }
    if let Some(warning) = outcome.archive_warning {
        eprintln!("warning: master archive build failed: {warning}");
    }
    Ok(0)
}

pub async fn verify(config: &Config, catalog: &str, catalog_id: &str, full: bool) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let handle = open_catalog_for_write(&catalog_ref, catalog_id, None).await?;

    let findings = handle.verify(full).await?;
    if findings.is_empty() {
        println!("catalog is consistent");
        return Ok(0);
    }
    for finding in &findings {
        println!("{finding:?}");
    }
    Ok(6)
}

pub async fn bundles(config: &Config, catalog: &str, catalog_id: &str) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let names = match catalog_ref {
        CatalogRef::Http(base_url) => {
            let client = Client::connect(base_url).await?;
            client.bundle_names().await?
        }
        other => {
            let handle = open_catalog_for_write(&other, catalog_id, None).await?;
            handle.bundle_names().await?
        }
    };
    for name in names {
        println!("{name}");
    }
    Ok(0)
}

pub async fn distro_show(config: &Config, catalog: &str, catalog_id: &str, bundle: &str, distro: &str) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let version = match catalog_ref {
        CatalogRef::Http(base_url) => {
            let client = Client::connect(base_url).await?;
            client.distribution(bundle, distro).await?
        }
        other => {
            let handle = open_catalog_for_write(&other, catalog_id, None).await?;
            handle.distribution(bundle, distro).await?
        }
    };
    match version {
        Some(version) => println!("{version}"),
        None => println!("(unset)"),
    }
    Ok(0)
}

pub async fn distro_set(config: &Config, catalog: &str, catalog_id: &str, bundle: &str, distro: &str, version: u32) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let handle = open_catalog_for_write(&catalog_ref, catalog_id, None).await?;
    handle.update_distribution(distro, bundle, version).await?;
    info!(bundle, distro, version, "updated distribution");
    println!("{bundle}: {distro} -> {version}");
    Ok(0)
}

pub async fn distro_delete(config: &Config, catalog: &str, catalog_id: &str, bundle: &str, distro: &str) -> Result<i32> {
    let catalog_ref = catalog_ref::parse(catalog, config)?;
    let handle = open_catalog_for_write(&catalog_ref, catalog_id, None).await?;
    handle.delete_distribution(distro, bundle).await?;
    println!("{bundle}: {distro} removed");
    Ok(0)
}

pub fn config_show(config: &Config) -> Result<i32> {
    let rendered = toml::to_string_pretty(config).map_err(crate::config::ConfigError::from)?;
    print!("{rendered}");
    Ok(0)
}

pub fn config_bookmark(config: &mut Config, alias: &str, url: &str) -> Result<i32> {
    config.bookmarks.insert(alias.to_string(), url.to_string());
    println!("bookmarked {alias} -> {url}");
    Ok(0)
}
