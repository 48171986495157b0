//! Command-line front-end for the Zinc asset catalog.

pub mod catalog_ref;
pub mod commands;
pub mod config;
pub mod error;

pub use catalog_ref::CatalogRef;
pub use config::{Config, ConfigManager};
pub use error::{CliError, Result};
