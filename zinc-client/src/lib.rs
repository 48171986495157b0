//! Read-only HTTP consumer client for a Zinc catalog mirror.

pub mod client;
pub mod error;

pub use client::{Client, SUPPORTED_API_VERSION};
pub use error::{Error, Result};
