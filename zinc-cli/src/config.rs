//! TOML configuration file: catalog bookmarks and `vars.NAME` substitution,
//! loaded the way `ngdp-client::config_manager` manages its own TOML file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `[bookmarks]` (alias -> catalog URL) and `[vars]` tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub bookmarks: BTreeMap<String, String>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl Config {
    /// Resolve `alias_or_url` against `[bookmarks]`; unresolved names pass
    /// through unchanged so a bare URL still works.
    pub fn resolve_bookmark(&self, alias_or_url: &str) -> String {
        self.bookmarks.get(alias_or_url).cloned().unwrap_or_else(|| alias_or_url.to_string())
    }

    /// `_replace_vars` from the original: any string value that is
    /// *exactly* `vars.NAME` is replaced with the resolved value of
    /// `vars.NAME`. Only `[bookmarks]` values carry catalog references, so
    /// that is the only table substituted into.
    pub fn substitute_vars(&mut self) {
        let Config { bookmarks, vars, .. } = self;
        for value in bookmarks.values_mut() {
            if let Some(name) = value.strip_prefix("vars.") {
                if let Some(resolved) = vars.get(name) {
                    *value = resolved.clone();
                }
            }
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load `path` (or the default config path), creating a default file on
    /// first run.
    pub fn load_or_create(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(Self::default_path);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };
        config.substitute_vars();

        let manager = Self { path, config };
        if !manager.path.exists() {
            manager.save()?;
        }
        Ok(manager)
    }

    fn default_path() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("zinc").join("config.toml")
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
