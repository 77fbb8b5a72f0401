use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use lp_core::DEFAULT_MAX_REDIRECTS;

const APP_PREFIX: &str = "linkpure";

/// Settings loaded from `~/.config/linkpure/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rewrite budget per chain. Values <= 0 fall back to the default.
    pub max_redirects: i32,
    /// Append the shared catalog after the user's own rules.
    pub use_shared_rules: bool,
    /// Log a "URL Rewritten" notice whenever `watch` writes back a URL.
    pub notification_enabled: bool,
    /// User rule store; defaults to `rules.json` under the XDG data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
    /// Catalog document replacing the bundled one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS as i32,
            use_shared_rules: true,
            notification_enabled: false,
            rules_path: None,
            catalog_path: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.get_config_file("config.toml"))
}

pub fn default_rules_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.get_data_file("rules.json"))
}

impl Config {
    /// Load `path`, or the XDG config file when no path is given. Only the
    /// default location may be absent; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    tracing::debug!("no config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_toml(&data).with_context(|| format!("invalid config '{}'", path.display()))
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn rules_path(&self) -> Result<PathBuf> {
        match &self.rules_path {
            Some(path) => Ok(path.clone()),
            None => default_rules_path(),
        }
    }
}
