//! Shared rule catalog documents
//!
//! A catalog is a JSON document `{name, description, rules}` where every rule
//! is a [`SharedRule`]. One catalog is bundled into the binary; others can be
//! loaded from disk and merged with it.

use std::fs;
use std::path::{Path, PathBuf};

use lp_core::SharedRule;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog bundled at build time.
const BUNDLED_CATALOG: &str = include_str!("../assets/shared-rules.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<SharedRule>,
}

impl Catalog {
    /// The catalog shipped with LinkPure. A corrupt bundle yields an empty
    /// catalog rather than an error.
    pub fn bundled() -> Self {
        match Self::from_json(BUNDLED_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                log::error!("Bundled catalog failed to parse, shared rules disabled: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(text)?;
        log::debug!("Parsed catalog '{}' with {} rules", catalog.name, catalog.rules.len());
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Load `path` if given, otherwise the bundled catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::bundled()),
        }
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Number of bundled test cases across all rules.
    pub fn test_case_count(&self) -> usize {
        self.rules.iter().map(|r| r.test.len()).sum()
    }

    pub fn get(&self, id: &str) -> Option<&SharedRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::bundled();
        assert_eq!(catalog.name, "Shared Rules");
        assert!(!catalog.rules.is_empty());
        assert!(catalog.get("amazon-params").is_some());
        assert!(catalog.get("google-redirect-0").is_some());
        assert!(catalog.test_case_count() >= catalog.rules.len());
    }

    #[test]
    fn test_parse_minimal_document() {
        let catalog =
            Catalog::from_json(r#"{"rules": [{"id": "x", "regexFilter": ".*"}]}"#).unwrap();
        assert!(catalog.name.is_empty());
        assert_eq!(catalog.rules.len(), 1);
        assert!(catalog.rules[0].remove_params.is_empty());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Catalog::from_json("{not json"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::from_path(Path::new("/nonexistent/linkpure/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_json_roundtrip_keeps_rules() {
        let catalog = Catalog::bundled();
        let reparsed = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, catalog);
    }
}
