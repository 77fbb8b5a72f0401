//! User rule store
//!
//! User rules live in a JSON array on disk. New rules are inserted at the
//! front, and every mutation is written back before it returns.

use std::fs;
use std::path::{Path, PathBuf};

use lp_core::{Rule, UserRule};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access rule store '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Rule store '{}' is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize rules: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("A rule with id '{0}' already exists")]
    DuplicateId(String),
    #[error("No rule with id '{0}'")]
    NotFound(String),
    #[error("Invalid rules file: {0}")]
    InvalidImport(String),
}

/// Rule shape accepted by [`RuleStore::import_json`]. Incoming ids are
/// ignored.
#[derive(Deserialize)]
struct ImportedRule {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    enabled: bool,
}

#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    rules: Vec<UserRule>,
}

impl RuleStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rules = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            if text.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            Vec::new()
        };

        log::debug!("Loaded {} user rule(s) from {}", rules.len(), path.display());
        Ok(Self { path, rules })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rules(&self) -> &[UserRule] {
        &self.rules
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &UserRule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    pub fn get(&self, id: &str) -> Option<&UserRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Insert a new rule ahead of all existing rules.
    pub fn add(&mut self, rule: UserRule) -> Result<(), StoreError> {
        if self.get(&rule.id).is_some() {
            return Err(StoreError::DuplicateId(rule.id));
        }
        log::info!("Adding rule '{}'", rule.id);
        self.rules.insert(0, rule);
        self.save()
    }

    /// Replace the rule with the same id, keeping its position.
    pub fn update(&mut self, rule: UserRule) -> Result<(), StoreError> {
        let slot = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| StoreError::NotFound(rule.id.clone()))?;
        log::info!("Updating rule '{}'", rule.id);
        *slot = rule;
        self.save()
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), StoreError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        rule.enabled = enabled;
        self.save()
    }

    pub fn remove(&mut self, id: &str) -> Result<UserRule, StoreError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = self.rules.remove(index);
        log::info!("Removed rule '{}'", id);
        self.save()?;
        Ok(removed)
    }

    /// Import a JSON array of rules. The whole file is checked before
    /// anything is stored: every rule needs a non-empty `from` and `to`, and
    /// `from` must compile. Each rule gets a fresh id from `next_id`, and the
    /// imported rules land ahead of the existing ones in file order.
    pub fn import_json(
        &mut self,
        text: &str,
        mut next_id: impl FnMut() -> String,
    ) -> Result<usize, StoreError> {
        let invalid = |e: serde_json::Error| StoreError::InvalidImport(e.to_string());
        let value: serde_json::Value = serde_json::from_str(text).map_err(invalid)?;
        if !value.is_array() {
            return Err(StoreError::InvalidImport("expected an array of rules".to_string()));
        }
        let imported: Vec<ImportedRule> = serde_json::from_value(value).map_err(invalid)?;

        let mut rules = Vec::with_capacity(imported.len());
        for rule in imported {
            if rule.from.is_empty() || rule.to.is_empty() {
                return Err(StoreError::InvalidImport(
                    "every rule needs a 'from' and a 'to'".to_string(),
                ));
            }
            let rule = UserRule {
                id: next_id(),
                from: rule.from,
                to: rule.to,
                enabled: rule.enabled,
            };
            Rule::from(rule.clone()).validate().map_err(|e| {
                StoreError::InvalidImport(format!("invalid regex pattern in rule: {e}"))
            })?;
            if self.get(&rule.id).is_some() || rules.iter().any(|r: &UserRule| r.id == rule.id) {
                return Err(StoreError::DuplicateId(rule.id));
            }
            rules.push(rule);
        }

        let count = rules.len();
        log::info!("Importing {} rule(s)", count);
        rules.append(&mut self.rules);
        self.rules = rules;
        self.save()?;
        Ok(count)
    }

    /// The stored rules as pretty-printed JSON, the format `import_json` reads.
    pub fn export_json(&self) -> Result<String, StoreError> {
        let mut text = serde_json::to_string_pretty(&self.rules)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the rules to a sibling temp file, then rename it into place.
    pub fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let text = self.export_json()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> UserRule {
        UserRule {
            id: id.to_string(),
            from: format!("http://{id}.com"),
            to: format!("http://{id}.org"),
            enabled: true,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::open(dir.path().join("rules.json")).unwrap();
        assert!(store.rules().is_empty());
    }

    #[test]
    fn test_add_inserts_at_front() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut store = RuleStore::open(&path).unwrap();
        store.add(rule("rule-1")).unwrap();
        store.add(rule("rule-2")).unwrap();

        let ids: Vec<&str> = store.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rule-2", "rule-1"]);

        let reopened = RuleStore::open(&path).unwrap();
        assert_eq!(reopened.rules(), store.rules());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RuleStore::open(dir.path().join("rules.json")).unwrap();
        store.add(rule("dup")).unwrap();
        assert!(matches!(store.add(rule("dup")), Err(StoreError::DuplicateId(id)) if id == "dup"));
    }

    #[test]
    fn test_update_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RuleStore::open(dir.path().join("rules.json")).unwrap();
        store.add(rule("a")).unwrap();
        store.add(rule("b")).unwrap();

        let mut changed = rule("a");
        changed.to = "http://changed.org".to_string();
        store.update(changed).unwrap();

        assert_eq!(store.rules()[1].id, "a");
        assert_eq!(store.rules()[1].to, "http://changed.org");
        assert!(matches!(store.update(rule("zzz")), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_remove_and_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.json");
        let mut store = RuleStore::open(&path).unwrap();
        store.add(rule("a")).unwrap();
        store.add(rule("b")).unwrap();

        store.set_enabled("a", false).unwrap();
        assert_eq!(store.enabled_rules().count(), 1);

        let removed = store.remove("b").unwrap();
        assert_eq!(removed.id, "b");
        assert!(matches!(store.remove("b"), Err(StoreError::NotFound(_))));

        let reopened = RuleStore::open(&path).unwrap();
        assert_eq!(reopened.rules().len(), 1);
        assert!(!reopened.rules()[0].enabled);
    }

    fn counter() -> impl FnMut() -> String {
        let mut next = 0;
        move || {
            next += 1;
            format!("imported-{next}")
        }
    }

    #[test]
    fn test_import_keeps_file_order_ahead_of_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut store = RuleStore::open(&path).unwrap();
        store.add(rule("existing")).unwrap();

        let text = r#"[
            {"id": "x", "from": "^https://x\\.com/(.*)$", "to": "https://x.org/$1",
             "enabled": true},
            {"id": "y", "from": "^https://y\\.com/(.*)$", "to": "https://y.org/$1"}
        ]"#;
        assert_eq!(store.import_json(text, counter()).unwrap(), 2);

        let ids: Vec<&str> = store.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["imported-1", "imported-2", "existing"]);
        assert_eq!(store.rules()[0].from, "^https://x\\.com/(.*)$");
        assert!(store.rules()[0].enabled);
        assert!(!store.rules()[1].enabled);

        let reopened = RuleStore::open(&path).unwrap();
        assert_eq!(reopened.rules(), store.rules());
    }

    #[test]
    fn test_import_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RuleStore::open(dir.path().join("rules.json")).unwrap();
        let err = store
            .import_json(r#"{"from": "a", "to": "b"}"#, counter())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidImport(msg) if msg.contains("array")));
        assert!(matches!(store.import_json("[{", counter()), Err(StoreError::InvalidImport(_))));
        assert!(store.rules().is_empty());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut store = RuleStore::open(&path).unwrap();

        let bad_regex = r#"[
            {"from": "^https://ok\\.com/", "to": "https://ok.org/"},
            {"from": "https://(unclosed", "to": "https://b.com/"}
        ]"#;
        let err = store.import_json(bad_regex, counter()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidImport(msg) if msg.contains("regex")));

        let missing_to = r#"[{"from": "^https://a\\.com/"}]"#;
        assert!(matches!(
            store.import_json(missing_to, counter()),
            Err(StoreError::InvalidImport(_))
        ));

        assert!(store.rules().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_export_reimports() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RuleStore::open(dir.path().join("a.json")).unwrap();
        store.add(rule("a")).unwrap();
        store.add(rule("b")).unwrap();
        let exported = store.export_json().unwrap();

        let mut other = RuleStore::open(dir.path().join("b.json")).unwrap();
        assert_eq!(other.import_json(&exported, counter()).unwrap(), 2);
        let froms: Vec<&str> = other.rules().iter().map(|r| r.from.as_str()).collect();
        assert_eq!(froms, vec!["http://b.com", "http://a.com"]);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, "[{").unwrap();
        assert!(matches!(RuleStore::open(&path), Err(StoreError::Parse { .. })));
    }
}
