//! Rule Set Assembly
//!
//! Enabled user rules come first in their stored order, then every shared
//! rule in catalog order. Ids are not de-duplicated.

use crate::matcher::CompiledRule;
use crate::types::{Rule, SharedRule, UserRule};

/// Ordered, compiled rules. First match wins within a chain step.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Merge user rules and shared rules into one ordered set.
    pub fn assemble(user_rules: &[UserRule], shared_rules: &[SharedRule]) -> Self {
        let user = user_rules
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .map(Rule::from);
        let shared = shared_rules.iter().cloned().map(Rule::from);

        let set: Self = user.chain(shared).collect();
        log::debug!(
            "Assembled rule set: {} rules ({} user, {} shared)",
            set.len(),
            set.len() - shared_rules.len(),
            shared_rules.len()
        );
        set
    }

    /// Build a set from already-normalized rules, keeping their order.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        rules.into_iter().collect()
    }

    /// First rule that matches `url`, with its rewritten URL.
    pub fn first_match(&self, url: &str) -> Option<(&CompiledRule, String)> {
        self.rules.iter().find_map(|compiled| {
            let outcome = compiled.apply(url);
            outcome.matched.then_some((compiled, outcome.url))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(CompiledRule::compile).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, enabled: bool) -> UserRule {
        UserRule {
            id: id.to_string(),
            from: format!("^https://{id}\\.com/(.*)$"),
            to: "https://dest.com/$1".to_string(),
            enabled,
        }
    }

    fn shared(id: &str) -> SharedRule {
        SharedRule {
            id: id.to_string(),
            regex_filter: "^https?://".to_string(),
            regex_substitution: None,
            remove_params: vec!["utm_source".to_string()],
            test: Vec::new(),
        }
    }

    #[test]
    fn test_assemble_order_and_filtering() {
        let set = RuleSet::assemble(
            &[user("a", true), user("b", false), user("c", true)],
            &[shared("s1"), shared("s2")],
        );
        let ids: Vec<&str> = set.iter().map(|r| r.rule().id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "s1", "s2"]);
    }

    #[test]
    fn test_colliding_ids_are_kept() {
        let set = RuleSet::assemble(&[user("dup", true)], &[shared("dup")]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let set = RuleSet::from_rules(vec![
            Rule::substitute("first", "^https://a\\.com/(.*)$", "https://first.com/$1"),
            Rule::substitute("second", "^https://a\\.com/(.*)$", "https://second.com/$1"),
        ]);
        let (rule, url) = set.first_match("https://a.com/x").unwrap();
        assert_eq!(rule.rule().id, "first");
        assert_eq!(url, "https://first.com/x");
        assert!(set.first_match("https://z.com/").is_none());
    }

    #[test]
    fn test_disabled_rule_in_prebuilt_set_is_skipped() {
        let mut off = Rule::substitute("off", "^https://a\\.com/(.*)$", "https://off.com/$1");
        off.enabled = false;
        let on = Rule::substitute("on", "^https://a\\.com/(.*)$", "https://on.com/$1");

        let set = RuleSet::from_rules(vec![off.clone()]);
        assert!(set.first_match("https://a.com/x").is_none());

        let set = RuleSet::from_rules(vec![off, on]);
        let (rule, url) = set.first_match("https://a.com/x").unwrap();
        assert_eq!(rule.rule().id, "on");
        assert_eq!(url, "https://on.com/x");
    }

    #[test]
    fn test_disabled_user_rule_never_participates() {
        let set = RuleSet::assemble(&[user("a", false)], &[]);
        assert!(set.is_empty());
        assert!(set.first_match("https://a.com/anything").is_none());
    }
}
