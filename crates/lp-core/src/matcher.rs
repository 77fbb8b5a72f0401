//! Rule Matching
//!
//! A [`CompiledRule`] holds the rule's filter and parameter patterns compiled
//! once, so a chain walk over many rules does not recompile on every step.
//! Compilation failures never escape: the rule simply never matches.

use fancy_regex::Regex;
use thiserror::Error;

use crate::params::{compile_patterns, is_regex_pattern, strip_params, ParamPattern};
use crate::substitute::substitute;
use crate::types::{MatchOutcome, Rule};

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        source: fancy_regex::Error,
    },
    #[error("Invalid parameter pattern '{pattern}': {source}")]
    InvalidParam {
        pattern: String,
        source: fancy_regex::Error,
    },
}

impl Rule {
    /// Check that the filter and every regex parameter pattern compile.
    pub fn validate(&self) -> Result<(), RuleError> {
        Regex::new(&self.filter).map_err(|source| RuleError::InvalidFilter {
            pattern: self.filter.clone(),
            source,
        })?;

        for pattern in self.remove_params.iter().filter(|p| is_regex_pattern(p)) {
            Regex::new(pattern).map_err(|source| RuleError::InvalidParam {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// Compiled Rule
// =============================================================================

/// A rule with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    filter: Option<Regex>,
    params: Vec<ParamPattern>,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Self {
        let filter = match Regex::new(&rule.filter) {
            Ok(re) => Some(re),
            Err(err) => {
                log::warn!(
                    "Rule '{}' has an invalid filter, it will never match: {}",
                    rule.id,
                    err
                );
                None
            }
        };
        let params = if rule.substitution.is_none() {
            compile_patterns(&rule.remove_params)
        } else {
            Vec::new()
        };

        Self { rule, filter, params }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// True if the filter compiled.
    pub fn is_valid(&self) -> bool {
        self.filter.is_some()
    }

    /// Apply this rule to `url`. A disabled rule never matches.
    pub fn apply(&self, url: &str) -> MatchOutcome {
        if !self.rule.enabled {
            return MatchOutcome::no_match();
        }

        let filter = match &self.filter {
            Some(re) => re,
            None => return MatchOutcome::no_match(),
        };

        let captures = match filter.captures(url) {
            Ok(Some(caps)) => caps,
            Ok(None) => return MatchOutcome::no_match(),
            Err(err) => {
                log::debug!("Rule '{}' failed while matching {}: {}", self.rule.id, url, err);
                return MatchOutcome::no_match();
            }
        };

        if let Some(template) = &self.rule.substitution {
            return MatchOutcome::rewritten(substitute(&captures, template));
        }

        if self.params.is_empty() {
            return MatchOutcome::no_match();
        }

        match strip_params(url, &self.params) {
            Some(stripped) => MatchOutcome::rewritten(stripped),
            None => MatchOutcome::no_match(),
        }
    }
}

/// Apply a single rule to a URL, compiling its patterns on the spot.
pub fn match_rule(rule: &Rule, url: &str) -> MatchOutcome {
    CompiledRule::compile(rule.clone()).apply(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRule;

    #[test]
    fn test_substitution_match() {
        let rule = Rule::substitute(
            "youtube-rule",
            "https://youtu.be/(.*)",
            "https://www.youtube.com/watch?v=$1",
        );
        let outcome = match_rule(&rule, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(
            outcome,
            MatchOutcome::rewritten("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let rule = Rule::from(UserRule {
            id: "off".to_string(),
            from: "^https://a\\.com/(.*)$".to_string(),
            to: "https://b.com/$1".to_string(),
            enabled: false,
        });
        assert_eq!(match_rule(&rule, "https://a.com/x"), MatchOutcome::no_match());

        let enabled = Rule { enabled: true, ..rule };
        assert!(match_rule(&enabled, "https://a.com/x").matched);
    }

    #[test]
    fn test_no_match_has_empty_url() {
        let rule = Rule::substitute(
            "r",
            "https://www.reddit.com/r/(.*?)/",
            "https://www.reddit.com/r/$1/top/",
        );
        assert_eq!(match_rule(&rule, "https://www.google.com/"), MatchOutcome::no_match());
    }

    #[test]
    fn test_invalid_filter_fails_closed() {
        let rule = Rule::substitute("bad", "https://(unclosed", "https://b.com/");
        let compiled = CompiledRule::compile(rule.clone());
        assert!(!compiled.is_valid());
        assert!(!compiled.apply("https://(unclosed").matched);
        assert!(matches!(rule.validate(), Err(RuleError::InvalidFilter { .. })));
    }

    #[test]
    fn test_negative_lookahead() {
        let rule = Rule::substitute(
            "negative-lookahead-rule",
            r"^https://www\.reddit\.com/r/([^/]+)/(?!top)(.*)$",
            "https://www.reddit.com/r/$1/top/$2",
        );
        assert_eq!(
            match_rule(&rule, "https://www.reddit.com/r/golang/posts").url,
            "https://www.reddit.com/r/golang/top/posts"
        );
        assert!(!match_rule(&rule, "https://www.reddit.com/r/golang/top/posts").matched);
    }

    #[test]
    fn test_positive_lookahead() {
        let rule = Rule::substitute(
            "positive-lookahead-rule",
            r"^https://github\.com/([^/]+/[^/]+)(?=/issues)(.*)$",
            "https://github.com/$1/issues?state=open",
        );
        assert_eq!(
            match_rule(&rule, "https://github.com/user/repo/issues").url,
            "https://github.com/user/repo/issues?state=open"
        );
        assert!(!match_rule(&rule, "https://github.com/user/repo/pull").matched);
    }

    #[test]
    fn test_whole_url_group_is_decoded() {
        let rule = Rule::substitute("google", r"^(https://www.google.com/search\?q=.+?)&.*$", "$1");
        let url = concat!(
            "https://www.google.com/search?q=%E6%B5%8B%E8%AF%95+JavaScript",
            "&newwindow=1&sxsrf=AE3TifMQ%3A1759421656393&uact=5",
        );
        let outcome = match_rule(&rule, url);
        assert!(outcome.matched);
        assert_eq!(outcome.url, "https://www.google.com/search?q=测试 JavaScript");
    }

    #[test]
    fn test_identity_substitution_still_matches() {
        let rule = Rule::substitute("self", "(.*)", "$1");
        assert_eq!(
            match_rule(&rule, "https://example.com/"),
            MatchOutcome::rewritten("https://example.com/".to_string())
        );
    }

    #[test]
    fn test_remove_params_match() {
        let rule = Rule::remove_params("utm", r"^https?://", ["utm_source", "utm_medium"]);
        let outcome = match_rule(&rule, "https://example.com/a?utm_source=x&id=1&utm_medium=y");
        assert_eq!(outcome.url, "https://example.com/a?id=1");
    }

    #[test]
    fn test_remove_params_noop_is_not_match() {
        let rule = Rule::remove_params("utm", r"^https?://", ["utm_source"]);
        assert_eq!(match_rule(&rule, "https://example.com/a?id=1"), MatchOutcome::no_match());
    }

    #[test]
    fn test_substitution_takes_precedence() {
        let mut rule = Rule::substitute(
            "3",
            r"^https://example\.com/page\?id=(.*)&utm_source=(.*)$",
            "https://example.com/page?id=$1",
        );
        rule.remove_params = vec!["id".to_string()];
        assert_eq!(
            match_rule(&rule, "https://example.com/page?id=123&utm_source=newsletter").url,
            "https://example.com/page?id=123"
        );
    }

    #[test]
    fn test_inert_rule_never_matches() {
        let rule = Rule::remove_params("inert", ".*", Vec::<String>::new());
        assert!(rule.is_inert());
        assert!(!match_rule(&rule, "https://example.com/?a=1").matched);
    }

    #[test]
    fn test_validate_param_patterns() {
        let rule = Rule::remove_params("p", ".*", ["ok", "bad_("]);
        assert!(matches!(
            rule.validate(),
            Err(RuleError::InvalidParam { ref pattern, .. }) if pattern == "bad_("
        ));
        assert!(Rule::remove_params("p", ".*", ["utm_.*"]).validate().is_ok());
    }
}
