//! Core type definitions for LinkPure
//!
//! Two rule shapes arrive from outside the engine: user rules from the rule
//! store and shared rules from the bundled catalog. Both are normalized into
//! [`Rule`] before anything is matched.

use serde::{Deserialize, Serialize};

/// Default redirect budget for a single chain resolution.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

// =============================================================================
// External Rule Shapes
// =============================================================================

/// A user-defined rule as persisted by the rule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRule {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Expected rewrite bundled with a shared rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub from: String,
    pub to: String,
}

/// A rule from the shared catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedRule {
    pub id: String,
    pub regex_filter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_substitution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<TestCase>,
}

// =============================================================================
// Normalized Rule
// =============================================================================

/// The unit of rewriting consumed by the matcher.
///
/// `substitution` takes precedence over `remove_params` when both are set.
/// An empty substitution string is normalized to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub filter: String,
    pub substitution: Option<String>,
    pub remove_params: Vec<String>,
    pub enabled: bool,
}

impl Rule {
    /// Rule that rewrites through a substitution template.
    pub fn substitute(
        id: impl Into<String>,
        filter: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filter: filter.into(),
            substitution: non_empty(template.into()),
            remove_params: Vec::new(),
            enabled: true,
        }
    }

    /// Rule that strips query parameters whose names match `params`.
    pub fn remove_params<I, S>(id: impl Into<String>, filter: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            filter: filter.into(),
            substitution: None,
            remove_params: params.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }

    /// True if the rule has neither a substitution nor parameters to strip.
    pub fn is_inert(&self) -> bool {
        self.substitution.is_none() && self.remove_params.is_empty()
    }
}

impl From<UserRule> for Rule {
    fn from(rule: UserRule) -> Self {
        Self {
            id: rule.id,
            filter: rule.from,
            substitution: non_empty(rule.to),
            remove_params: Vec::new(),
            enabled: rule.enabled,
        }
    }
}

impl From<SharedRule> for Rule {
    fn from(rule: SharedRule) -> Self {
        Self {
            id: rule.id,
            filter: rule.regex_filter,
            substitution: rule.regex_substitution.and_then(non_empty),
            remove_params: rule.remove_params,
            enabled: true,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

// =============================================================================
// Match Outcome
// =============================================================================

/// Result of applying one rule to one URL.
///
/// `url` is only meaningful when `matched` is true; a miss always carries an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub matched: bool,
    pub url: String,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self {
            matched: false,
            url: String::new(),
        }
    }

    pub fn rewritten(url: String) -> Self {
        Self { matched: true, url }
    }
}

// =============================================================================
// Chain Result
// =============================================================================

/// Terminal classification of a redirect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainStatus {
    /// No rule matched the starting URL.
    NotMatched,
    /// At least one rewrite happened and the chain reached a stable URL.
    Matched,
    /// A rewrite produced a URL already seen in this chain.
    CircularRedirect,
    /// The redirect budget ran out before the chain settled.
    InfiniteRedirect,
}

impl ChainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotMatched => "not-matched",
            Self::Matched => "matched",
            Self::CircularRedirect => "circular-redirect",
            Self::InfiniteRedirect => "infinite-redirect",
        }
    }
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every rewritten URL in production order, plus the terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResult {
    pub status: ChainStatus,
    pub urls: Vec<String>,
}

impl ChainResult {
    pub fn not_matched() -> Self {
        Self {
            status: ChainStatus::NotMatched,
            urls: Vec::new(),
        }
    }

    /// The stable rewritten URL. Only a `matched` chain has one.
    pub fn final_url(&self) -> Option<&str> {
        match self.status {
            ChainStatus::Matched => self.urls.last().map(String::as_str),
            _ => None,
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Per-call chain options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOptions {
    /// Redirect budget. Zero or negative means [`DEFAULT_MAX_REDIRECTS`].
    pub max_redirects: i32,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS as i32,
        }
    }
}

impl ChainOptions {
    pub fn with_max_redirects(max_redirects: i32) -> Self {
        Self { max_redirects }
    }

    /// Number of rewrite steps a chain may take.
    pub fn effective_budget(&self) -> usize {
        if self.max_redirects <= 0 {
            DEFAULT_MAX_REDIRECTS
        } else {
            self.max_redirects as usize
        }
    }
}
