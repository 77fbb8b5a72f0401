//! Query parameter stripping
//!
//! Parameters are removed by filtering segments of the raw query string, so
//! every parameter that survives keeps its original bytes.

use fancy_regex::Regex;

use crate::decode::decode_or_raw;

/// Characters that turn a parameter pattern into a regular expression.
const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// True if `pattern` contains any regex metacharacter.
pub fn is_regex_pattern(pattern: &str) -> bool {
    pattern.contains(REGEX_META)
}

// =============================================================================
// Parameter Patterns
// =============================================================================

/// A compiled parameter-name pattern.
#[derive(Debug, Clone)]
pub enum ParamPattern {
    /// No metacharacters: matches the whole decoded name exactly.
    Exact(String),
    /// Unanchored regex tested against the decoded name.
    Regex(Regex),
    /// Failed to compile; never matches.
    Invalid(String),
}

impl ParamPattern {
    pub fn compile(pattern: &str) -> Self {
        if !is_regex_pattern(pattern) {
            return Self::Exact(pattern.to_string());
        }
        match Regex::new(pattern) {
            Ok(re) => Self::Regex(re),
            Err(err) => {
                log::warn!("Invalid parameter pattern '{}': {}", pattern, err);
                Self::Invalid(pattern.to_string())
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Exact(literal) => literal == name,
            Self::Regex(re) => re.is_match(name).unwrap_or(false),
            Self::Invalid(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(literal) => literal,
            Self::Regex(re) => re.as_str(),
            Self::Invalid(raw) => raw,
        }
    }
}

// =============================================================================
// Stripping
// =============================================================================

/// Remove every query parameter whose decoded name matches any pattern.
/// Returns `None` when nothing was removed.
pub fn strip_params(url: &str, patterns: &[ParamPattern]) -> Option<String> {
    if patterns.is_empty() {
        return None;
    }

    let fragment_start = url.find('#').unwrap_or(url.len());
    let query_start = url[..fragment_start].find('?')?;

    let base = &url[..query_start];
    let query = &url[query_start + 1..fragment_start];
    let fragment = &url[fragment_start..];

    if query.is_empty() {
        return None;
    }

    let mut kept = Vec::new();
    let mut removed = false;

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        let name = match part.find('=') {
            Some(idx) => &part[..idx],
            None => part,
        };
        let decoded = decode_or_raw(name);
        if patterns.iter().any(|p| p.is_match(&decoded)) {
            removed = true;
            continue;
        }
        kept.push(part);
    }

    if !removed {
        return None;
    }

    let mut out = String::with_capacity(url.len());
    out.push_str(base);
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    out.push_str(fragment);

    if out == url {
        return None;
    }
    Some(out)
}

/// Compile a list of raw parameter patterns.
pub fn compile_patterns(patterns: &[String]) -> Vec<ParamPattern> {
    patterns.iter().map(|p| ParamPattern::compile(p)).collect()
}
