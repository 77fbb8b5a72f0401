//! LinkPure Core Library
//!
//! This crate provides the rule matching and redirect chain resolution engine
//! for LinkPure. It is a pure string-transformation engine: no I/O, no global
//! state, and no network access. Every failure mode (bad patterns, malformed
//! escapes, runaway chains) degrades to a classified result.
//!
//! # Architecture
//!
//! User rules and shared catalog rules are normalized into one [`Rule`] type
//! and compiled into a [`RuleSet`]. The chain walker applies the set to a URL
//! step by step, first match wins, until the chain settles, revisits a URL, or
//! exhausts its redirect budget.
//!
//! # Modules
//!
//! - `types`: Rule shapes, match outcomes, chain results and options
//! - `decode`: Query-component percent-decoding with raw fallback
//! - `substitute`: Decoding-aware `$N` template substitution
//! - `params`: Query parameter stripping that preserves original encoding
//! - `matcher`: Rule compilation and single-rule application
//! - `ruleset`: Assembly of user and shared rules into one ordered set
//! - `chain`: Redirect chain resolution with cycle and budget detection

pub mod chain;
pub mod decode;
pub mod matcher;
pub mod params;
pub mod ruleset;
pub mod substitute;
pub mod types;

// Re-export commonly used types
pub use chain::{check_rule_chain, resolve, resolve_with_budget};
pub use matcher::{match_rule, CompiledRule, RuleError};
pub use params::strip_params;
pub use ruleset::RuleSet;
pub use types::{
    ChainOptions, ChainResult, ChainStatus, MatchOutcome, Rule, SharedRule, TestCase, UserRule,
    DEFAULT_MAX_REDIRECTS,
};
