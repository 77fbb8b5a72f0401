//! Redirect Chain Resolution
//!
//! Applies a rule set to a URL repeatedly until no rule matches, a rewrite
//! revisits a URL already in the chain, or the redirect budget runs out.
//! Worst-case work is `budget * rules.len()` rule applications.

use crate::ruleset::RuleSet;
use crate::types::{ChainOptions, ChainResult, ChainStatus, SharedRule, UserRule};

/// Resolve the redirect chain for `url`.
pub fn resolve(rules: &RuleSet, url: &str, options: &ChainOptions) -> ChainResult {
    let budget = options.effective_budget();
    resolve_with_budget(rules, url, budget)
}

/// Resolve with an explicit step budget. A budget of zero yields an empty
/// `infinite-redirect` chain.
pub fn resolve_with_budget(rules: &RuleSet, url: &str, budget: usize) -> ChainResult {
    let mut urls: Vec<String> = Vec::with_capacity(budget);
    let mut current = url.to_string();

    for step in 0..budget {
        let (rule, rewritten) = match rules.first_match(&current) {
            Some(found) => found,
            None if step == 0 => {
                log::debug!("No rule matched {}", url);
                return ChainResult::not_matched();
            }
            None => {
                log::debug!("Chain for {} settled after {} step(s)", url, step);
                return ChainResult {
                    status: ChainStatus::Matched,
                    urls,
                };
            }
        };

        log::debug!(
            "Step {}: rule '{}' rewrote {} -> {}",
            step + 1,
            rule.rule().id,
            current,
            rewritten
        );

        if rewritten == url || urls.contains(&rewritten) {
            log::debug!("Circular redirect detected for {} at {}", url, rewritten);
            urls.push(rewritten);
            return ChainResult {
                status: ChainStatus::CircularRedirect,
                urls,
            };
        }

        urls.push(rewritten.clone());
        current = rewritten;
    }

    log::debug!("Redirect budget of {} exhausted for {}", budget, url);
    ChainResult {
        status: ChainStatus::InfiniteRedirect,
        urls,
    }
}

/// Assemble a rule set from user and shared rules, then resolve `url`.
pub fn check_rule_chain(
    user_rules: &[UserRule],
    shared_rules: &[SharedRule],
    url: &str,
    options: &ChainOptions,
) -> ChainResult {
    let rules = RuleSet::assemble(user_rules, shared_rules);
    resolve(&rules, url, options)
}
