//! Catalog self-check
//!
//! Every shared rule may carry `{from, to}` test cases. A case passes when
//! resolving `from` against the whole catalog settles as `matched` on `to`.

use std::fmt;

use lp_core::{resolve, ChainOptions, ChainResult, RuleSet};

use crate::catalog::Catalog;

#[derive(Debug, Clone)]
pub struct TestFailure {
    pub rule_id: String,
    pub from: String,
    pub expected: String,
    pub result: ChainResult,
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result.final_url() {
            Some(actual) => write!(
                f,
                "rule '{}': expected {} -> {}, got {}",
                self.rule_id, self.from, self.expected, actual
            ),
            None => write!(
                f,
                "rule '{}': {} ended as {} ({} step(s))",
                self.rule_id,
                self.from,
                self.result.status,
                self.result.urls.len()
            ),
        }
    }
}

/// Run every bundled test case; returns the failures.
pub fn verify(catalog: &Catalog, options: &ChainOptions) -> Vec<TestFailure> {
    let rules = RuleSet::assemble(&[], &catalog.rules);
    let mut failures = Vec::new();

    for rule in &catalog.rules {
        for case in &rule.test {
            let result = resolve(&rules, &case.from, options);
            if result.final_url() != Some(case.to.as_str()) {
                failures.push(TestFailure {
                    rule_id: rule.id.clone(),
                    from: case.from.clone(),
                    expected: case.to.clone(),
                    result,
                });
            }
        }
    }

    log::debug!(
        "Verified {} test case(s) in catalog '{}': {} failure(s)",
        catalog.test_case_count(),
        catalog.name,
        failures.len()
    );
    failures
}
