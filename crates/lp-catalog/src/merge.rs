use std::collections::HashSet;

use crate::catalog::Catalog;

pub const MERGED_NAME: &str = "Shared Rules";
pub const MERGED_DESCRIPTION: &str =
    "Combined tracking parameter cleaning and redirect unwrapping rules";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStats {
    /// Rule count per source, in input order.
    pub per_source: Vec<usize>,
    pub before: usize,
    pub after: usize,
    /// Ids skipped because an earlier source already defined them.
    pub duplicates: Vec<String>,
}

/// Merge catalog sources in priority order. The first rule seen for an id
/// wins and keeps its first-seen position.
pub fn merge_sources(sources: &[Catalog]) -> (Catalog, MergeStats) {
    let before = sources.iter().map(|s| s.rules.len()).sum();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rules = Vec::with_capacity(before);
    let mut duplicates = Vec::new();

    for source in sources {
        for rule in &source.rules {
            if seen.insert(rule.id.as_str()) {
                rules.push(rule.clone());
            } else {
                log::info!("Skipping duplicate rule: {}", rule.id);
                duplicates.push(rule.id.clone());
            }
        }
    }

    let stats = MergeStats {
        per_source: sources.iter().map(|s| s.rules.len()).collect(),
        before,
        after: rules.len(),
        duplicates,
    };
    let merged = Catalog {
        name: MERGED_NAME.to_string(),
        description: MERGED_DESCRIPTION.to_string(),
        rules,
    };

    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_core::SharedRule;

    fn source(ids: &[(&str, &str)]) -> Catalog {
        Catalog {
            name: "src".to_string(),
            description: String::new(),
            rules: ids
                .iter()
                .map(|(id, filter)| SharedRule {
                    id: id.to_string(),
                    regex_filter: filter.to_string(),
                    regex_substitution: Some("$1".to_string()),
                    remove_params: Vec::new(),
                    test: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_source_wins() {
        let custom = source(&[("a", "custom-a"), ("b", "custom-b")]);
        let upstream = source(&[("b", "upstream-b"), ("c", "upstream-c"), ("a", "upstream-a")]);

        let (merged, stats) = merge_sources(&[custom, upstream]);

        let ids: Vec<&str> = merged.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged.get("b").unwrap().regex_filter, "custom-b");
        assert_eq!(stats.per_source, vec![2, 3]);
        assert_eq!(stats.before, 5);
        assert_eq!(stats.after, 3);
        assert_eq!(stats.duplicates, vec!["b", "a"]);
        assert_eq!(merged.name, MERGED_NAME);
    }

    #[test]
    fn test_merge_nothing() {
        let (merged, stats) = merge_sources(&[]);
        assert!(merged.rules.is_empty());
        assert_eq!(
            stats,
            MergeStats {
                per_source: Vec::new(),
                before: 0,
                after: 0,
                duplicates: Vec::new(),
            }
        );
    }
}
