//! Upstream rule list conversion
//!
//! Turns third-party rule data into catalog documents that can then be
//! merged with [`crate::merge_sources`]. Two formats are understood:
//!
//! - ClearURLs `data.min.json`: a `providers` map whose entries carry
//!   `urlPattern`, `rules`, `referralMarketing` and `redirections`.
//! - Linkumori `parameterRules`: an array of `{domain?, removeParams}`.

use lp_core::SharedRule;
use serde::Deserialize;

use crate::catalog::{Catalog, CatalogError};

pub const CLEARURLS_NAME: &str = "ClearURLs Rules";
pub const CLEARURLS_DESCRIPTION: &str = "Rules imported from ClearURLs project";
pub const LINKUMORI_NAME: &str = "Linkumori Rules";
pub const LINKUMORI_DESCRIPTION: &str = "Rules imported from Linkumori Extension";

// =============================================================================
// ClearURLs
// =============================================================================

#[derive(Debug, Deserialize)]
struct ClearUrlsData {
    #[serde(default)]
    providers: serde_json::Map<String, serde_json::Value>,
}

/// One ClearURLs provider. Fields without a catalog counterpart are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provider {
    pub url_pattern: String,
    pub rules: Vec<String>,
    pub raw_rules: Vec<String>,
    pub referral_marketing: Vec<String>,
    pub redirections: Vec<String>,
}

/// Lowercase and keep only `[a-z0-9-.]`.
pub fn sanitize_id(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.'))
        .collect()
}

/// Rules for one provider, in order: one `-redirect-N` rule per redirection
/// (substituting the first group), then `-params`, then `-referral`.
///
/// `rawRules` remove matched text in place, which a regex filter plus
/// substitution cannot express; they are skipped.
pub fn convert_provider(name: &str, provider: &Provider) -> Vec<SharedRule> {
    let prefix = format!("clearurls-{}", sanitize_id(name));
    let mut rules = Vec::new();

    for (i, redirection) in provider.redirections.iter().enumerate() {
        rules.push(SharedRule {
            id: format!("{prefix}-redirect-{i}"),
            regex_filter: redirection.clone(),
            regex_substitution: Some("$1".to_string()),
            remove_params: Vec::new(),
            test: Vec::new(),
        });
    }

    if !provider.raw_rules.is_empty() {
        log::debug!(
            "Skipping {} raw rule(s) of provider '{}'",
            provider.raw_rules.len(),
            name
        );
    }

    let param_groups = [
        ("params", &provider.rules),
        ("referral", &provider.referral_marketing),
    ];
    for (suffix, params) in param_groups {
        if params.is_empty() {
            continue;
        }
        rules.push(SharedRule {
            id: format!("{prefix}-{suffix}"),
            regex_filter: provider.url_pattern.clone(),
            regex_substitution: None,
            remove_params: params.clone(),
            test: Vec::new(),
        });
    }

    rules
}

/// Convert a ClearURLs data document, keeping provider order.
pub fn convert_clearurls(json: &str) -> Result<Catalog, CatalogError> {
    let data: ClearUrlsData = serde_json::from_str(json)?;

    let mut rules = Vec::new();
    for (name, value) in data.providers {
        let provider: Provider = serde_json::from_value(value)?;
        rules.extend(convert_provider(&name, &provider));
    }

    log::info!("Converted {} ClearURLs rule(s)", rules.len());
    Ok(Catalog {
        name: CLEARURLS_NAME.to_string(),
        description: CLEARURLS_DESCRIPTION.to_string(),
        rules,
    })
}

// =============================================================================
// Linkumori
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterRule {
    pub domain: Option<String>,
    pub remove_params: Vec<String>,
}

/// Host filter matching `domain` and any of its subdomains.
pub fn domain_filter(domain: &str) -> String {
    format!(r"^https?://(?:[a-z0-9-]+\.)*?{}", domain.replace('.', r"\."))
}

/// Convert one parameter rule. Params written as `/regex/` are dropped; a
/// rule left with no params yields nothing.
pub fn convert_parameter_rule(rule: &ParameterRule) -> Option<SharedRule> {
    let remove_params: Vec<String> = rule
        .remove_params
        .iter()
        .filter(|p| !p.starts_with('/'))
        .cloned()
        .collect();
    if remove_params.is_empty() {
        return None;
    }

    let (id, regex_filter) = match rule.domain.as_deref().filter(|d| !d.is_empty()) {
        Some(domain) => (
            format!("linkumori-{}-params", sanitize_id(domain)),
            domain_filter(domain),
        ),
        None => ("linkumori-global-params".to_string(), ".*".to_string()),
    };

    Some(SharedRule {
        id,
        regex_filter,
        regex_substitution: None,
        remove_params,
        test: Vec::new(),
    })
}

/// Convert a JSON array of Linkumori parameter rules.
pub fn convert_linkumori(json: &str) -> Result<Catalog, CatalogError> {
    let parameter_rules: Vec<ParameterRule> = serde_json::from_str(json)?;
    let rules: Vec<SharedRule> = parameter_rules
        .iter()
        .filter_map(convert_parameter_rule)
        .collect();

    log::info!("Converted {} Linkumori rule(s)", rules.len());
    Ok(Catalog {
        name: LINKUMORI_NAME.to_string(),
        description: LINKUMORI_DESCRIPTION.to_string(),
        rules,
    })
}
