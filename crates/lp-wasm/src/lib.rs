//! WebAssembly bindings for LinkPure

use std::sync::OnceLock;
use wasm_bindgen::prelude::*;
use lp_catalog::Catalog;
use lp_core::{
    check_rule_chain as resolve_chain,
    match_rule as match_single,
    ChainOptions, ChainResult, MatchOutcome, Rule, SharedRule, UserRule,
};

static SHARED_CATALOG: OnceLock<Catalog> = OnceLock::new();

fn shared_catalog() -> &'static Catalog {
    SHARED_CATALOG.get_or_init(Catalog::bundled)
}

fn parse_user_rules(user_rules_json: &str) -> Result<Vec<UserRule>, String> {
    if user_rules_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(user_rules_json).map_err(|e| format!("Invalid user rules: {}", e))
}

fn chain_for(
    user_rules: &[UserRule],
    use_shared: bool,
    url: &str,
    max_redirects: i32,
) -> ChainResult {
    let shared: &[SharedRule] = if use_shared { &shared_catalog().rules } else { &[] };
    resolve_chain(user_rules, shared, url, &ChainOptions::with_max_redirects(max_redirects))
}

fn single_rule(from: &str, to: &str) -> Rule {
    Rule::from(UserRule {
        id: "preview".to_string(),
        from: from.to_string(),
        to: to.to_string(),
        enabled: true,
    })
}

fn chain_to_js(result: &ChainResult) -> JsValue {
    let js_result = js_sys::Object::new();
    let urls = js_sys::Array::new_with_length(result.urls.len() as u32);
    for (i, url) in result.urls.iter().enumerate() {
        urls.set(i as u32, JsValue::from_str(url));
    }

    let status = JsValue::from_str(result.status.as_str());
    let _ = js_sys::Reflect::set(&js_result, &"status".into(), &status);
    let _ = js_sys::Reflect::set(&js_result, &"urls".into(), &urls);
    if let Some(final_url) = result.final_url() {
        let final_url = JsValue::from_str(final_url);
        let _ = js_sys::Reflect::set(&js_result, &"finalUrl".into(), &final_url);
    }
    js_result.into()
}

fn outcome_to_js(outcome: &MatchOutcome) -> JsValue {
    let js_result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&js_result, &"matched".into(), &JsValue::from(outcome.matched));
    let _ = js_sys::Reflect::set(&js_result, &"url".into(), &JsValue::from_str(&outcome.url));
    js_result.into()
}

/// Resolve `url` through the user rules (a JSON array) followed by the
/// bundled shared rules.
#[wasm_bindgen]
pub fn check_rule_chain(
    user_rules_json: &str,
    url: &str,
    max_redirects: i32,
    use_shared: bool,
) -> Result<JsValue, JsValue> {
    let user_rules = parse_user_rules(user_rules_json).map_err(|e| JsValue::from_str(&e))?;
    for rule in user_rules.iter().filter(|r| r.enabled) {
        if let Err(e) = Rule::from(rule.clone()).validate() {
            let message = format!("Rule '{}' ignored: {}", rule.id, e);
            web_sys::console::warn_1(&JsValue::from_str(&message));
        }
    }

    let result = chain_for(&user_rules, use_shared, url, max_redirects);
    Ok(chain_to_js(&result))
}

/// Apply a single, unsaved rule once. Used by the rule editor preview.
#[wasm_bindgen]
pub fn match_rule(from: &str, to: &str, url: &str) -> JsValue {
    outcome_to_js(&match_single(&single_rule(from, to), url))
}

/// Error message for a filter that does not compile, `None` when valid.
#[wasm_bindgen]
pub fn validate_filter(from: &str) -> Option<String> {
    single_rule(from, "").validate().err().map(|e| e.to_string())
}

#[wasm_bindgen]
pub fn get_shared_rules_info() -> JsValue {
    let catalog = shared_catalog();
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"name".into(), &JsValue::from_str(&catalog.name));
    let rules = JsValue::from(catalog.rules.len() as u32);
    let _ = js_sys::Reflect::set(&result, &"rules".into(), &rules);
    let test_cases = JsValue::from(catalog.test_case_count() as u32);
    let _ = js_sys::Reflect::set(&result, &"testCases".into(), &test_cases);
    result.into()
}

#[wasm_bindgen]
pub fn get_shared_rules_json() -> Result<String, JsValue> {
    shared_catalog()
        .to_json()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_check_rule_chain_js_shape() {
        let value = check_rule_chain("[]", "https://example.com/", 5, false).unwrap();
        let status = js_sys::Reflect::get(&value, &"status".into()).unwrap();
        assert_eq!(status.as_string().as_deref(), Some("not-matched"));
    }

    #[wasm_bindgen_test]
    fn test_match_rule_js_shape() {
        let value = match_rule("^https://a\\.com/(.*)$", "https://b.com/$1", "https://a.com/x");
        let url = js_sys::Reflect::get(&value, &"url".into()).unwrap();
        assert_eq!(url.as_string().as_deref(), Some("https://b.com/x"));
    }
}
