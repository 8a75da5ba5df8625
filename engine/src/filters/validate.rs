//! Heuristic keyword scan over compiled filters
//!
//! A weak guard, not a security boundary. Injection defence belongs to the
//! execution collaborator through bound parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::compile::FilterSet;

/// SQL keywords reported by the scan
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "EXEC",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Reject filters containing a keyword instead of only logging it
    pub block_on_keywords: bool,
    pub keywords: Vec<String>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            block_on_keywords: false,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Scan a transport filter object
///
/// Non-objects are rejected. Keyword hits are logged; with the default
/// options they do not change the result.
pub fn validate(filters: &Value) -> bool {
    validate_with(filters, &ValidatorOptions::default())
}

pub fn validate_with(filters: &Value, options: &ValidatorOptions) -> bool {
    if !filters.is_object() {
        tracing::debug!("Rejecting non-object filter payload");
        return false;
    }

    let haystack = filters.to_string().to_uppercase();
    let hits: Vec<String> = options
        .keywords
        .iter()
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty() && haystack.contains(k.as_str()))
        .collect();

    if hits.is_empty() {
        return true;
    }

    tracing::warn!(
        keywords = %hits.join(", "),
        blocked = options.block_on_keywords,
        "Filter contains SQL keywords"
    );
    !options.block_on_keywords
}

pub fn validate_filter_set(filter_set: &FilterSet) -> bool {
    validate(&Value::from(filter_set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_objects() {
        assert!(!validate(&json!(null)));
        assert!(!validate(&json!("filters")));
        assert!(!validate(&json!([{"a": 1}])));
    }

    #[test]
    fn accepts_plain_filters() {
        assert!(validate(&json!({})));
        assert!(validate(&json!({"status": "open", "age": {"gt": 3}})));
    }

    #[test]
    fn keyword_hits_are_logged_not_blocked() {
        assert!(validate(&json!({"name": "x'; DROP TABLE users; --"})));
        assert!(validate(&json!({"updated_at": {"not_empty": true}})));
    }

    #[test]
    fn blocking_mode_rejects_keyword_hits() {
        let options = ValidatorOptions {
            block_on_keywords: true,
            ..ValidatorOptions::default()
        };
        assert!(!validate_with(&json!({"name": "drop table"}), &options));
        assert!(validate_with(&json!({"name": "Ann"}), &options));
    }

    #[test]
    fn custom_keyword_list() {
        let options = ValidatorOptions {
            block_on_keywords: true,
            keywords: vec!["sleep".into(), " ".into(), String::new()],
        };
        assert!(!validate_with(&json!({"a": "SLEEP(5)"}), &options));
        assert!(validate_with(&json!({"a": "drop"}), &options));
    }

    #[test]
    fn filter_set_helper() {
        let set: FilterSet = serde_json::from_value(json!({"a": {"contains": "x"}})).unwrap();
        assert!(validate_filter_set(&set));
        assert!(validate_filter_set(&FilterSet::new()));
    }
}
