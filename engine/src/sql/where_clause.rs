//! WHERE clause compiler
//!
//! Renders a `FilterSet` as a MySQL-flavoured condition: one clause per
//! column in mapping order, joined by `AND`.

use serde::{Deserialize, Serialize};

use crate::filters::{FilterSet, FilterSpec, Identifier, Scalar};
use crate::utils::sql::{escape_like_pattern, escape_literal, quote_identifier, quote_literal};

/// Rendering options for SQL text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlOptions {
    /// Also double backslashes inside string literals
    pub escape_backslashes: bool,
}

/// Render a filter set as a WHERE fragment (without the keyword)
///
/// Returns `None` when there is nothing to render, so the caller can drop
/// the `WHERE` keyword entirely.
pub fn to_where(filter_set: &FilterSet) -> Option<String> {
    to_where_with(filter_set, &SqlOptions::default())
}

pub fn to_where_with(filter_set: &FilterSet, options: &SqlOptions) -> Option<String> {
    let clauses: Vec<String> = filter_set
        .iter()
        .filter_map(|(column, spec)| render_clause(column, spec, options))
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Render the clause for one column, or `None` when the spec is incomplete
pub fn render_clause(
    column: &Identifier,
    spec: &FilterSpec,
    options: &SqlOptions,
) -> Option<String> {
    let col = quote_identifier(column.as_str());
    let literal = |v: &Scalar| render_literal(v, options);

    let clause = match spec {
        FilterSpec::Eq(Scalar::Null) => format!("{} IS NULL", col),
        FilterSpec::Eq(v) => format!("{} = {}", col, literal(v)),
        FilterSpec::In(items) if items.is_empty() => "1=0".to_string(),
        FilterSpec::In(items) => format!("{} IN ({})", col, render_list(items, options)),
        FilterSpec::Contains(v) => format!(
            "{} LIKE '%{}%'",
            col,
            escape_literal(&escape_like_pattern(&v.text()), options.escape_backslashes)
        ),
        // Pattern is interpolated as-is; only starts_with/ends_with anchors are pre-escaped
        FilterSpec::Regex(pattern) => format!("{} REGEXP '{}'", col, pattern),
        FilterSpec::NotEmpty => format!("{} IS NOT NULL AND {} != ''", col, col),
        FilterSpec::Empty => format!("({} IS NULL OR {} = '')", col, col),
        FilterSpec::NotIn(items) if items.is_empty() => "1=1".to_string(),
        FilterSpec::NotIn(items) => format!("{} NOT IN ({})", col, render_list(items, options)),
        FilterSpec::Gt(v) => format!("{} > {}", col, literal(v)),
        FilterSpec::Lt(v) => format!("{} < {}", col, literal(v)),
        FilterSpec::Range { gte, lte } => match (gte, lte) {
            (Some(low), Some(high)) => {
                format!("{} BETWEEN {} AND {}", col, literal(low), literal(high))
            }
            _ => {
                tracing::debug!(column = %column, "Omitting range filter without both bounds");
                return None;
            }
        },
    };
    Some(clause)
}

/// Render a scalar as a SQL literal: strings quoted, numbers bare
pub fn render_literal(value: &Scalar, options: &SqlOptions) -> String {
    match value {
        Scalar::Null => "NULL".to_string(),
        Scalar::Bool(true) => "TRUE".to_string(),
        Scalar::Bool(false) => "FALSE".to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::String(s) => quote_literal(s, options.escape_backslashes),
    }
}

fn render_list(items: &[Scalar], options: &SqlOptions) -> String {
    items
        .iter()
        .map(|v| render_literal(v, options))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{Bounds, Operator, Predicate, compile};
    use serde_json::json;

    fn set(value: serde_json::Value) -> FilterSet {
        serde_json::from_value(value).unwrap()
    }

    fn pred(column: &str, operator: Operator) -> Predicate {
        Predicate::new(Identifier::new(column).unwrap(), operator)
    }

    #[test]
    fn to_where_empty_is_none() {
        assert_eq!(to_where(&FilterSet::new()), None);
    }

    #[test]
    fn equals_string_and_number() {
        assert_eq!(
            to_where(&set(json!({"name": "Ann"}))).as_deref(),
            Some("`name` = 'Ann'")
        );
        assert_eq!(to_where(&set(json!({"age": 42}))).as_deref(), Some("`age` = 42"));
        assert_eq!(
            to_where(&set(json!({"ratio": 0.25}))).as_deref(),
            Some("`ratio` = 0.25")
        );
    }

    #[test]
    fn equals_bool_and_null() {
        assert_eq!(
            to_where(&set(json!({"active": true}))).as_deref(),
            Some("`active` = TRUE")
        );
        assert_eq!(
            to_where(&set(json!({"deleted_at": null}))).as_deref(),
            Some("`deleted_at` IS NULL")
        );
    }

    #[test]
    fn quotes_are_doubled() {
        let filters = compile(&[pred("name", Operator::Equals("O'Brien".into()))]).unwrap();
        let sql = to_where(&filters).unwrap();
        assert_eq!(sql, "`name` = 'O''Brien'");
        assert!(sql.contains("O''Brien"));
    }

    #[test]
    fn injection_attempt_stays_inside_literal() {
        let sql = to_where(&set(json!({"name": "x' OR '1'='1"}))).unwrap();
        assert_eq!(sql, "`name` = 'x'' OR ''1''=''1'");
    }

    #[test]
    fn backslash_escaping_is_opt_in() {
        let filters = set(json!({"path": r"C:\'"}));
        assert_eq!(to_where(&filters).unwrap(), r"`path` = 'C:\'''");
        let options = SqlOptions {
            escape_backslashes: true,
        };
        assert_eq!(to_where_with(&filters, &options).unwrap(), r"`path` = 'C:\\'''");
    }

    #[test]
    fn in_and_not_in_lists() {
        assert_eq!(
            to_where(&set(json!({"status": ["open", "it's", 3]}))).as_deref(),
            Some("`status` IN ('open', 'it''s', 3)")
        );
        assert_eq!(
            to_where(&set(json!({"status": {"not_in": ["done"]}}))).as_deref(),
            Some("`status` NOT IN ('done')")
        );
    }

    #[test]
    fn scalar_in_and_not_in_render_single_element_lists() {
        let filters = compile(&[
            pred("a", Operator::In(vec!["x".into()])),
            pred("b", Operator::NotIn(vec![7.into()])),
        ])
        .unwrap();
        assert_eq!(
            to_where(&filters).as_deref(),
            Some("`a` IN ('x') AND `b` NOT IN (7)")
        );
    }

    #[test]
    fn empty_lists_render_constant_conditions() {
        assert_eq!(to_where(&set(json!({"a": []}))).as_deref(), Some("1=0"));
        assert_eq!(
            to_where(&set(json!({"a": {"not_in": []}}))).as_deref(),
            Some("1=1")
        );
    }

    #[test]
    fn object_specs() {
        assert_eq!(
            to_where(&set(json!({"name": {"contains": "o'b"}}))).as_deref(),
            Some("`name` LIKE '%o''b%'")
        );
        assert_eq!(
            to_where(&set(json!({"name": {"regex": "^Jo"}}))).as_deref(),
            Some("`name` REGEXP '^Jo'")
        );
        assert_eq!(
            to_where(&set(json!({"email": {"not_empty": true}}))).as_deref(),
            Some("`email` IS NOT NULL AND `email` != ''")
        );
        assert_eq!(
            to_where(&set(json!({"email": {"empty": true}}))).as_deref(),
            Some("(`email` IS NULL OR `email` = '')")
        );
        assert_eq!(to_where(&set(json!({"n": {"gt": 5}}))).as_deref(), Some("`n` > 5"));
        assert_eq!(to_where(&set(json!({"n": {"lt": -1}}))).as_deref(), Some("`n` < -1"));
    }

    #[test]
    fn contains_escapes_like_wildcards() {
        assert_eq!(
            to_where(&set(json!({"code": {"contains": "a_c"}}))).as_deref(),
            Some(r"`code` LIKE '%a\_c%'")
        );
        assert_eq!(
            to_where(&set(json!({"rate": {"contains": "50% o'ff"}}))).as_deref(),
            Some(r"`rate` LIKE '%50\% o''ff%'")
        );
        let options = SqlOptions {
            escape_backslashes: true,
        };
        assert_eq!(
            to_where_with(&set(json!({"path": {"contains": r"a\b"}})), &options).as_deref(),
            Some(r"`path` LIKE '%a\\\\b%'")
        );
    }

    #[test]
    fn regex_spec_is_not_escaped() {
        let sql = to_where(&set(json!({"name": {"regex": "a'b"}}))).unwrap();
        assert_eq!(sql, "`name` REGEXP 'a'b'");
    }

    #[test]
    fn starts_with_quote_is_left_unescaped_in_regexp() {
        // Regex specs, including anchored starts_with patterns, go in verbatim
        let filters = compile(&[pred("name", Operator::StartsWith("O'Br".into()))]).unwrap();
        assert_eq!(to_where(&filters).as_deref(), Some("`name` REGEXP '^O'Br'"));
    }

    #[test]
    fn starts_with_regex_is_anchored_and_escaped() {
        let filters = compile(&[pred("version", Operator::StartsWith("1.2".into()))]).unwrap();
        assert_eq!(
            to_where(&filters).as_deref(),
            Some(r"`version` REGEXP '^1\.2'")
        );
    }

    #[test]
    fn between_renders_both_bounds() {
        let filters = compile(&[pred("age", Operator::Between(Bounds::new(1, 10)))]).unwrap();
        assert_eq!(serde_json::to_value(&filters).unwrap(), json!({"age": {"gte": 1, "lte": 10}}));
        assert_eq!(to_where(&filters).as_deref(), Some("`age` BETWEEN 1 AND 10"));
    }

    #[test]
    fn between_missing_bound_omits_clause() {
        let filters = compile(&[
            pred("name", Operator::Equals("Ann".into())),
            pred(
                "age",
                Operator::Between(Bounds {
                    min: Some(1.into()),
                    max: None,
                }),
            ),
        ])
        .unwrap();
        assert_eq!(to_where(&filters).as_deref(), Some("`name` = 'Ann'"));

        let only_range = set(json!({"age": {"lte": 3}}));
        assert_eq!(to_where(&only_range), None);
    }

    #[test]
    fn clauses_join_in_mapping_order() {
        let filters = set(json!({"b": 1, "a": {"empty": true}, "c": "x"}));
        assert_eq!(
            to_where(&filters).as_deref(),
            Some("`b` = 1 AND (`a` IS NULL OR `a` = '') AND `c` = 'x'")
        );
    }

    #[test]
    fn string_comparison_literal_is_quoted() {
        assert_eq!(
            to_where(&set(json!({"created": {"gt": "2024-01-01"}}))).as_deref(),
            Some("`created` > '2024-01-01'")
        );
    }
}
