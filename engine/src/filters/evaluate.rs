//! In-memory evaluator
//!
//! Applies predicates directly to rows for instant previews, with the same
//! logical intent as the generated SQL. All predicates are AND-combined.
//!
//! By default `not_in`, `between` and unknown operators let every row
//! through. `EvalOptions::full_operator_set` evaluates them as well.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{Bounds, Operand, Operator, Predicate, Scalar, parse_numeric};

/// A flat key/value row
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Evaluate `not_in`, `between` and unknown operators instead of passing rows through
    pub full_operator_set: bool,
}

pub fn apply_to_data(rows: &[Record], predicates: &[Predicate]) -> Vec<Record> {
    apply_to_data_with(rows, predicates, &EvalOptions::default())
}

pub fn apply_to_data_with(
    rows: &[Record],
    predicates: &[Predicate],
    options: &EvalOptions,
) -> Vec<Record> {
    filter_rows_with(rows, predicates, options)
        .into_iter()
        .cloned()
        .collect()
}

/// Borrowing variant of [`apply_to_data`]
pub fn filter_rows<'a>(rows: &'a [Record], predicates: &[Predicate]) -> Vec<&'a Record> {
    filter_rows_with(rows, predicates, &EvalOptions::default())
}

pub fn filter_rows_with<'a>(
    rows: &'a [Record],
    predicates: &[Predicate],
    options: &EvalOptions,
) -> Vec<&'a Record> {
    rows.iter()
        .filter(|row| matches_with(row, predicates, options))
        .collect()
}

pub fn matches(row: &Record, predicates: &[Predicate]) -> bool {
    matches_with(row, predicates, &EvalOptions::default())
}

pub fn matches_with(row: &Record, predicates: &[Predicate], options: &EvalOptions) -> bool {
    predicates
        .iter()
        .all(|p| predicate_matches(row, p, options))
}

fn predicate_matches(row: &Record, predicate: &Predicate, options: &EvalOptions) -> bool {
    // Missing and null cells are the same thing to every operator
    let cell = row.get(predicate.column.as_str()).filter(|v| !v.is_null());

    match &predicate.operator {
        Operator::Equals(v) => equals(cell, v),
        Operator::Contains(v) => text_matches(cell, v, |h, n| h.contains(n)),
        Operator::StartsWith(v) => text_matches(cell, v, |h, n| h.starts_with(n)),
        Operator::EndsWith(v) => text_matches(cell, v, |h, n| h.ends_with(n)),
        Operator::NotEmpty => !is_blank(cell),
        Operator::Empty => is_blank(cell),
        Operator::In(items) => is_member(cell, items),
        Operator::GreaterThan(v) => compare(cell, v, |a, b| a > b),
        Operator::LessThan(v) => compare(cell, v, |a, b| a < b),
        Operator::NotIn(items) => !options.full_operator_set || not_member(cell, items),
        Operator::Between(bounds) => !options.full_operator_set || between(cell, bounds),
        Operator::Unknown { value, .. } => {
            !options.full_operator_set
                || match value {
                    Operand::Scalar(v) => equals(cell, v),
                    Operand::List(items) => is_member(cell, items),
                }
        }
    }
}

fn cell_text(cell: &Value) -> Cow<'_, str> {
    match cell {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn cell_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Equality with SQL `=` / `IS NULL` semantics
///
/// Numeric comparison applies when either side is a JSON number; otherwise
/// text compares case-insensitively.
fn equals(cell: Option<&Value>, value: &Scalar) -> bool {
    let cell = match (cell, value) {
        (None, Scalar::Null) => return true,
        (None, _) | (Some(_), Scalar::Null) => return false,
        (Some(cell), _) => cell,
    };

    if (cell.is_number() || matches!(value, Scalar::Number(_)))
        && let (Some(a), Some(b)) = (cell_number(cell), value.as_f64())
    {
        return a == b;
    }

    cell_text(cell).to_lowercase() == value.text().to_lowercase()
}

fn text_matches(cell: Option<&Value>, value: &Scalar, test: impl Fn(&str, &str) -> bool) -> bool {
    cell.is_some_and(|cell| {
        test(
            &cell_text(cell).to_lowercase(),
            &value.text().to_lowercase(),
        )
    })
}

fn is_blank(cell: Option<&Value>) -> bool {
    match cell {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// `IN (..)`: a NULL list element never matches
fn is_member(cell: Option<&Value>, items: &[Scalar]) -> bool {
    items.iter().any(|v| !v.is_null() && equals(cell, v))
}

/// `NOT IN (..)`: NULL cells and lists holding NULL never match
fn not_member(cell: Option<&Value>, items: &[Scalar]) -> bool {
    if items.is_empty() {
        return true;
    }
    cell.is_some() && !items.iter().any(Scalar::is_null) && !is_member(cell, items)
}

fn compare(cell: Option<&Value>, value: &Scalar, test: impl Fn(f64, f64) -> bool) -> bool {
    match (cell.and_then(cell_number), value.as_f64()) {
        (Some(a), Some(b)) => test(a, b),
        _ => false,
    }
}

/// Inclusive numeric range; a missing bound disables the check like the omitted SQL clause
fn between(cell: Option<&Value>, bounds: &Bounds) -> bool {
    let Some((low, high)) = bounds.both() else {
        return true;
    };
    compare(cell, low, |a, b| a >= b) && compare(cell, high, |a, b| a <= b)
}
