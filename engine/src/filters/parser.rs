//! Filter parsing
//!
//! Parses JSON filter definitions into typed predicates with size, count
//! and column checks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::constants::{DEFAULT_MAX_FILTER_JSON_BYTES, DEFAULT_MAX_PREDICATES};
use crate::error::FilterError;

use super::compile::FilterSet;
use super::types::{Predicate, RawPredicate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    pub max_predicates: usize,
    pub max_json_bytes: usize,
    /// Column whitelist; `None` accepts any valid identifier
    pub allowed_columns: Option<Vec<String>>,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_predicates: DEFAULT_MAX_PREDICATES,
            max_json_bytes: DEFAULT_MAX_FILTER_JSON_BYTES,
            allowed_columns: None,
        }
    }
}

fn check_size(json_str: &str, limits: &ParseLimits) -> Result<(), FilterError> {
    if json_str.len() > limits.max_json_bytes {
        return Err(FilterError::PayloadTooLarge {
            max: limits.max_json_bytes,
        });
    }
    Ok(())
}

/// Parse a JSON array of `{column, operator, value}` tuples
///
/// Validates JSON size, parses, checks the predicate count and converts each
/// tuple, applying the column whitelist when one is configured.
pub fn parse_predicates(
    json_str: &str,
    limits: &ParseLimits,
) -> Result<Vec<Predicate>, FilterError> {
    check_size(json_str, limits)?;

    let raw: Vec<RawPredicate> = serde_json::from_str(json_str)?;

    if raw.len() > limits.max_predicates {
        return Err(FilterError::TooManyPredicates {
            max: limits.max_predicates,
        });
    }

    raw.into_iter()
        .map(|raw| -> Result<Predicate, FilterError> {
            let predicate = Predicate::try_from(raw)?;
            if let Some(allowed) = &limits.allowed_columns {
                predicate.ensure_allowed(allowed.as_slice())?;
            }
            Ok(predicate)
        })
        .collect()
}

/// Parse a transport filter object (`{column: spec}`)
pub fn parse_filter_set(json_str: &str, limits: &ParseLimits) -> Result<FilterSet, FilterError> {
    check_size(json_str, limits)?;
    // Convert outside serde so filter errors keep their own codes
    let map: Map<String, Value> = serde_json::from_str(json_str)?;
    let set = FilterSet::try_from(map)?;
    if set.len() > limits.max_predicates {
        return Err(FilterError::TooManyPredicates {
            max: limits.max_predicates,
        });
    }
    if let Some(allowed) = &limits.allowed_columns
        && let Some((column, _)) = set
            .iter()
            .find(|(c, _)| !allowed.iter().any(|a| a == c.as_str()))
    {
        return Err(FilterError::ColumnNotAllowed(column.to_string()));
    }
    Ok(set)
}
