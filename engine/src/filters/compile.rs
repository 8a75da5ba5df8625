//! Backend filter compiler
//!
//! Maps an ordered predicate list onto the backend-transport `FilterSet`:
//! one `FilterSpec` per column, last write wins.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::FilterError;
use crate::utils::sql::escape_regex;

use super::types::{Identifier, Operand, Operator, Predicate, Scalar};

/// Transport encoding of one predicate's effect on a column
///
/// `Eq` and `In` travel as a bare scalar/array; every other variant is an
/// object carrying exactly one operator branch (`gte`/`lte` count as one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FilterSpec {
    Eq(Scalar),
    In(Vec<Scalar>),
    Contains(Scalar),
    Regex(String),
    NotEmpty,
    Empty,
    NotIn(Vec<Scalar>),
    Gt(Scalar),
    Lt(Scalar),
    Range {
        gte: Option<Scalar>,
        lte: Option<Scalar>,
    },
}

fn single_branch(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn list_value(items: Vec<Scalar>) -> Value {
    Value::Array(items.into_iter().map(Value::from).collect())
}

impl From<FilterSpec> for Value {
    fn from(spec: FilterSpec) -> Self {
        match spec {
            FilterSpec::Eq(v) => v.into(),
            FilterSpec::In(items) => list_value(items),
            FilterSpec::Contains(v) => single_branch("contains", v.into()),
            FilterSpec::Regex(pattern) => single_branch("regex", Value::String(pattern)),
            FilterSpec::NotEmpty => single_branch("not_empty", Value::Bool(true)),
            FilterSpec::Empty => single_branch("empty", Value::Bool(true)),
            FilterSpec::NotIn(items) => single_branch("not_in", list_value(items)),
            FilterSpec::Gt(v) => single_branch("gt", v.into()),
            FilterSpec::Lt(v) => single_branch("lt", v.into()),
            FilterSpec::Range { gte, lte } => {
                let mut map = Map::new();
                if let Some(gte) = gte {
                    map.insert("gte".to_string(), gte.into());
                }
                if let Some(lte) = lte {
                    map.insert("lte".to_string(), lte.into());
                }
                Value::Object(map)
            }
        }
    }
}

fn spec_scalar(key: &str, value: Value) -> Result<Scalar, FilterError> {
    Scalar::from_value(value)
        .ok_or_else(|| FilterError::invalid_spec(format!("'{}' expects a scalar", key)))
}

fn spec_list(key: &str, value: Value) -> Result<Vec<Scalar>, FilterError> {
    match value {
        Value::Array(items) => items.into_iter().map(|v| spec_scalar(key, v)).collect(),
        other => spec_scalar(key, other).map(|v| vec![v]),
    }
}

fn spec_flag(key: &str, value: Value) -> Result<(), FilterError> {
    if value == Value::Bool(true) {
        Ok(())
    } else {
        Err(FilterError::invalid_spec(format!("'{}' must be true", key)))
    }
}

impl TryFrom<Value> for FilterSpec {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut map = match value {
            Value::Array(items) => return spec_list("in", Value::Array(items)).map(Self::In),
            Value::Object(map) => map,
            scalar => return spec_scalar("equals", scalar).map(Self::Eq),
        };

        // `{}` is a range whose bounds were both dropped
        if map.keys().all(|k| k == "gte" || k == "lte") {
            let mut bound = |key: &str| match map.remove(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => spec_scalar(key, v).map(Some),
            };
            let gte = bound("gte")?;
            let lte = bound("lte")?;
            return Ok(Self::Range { gte, lte });
        }

        if map.len() > 1 {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            return Err(FilterError::invalid_spec(format!(
                "more than one operator branch: {}",
                keys.join(", ")
            )));
        }

        let Some((key, value)) = map.into_iter().next() else {
            return Err(FilterError::invalid_spec("empty filter object"));
        };
        match key.as_str() {
            "contains" => spec_scalar(&key, value).map(Self::Contains),
            "regex" => match value {
                Value::String(pattern) => Ok(Self::Regex(pattern)),
                _ => Err(FilterError::invalid_spec("'regex' expects a string")),
            },
            "not_empty" => spec_flag(&key, value).map(|_| Self::NotEmpty),
            "empty" => spec_flag(&key, value).map(|_| Self::Empty),
            "not_in" => spec_list(&key, value).map(Self::NotIn),
            "gt" => spec_scalar(&key, value).map(Self::Gt),
            "lt" => spec_scalar(&key, value).map(Self::Lt),
            other => Err(FilterError::invalid_spec(format!(
                "unknown operator branch '{}'",
                other
            ))),
        }
    }
}

/// Conjunction of per-column filters
///
/// Inserting a column that is already present replaces its spec in place.
/// Equality ignores entry order because the conditions are AND-combined.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: Vec<(Identifier, FilterSpec)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the spec for a column, returning the previous one
    pub fn insert(&mut self, column: Identifier, spec: FilterSpec) -> Option<FilterSpec> {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => Some(std::mem::replace(existing, spec)),
            None => {
                self.entries.push((column, spec));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&FilterSpec> {
        self.entries
            .iter()
            .find(|(c, _)| c.as_str() == column)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &FilterSpec)> {
        self.entries.iter().map(|(c, spec)| (c, spec))
    }
}

impl PartialEq for FilterSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(column, spec)| other.get(column.as_str()) == Some(spec))
    }
}

impl FromIterator<(Identifier, FilterSpec)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (Identifier, FilterSpec)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (column, spec) in iter {
            set.insert(column, spec);
        }
        set
    }
}

impl From<&FilterSet> for Value {
    fn from(set: &FilterSet) -> Self {
        Value::Object(
            set.iter()
                .map(|(column, spec)| (column.to_string(), Value::from(spec.clone())))
                .collect(),
        )
    }
}

impl TryFrom<Map<String, Value>> for FilterSet {
    type Error = FilterError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(column, value)| -> Result<_, FilterError> {
                Ok((Identifier::new(column)?, FilterSpec::try_from(value)?))
            })
            .collect()
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, spec) in self.iter() {
            map.serialize_entry(column, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::try_from(map).map_err(serde::de::Error::custom)
    }
}

/// Compile a predicate list into a transport filter set
///
/// Returns `None` for an empty list; a compiled set is never empty.
pub fn compile(predicates: &[Predicate]) -> Option<FilterSet> {
    if predicates.is_empty() {
        return None;
    }
    let mut set = FilterSet::new();
    for predicate in predicates {
        set.insert(predicate.column.clone(), compile_predicate(predicate));
    }
    Some(set)
}

/// Compile a single predicate into its column spec
pub fn compile_predicate(predicate: &Predicate) -> FilterSpec {
    match &predicate.operator {
        Operator::Equals(v) => FilterSpec::Eq(v.clone()),
        Operator::Contains(v) => FilterSpec::Contains(v.clone()),
        Operator::StartsWith(v) => FilterSpec::Regex(format!("^{}", escape_regex(&v.text()))),
        Operator::EndsWith(v) => FilterSpec::Regex(format!("{}$", escape_regex(&v.text()))),
        Operator::NotEmpty => FilterSpec::NotEmpty,
        Operator::Empty => FilterSpec::Empty,
        Operator::In(items) => FilterSpec::In(items.clone()),
        Operator::NotIn(items) => FilterSpec::NotIn(items.clone()),
        Operator::GreaterThan(v) => FilterSpec::Gt(v.clone()),
        Operator::LessThan(v) => FilterSpec::Lt(v.clone()),
        Operator::Between(bounds) => FilterSpec::Range {
            gte: bounds.min.clone(),
            lte: bounds.max.clone(),
        },
        Operator::Unknown { name, value } => {
            tracing::warn!(
                column = %predicate.column,
                operator = %name,
                "Unknown filter operator, falling back to equality"
            );
            match value {
                Operand::Scalar(v) => FilterSpec::Eq(v.clone()),
                Operand::List(items) => FilterSpec::In(items.clone()),
            }
        }
    }
}
