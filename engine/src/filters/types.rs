//! Predicate model
//!
//! Defines the identifiers, scalar values and operator variants shared by the
//! transport compiler, the SQL compiler and the in-memory evaluator.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::FilterError;

/// A table or column name restricted to `[A-Za-z_][A-Za-z0-9_]*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, FilterError> {
        let name = name.into();
        if is_valid_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(FilterError::InvalidIdentifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check a name against `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TryFrom<String> for Identifier {
    type Error = FilterError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = FilterError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Identifier> for String {
    fn from(ident: Identifier) -> Self {
        ident.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single JSON scalar carried by a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Convert a JSON value, returning `None` for arrays and objects
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => Some(Self::Number(n)),
            Value::String(s) => Some(Self::String(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Textual form used for pattern operators
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed("null"),
            Self::Bool(b) => Cow::Owned(b.to_string()),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::String(s) => Cow::Borrowed(s),
        }
    }

    /// Explicit numeric cast; `None` plays the role of NaN
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => n.as_f64(),
            Self::String(s) => parse_numeric(s),
        }
    }
}

/// Parse trimmed numeric text, rejecting blanks and non-finite values
pub(crate) fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Payload kept for an operator name outside the known set
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Bounds of a `between` predicate; a missing bound is `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
}

impl Bounds {
    pub fn new(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// Both bounds, when both are present
    pub fn both(&self) -> Option<(&Scalar, &Scalar)> {
        self.min.as_ref().zip(self.max.as_ref())
    }
}

/// Filter operator with the payload it requires
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Equals(Scalar),
    Contains(Scalar),
    StartsWith(Scalar),
    EndsWith(Scalar),
    NotEmpty,
    Empty,
    In(Vec<Scalar>),
    NotIn(Vec<Scalar>),
    GreaterThan(Scalar),
    LessThan(Scalar),
    Between(Bounds),
    /// Operator name outside the closed set; compiles as equality
    Unknown { name: String, value: Operand },
}

impl Operator {
    /// Wire name of the operator
    pub fn name(&self) -> &str {
        match self {
            Self::Equals(_) => "equals",
            Self::Contains(_) => "contains",
            Self::StartsWith(_) => "starts_with",
            Self::EndsWith(_) => "ends_with",
            Self::NotEmpty => "not_empty",
            Self::Empty => "empty",
            Self::In(_) => "in",
            Self::NotIn(_) => "not_in",
            Self::GreaterThan(_) => "greater_than",
            Self::LessThan(_) => "less_than",
            Self::Between(_) => "between",
            Self::Unknown { name, .. } => name,
        }
    }

    /// Build an operator from its wire name and raw JSON value
    pub fn from_parts(column: &str, name: &str, value: Value) -> Result<Self, FilterError> {
        let scalar = |value: Value| {
            Scalar::from_value(value).ok_or_else(|| {
                FilterError::invalid_value(column, name, "expected a scalar value")
            })
        };
        let text = |value: Value| -> Result<Scalar, FilterError> {
            match scalar(value)? {
                Scalar::Null => Err(FilterError::invalid_value(
                    column,
                    name,
                    "expected a non-null value",
                )),
                v => Ok(v),
            }
        };
        let list = |value: Value| -> Result<Vec<Scalar>, FilterError> {
            match value {
                Value::Array(items) => items.into_iter().map(scalar).collect(),
                other => scalar(other).map(|v| vec![v]),
            }
        };

        Ok(match name {
            "equals" => Self::Equals(scalar(value)?),
            "contains" => Self::Contains(text(value)?),
            "starts_with" => Self::StartsWith(text(value)?),
            "ends_with" => Self::EndsWith(text(value)?),
            "not_empty" => Self::NotEmpty,
            "empty" => Self::Empty,
            "in" => Self::In(list(value)?),
            "not_in" => Self::NotIn(list(value)?),
            "greater_than" => Self::GreaterThan(scalar(value)?),
            "less_than" => Self::LessThan(scalar(value)?),
            "between" => {
                let Value::Object(mut range) = value else {
                    tracing::debug!(
                        column = %column,
                        "Between value is not an object, dropping both bounds"
                    );
                    return Ok(Self::Between(Bounds::default()));
                };
                // Null or non-scalar bounds count as missing
                let mut bound = |key: &str| {
                    range
                        .remove(key)
                        .and_then(Scalar::from_value)
                        .filter(|v| !v.is_null())
                };
                let min = bound("min");
                let max = bound("max");
                Self::Between(Bounds { min, max })
            }
            _ => {
                let value = match value {
                    Value::Object(_) => {
                        return Err(FilterError::invalid_value(
                            column,
                            name,
                            "expected a scalar or an array",
                        ));
                    }
                    Value::Array(items) => Operand::List(list(Value::Array(items))?),
                    other => Operand::Scalar(scalar(other)?),
                };
                Self::Unknown {
                    name: name.to_string(),
                    value,
                }
            }
        })
    }
}

/// One column/operator/value condition
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Identifier,
    pub operator: Operator,
}

impl Predicate {
    pub fn new(column: Identifier, operator: Operator) -> Self {
        Self { column, operator }
    }

    pub fn operator_name(&self) -> &str {
        self.operator.name()
    }

    /// Validate the column against a whitelist
    pub fn ensure_allowed<S: AsRef<str>>(&self, allowed_columns: &[S]) -> Result<(), FilterError> {
        if allowed_columns
            .iter()
            .any(|c| c.as_ref() == self.column.as_str())
        {
            Ok(())
        } else {
            Err(FilterError::ColumnNotAllowed(self.column.to_string()))
        }
    }
}

/// Predicate tuple as authored by the UI filter builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPredicate {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl TryFrom<RawPredicate> for Predicate {
    type Error = FilterError;

    fn try_from(raw: RawPredicate) -> Result<Self, Self::Error> {
        let operator = Operator::from_parts(&raw.column, &raw.operator, raw.value)?;
        let column = Identifier::new(raw.column)?;
        Ok(Self { column, operator })
    }
}
