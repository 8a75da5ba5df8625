//! Error type for the filter engine
//!
//! Only the parse boundary can fail. Compiling, rendering and evaluating
//! already-typed predicates never return errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Table or column name outside `[A-Za-z_][A-Za-z0-9_]*`
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Predicate value has the wrong shape for its operator
    #[error("Invalid value for '{operator}' on column {column}: {reason}")]
    InvalidValue {
        column: String,
        operator: String,
        reason: String,
    },

    /// Transport filter object that breaks the one-branch-per-column rule
    #[error("Invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    /// Column rejected by the configured whitelist
    #[error("Cannot filter by column: {0}")]
    ColumnNotAllowed(String),

    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("Maximum {max} filters allowed")]
    TooManyPredicates { max: usize },

    #[error("Invalid filter JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    pub fn invalid_value(
        column: impl Into<String>,
        operator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            column: column.into(),
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidFilterSpec(reason.into())
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::InvalidValue { .. } => "INVALID_FILTER_VALUE",
            Self::InvalidFilterSpec(_) => "INVALID_FILTER_SPEC",
            Self::ColumnNotAllowed(_) => "INVALID_FILTER_COLUMN",
            Self::PayloadTooLarge { .. } => "FILTER_JSON_TOO_LARGE",
            Self::TooManyPredicates { .. } => "TOO_MANY_FILTERS",
            Self::Json(_) => "INVALID_FILTER_JSON",
        }
    }
}
