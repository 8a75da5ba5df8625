//! Predicate filter system
//!
//! One predicate list, three consistent execution paths: the backend
//! transport `FilterSet`, the SQL WHERE text (see [`crate::sql`]) and the
//! in-memory evaluator used for client-side previews.
//!
//! ## Usage
//!
//! ```
//! use filterql::filters::{ParseLimits, apply_to_data, compile, parse_predicates};
//! use filterql::sql::to_where;
//!
//! let json = r#"[{"column": "status", "operator": "equals", "value": "ok"}]"#;
//! let predicates = parse_predicates(json, &ParseLimits::default()).unwrap();
//!
//! let filters = compile(&predicates).unwrap();
//! assert_eq!(to_where(&filters).as_deref(), Some("`status` = 'ok'"));
//!
//! let rows = vec![serde_json::json!({"status": "OK"}).as_object().unwrap().clone()];
//! assert_eq!(apply_to_data(&rows, &predicates).len(), 1);
//! ```

mod compile;
mod evaluate;
mod parser;
mod types;
mod validate;

pub use compile::{FilterSet, FilterSpec, compile, compile_predicate};
pub use evaluate::{
    EvalOptions, Record, apply_to_data, apply_to_data_with, filter_rows, filter_rows_with,
    matches, matches_with,
};
pub use parser::{ParseLimits, parse_filter_set, parse_predicates};
pub use types::{
    Bounds, Identifier, Operand, Operator, Predicate, RawPredicate, Scalar, is_valid_identifier,
};
pub use validate::{
    DEFAULT_KEYWORDS, ValidatorOptions, validate, validate_filter_set, validate_with,
};
