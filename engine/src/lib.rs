//! Filter predicates for table views
//!
//! Typed predicates are compiled into a transport `FilterSet`, which can be
//! rendered as MySQL-flavoured SQL text or evaluated against in-memory rows.
//!
//! - [`filters`]: predicate model, parser, backend compiler, evaluator, validator
//! - [`sql`]: WHERE rendering and SELECT / COUNT assembly
//! - [`core`]: configuration and constants

pub mod core;
pub mod error;
pub mod filters;
pub mod sql;
pub mod utils;

pub use error::FilterError;
