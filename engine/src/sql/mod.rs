//! SQL text generation
//!
//! Produces MySQL-flavoured text (backtick identifiers, `REGEXP`, `''`
//! escaping) for preview and debugging. Never execute this text directly
//! against a live database; route execution through bound parameters.

mod query;
mod where_clause;

pub use query::{
    Columns, QueryDescriptor, build_count, build_count_with, build_select, build_select_with,
    extract_order_by, extract_where,
};
pub use where_clause::{SqlOptions, render_clause, render_literal, to_where, to_where_with};
