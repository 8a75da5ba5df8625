//! SELECT / COUNT query assembly
//!
//! Pure string builders. The produced text is meant for preview and
//! debugging; execution belongs to a collaborator using bound parameters.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FilterError;
use crate::filters::{FilterSet, Identifier};
use crate::utils::sql::quote_identifier;

use super::where_clause::{SqlOptions, to_where_with};

static WHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bWHERE\s+(.+?)\s*(?:\bORDER\s+BY\b|\bLIMIT\b|$)").expect("valid regex")
});

static ORDER_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bORDER\s+BY\s+(.+?)\s*(?:\bLIMIT\b|$)").expect("valid regex")
});

/// Column list of a SELECT
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    Named(Vec<Identifier>),
}

impl Columns {
    pub fn named<I, S>(names: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(Identifier::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(if names.is_empty() {
            Self::All
        } else {
            Self::Named(names)
        })
    }

    fn render(&self) -> String {
        match self {
            Self::Named(names) if !names.is_empty() => names
                .iter()
                .map(|n| quote_identifier(n.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_string(),
        }
    }
}

impl Serialize for Columns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => ["*"].serialize(serializer),
            Self::Named(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        if names.iter().all(|n| n == "*") {
            return Ok(Self::All);
        }
        Self::named(names).map_err(serde::de::Error::custom)
    }
}

/// Everything needed to assemble one SELECT
///
/// Serialises in the outbound transport shape
/// `{ table, filters, columns, limit, offset, orderBy }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub table: Identifier,
    #[serde(default)]
    pub filters: Option<FilterSet>,
    #[serde(default)]
    pub columns: Columns,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub order_by: Option<String>,
}

impl QueryDescriptor {
    pub fn new(table: Identifier) -> Self {
        Self {
            table,
            filters: None,
            columns: Columns::All,
            limit: None,
            offset: None,
            order_by: None,
        }
    }

    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_filters(mut self, filters: Option<FilterSet>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

pub fn build_select(descriptor: &QueryDescriptor) -> String {
    build_select_with(descriptor, &SqlOptions::default())
}

/// `SELECT <cols> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT n [OFFSET m]]`
///
/// OFFSET is only emitted together with LIMIT and when non-zero.
pub fn build_select_with(descriptor: &QueryDescriptor, options: &SqlOptions) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}",
        descriptor.columns.render(),
        quote_identifier(descriptor.table.as_str())
    );

    push_where(&mut sql, descriptor.filters.as_ref(), options);

    if let Some(order_by) = descriptor
        .order_by
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
    {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }

    if let Some(limit) = descriptor.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
        if let Some(offset) = descriptor.offset.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    sql
}

pub fn build_count(table: &Identifier, filters: Option<&FilterSet>) -> String {
    build_count_with(table, filters, &SqlOptions::default())
}

/// `SELECT COUNT(*) as count FROM <table> [WHERE ..]`
pub fn build_count_with(
    table: &Identifier,
    filters: Option<&FilterSet>,
    options: &SqlOptions,
) -> String {
    let mut sql = format!(
        "SELECT COUNT(*) as count FROM {}",
        quote_identifier(table.as_str())
    );
    push_where(&mut sql, filters, options);
    sql
}

fn push_where(sql: &mut String, filters: Option<&FilterSet>, options: &SqlOptions) {
    if let Some(clause) = filters.and_then(|f| to_where_with(f, options)) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
}

/// Recover the WHERE condition from previously built SQL
///
/// Best effort: keywords inside string literals cut the match short.
pub fn extract_where(sql: &str) -> Option<String> {
    capture(&WHERE_RE, sql)
}

/// Recover the ORDER BY expression from previously built SQL
///
/// Same textual limitation as [`extract_where`].
pub fn extract_order_by(sql: &str) -> Option<String> {
    capture(&ORDER_BY_RE, sql)
}

fn capture(re: &Regex, sql: &str) -> Option<String> {
    re.captures(sql)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
