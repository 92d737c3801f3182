//! The data store contract.
//!
//! Route handlers talk to the relational store through [`Store`], an
//! object-safe trait over JSON rows. Rows are plain `serde_json` objects, and
//! queries are expressed with a small filter vocabulary ([`Condition`]) plus
//! ordering and a range. [`crate::PgStore`] renders these to SQL;
//! [`crate::MemoryStore`] evaluates them in process.

use async_trait::async_trait;
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("relation \"{0}\" does not exist")]
    MissingRelation(String),

    #[error("duplicate key value violates unique constraint: {0}")]
    Conflict(String),

    #[error("invalid identifier \"{0}\"")]
    InvalidIdentifier(String),

    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("failed to decode row from \"{table}\": {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_missing_relation(&self) -> bool {
        matches!(self, StoreError::MissingRelation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Neq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    /// Case-insensitive substring match.
    Contains(String, String),
    IsNull(String),
    /// Any of the nested conditions holds.
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Condition::Eq(column.to_string(), value.into())
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Condition::Neq(column.to_string(), value.into())
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Condition::Gte(column.to_string(), value.into())
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Condition::Lte(column.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(column.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Condition::Contains(column.to_string(), needle.to_string())
    }

    pub fn is_null(column: &str) -> Self {
        Condition::IsNull(column.to_string())
    }

    /// Matches `needle` in any of `columns`.
    pub fn search(columns: &[&str], needle: &str) -> Self {
        Condition::AnyOf(columns.iter().map(|c| Self::contains(c, needle)).collect())
    }

    pub(crate) fn columns(&self) -> Vec<&str> {
        match self {
            Condition::Eq(c, _)
            | Condition::Neq(c, _)
            | Condition::Gte(c, _)
            | Condition::Lte(c, _)
            | Condition::In(c, _)
            | Condition::Contains(c, _)
            | Condition::IsNull(c) => vec![c.as_str()],
            Condition::AnyOf(nested) => nested.iter().flat_map(Condition::columns).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filters: Vec<Condition>,
    pub order: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    #[must_use]
    pub fn filter_opt(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(c) => self.filter(c),
            None => self,
        }
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn range(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset.max(0);
        self.limit = Some(limit.max(0));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }
}

/// Rows in the requested range plus the number of rows matching the filters.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub rows: Vec<Row>,
    pub total: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name, e.g. `postgres`.
    fn backend(&self) -> &'static str;

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError>;

    /// Inserts one row and returns it with store-assigned columns filled in.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Applies `patch` to every row matching `filters` and returns the updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row`, or updates the existing row sharing `conflict_column`.
    async fn upsert(&self, table: &str, row: Row, conflict_column: &str)
    -> Result<Row, StoreError>;

    async fn delete(&self, table: &str, filters: &[Condition]) -> Result<u64, StoreError>;
}

/// Table and column names must be plain lower-case identifiers.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.len() <= 63;

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifiers() {
        assert!(validate_identifier("forum_threads").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("Threads").is_err());
        assert!(validate_identifier("threads; drop table users").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_search_builds_or_group() {
        let condition = Condition::search(&["title", "content"], "spawn");
        assert_eq!(
            condition,
            Condition::AnyOf(vec![
                Condition::Contains("title".into(), "spawn".into()),
                Condition::Contains("content".into(), "spawn".into()),
            ])
        );
        assert_eq!(condition.columns(), vec!["title", "content"]);
    }

    #[test]
    fn test_query_builder() {
        let query = SelectQuery::new()
            .filter(Condition::eq("category_id", 3))
            .filter_opt(None)
            .order_by("is_pinned", Direction::Desc)
            .range(20, 20);
        assert_eq!(query.filters, vec![Condition::Eq("category_id".into(), json!(3))]);
        assert_eq!(query.order.len(), 1);
        assert_eq!(query.offset, 20);
        assert_eq!(query.limit, Some(20));
    }
}
