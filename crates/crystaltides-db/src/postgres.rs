//! Postgres implementation of [`Store`].
//!
//! Rows travel as `jsonb`: reads use `to_jsonb(t.*)`, writes go through
//! `jsonb_populate_record(NULL::"table", $1)` so every JSON value is cast to
//! the column's declared type by Postgres itself. Filter values are bound the
//! same way, which keeps comparisons typed (uuid with uuid, timestamptz with
//! timestamptz) without per-table mapping code.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::store::{
    Condition, Direction, Row, SelectQuery, Selection, Store, StoreError, validate_identifier,
};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_sqlx(err: sqlx::Error, table: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("42P01") {
            return StoreError::MissingRelation(table.to_string());
        }
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}

fn validate_query(table: &str, filters: &[Condition]) -> Result<(), StoreError> {
    validate_identifier(table)?;
    for column in filters.iter().flat_map(Condition::columns) {
        validate_identifier(column)?;
    }
    Ok(())
}

fn validate_row(row: &Row) -> Result<Vec<String>, StoreError> {
    row.keys()
        .map(|column| validate_identifier(column).map(|()| quote(column)))
        .collect()
}

fn push_comparison(
    qb: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    column: &str,
    op: &str,
    value: &Value,
) {
    let mut record = Map::new();
    record.insert(column.to_string(), value.clone());

    qb.push("t.")
        .push(quote(column))
        .push(format!(" {op} (jsonb_populate_record(NULL::{}, ", quote(table)))
        .push_bind(Json(Value::Object(record)))
        .push(format!(")).{}", quote(column)));
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, table: &str, condition: &Condition) {
    match condition {
        Condition::Eq(column, value) => push_comparison(qb, table, column, "=", value),
        Condition::Neq(column, value) => {
            push_comparison(qb, table, column, "IS DISTINCT FROM", value)
        }
        Condition::Gte(column, value) => push_comparison(qb, table, column, ">=", value),
        Condition::Lte(column, value) => push_comparison(qb, table, column, "<=", value),
        Condition::In(_, values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Condition::In(column, values) => {
            qb.push_bind(Json(Value::Array(values.clone())))
                .push(format!("::jsonb @> to_jsonb(t.{})", quote(column)));
        }
        Condition::Contains(column, needle) => {
            qb.push(format!("t.{}::text ILIKE ", quote(column)))
                .push_bind(format!("%{}%", escape_like(needle)));
        }
        Condition::IsNull(column) => {
            qb.push(format!("t.{} IS NULL", quote(column)));
        }
        Condition::AnyOf(nested) if nested.is_empty() => {
            qb.push("FALSE");
        }
        Condition::AnyOf(nested) => {
            qb.push("(");
            for (i, inner) in nested.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_condition(qb, table, inner);
            }
            qb.push(")");
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, table: &str, filters: &[Condition]) {
    for (i, condition) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(qb, table, condition);
    }
}

pub(crate) fn count_sql<'a>(
    table: &str,
    query: &SelectQuery,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    validate_query(table, &query.filters)?;
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} AS t", quote(table)));
    push_filters(&mut qb, table, &query.filters);
    Ok(qb)
}

pub(crate) fn select_sql<'a>(
    table: &str,
    query: &SelectQuery,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    validate_query(table, &query.filters)?;
    let mut qb = QueryBuilder::new(format!("SELECT to_jsonb(t.*) FROM {} AS t", quote(table)));
    push_filters(&mut qb, table, &query.filters);

    for (i, order) in query.order.iter().enumerate() {
        validate_identifier(&order.column)?;
        let direction = match order.direction {
            Direction::Asc => "ASC NULLS LAST",
            Direction::Desc => "DESC NULLS LAST",
        };
        qb.push(if i == 0 { " ORDER BY " } else { ", " })
            .push(format!("t.{} {direction}", quote(&order.column)));
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if query.offset > 0 {
        qb.push(" OFFSET ").push_bind(query.offset);
    }

    Ok(qb)
}

fn into_row(value: Json<Value>) -> Result<Row, StoreError> {
    match value.0 {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self, query), fields(filters = query.filters.len()))]
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError> {
        let total: i64 = count_sql(table, query)?
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?;

        if query.limit == Some(0) || total == 0 {
            return Ok(Selection {
                rows: Vec::new(),
                total,
            });
        }

        let rows = select_sql(table, query)?
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?
            .into_iter()
            .map(into_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Selection { rows, total })
    }

    #[instrument(skip(self, row))]
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        validate_identifier(table)?;
        let columns = validate_row(&row)?;

        let mut qb = if columns.is_empty() {
            QueryBuilder::new(format!("INSERT INTO {} AS t DEFAULT VALUES", quote(table)))
        } else {
            let list = columns.join(", ");
            let mut qb = QueryBuilder::new(format!(
                "INSERT INTO {} AS t ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{}, ",
                quote(table),
                quote(table)
            ));
            qb.push_bind(Json(Value::Object(row))).push(")");
            qb
        };
        qb.push(" RETURNING to_jsonb(t.*)");

        let inserted = qb
            .build_query_scalar::<Json<Value>>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?;

        into_row(inserted)
    }

    #[instrument(skip(self, filters, patch))]
    async fn update(
        &self,
        table: &str,
        filters: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        validate_query(table, filters)?;
        let columns = validate_row(&patch)?;

        if columns.is_empty() {
            let query = SelectQuery {
                filters: filters.to_vec(),
                ..SelectQuery::default()
            };
            return self.select(table, &query).await.map(|s| s.rows);
        }

        let assignments = columns
            .iter()
            .map(|c| format!("{c} = r.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut qb = QueryBuilder::new(format!(
            "UPDATE {} AS t SET {assignments} FROM jsonb_populate_record(NULL::{}, ",
            quote(table),
            quote(table)
        ));
        qb.push_bind(Json(Value::Object(patch))).push(") AS r");
        push_filters(&mut qb, table, filters);
        qb.push(" RETURNING to_jsonb(t.*)");

        qb.build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?
            .into_iter()
            .map(into_row)
            .collect()
    }

    #[instrument(skip(self, row))]
    async fn upsert(
        &self,
        table: &str,
        row: Row,
        conflict_column: &str,
    ) -> Result<Row, StoreError> {
        validate_identifier(table)?;
        validate_identifier(conflict_column)?;
        let columns = validate_row(&row)?;
        if columns.is_empty() {
            return Err(StoreError::NotAnObject);
        }

        let list = columns.join(", ");
        let assignments = columns
            .iter()
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut qb = QueryBuilder::new(format!(
            "INSERT INTO {} AS t ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{}, ",
            quote(table),
            quote(table)
        ));
        qb.push_bind(Json(Value::Object(row))).push(format!(
            ") ON CONFLICT ({}) DO UPDATE SET {assignments} RETURNING to_jsonb(t.*)",
            quote(conflict_column)
        ));

        let row = qb
            .build_query_scalar::<Json<Value>>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?;

        into_row(row)
    }

    #[instrument(skip(self, filters))]
    async fn delete(&self, table: &str, filters: &[Condition]) -> Result<u64, StoreError> {
        validate_query(table, filters)?;
        let mut qb = QueryBuilder::new(format!("DELETE FROM {} AS t", quote(table)));
        push_filters(&mut qb, table, filters);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, table))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;

    #[test]
    fn test_select_sql_shape() {
        let query = SelectQuery::new()
            .filter(Condition::eq("category_id", 4))
            .filter(Condition::search(&["title", "content"], "spawn"))
            .order_by("is_pinned", Direction::Desc)
            .order_by("created_at", Direction::Desc)
            .range(20, 20);

        let qb = select_sql("forum_threads", &query).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT to_jsonb(t.*) FROM \"forum_threads\" AS t \
             WHERE t.\"category_id\" = \
             (jsonb_populate_record(NULL::\"forum_threads\", $1)).\"category_id\" \
             AND (t.\"title\"::text ILIKE $2 OR t.\"content\"::text ILIKE $3) \
             ORDER BY t.\"is_pinned\" DESC NULLS LAST, t.\"created_at\" DESC NULLS LAST \
             LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn test_count_sql_without_filters() {
        let qb = count_sql("donations", &SelectQuery::new()).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM \"donations\" AS t");
    }

    #[test]
    fn test_empty_in_is_false() {
        let query = SelectQuery::new().filter(Condition::In("role".into(), vec![]));
        let qb = count_sql("profiles", &query).unwrap();
        assert!(qb.sql().ends_with("WHERE FALSE"));
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let query = SelectQuery::new().filter(Condition::eq("id\"; --", 1));
        assert!(matches!(
            select_sql("forum_threads", &query),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(select_sql("Forum", &SelectQuery::new()).is_err());

        let query = SelectQuery::new().order_by("created_at desc", Direction::Asc);
        assert!(select_sql("forum_threads", &query).is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
