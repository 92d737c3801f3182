//! In-process [`Store`] used by tests and local tooling.
//!
//! Tables are created on first write. Rows receive an auto-incrementing
//! integer `id` and an RFC 3339 `created_at` when the caller leaves them
//! out. Tables listed with [`MemoryStore::without_table`] behave as if the
//! relation did not exist.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{
    Condition, Direction, OrderBy, Row, SelectQuery, Selection, Store, StoreError,
    validate_identifier,
};

static NULL: Value = Value::Null;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    fn assign_defaults(&mut self, row: &mut Row) {
        match row.get("id") {
            None | Some(Value::Null) => {
                self.next_id += 1;
                row.insert("id".to_string(), Value::from(self.next_id));
            }
            Some(Value::Number(n)) => {
                if let Some(id) = n.as_i64() {
                    self.next_id = self.next_id.max(id);
                }
            }
            Some(_) => {}
        }
        if matches!(row.get("created_at"), None | Some(Value::Null)) {
            row.insert(
                "created_at".to_string(),
                Value::from(Utc::now().to_rfc3339()),
            );
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    missing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation on `table` fail with [`StoreError::MissingRelation`].
    #[must_use]
    pub fn without_table(mut self, table: &str) -> Self {
        self.missing.insert(table.to_string());
        self
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        validate_identifier(table)?;
        if self.missing.contains(table) {
            return Err(StoreError::MissingRelation(table.to_string()));
        }
        Ok(())
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        (Value::String(x), Value::Number(_)) | (Value::Number(_), Value::String(x)) => {
            let number = if a.is_number() { a } else { b };
            x == &number.to_string()
        }
        _ => a == b,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn matches(row: &Row, condition: &Condition) -> bool {
    let field = |column: &str| row.get(column).unwrap_or(&NULL);
    match condition {
        Condition::Eq(column, value) => values_equal(field(column), value),
        Condition::Neq(column, value) => !values_equal(field(column), value),
        Condition::Gte(column, value) => matches!(
            compare_values(field(column), value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Condition::Lte(column, value) => matches!(
            compare_values(field(column), value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Condition::In(column, values) => values.iter().any(|v| values_equal(field(column), v)),
        Condition::Contains(column, needle) => text_of(field(column))
            .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        Condition::IsNull(column) => field(column).is_null(),
        Condition::AnyOf(nested) => nested.iter().any(|c| matches(row, c)),
    }
}

fn compare_rows(a: &Row, b: &Row, order: &[OrderBy]) -> Ordering {
    for key in order {
        let left = a.get(&key.column).unwrap_or(&NULL);
        let right = b.get(&key.column).unwrap_or(&NULL);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {
                let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
                match key.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError> {
        self.check(table)?;
        let tables = self.tables.read().await;
        let Some(stored) = tables.get(table) else {
            return Ok(Selection::default());
        };

        let mut rows: Vec<Row> = stored
            .rows
            .iter()
            .filter(|row| query.filters.iter().all(|c| matches(row, c)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_rows(a, b, &query.order));

        let total = rows.len() as i64;
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let rows = rows
            .into_iter()
            .skip(offset)
            .take(query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(0)))
            .collect();

        Ok(Selection { rows, total })
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, StoreError> {
        self.check(table)?;
        let mut tables = self.tables.write().await;
        let stored = tables.entry(table.to_string()).or_default();
        stored.assign_defaults(&mut row);
        stored.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        self.check(table)?;
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in stored
            .rows
            .iter_mut()
            .filter(|row| filters.iter().all(|c| matches(row, c)))
        {
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: &str,
        mut row: Row,
        conflict_column: &str,
    ) -> Result<Row, StoreError> {
        self.check(table)?;
        let key = row
            .get(conflict_column)
            .cloned()
            .ok_or(StoreError::NotAnObject)?;

        let mut tables = self.tables.write().await;
        let stored = tables.entry(table.to_string()).or_default();

        if let Some(existing) = stored
            .rows
            .iter_mut()
            .find(|r| r.get(conflict_column).is_some_and(|v| values_equal(v, &key)))
        {
            for (column, value) in row {
                existing.insert(column, value);
            }
            return Ok(existing.clone());
        }

        stored.assign_defaults(&mut row);
        stored.rows.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, table: &str, filters: &[Condition]) -> Result<u64, StoreError> {
        self.check(table)?;
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.get_mut(table) else {
            return Ok(0);
        };

        let before = stored.rows.len();
        stored
            .rows
            .retain(|row| !filters.iter().all(|c| matches(row, c)));
        Ok((before - stored.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let first = store.insert("rules", row(json!({ "title": "a" }))).await.unwrap();
        let second = store.insert("rules", row(json!({ "title": "b" }))).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert!(first["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_ranges() {
        let store = MemoryStore::new();
        for i in 0..45 {
            store
                .insert("donations", row(json!({ "amount": i, "from_name": format!("donor{i}") })))
                .await
                .unwrap();
        }

        let query = SelectQuery::new()
            .order_by("amount", Direction::Desc)
            .range(20, 20);
        let selection = store.select("donations", &query).await.unwrap();
        assert_eq!(selection.total, 45);
        assert_eq!(selection.rows.len(), 20);
        assert_eq!(selection.rows[0]["amount"], 24);

        let query = SelectQuery::new().filter(Condition::search(&["from_name"], "DONOR4"));
        let selection = store.select("donations", &query).await.unwrap();
        // donor4 and donor40..donor44
        assert_eq!(selection.total, 6);
    }

    #[tokio::test]
    async fn test_nulls_sort_last() {
        let store = MemoryStore::new();
        store.insert("rules", row(json!({ "sort_order": null }))).await.unwrap();
        store.insert("rules", row(json!({ "sort_order": 2 }))).await.unwrap();
        store.insert("rules", row(json!({ "sort_order": 1 }))).await.unwrap();

        let query = SelectQuery::new().order_by("sort_order", Direction::Asc);
        let rows = store.select("rules", &query).await.unwrap().rows;
        assert_eq!(rows[0]["sort_order"], 1);
        assert_eq!(rows[1]["sort_order"], 2);
        assert!(rows[2]["sort_order"].is_null());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        store.insert("tickets", row(json!({ "status": "open" }))).await.unwrap();
        store.insert("tickets", row(json!({ "status": "open" }))).await.unwrap();

        let updated = store
            .update("tickets", &[Condition::eq("id", 2)], row(json!({ "status": "closed" })))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["status"], "closed");

        let deleted = store
            .delete("tickets", &[Condition::eq("status", "open")])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.row_count("tickets").await, 1);
    }

    #[tokio::test]
    async fn test_upsert_on_conflict_column() {
        let store = MemoryStore::new();
        let first = store
            .upsert("donations", row(json!({ "message_id": "k1", "amount": 5 })), "message_id")
            .await
            .unwrap();
        let second = store
            .upsert("donations", row(json!({ "message_id": "k1", "amount": 7 })), "message_id")
            .await
            .unwrap();
        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["amount"], 7);
        assert_eq!(store.row_count("donations").await, 1);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new().without_table("rules");
        let err = store.select("rules", &SelectQuery::new()).await.unwrap_err();
        assert!(err.is_missing_relation());
    }

    #[test]
    fn test_number_and_string_equality() {
        let r = row(json!({ "id": 5, "user_id": "00000000-0000-0000-0000-000000000001" }));
        assert!(matches(&r, &Condition::eq("id", 5)));
        assert!(matches(&r, &Condition::eq("id", "5")));
        assert!(matches(&r, &Condition::is_in("id", [4, 5])));
        assert!(!matches(&r, &Condition::eq("user_id", "other")));
        assert!(matches(&r, &Condition::is_null("missing")));
    }
}
