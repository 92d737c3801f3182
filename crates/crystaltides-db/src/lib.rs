//! # CrystalTides DB
//!
//! Data access for the CrystalTides API.
//!
//! - [`store`]: the object-safe [`Store`] contract over JSON rows
//! - [`postgres`]: [`PgStore`], the production store backed by SQLx
//! - [`memory`]: [`MemoryStore`], an in-process store for tests
//! - [`coreprotect`]: read-only command history from the game server's MySQL
//!
//! Handlers use [`Database`], a cloneable typed facade over any store.
//!
//! # Example
//!
//! ```ignore
//! use crystaltides_db::{Condition, Database, init_pg_pool};
//!
//! let db = Database::postgres(init_pg_pool(&database_url).await?);
//! let thread: Option<ForumThread> = db
//!     .find("forum_threads", vec![Condition::eq("slug", slug)])
//!     .await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;

pub mod coreprotect;
pub mod memory;
pub mod postgres;
pub mod store;

pub use coreprotect::{CommandLogEntry, CommandLogSource, MySqlCommandLogs};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Condition, Direction, Row, SelectQuery, Selection, Store, StoreError};

pub use sqlx::{MySqlPool, PgPool};

/// Creates the Postgres pool backing [`PgStore`].
pub async fn init_pg_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Creates a lazily connecting pool for the CoreProtect database.
pub fn init_mysql_pool(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)
}

fn to_row<R: Serialize + ?Sized>(value: &R) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

fn from_row<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|source| StoreError::Decode {
        table: table.to_string(),
        source,
    })
}

/// Typed access to a [`Store`].
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PgStore::new(pool)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Rows in the query's range and the total matching the filters.
    pub async fn list<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<(Vec<T>, i64), StoreError> {
        let selection = self.store.select(table, query).await?;
        let rows = selection
            .rows
            .into_iter()
            .map(|row| from_row(table, row))
            .collect::<Result<Vec<T>, _>>()?;
        Ok((rows, selection.total))
    }

    /// Like [`Database::list`], but a missing relation reads as empty.
    pub async fn list_or_empty<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<(Vec<T>, i64), StoreError> {
        match self.list(table, query).await {
            Err(StoreError::MissingRelation(relation)) => {
                tracing::warn!(%relation, "relation missing, returning no rows");
                Ok((Vec::new(), 0))
            }
            other => other,
        }
    }

    pub async fn find<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: Vec<Condition>,
    ) -> Result<Option<T>, StoreError> {
        let query = SelectQuery {
            filters,
            limit: Some(1),
            ..SelectQuery::default()
        };
        let (mut rows, _) = self.list::<T>(table, &query).await?;
        Ok(rows.pop())
    }

    pub async fn find_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
    ) -> Result<Option<T>, StoreError> {
        self.find(table, vec![Condition::eq("id", id)]).await
    }

    pub async fn count(&self, table: &str, filters: Vec<Condition>) -> Result<i64, StoreError> {
        let query = SelectQuery {
            filters,
            limit: Some(0),
            ..SelectQuery::default()
        };
        Ok(self.store.select(table, &query).await?.total)
    }

    pub async fn insert<T: DeserializeOwned, R: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &R,
    ) -> Result<T, StoreError> {
        let inserted = self.store.insert(table, to_row(row)?).await?;
        from_row(table, inserted)
    }

    /// Updates matching rows and returns the first one, if any matched.
    pub async fn update<T: DeserializeOwned, R: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: Vec<Condition>,
        patch: &R,
    ) -> Result<Option<T>, StoreError> {
        let updated = self.store.update(table, &filters, to_row(patch)?).await?;
        updated
            .into_iter()
            .next()
            .map(|row| from_row(table, row))
            .transpose()
    }

    pub async fn update_by_id<T: DeserializeOwned, R: Serialize + ?Sized>(
        &self,
        table: &str,
        id: i64,
        patch: &R,
    ) -> Result<Option<T>, StoreError> {
        self.update(table, vec![Condition::eq("id", id)], patch)
            .await
    }

    pub async fn upsert<T: DeserializeOwned, R: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &R,
        conflict_column: &str,
    ) -> Result<T, StoreError> {
        let row = self
            .store
            .upsert(table, to_row(row)?, conflict_column)
            .await?;
        from_row(table, row)
    }

    pub async fn delete(&self, table: &str, filters: Vec<Condition>) -> Result<u64, StoreError> {
        self.store.delete(table, &filters).await
    }

    /// Deletes one row by id; `false` when nothing matched.
    pub async fn delete_by_id(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        Ok(self.delete(table, vec![Condition::eq("id", id)]).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rule {
        id: i64,
        title: String,
    }

    #[derive(Serialize)]
    struct NewRule<'a> {
        title: &'a str,
    }

    #[derive(Serialize)]
    struct RulePatch<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<&'a str>,
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let db = Database::memory();
        let created: Rule = db.insert("rules", &NewRule { title: "No griefing" }).await.unwrap();
        assert_eq!(created.id, 1);

        let found: Option<Rule> = db.find_by_id("rules", 1).await.unwrap();
        assert_eq!(found.unwrap().title, "No griefing");

        let updated: Option<Rule> = db
            .update_by_id("rules", 1, &RulePatch { title: Some("No griefing, ever") })
            .await
            .unwrap();
        assert_eq!(updated.unwrap().title, "No griefing, ever");

        let missing: Option<Rule> = db
            .update_by_id("rules", 99, &RulePatch { title: None })
            .await
            .unwrap();
        assert!(missing.is_none());

        assert_eq!(db.count("rules", vec![]).await.unwrap(), 1);
        assert!(db.delete_by_id("rules", 1).await.unwrap());
        assert!(!db.delete_by_id("rules", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_or_empty_on_missing_relation() {
        let db = Database::new(Arc::new(MemoryStore::new().without_table("rules")));
        let (rows, total) = db
            .list_or_empty::<Rule>("rules", &SelectQuery::new())
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);

        assert!(db.list::<Rule>("rules", &SelectQuery::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_decode_error_names_table() {
        let db = Database::memory();
        db.insert::<Row, _>("rules", &serde_json::json!({ "title": 5 }))
            .await
            .unwrap();
        let err = db.find_by_id::<Rule>("rules", 1).await.unwrap_err();
        assert!(err.to_string().contains("rules"));
    }

    #[test]
    fn test_to_row_rejects_non_objects() {
        assert!(matches!(to_row(&5), Err(StoreError::NotAnObject)));
    }
}
