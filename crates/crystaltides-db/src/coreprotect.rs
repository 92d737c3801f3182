//! Suspicious command history from the CoreProtect plugin database (MySQL).
//!
//! CoreProtect records every command players run in `co_command`, keyed to
//! `co_user`. Staff only care about a fixed list of privileged commands, which
//! are matched by prefix.

use async_trait::async_trait;
use crystaltides_core::Page;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::instrument;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Command prefixes considered privileged.
pub const SUSPICIOUS_COMMANDS: &[&str] = &[
    "/gm ",
    "/gamemode",
    "/give",
    "/item",
    "/xp",
    "/experience",
    "/enchant",
    "/tp ",
    "/teleport",
    "//",
    "/fly",
    "/god",
    "/heal",
    "/feed",
    "/op",
    "/deop",
    "/fill",
    "/setblock",
    "/clone",
    "/effect",
    "/attribute",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CommandLogEntry {
    /// Unix timestamp (seconds).
    pub time: i64,
    pub user: String,
    pub message: String,
}

#[async_trait]
pub trait CommandLogSource: Send + Sync {
    /// Suspicious commands newest first, with the total matching count.
    async fn suspicious_commands(
        &self,
        page: Page,
        search: Option<&str>,
    ) -> Result<(Vec<CommandLogEntry>, i64), StoreError>;
}

pub struct MySqlCommandLogs {
    pool: MySqlPool,
}

impl MySqlCommandLogs {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, search: Option<&str>) {
    qb.push(" WHERE (");
    for (i, prefix) in SUSPICIOUS_COMMANDS.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("cmd.message LIKE ").push_bind(format!("{prefix}%"));
    }
    qb.push(")");

    if let Some(search) = search {
        let pattern = format!("%{search}%");
        qb.push(" AND (u.user LIKE ")
            .push_bind(pattern.clone())
            .push(" OR cmd.message LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

const FROM_CLAUSE: &str = " FROM co_command cmd JOIN co_user u ON cmd.user = u.rowid";

#[async_trait]
impl CommandLogSource for MySqlCommandLogs {
    #[instrument(skip(self))]
    async fn suspicious_commands(
        &self,
        page: Page,
        search: Option<&str>,
    ) -> Result<(Vec<CommandLogEntry>, i64), StoreError> {
        let mut count = QueryBuilder::<MySql>::new(format!("SELECT COUNT(*){FROM_CLAUSE}"));
        push_filters(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<MySql>::new(format!(
            "SELECT CAST(cmd.time AS SIGNED) AS time, u.user AS user, \
             cmd.message AS message{FROM_CLAUSE}"
        ));
        push_filters(&mut select, search);
        select
            .push(" ORDER BY cmd.time DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<CommandLogEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}
