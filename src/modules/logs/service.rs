use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, Page, PaginationMeta};
use crystaltides_db::{CommandLogEntry, Condition, Database, Direction, SelectQuery};
use crystaltides_models::logs::{self, DEFAULT_LIMIT};
use crystaltides_models::{
    AuditLog, CreateLogDto, LogListParams, LogSource, NewAuditLog, SecurityAlertDto,
};
use tracing::{error, instrument, warn};

use crate::state::AppState;

pub struct LogService;

impl LogService {
    /// Writes an audit entry. Failures are logged and never surface to the caller.
    #[instrument(skip(db, entry), fields(action = %entry.action))]
    pub async fn record(db: &Database, entry: NewAuditLog) {
        if let Err(e) = db.insert::<AuditLog, _>(logs::TABLE, &entry).await {
            error!(error = %e, action = %entry.action, "Failed to write audit log");
        }
    }

    /// Audit entry for an action taken by `principal` from the web panel.
    pub async fn record_action(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        action: &str,
        details: impl Into<String>,
    ) {
        let entry = NewAuditLog::web(Some(principal.id), &principal.username, action, details);
        Self::record(db, entry).await;
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &LogListParams,
    ) -> Result<(Vec<AuditLog>, PaginationMeta), AppError> {
        let page = params.pagination.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter_opt(params.source().map(|source| Condition::eq("source", source)))
            .filter_opt(
                params
                    .pagination
                    .search()
                    .map(|term| Condition::search(&["username", "action", "details"], term)),
            )
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (rows, total) = db.list_or_empty::<AuditLog>(logs::TABLE, &query).await?;
        Ok((rows, page.meta(total)))
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn create(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: CreateLogDto,
    ) -> Result<AuditLog, AppError> {
        let entry = NewAuditLog {
            user_id: Some(principal.id),
            username: principal.username.clone(),
            details: dto.details_text(),
            action: dto.action,
            source: dto.source.unwrap_or_default(),
        };
        Ok(db.insert(logs::TABLE, &entry).await?)
    }

    /// Records a client-reported security alert under the `security` source.
    #[instrument(skip(db, dto, principal))]
    pub async fn security_alert(
        db: &Database,
        dto: SecurityAlertDto,
        principal: Option<&AuthenticatedPrincipal>,
        client_ip: String,
    ) {
        warn!(kind = %dto.kind, path = ?dto.path, %client_ip, "Security alert reported");

        let details = serde_json::json!({
            "path": dto.path,
            "ip": client_ip,
            "details": dto.details,
        });
        let entry = NewAuditLog {
            user_id: principal.map(|p| p.id),
            username: principal.map_or_else(|| "anonymous".to_string(), |p| p.username.clone()),
            action: format!("SECURITY_{}", dto.kind.to_uppercase()),
            details: Some(details.to_string()),
            source: LogSource::Security,
        };
        Self::record(db, entry).await;
    }

    #[instrument(skip(state))]
    pub async fn suspicious_commands(
        state: &AppState,
        page: Page,
        search: Option<&str>,
    ) -> Result<(Vec<CommandLogEntry>, PaginationMeta), AppError> {
        let source = state
            .command_logs
            .as_ref()
            .ok_or_else(|| {
                AppError::service_unavailable("Command log database is not configured")
            })?;

        let (rows, total) = source.suspicious_commands(page, search).await?;
        Ok((rows, page.meta(total)))
    }
}
