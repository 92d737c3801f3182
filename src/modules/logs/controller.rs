use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError, PaginationParams};
use crystaltides_db::CommandLogEntry;
use crystaltides_models::{AuditLog, CreateLogDto, LogListParams, SecurityAlertDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::ClientIp;
use crate::modules::logs::service::LogService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

/// Default page size of the command log.
const COMMANDS_LIMIT: i64 = 50;

#[utoipa::path(
    get,
    path = "/api/logs",
    params(LogListParams),
    responses(
        (status = 200, description = "Audit log, newest first", body = [AuditLog]),
        (status = 400, description = "Invalid filters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Logs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_logs(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<LogListParams>,
) -> Result<ApiResponse<Vec<AuditLog>>, AppError> {
    let (logs, meta) = LogService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(logs, meta))
}

#[utoipa::path(
    post,
    path = "/api/logs",
    request_body = CreateLogDto,
    responses(
        (status = 200, description = "Log entry created", body = AuditLog),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Logs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn create_log(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateLogDto>,
) -> Result<ApiResponse<AuditLog>, AppError> {
    let log = LogService::create(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(log))
}

#[utoipa::path(
    get,
    path = "/api/logs/commands",
    params(PaginationParams),
    responses(
        (
            status = 200,
            description = "Privileged in-game commands, newest first",
            body = [CommandLogEntry]
        ),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 503, description = "Command log database not configured")
    ),
    tag = "Logs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_command_logs(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Vec<CommandLogEntry>>, AppError> {
    let page = params.resolve(COMMANDS_LIMIT);
    let (rows, meta) = LogService::suspicious_commands(&state, page, params.search()).await?;
    Ok(ApiResponse::paginated(rows, meta))
}

#[utoipa::path(
    post,
    path = "/api/logs/security-alert",
    request_body = SecurityAlertDto,
    responses(
        (status = 200, description = "Alert received"),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Logs"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn report_security_alert(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    auth_user: Option<AuthUser>,
    ValidatedJson(dto): ValidatedJson<SecurityAlertDto>,
) -> ApiResponse<()> {
    LogService::security_alert(&state.db, dto, auth_user.as_deref(), ip.to_string()).await;
    ApiResponse::message("Alert received")
}
