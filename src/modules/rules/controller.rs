use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::{CreateRuleDto, Rule, UpdateRuleDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::rules::service::RuleService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/rules",
    responses(
        (status = 200, description = "Server rules by sort order", body = [Rule])
    ),
    tag = "Rules"
)]
#[instrument(skip(state))]
pub async fn get_rules(State(state): State<AppState>) -> Result<ApiResponse<Vec<Rule>>, AppError> {
    Ok(ApiResponse::ok(RuleService::list(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/api/rules",
    request_body = CreateRuleDto,
    responses(
        (status = 200, description = "Rule created", body = Rule),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Rules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn create_rule(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateRuleDto>,
) -> Result<ApiResponse<Rule>, AppError> {
    let rule = RuleService::create(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(rule).with_message("Rule created"))
}

#[utoipa::path(
    put,
    path = "/api/rules/{id}",
    params(("id" = i64, Path, description = "Rule ID")),
    request_body = UpdateRuleDto,
    responses(
        (status = 200, description = "Rule updated", body = Rule),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Rule not found")
    ),
    tag = "Rules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn update_rule(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateRuleDto>,
) -> Result<ApiResponse<Rule>, AppError> {
    let rule = RuleService::update(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(rule).with_message("Rule updated"))
}

#[utoipa::path(
    delete,
    path = "/api/rules/{id}",
    params(("id" = i64, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deleted"),
        (status = 404, description = "Rule not found")
    ),
    tag = "Rules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_rule(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    RuleService::delete(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Rule deleted"))
}
