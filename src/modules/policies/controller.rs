use axum::extract::{Path, State};
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::{Policy, UpsertPolicyDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::policies::service::PolicyService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/policies",
    responses((status = 200, description = "All site policies", body = [Policy])),
    tag = "Policies"
)]
#[instrument(skip(state))]
pub async fn get_policies(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Policy>>, AppError> {
    Ok(ApiResponse::ok(PolicyService::list(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/policies/{slug}",
    params(("slug" = String, Path, description = "Policy slug, e.g. `privacy`")),
    responses(
        (status = 200, description = "Policy", body = Policy),
        (status = 404, description = "Policy not found")
    ),
    tag = "Policies"
)]
#[instrument(skip(state))]
pub async fn get_policy(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<Policy>, AppError> {
    Ok(ApiResponse::ok(PolicyService::get(&state.db, &slug).await?))
}

#[utoipa::path(
    put,
    path = "/api/policies/{slug}",
    params(("slug" = String, Path, description = "Policy slug")),
    request_body = UpsertPolicyDto,
    responses(
        (status = 200, description = "Policy saved", body = Policy),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Policies",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn upsert_policy(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpsertPolicyDto>,
) -> Result<ApiResponse<Policy>, AppError> {
    let policy = PolicyService::upsert(&state.db, &auth_user, &slug, dto).await?;
    Ok(ApiResponse::ok(policy).with_message("Policy saved"))
}
