use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::suggestions::SuggestionListParams;
use crystaltides_models::{CreateSuggestionDto, Suggestion, UpdateSuggestionStatusDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::suggestions::service::SuggestionService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    post,
    path = "/api/suggestions",
    request_body = CreateSuggestionDto,
    responses(
        (status = 200, description = "Suggestion received", body = Suggestion),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Suggestions"
)]
#[instrument(skip(state, dto))]
pub async fn create_suggestion(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSuggestionDto>,
) -> Result<ApiResponse<Suggestion>, AppError> {
    let suggestion = SuggestionService::create(&state.db, dto).await?;
    Ok(ApiResponse::ok(suggestion).with_message("Suggestion received"))
}

#[utoipa::path(
    get,
    path = "/api/suggestions",
    params(SuggestionListParams),
    responses(
        (status = 200, description = "Suggestions, newest first", body = [Suggestion]),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Suggestions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_suggestions(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<SuggestionListParams>,
) -> Result<ApiResponse<Vec<Suggestion>>, AppError> {
    let (rows, meta) = SuggestionService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(rows, meta))
}

#[utoipa::path(
    patch,
    path = "/api/suggestions/{id}/status",
    params(("id" = i64, Path, description = "Suggestion ID")),
    request_body = UpdateSuggestionStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Suggestion),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Suggestion not found")
    ),
    tag = "Suggestions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn update_suggestion_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateSuggestionStatusDto>,
) -> Result<ApiResponse<Suggestion>, AppError> {
    let suggestion = SuggestionService::update_status(&state.db, &auth_user, id, dto.status).await?;
    Ok(ApiResponse::ok(suggestion))
}

#[utoipa::path(
    delete,
    path = "/api/suggestions/{id}",
    params(("id" = i64, Path, description = "Suggestion ID")),
    responses(
        (status = 200, description = "Suggestion deleted"),
        (status = 404, description = "Suggestion not found")
    ),
    tag = "Suggestions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_suggestion(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    SuggestionService::delete(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Suggestion deleted"))
}
