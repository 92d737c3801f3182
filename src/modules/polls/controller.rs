use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError, PaginationParams};
use crystaltides_models::polls::{PollSummary, VoteResult};
use crystaltides_models::{CreatePollDto, PollWithOptions, VoteDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::polls::service::PollService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/polls",
    params(PaginationParams),
    responses(
        (status = 200, description = "Polls, newest first, with vote totals", body = [PollSummary])
    ),
    tag = "Polls"
)]
#[instrument(skip(state))]
pub async fn get_polls(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Vec<PollSummary>>, AppError> {
    let (polls, meta) = PollService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(polls, meta))
}

#[utoipa::path(
    get,
    path = "/api/polls/active",
    responses(
        (
            status = 200,
            description = "The active global poll, or null",
            body = Option<PollWithOptions>
        )
    ),
    tag = "Polls"
)]
#[instrument(skip(state))]
pub async fn get_active_poll(
    State(state): State<AppState>,
) -> Result<ApiResponse<Option<PollWithOptions>>, AppError> {
    Ok(ApiResponse::ok(PollService::active(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/polls/{id}",
    params(("id" = i64, Path, description = "Poll ID")),
    responses(
        (status = 200, description = "Poll with options and percentages", body = PollWithOptions),
        (status = 404, description = "Poll not found")
    ),
    tag = "Polls"
)]
#[instrument(skip(state))]
pub async fn get_poll(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<ApiResponse<PollWithOptions>, AppError> {
    Ok(ApiResponse::ok(PollService::get(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/polls",
    request_body = CreatePollDto,
    responses(
        (status = 200, description = "Poll created", body = PollWithOptions),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Polls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreatePollDto>,
) -> Result<ApiResponse<PollWithOptions>, AppError> {
    let poll = PollService::create_audited(&state.db, &state.translator, &auth_user, dto).await?;
    Ok(ApiResponse::ok(poll).with_message("Poll created"))
}

#[utoipa::path(
    post,
    path = "/api/polls/{id}/vote",
    params(("id" = i64, Path, description = "Poll ID")),
    request_body = VoteDto,
    responses(
        (status = 200, description = "Vote counted", body = VoteResult),
        (status = 404, description = "Poll or option not found"),
        (status = 409, description = "Poll closed")
    ),
    tag = "Polls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<VoteDto>,
) -> Result<ApiResponse<VoteResult>, AppError> {
    let result = PollService::vote(&state.db, id, dto.option_id).await?;
    Ok(ApiResponse::ok(result).with_message("Vote counted"))
}

#[utoipa::path(
    delete,
    path = "/api/polls/{id}",
    params(("id" = i64, Path, description = "Poll ID")),
    responses(
        (status = 200, description = "Poll deleted"),
        (status = 404, description = "Poll not found")
    ),
    tag = "Polls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    PollService::delete(&state.db, Some(&auth_user), id).await?;
    Ok(ApiResponse::message("Poll deleted"))
}
