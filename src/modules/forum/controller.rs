use axum::extract::{Path, State};
use crystaltides_core::{ApiResponse, AppError, PaginationParams};
use crystaltides_models::forum::{
    CategoryPath, CreateThreadRequest, ListThreadsRequest, ThreadDetail,
};
use crystaltides_models::{
    CreatePostDto, CreateThreadDto, ForumPost, ForumThread, UpdatePostDto, UpdateThreadDto,
};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::forum::service::ForumService;
use crate::state::AppState;
use crate::validator::{PathId, PathUuid, Validated, ValidatedJson};

#[utoipa::path(
    get,
    path = "/api/forum/categories/{category_id}/threads",
    params(CategoryPath, PaginationParams),
    responses(
        (status = 200, description = "Threads of the category, pinned first", body = [ForumThread]),
        (status = 400, description = "Invalid category or pagination")
    ),
    tag = "Forum"
)]
#[instrument(skip(state))]
pub async fn get_threads(
    State(state): State<AppState>,
    Validated(request): Validated<ListThreadsRequest>,
) -> Result<ApiResponse<Vec<ForumThread>>, AppError> {
    let category_id = request.params.category_id.unwrap_or_default();
    let (threads, meta) = ForumService::list_threads(&state.db, category_id, &request.query).await?;
    Ok(ApiResponse::paginated(threads, meta))
}

#[utoipa::path(
    get,
    path = "/api/forum/threads/{id}",
    params(("id" = String, Path, description = "Numeric thread ID or slug")),
    responses(
        (status = 200, description = "Thread with its poll", body = ThreadDetail),
        (status = 404, description = "Thread not found")
    ),
    tag = "Forum"
)]
#[instrument(skip(state))]
pub async fn get_thread(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<ApiResponse<ThreadDetail>, AppError> {
    Ok(ApiResponse::ok(ForumService::get_thread(&state.db, &id_or_slug).await?))
}

#[utoipa::path(
    get,
    path = "/api/forum/threads/{id}/posts",
    params(("id" = i64, Path, description = "Thread ID")),
    responses((status = 200, description = "Replies, oldest first", body = [ForumPost])),
    tag = "Forum"
)]
#[instrument(skip(state))]
pub async fn get_posts(
    State(state): State<AppState>,
    PathId(thread_id): PathId,
) -> Result<ApiResponse<Vec<ForumPost>>, AppError> {
    Ok(ApiResponse::ok(ForumService::posts(&state.db, thread_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/forum/users/{user_id}/threads",
    params(("user_id" = uuid::Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Threads by the user, newest first", body = [ForumThread])
    ),
    tag = "Forum"
)]
#[instrument(skip(state))]
pub async fn get_user_threads(
    State(state): State<AppState>,
    PathUuid(user_id): PathUuid,
) -> Result<ApiResponse<Vec<ForumThread>>, AppError> {
    Ok(ApiResponse::ok(ForumService::user_threads(&state.db, user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/forum/threads",
    request_body = CreateThreadDto,
    responses(
        (status = 200, description = "Thread created", body = ForumThread),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, request), fields(user_id = %auth_user.id))]
pub async fn create_thread(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Validated(request): Validated<CreateThreadRequest>,
) -> Result<ApiResponse<ForumThread>, AppError> {
    let thread = ForumService::create_thread(&state, &auth_user, request.body).await?;
    Ok(ApiResponse::ok(thread).with_message("Thread created"))
}

#[utoipa::path(
    post,
    path = "/api/forum/threads/{id}/posts",
    params(("id" = i64, Path, description = "Thread ID")),
    request_body = CreatePostDto,
    responses(
        (status = 200, description = "Reply created", body = ForumPost),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Thread not found")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(thread_id): PathId,
    ValidatedJson(dto): ValidatedJson<CreatePostDto>,
) -> Result<ApiResponse<ForumPost>, AppError> {
    let post = ForumService::create_post(&state.db, &auth_user, thread_id, dto).await?;
    Ok(ApiResponse::ok(post).with_message("Reply posted"))
}

#[utoipa::path(
    put,
    path = "/api/forum/threads/{id}",
    params(("id" = i64, Path, description = "Thread ID")),
    request_body = UpdateThreadDto,
    responses(
        (status = 200, description = "Thread updated", body = ForumThread),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Thread not found")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_thread(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateThreadDto>,
) -> Result<ApiResponse<ForumThread>, AppError> {
    let thread = ForumService::update_thread(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(thread).with_message("Thread updated"))
}

#[utoipa::path(
    delete,
    path = "/api/forum/threads/{id}",
    params(("id" = i64, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Thread, replies and poll deleted"),
        (status = 404, description = "Thread not found")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_thread(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    ForumService::delete_thread(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Thread deleted"))
}

#[utoipa::path(
    put,
    path = "/api/forum/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = ForumPost),
        (status = 404, description = "Post not found")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdatePostDto>,
) -> Result<ApiResponse<ForumPost>, AppError> {
    let post = ForumService::update_post(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(post).with_message("Post updated"))
}

#[utoipa::path(
    delete,
    path = "/api/forum/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "Post not found")
    ),
    tag = "Forum",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    ForumService::delete_post(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Post deleted"))
}
