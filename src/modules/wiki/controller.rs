use axum::extract::{Path, State};
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::wiki::WikiListParams;
use crystaltides_models::{CreateWikiArticleDto, UpdateWikiArticleDto, WikiArticle};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::wiki::service::WikiService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/wiki",
    params(WikiListParams),
    responses((status = 200, description = "Wiki articles, newest first", body = [WikiArticle])),
    tag = "Wiki"
)]
#[instrument(skip(state))]
pub async fn get_articles(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<WikiListParams>,
) -> Result<ApiResponse<Vec<WikiArticle>>, AppError> {
    Ok(ApiResponse::ok(WikiService::list(&state.db, &params).await?))
}

#[utoipa::path(
    get,
    path = "/api/wiki/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = WikiArticle),
        (status = 404, description = "Article not found")
    ),
    tag = "Wiki"
)]
#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<WikiArticle>, AppError> {
    Ok(ApiResponse::ok(WikiService::get_by_slug(&state.db, &slug).await?))
}

#[utoipa::path(
    post,
    path = "/api/wiki",
    request_body = CreateWikiArticleDto,
    responses(
        (status = 200, description = "Article created", body = WikiArticle),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Slug already taken")
    ),
    tag = "Wiki",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_article(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateWikiArticleDto>,
) -> Result<ApiResponse<WikiArticle>, AppError> {
    let article = WikiService::create(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(article).with_message("Article created"))
}

#[utoipa::path(
    put,
    path = "/api/wiki/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateWikiArticleDto,
    responses(
        (status = 200, description = "Article updated", body = WikiArticle),
        (status = 404, description = "Article not found")
    ),
    tag = "Wiki",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_article(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateWikiArticleDto>,
) -> Result<ApiResponse<WikiArticle>, AppError> {
    let article = WikiService::update(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(article).with_message("Article updated"))
}

#[utoipa::path(
    delete,
    path = "/api/wiki/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 404, description = "Article not found")
    ),
    tag = "Wiki",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_article(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    WikiService::delete(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Article deleted"))
}
