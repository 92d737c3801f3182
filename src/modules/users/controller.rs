use axum::extract::{Path, State};
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::users::{CurrentUser, UserListParams};
use crystaltides_models::{Profile, UpdateMetadataDto, UpdateProfileDto, UpdateRoleDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::{PathUuid, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller with role priority and tier", body = CurrentUser),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<CurrentUser>, AppError> {
    Ok(ApiResponse::ok(UserService::current_user(&state.db, &auth_user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/users/me/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username taken")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<ApiResponse<Profile>, AppError> {
    let profile = UserService::update_profile(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(profile).with_message("Profile updated successfully"))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListParams),
    responses(
        (status = 200, description = "Profiles, newest first", body = [Profile]),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<UserListParams>,
) -> Result<ApiResponse<Vec<Profile>>, AppError> {
    let (users, meta) = UserService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(users, meta))
}

#[utoipa::path(
    get,
    path = "/api/users/staff",
    responses((status = 200, description = "Staff profiles by role priority", body = [Profile])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_staff(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Profile>>, AppError> {
    Ok(ApiResponse::ok(UserService::staff(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/profile/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public profile", body = Profile),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<ApiResponse<Profile>, AppError> {
    Ok(ApiResponse::ok(UserService::public_profile(&state.db, &username).await?))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated", body = Profile),
        (status = 403, description = "Role hierarchy violation"),
        (status = 404, description = "Target user not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_user_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathUuid(id): PathUuid,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<ApiResponse<Profile>, AppError> {
    let profile = UserService::update_role(&state.db, &auth_user, id, &dto.role).await?;
    Ok(ApiResponse::ok(profile).with_message("User role updated"))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/metadata",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateMetadataDto,
    responses(
        (status = 200, description = "Metadata updated", body = Profile),
        (status = 404, description = "Target user not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_user_metadata(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathUuid(id): PathUuid,
    ValidatedJson(dto): ValidatedJson<UpdateMetadataDto>,
) -> Result<ApiResponse<Profile>, AppError> {
    let profile = UserService::update_metadata(&state.db, &auth_user, id, &dto.metadata).await?;
    Ok(ApiResponse::ok(profile).with_message("User metadata updated"))
}
