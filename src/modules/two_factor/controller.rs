use axum::extract::State;
use crystaltides_auth::TotpEnrollment;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::TwoFactorStatus;
use crystaltides_models::two_factor::{AdminTokenResponse, EnableTwoFactorDto, VerifyTwoFactorDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::two_factor::service::TwoFactorService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/auth/2fa/status",
    responses(
        (status = 200, description = "Whether 2FA is enabled", body = TwoFactorStatus),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Two-Factor",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn get_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<TwoFactorStatus>, AppError> {
    Ok(ApiResponse::ok(TwoFactorService::status(&state.db, auth_user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/setup",
    responses(
        (status = 200, description = "New secret, otpauth URL and QR code", body = TotpEnrollment),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Two-Factor",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn setup(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<ApiResponse<TotpEnrollment>, AppError> {
    Ok(ApiResponse::ok(TwoFactorService::setup(&auth_user, &state.auth_config)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/enable",
    request_body = EnableTwoFactorDto,
    responses(
        (status = 200, description = "2FA enabled"),
        (status = 400, description = "Invalid code or secret")
    ),
    tag = "Two-Factor",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn enable(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<EnableTwoFactorDto>,
) -> Result<ApiResponse<()>, AppError> {
    TwoFactorService::enable(&state.db, &auth_user, &dto.secret, &dto.token).await?;
    Ok(ApiResponse::message("2FA enabled"))
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/disable",
    request_body = VerifyTwoFactorDto,
    responses(
        (status = 200, description = "2FA disabled"),
        (status = 400, description = "Invalid code or 2FA not enabled")
    ),
    tag = "Two-Factor",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn disable(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<VerifyTwoFactorDto>,
) -> Result<ApiResponse<()>, AppError> {
    TwoFactorService::disable(&state.db, &auth_user, &dto.token).await?;
    Ok(ApiResponse::message("2FA disabled"))
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/verify",
    request_body = VerifyTwoFactorDto,
    responses(
        (
            status = 200,
            description = "Admin step-up token for the x-admin-token header",
            body = AdminTokenResponse
        ),
        (status = 400, description = "Invalid code or 2FA not enabled")
    ),
    tag = "Two-Factor",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn verify(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<VerifyTwoFactorDto>,
) -> Result<ApiResponse<AdminTokenResponse>, AppError> {
    let response =
        TwoFactorService::verify(&state.db, &auth_user, &state.auth_config, &dto.token).await?;
    Ok(ApiResponse::ok(response))
}
