use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::donations::DonationListParams;
use crystaltides_models::{CreateDonationDto, Donation, DonationStats, UpdateDonationDto};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::donations::service::DonationService;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/donations",
    params(DonationListParams),
    responses(
        (
            status = 200,
            description = "Donations, newest first; private donors are anonymised",
            body = [Donation]
        ),
        (status = 400, description = "Invalid pagination")
    ),
    tag = "Donations"
)]
#[instrument(skip(state))]
pub async fn get_donations(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<DonationListParams>,
) -> Result<ApiResponse<Vec<Donation>>, AppError> {
    let (donations, meta) = DonationService::list(&state.db, &params).await?;
    Ok(ApiResponse::paginated(donations, meta))
}

#[utoipa::path(
    get,
    path = "/api/donations/stats",
    responses((status = 200, description = "This month against last month", body = DonationStats)),
    tag = "Donations"
)]
#[instrument(skip(state))]
pub async fn get_donation_stats(
    State(state): State<AppState>,
) -> Result<ApiResponse<DonationStats>, AppError> {
    Ok(ApiResponse::ok(DonationService::stats(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/api/donations",
    request_body = CreateDonationDto,
    responses(
        (status = 200, description = "Donation created", body = Donation),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Donations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_donation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateDonationDto>,
) -> Result<ApiResponse<Donation>, AppError> {
    let donation = DonationService::create(&state.db, &auth_user, dto).await?;
    Ok(ApiResponse::ok(donation).with_message("Donation created successfully"))
}

#[utoipa::path(
    put,
    path = "/api/donations/{id}",
    params(("id" = i64, Path, description = "Donation ID")),
    request_body = UpdateDonationDto,
    responses(
        (status = 200, description = "Donation updated", body = Donation),
        (status = 404, description = "Donation not found")
    ),
    tag = "Donations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_donation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
    ValidatedJson(dto): ValidatedJson<UpdateDonationDto>,
) -> Result<ApiResponse<Donation>, AppError> {
    let donation = DonationService::update(&state.db, &auth_user, id, dto).await?;
    Ok(ApiResponse::ok(donation).with_message("Donation updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/donations/{id}",
    params(("id" = i64, Path, description = "Donation ID")),
    responses(
        (status = 200, description = "Donation deleted"),
        (status = 404, description = "Donation not found")
    ),
    tag = "Donations",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_donation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    DonationService::delete(&state.db, &auth_user, id).await?;
    Ok(ApiResponse::message("Donation deleted successfully"))
}
