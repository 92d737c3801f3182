use axum::extract::State;
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::{TranslateDto, TranslationResult};
use tracing::instrument;

use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/translation",
    request_body = TranslateDto,
    responses(
        (
            status = 200,
            description = "Translated text, or the original when translation is unavailable",
            body = TranslationResult
        ),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Translation"
)]
#[instrument(skip(state, dto), fields(target = %dto.target))]
pub async fn translate(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<TranslateDto>,
) -> Result<ApiResponse<TranslationResult>, AppError> {
    let result = state
        .translator
        .translate(&dto.text, &dto.target, dto.source.as_deref())
        .await;
    Ok(ApiResponse::ok(result))
}
