use anyhow::anyhow;
use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use crystaltides_core::{ApiResponse, AppError};
use crystaltides_models::webhooks::KofiForm;
use crystaltides_models::{KofiPayload, MinecraftEventDto};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::modules::webhooks::service::{KofiOutcome, WebhookService};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// A Ko-fi event, posted either as a urlencoded form or as JSON.
pub struct KofiBody(pub KofiPayload);

impl<S> FromRequest<S> for KofiBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let body = if is_form {
            let Form(form) = Form::<KofiForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(anyhow!("Invalid form body: {e}")))?;
            form.data.map_or_else(|| json!({}), |data| json!({ "data": data }))
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|_| AppError::bad_request(anyhow!("Invalid JSON format")))?;
            value
        };

        WebhookService::kofi_payload(body).map(KofiBody)
    }
}

#[utoipa::path(
    post,
    path = "/api/webhooks/kofi",
    request_body(content = KofiForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Donation recorded, or ignored when it has no message id"),
        (status = 400, description = "Malformed payload"),
        (status = 403, description = "Invalid verification token")
    ),
    tag = "Webhooks"
)]
#[instrument(skip(state, payload))]
pub async fn kofi_webhook(
    State(state): State<AppState>,
    KofiBody(payload): KofiBody,
) -> Result<ApiResponse<()>, AppError> {
    match WebhookService::handle_kofi(&state, payload).await? {
        KofiOutcome::Ignored => Ok(ApiResponse::message("Ignored")),
        KofiOutcome::Recorded(_) => Ok(ApiResponse::message("Donation recorded")),
    }
}

#[utoipa::path(
    post,
    path = "/api/webhooks/minecraft",
    request_body = MinecraftEventDto,
    params(("x-bridge-secret" = Option<String>, Header, description = "Shared bridge secret")),
    responses(
        (status = 200, description = "Event forwarded"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing bridge secret"),
        (status = 403, description = "Invalid bridge secret")
    ),
    tag = "Webhooks"
)]
#[instrument(skip(state, headers, event))]
pub async fn minecraft_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(event): ValidatedJson<MinecraftEventDto>,
) -> Result<ApiResponse<()>, AppError> {
    WebhookService::verify_bridge_secret(state.integrations.bridge_secret.as_deref(), &headers)?;
    info!(event = %event.event, player = %event.player, "Game event received");
    state.discord.notify_game_event(&event);
    Ok(ApiResponse::message("Event forwarded"))
}
