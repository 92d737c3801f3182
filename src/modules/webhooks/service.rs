use anyhow::anyhow;
use axum::http::HeaderMap;
use chrono::Utc;
use crystaltides_core::AppError;
use crystaltides_models::donations::{ANONYMOUS_DONOR, DonationRecord};
use crystaltides_models::{Donation, KofiPayload};
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

use crate::modules::donations::service::DonationService;
use crate::state::AppState;

pub const BRIDGE_SECRET_HEADER: &str = "x-bridge-secret";

fn secrets_match(sent: &str, expected: &str) -> bool {
    sent.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// What happened to an accepted Ko-fi event.
#[derive(Debug)]
pub enum KofiOutcome {
    /// Verified but carried no `message_id`; acknowledged so Ko-fi stops retrying.
    Ignored,
    Recorded(Donation),
}

pub struct WebhookService;

impl WebhookService {
    /// Unwraps the `data` JSON string when present, otherwise reads the body
    /// itself as the event.
    pub fn kofi_payload(body: Value) -> Result<KofiPayload, AppError> {
        let event = match body.get("data") {
            Some(Value::String(data)) => serde_json::from_str::<Value>(data)
                .map_err(|_| AppError::bad_request(anyhow!("Invalid JSON format")))?,
            _ => body,
        };
        serde_json::from_value(event)
            .map_err(|e| AppError::bad_request(anyhow!("Invalid Ko-fi payload: {e}")))
    }

    /// Accepts every event when no verification token is configured.
    pub fn verify_kofi_token(
        expected: Option<&str>,
        payload: &KofiPayload,
    ) -> Result<(), AppError> {
        let Some(expected) = expected.filter(|token| !token.is_empty()) else {
            warn!("KOFI_VERIFICATION_TOKEN is not set, accepting Ko-fi event unverified");
            return Ok(());
        };
        let sent = payload.verification_token.as_deref().unwrap_or_default();
        if !secrets_match(sent, expected) {
            warn!("Invalid Ko-fi verification token");
            return Err(AppError::forbidden("Invalid token"));
        }
        Ok(())
    }

    pub fn donation_record(payload: &KofiPayload, message_id: String) -> DonationRecord {
        DonationRecord {
            message_id,
            created_at: payload.timestamp.unwrap_or_else(Utc::now),
            kind: payload.kind.clone(),
            from_name: payload
                .from_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_DONOR.to_string()),
            message: payload.message.clone(),
            amount: payload.amount.unwrap_or_default(),
            currency: payload.currency.clone(),
            url: payload.url.clone(),
            is_public: payload.is_public(),
        }
    }

    /// Verifies the event and records it, keyed by `message_id`.
    #[instrument(skip(state, payload), fields(kind = ?payload.kind))]
    pub async fn handle_kofi(
        state: &AppState,
        payload: KofiPayload,
    ) -> Result<KofiOutcome, AppError> {
        Self::verify_kofi_token(state.integrations.kofi_verification_token.as_deref(), &payload)?;

        let Some(message_id) = payload.message_id.clone().filter(|id| !id.is_empty()) else {
            warn!("Ko-fi payload without message_id, ignoring");
            return Ok(KofiOutcome::Ignored);
        };

        let record = Self::donation_record(&payload, message_id);
        let donation = DonationService::upsert_record(&state.db, &record, "kofi").await?;
        info!(
            amount = donation.amount,
            currency = donation.currency.as_deref().unwrap_or_default(),
            "Ko-fi donation saved"
        );
        state.discord.notify_donation(&donation);
        Ok(KofiOutcome::Recorded(donation))
    }

    /// Accepts any request when no bridge secret is configured.
    pub fn verify_bridge_secret(
        expected: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<(), AppError> {
        let Some(expected) = expected.filter(|secret| !secret.is_empty()) else {
            return Ok(());
        };
        let sent = headers
            .get(BRIDGE_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        match sent {
            Some(sent) if secrets_match(sent, expected) => Ok(()),
            Some(_) => Err(AppError::forbidden("Invalid bridge secret")),
            None => Err(AppError::unauthorized("Missing bridge secret")),
        }
    }
}
