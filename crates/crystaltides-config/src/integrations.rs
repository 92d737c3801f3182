//! Outbound and inbound integration endpoints.
//!
//! Every value is optional: a missing Discord webhook skips the notification,
//! a missing translation endpoint returns the original text, and a missing
//! Ko-fi token makes the donation webhook answer 500.

use crate::env_opt;

#[derive(Clone, Debug, Default)]
pub struct IntegrationsConfig {
    pub discord_forum_webhook: Option<String>,
    pub discord_events_webhook: Option<String>,
    pub discord_donations_webhook: Option<String>,
    pub kofi_verification_token: Option<String>,
    /// Shared secret expected in `x-bridge-secret` from the game server.
    pub bridge_secret: Option<String>,
    pub translation_api_url: Option<String>,
    pub translation_api_key: Option<String>,
    pub frontend_url: String,
}

impl IntegrationsConfig {
    pub fn from_env() -> Self {
        Self {
            discord_forum_webhook: env_opt("DISCORD_FORUM_WEBHOOK"),
            discord_events_webhook: env_opt("DISCORD_MC_EVENTS_WEBHOOK"),
            discord_donations_webhook: env_opt("DISCORD_DONATIONS_WEBHOOK"),
            kofi_verification_token: env_opt("KOFI_VERIFICATION_TOKEN"),
            bridge_secret: env_opt("BRIDGE_SECRET"),
            translation_api_url: env_opt("TRANSLATION_API_URL"),
            translation_api_key: env_opt("TRANSLATION_API_KEY"),
            frontend_url: env_opt("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        }
    }
}
