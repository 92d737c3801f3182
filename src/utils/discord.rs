//! Discord webhook announcements.
//!
//! Every notification is fire-and-forget: the request is sent from a spawned
//! task and failures are only logged. A notification whose webhook is not
//! configured is skipped.

use chrono::Utc;
use crystaltides_config::IntegrationsConfig;
use crystaltides_models::donations::ANONYMOUS_DONOR;
use crystaltides_models::{Donation, ForumThread, MinecraftEventDto};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

const THREAD_COLOR: u32 = 0x6DA5C0;
const GAME_EVENT_COLOR: u32 = 0x4CAF50;
const DONATION_COLOR: u32 = 0xFF5E5B;

#[derive(Clone, Debug)]
pub struct DiscordNotifier {
    client: reqwest::Client,
    forum_webhook: Option<String>,
    events_webhook: Option<String>,
    donations_webhook: Option<String>,
    frontend_url: String,
}

impl DiscordNotifier {
    pub fn new(client: reqwest::Client, config: &IntegrationsConfig) -> Self {
        Self {
            client,
            forum_webhook: config.discord_forum_webhook.clone(),
            events_webhook: config.discord_events_webhook.clone(),
            donations_webhook: config.discord_donations_webhook.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub fn notify_new_thread(&self, thread: &ForumThread) {
        let embed = thread_embed(thread, &self.frontend_url);
        self.dispatch("forum", self.forum_webhook.as_deref(), embed);
    }

    pub fn notify_game_event(&self, event: &MinecraftEventDto) {
        self.dispatch("game_event", self.events_webhook.as_deref(), game_event_embed(event));
    }

    pub fn notify_donation(&self, donation: &Donation) {
        if !donation.is_public {
            return;
        }
        self.dispatch("donation", self.donations_webhook.as_deref(), donation_embed(donation));
    }

    fn dispatch(&self, kind: &'static str, webhook: Option<&str>, payload: Value) {
        let Some(url) = webhook else {
            debug!(kind, "Discord webhook not configured, skipping announcement");
            return;
        };

        let request = self.client.post(url).json(&payload);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    warn!(kind, %status, "Discord webhook rejected announcement");
                }
                Ok(_) => debug!(kind, "Discord announcement sent"),
                Err(e) => error!(kind, error = %e, "Failed to send Discord announcement"),
            }
        });
    }
}

pub fn thread_embed(thread: &ForumThread, frontend_url: &str) -> Value {
    json!({
        "embeds": [{
            "title": format!("📌 Nuevo Tema: {}", thread.title),
            "description": thread.preview(),
            "url": format!("{frontend_url}/forum/thread/topic/{}", thread.id),
            "color": THREAD_COLOR,
            "author": {
                "name": thread.author_name,
                "icon_url": thread.author_avatar,
            },
            "timestamp": Utc::now().to_rfc3339(),
        }]
    })
}

pub fn game_event_embed(event: &MinecraftEventDto) -> Value {
    json!({
        "embeds": [{
            "title": format!("🎮 Evento In-Game: {}", event.event),
            "description": format!("**{}** {}", event.player, event.details),
            "color": GAME_EVENT_COLOR,
            "timestamp": Utc::now().to_rfc3339(),
        }]
    })
}

pub fn donation_embed(donation: &Donation) -> Value {
    let donor = donation.from_name.as_deref().unwrap_or(ANONYMOUS_DONOR);
    let currency = donation.currency.as_deref().unwrap_or("EUR");
    json!({
        "embeds": [{
            "title": format!("☕ Nueva donación de {donor}"),
            "description": donation.message.clone().unwrap_or_default(),
            "color": DONATION_COLOR,
            "fields": [{
                "name": "Cantidad",
                "value": format!("{:.2} {currency}", donation.amount),
                "inline": true
            }],
            "timestamp": donation.created_at.to_rfc3339(),
        }]
    })
}
