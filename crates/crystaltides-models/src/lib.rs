//! # CrystalTides Models
//!
//! Entities and request DTOs for the CrystalTides API.
//!
//! Entities mirror the rows of the external store and are lenient about
//! missing optional columns. DTOs derive [`validator::Validate`]; the
//! request validator reports their failures per field (`body.title`).
//!
//! # Modules
//!
//! - [`forum`]: threads and posts
//! - [`rules`], [`policies`], [`wiki`]: editorial content
//! - [`polls`]: polls, options and vote tallies
//! - [`suggestions`], [`tickets`]: community feedback and support
//! - [`donations`]: Ko-fi donations and monthly stats
//! - [`users`]: profiles, role and metadata updates
//! - [`logs`]: audit log
//! - [`webhooks`]: Ko-fi and in-game event payloads
//! - [`two_factor`]: TOTP enrolment
//! - [`translation`]: machine translation requests

pub mod donations;
pub mod forum;
pub mod logs;
pub mod policies;
pub mod polls;
pub mod rules;
pub mod suggestions;
pub mod tickets;
pub mod translation;
pub mod two_factor;
pub mod users;
pub mod webhooks;
pub mod wiki;

pub(crate) mod validation;

pub use donations::{CreateDonationDto, Donation, DonationStats, UpdateDonationDto};
pub use forum::{
    CreatePostDto, CreateThreadDto, ForumPost, ForumThread, UpdatePostDto, UpdateThreadDto,
};
pub use logs::{AuditLog, CreateLogDto, LogListParams, LogSource, NewAuditLog, SecurityAlertDto};
pub use policies::{Policy, UpsertPolicyDto};
pub use polls::{CreatePollDto, Poll, PollOption, PollWithOptions, VoteDto};
pub use rules::{CreateRuleDto, Rule, UpdateRuleDto};
pub use suggestions::{CreateSuggestionDto, Suggestion, SuggestionStatus, UpdateSuggestionStatusDto};
pub use tickets::{
    CreateTicketDto, CreateTicketMessageDto, Ticket, TicketMessage, TicketPriority, TicketStats,
    TicketStatus, UpdateTicketStatusDto,
};
pub use translation::{TranslateDto, TranslationResult};
pub use two_factor::{TwoFactorRecord, TwoFactorStatus};
pub use users::{Profile, UpdateMetadataDto, UpdateProfileDto, UpdateRoleDto};
pub use webhooks::{KofiPayload, MinecraftEventDto};
pub use wiki::{CreateWikiArticleDto, UpdateWikiArticleDto, WikiArticle};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A patch stamped with `updated_at`.
#[derive(Debug, Serialize)]
pub struct Touched<'a, T: Serialize> {
    #[serde(flatten)]
    pub patch: &'a T,
    pub updated_at: DateTime<Utc>,
}

impl<'a, T: Serialize> Touched<'a, T> {
    pub fn now(patch: &'a T) -> Self {
        Self {
            patch,
            updated_at: Utc::now(),
        }
    }
}
