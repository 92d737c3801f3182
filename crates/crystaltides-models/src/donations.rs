//! Donations received through Ko-fi or recorded by hand.

use chrono::{DateTime, Utc};
use crystaltides_core::PaginationParams;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const TABLE: &str = "donations";

/// Default page size of the donation listing.
pub const DEFAULT_LIMIT: i64 = 20;

/// Shown when a donor leaves no name.
pub const ANONYMOUS_DONOR: &str = "Anónimo";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Donation {
    pub id: i64,
    #[serde(default)]
    pub message_id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDonationDto {
    #[serde(default)]
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(length(max = 100))]
    pub from_name: Option<String>,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[validate(email)]
    pub buyer_email: Option<String>,
    /// Backdates historic donations.
    pub created_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDonationDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.01))]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub from_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Row upserted by `message_id` (Ko-fi webhook, seeding).
#[derive(Debug, Clone, Serialize)]
pub struct DonationRecord {
    pub message_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub from_name: String,
    pub message: Option<String>,
    pub amount: f64,
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_public: bool,
}

/// Donation totals of the current and previous calendar month (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    /// Two decimals, e.g. `"42.50"`.
    pub current_month: String,
    pub previous_month: String,
    /// One decimal, e.g. `"-12.5"`.
    pub percent_change: String,
}

impl DonationStats {
    pub fn from_totals(current: f64, previous: f64) -> Self {
        let change = if previous > 0.0 {
            (current - previous) / previous * 100.0
        } else if current > 0.0 {
            100.0
        } else {
            0.0
        };
        Self {
            current_month: format!("{current:.2}"),
            previous_month: format!("{previous:.2}"),
            percent_change: format!("{change:.1}"),
        }
    }
}

impl Default for DonationStats {
    fn default() -> Self {
        Self::from_totals(0.0, 0.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DonationListParams {
    #[serde(flatten)]
    #[validate(nested)]
    pub pagination: PaginationParams,
}
