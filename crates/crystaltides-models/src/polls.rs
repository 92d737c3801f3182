//! Polls, their options and vote tallies.
//!
//! A poll without a `thread_id` is global; creating one deactivates the
//! previous global polls. Thread polls are independent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const POLLS_TABLE: &str = "polls";
pub const OPTIONS_TABLE: &str = "poll_options";

/// Default page size of the poll listing.
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    pub question: String,
    #[serde(default)]
    pub question_en: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thread_id: Option<i64>,
    #[serde(default)]
    pub discord_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Active and not past its closing time.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.closes_at.is_none_or(|closes| closes > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub label: String,
    #[serde(default)]
    pub label_en: Option<String>,
    #[serde(default)]
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollOptionResult {
    #[serde(flatten)]
    pub option: PollOption,
    /// Rounded share of all votes, 0 when nobody voted.
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollWithOptions {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOptionResult>,
    #[serde(rename = "totalVotes")]
    pub total_votes: i64,
}

impl PollWithOptions {
    pub fn tally(poll: Poll, options: Vec<PollOption>) -> Self {
        let total_votes: i64 = options.iter().map(|o| o.votes.max(0)).sum();
        let options = options
            .into_iter()
            .map(|option| {
                let percent = if total_votes == 0 {
                    0
                } else {
                    ((option.votes.max(0) as f64 / total_votes as f64) * 100.0).round() as i64
                };
                PollOptionResult { option, percent }
            })
            .collect();
        Self {
            poll,
            options,
            total_votes,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollSummary {
    #[serde(flatten)]
    pub poll: Poll,
    #[serde(rename = "totalVotes")]
    pub total_votes: i64,
}

/// An option given either as a bare label or with its English label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PollOptionInput {
    Label(String),
    Labeled {
        label: String,
        label_en: Option<String>,
    },
}

impl PollOptionInput {
    pub fn label(&self) -> &str {
        match self {
            PollOptionInput::Label(label) | PollOptionInput::Labeled { label, .. } => label,
        }
    }

    pub fn label_en(&self) -> Option<&str> {
        match self {
            PollOptionInput::Label(_) => None,
            PollOptionInput::Labeled { label_en, .. } => label_en.as_deref(),
        }
    }
}

fn option_labels(options: &[PollOptionInput]) -> Result<(), ValidationError> {
    if options
        .iter()
        .any(|o| o.label().trim().is_empty() || o.label().chars().count() > 200)
    {
        let mut err = ValidationError::new("options");
        err.message = Some("every option needs a label of at most 200 characters".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePollDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    pub title_en: Option<String>,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 500,
        message = "question must be between 1 and 500 characters"
    ))]
    pub question: String,
    pub question_en: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 2, max = 10, message = "a poll needs between 2 and 10 options"),
        custom(function = "option_labels")
    )]
    pub options: Vec<PollOptionInput>,
    pub closes_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub thread_id: Option<i64>,
    #[validate(url)]
    pub discord_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewPoll<'a> {
    pub title: &'a str,
    pub title_en: Option<String>,
    pub question: &'a str,
    pub question_en: Option<String>,
    pub is_active: bool,
    pub closes_at: Option<DateTime<Utc>>,
    pub thread_id: Option<i64>,
    pub discord_link: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct NewPollOption<'a> {
    pub poll_id: i64,
    pub label: &'a str,
    pub label_en: Option<String>,
    pub votes: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VoteDto {
    #[serde(default)]
    #[validate(range(min = 1, message = "option_id is required"))]
    pub option_id: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoteResult {
    pub option_id: i64,
    pub votes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn poll(is_active: bool, closes_at: Option<DateTime<Utc>>) -> Poll {
        Poll {
            id: 1,
            title: "Next event".into(),
            title_en: None,
            question: "Which biome?".into(),
            question_en: None,
            is_active,
            closes_at,
            thread_id: None,
            discord_link: None,
            created_at: Utc::now(),
        }
    }

    fn option(id: i64, votes: i64) -> PollOption {
        PollOption {
            id,
            poll_id: 1,
            label: format!("option {id}"),
            label_en: None,
            votes,
        }
    }

    #[test]
    fn test_tally_percentages() {
        let tallied = PollWithOptions::tally(poll(true, None), vec![option(1, 1), option(2, 2)]);
        assert_eq!(tallied.total_votes, 3);
        assert_eq!(tallied.options[0].percent, 33);
        assert_eq!(tallied.options[1].percent, 67);

        let value = serde_json::to_value(&tallied).unwrap();
        assert_eq!(value["totalVotes"], 3);
        assert_eq!(value["options"][1]["label"], "option 2");
        assert_eq!(value["title"], "Next event");
    }

    #[test]
    fn test_tally_without_votes() {
        let tallied = PollWithOptions::tally(poll(true, None), vec![option(1, 0), option(2, 0)]);
        assert_eq!(tallied.total_votes, 0);
        assert!(tallied.options.iter().all(|o| o.percent == 0));
    }

    #[test]
    fn test_is_open() {
        let now = Utc::now();
        assert!(poll(true, None).is_open_at(now));
        assert!(!poll(false, None).is_open_at(now));
        assert!(!poll(true, Some(now - chrono::Duration::hours(1))).is_open_at(now));
        assert!(poll(true, Some(now + chrono::Duration::hours(1))).is_open_at(now));
    }

    #[test]
    fn test_create_poll_options() {
        let dto: CreatePollDto = serde_json::from_value(json!({
            "title": "Next event",
            "question": "Which biome?",
            "options": ["Desert", { "label": "Jungle", "label_en": "Jungle" }]
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.options[1].label_en(), Some("Jungle"));

        let dto: CreatePollDto = serde_json::from_value(json!({
            "title": "Next event",
            "question": "Which biome?",
            "options": ["Desert"]
        }))
        .unwrap();
        assert!(dto.validate().unwrap_err().field_errors().contains_key("options"));

        let dto: CreatePollDto = serde_json::from_value(json!({
            "title": "Next event",
            "question": "Which biome?",
            "options": ["Desert", " "]
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
