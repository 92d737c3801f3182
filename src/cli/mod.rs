//! Administrative commands behind `crystaltides-cli`.

pub mod seeder;

use anyhow::{Context, anyhow};
use chrono::Utc;
use crystaltides_core::roles::{self, RoleInfo};
use crystaltides_db::{Condition, Database};
use crystaltides_models::users::TABLE;
use crystaltides_models::{Profile, Touched};
use serde::Serialize;
use uuid::Uuid;

pub use seeder::seed_donations;

#[derive(Serialize)]
struct RolePatch<'a> {
    role: &'a str,
}

/// One line per registered role, highest priority first.
pub fn format_role_table(table: &[RoleInfo]) -> Vec<String> {
    let mut lines = vec![format!("{:<12} {:>8}  {}", "ROLE", "PRIORITY", "TIER")];
    lines.extend(table.iter().map(|info| {
        format!(
            "{:<12} {:>8}  {}",
            info.name,
            info.priority,
            format!("{:?}", info.tier).to_lowercase()
        )
    }));
    lines
}

/// Writes `profiles.role` directly, bypassing the hierarchy check.
pub async fn set_role(db: &Database, user_id: Uuid, role: &str) -> anyhow::Result<Profile> {
    let role = roles::normalize_role(role);
    if role.is_empty() {
        return Err(anyhow!("Role must not be empty"));
    }

    let patch = RolePatch { role: &role };
    let profile: Option<Profile> = db
        .update(
            TABLE,
            vec![Condition::eq("id", user_id.to_string())],
            &Touched {
                patch: &patch,
                updated_at: Utc::now(),
            },
        )
        .await
        .context("Failed to update profile")?;

    profile.ok_or_else(|| anyhow!("No profile found for user {user_id}"))
}
