//! Fake donation history for local development.

use std::time::Instant;

use chrono::{Duration, Utc};
use crystaltides_db::Database;
use crystaltides_models::donations::DonationRecord;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::{Fake, Faker};
use uuid::Uuid;

use crate::modules::donations::service::DonationService;

const CURRENCIES: &[&str] = &["USD", "EUR"];

pub fn fake_donation() -> DonationRecord {
    let is_public: bool = Faker.fake();
    let days_ago: i64 = (0..90).fake();
    let cents: i64 = (100..10_000).fake();

    DonationRecord {
        message_id: Uuid::new_v4().to_string(),
        created_at: Utc::now() - Duration::days(days_ago),
        kind: Some("Donation".to_string()),
        from_name: Name().fake(),
        message: is_public.then(|| Sentence(3..10).fake()),
        amount: cents as f64 / 100.0,
        currency: Some(CURRENCIES[(0..CURRENCIES.len()).fake::<usize>()].to_string()),
        url: None,
        is_public,
    }
}

/// Inserts `count` fake donations and returns how many were written.
pub async fn seed_donations(db: &Database, count: usize) -> anyhow::Result<usize> {
    let start = Instant::now();
    println!("🌱 Seeding {count} donations...");

    for _ in 0..count {
        DonationService::upsert_record(db, &fake_donation(), "seed")
            .await
            .map_err(|e| e.error)?;
    }

    println!("✅ Seeded {count} donations in {:?}", start.elapsed());
    Ok(count)
}
