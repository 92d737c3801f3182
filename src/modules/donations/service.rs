use anyhow::anyhow;
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::{AppError, PaginationMeta};
use crystaltides_db::{Condition, Database, Direction, SelectQuery, StoreError};
use crystaltides_models::donations::{
    ANONYMOUS_DONOR, DEFAULT_LIMIT, DonationListParams, DonationRecord, TABLE,
};
use crystaltides_models::{CreateDonationDto, Donation, DonationStats, UpdateDonationDto};
use tracing::{info, instrument, warn};

use crate::metrics::track_donation_recorded;
use crate::modules::logs::service::LogService;

pub struct DonationService;

/// Hides what the public listing must not show.
fn redact(mut donation: Donation) -> Donation {
    donation.buyer_email = None;
    if !donation.is_public {
        donation.from_name = Some(ANONYMOUS_DONOR.to_string());
        donation.message = None;
    }
    donation
}

fn month_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    let first = date.with_day(1)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&first))
}

/// Totals for the month of `now` and the month before it.
pub fn monthly_totals(donations: &[Donation], now: DateTime<Utc>) -> (f64, f64) {
    let Some(current_start) = month_start(now.date_naive()) else {
        return (0.0, 0.0);
    };
    let previous_start = current_start
        .checked_sub_months(Months::new(1))
        .unwrap_or(current_start);

    donations.iter().fold((0.0, 0.0), |(current, previous), d| {
        if d.created_at >= current_start {
            (current + d.amount, previous)
        } else if d.created_at >= previous_start {
            (current, previous + d.amount)
        } else {
            (current, previous)
        }
    })
}

impl DonationService {
    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &DonationListParams,
    ) -> Result<(Vec<Donation>, PaginationMeta), AppError> {
        let page = params.pagination.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter_opt(
                params
                    .pagination
                    .search()
                    .map(|term| Condition::search(&["from_name"], term)),
            )
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (rows, total) = db.list_or_empty::<Donation>(TABLE, &query).await?;
        Ok((rows.into_iter().map(redact).collect(), page.meta(total)))
    }

    /// This month against last month. A missing table reads as zeros.
    #[instrument(skip(db))]
    pub async fn stats(db: &Database) -> Result<DonationStats, AppError> {
        let now = Utc::now();
        let since = month_start(now.date_naive())
            .and_then(|start| start.checked_sub_months(Months::new(1)))
            .ok_or_else(|| AppError::internal_error("Could not compute the stats window"))?;

        let query = SelectQuery::new().filter(Condition::gte("created_at", since.to_rfc3339()));
        match db.list::<Donation>(TABLE, &query).await {
            Ok((rows, _)) => {
                let (current, previous) = monthly_totals(&rows, now);
                Ok(DonationStats::from_totals(current, previous))
            }
            Err(StoreError::MissingRelation(relation)) => {
                warn!(%relation, "donations table missing, returning default stats");
                Ok(DonationStats::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn create(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: CreateDonationDto,
    ) -> Result<Donation, AppError> {
        let dto = CreateDonationDto {
            created_at: Some(dto.created_at.unwrap_or_else(Utc::now)),
            ..dto
        };
        let donation: Donation = db.insert(TABLE, &dto).await?;

        track_donation_recorded("manual");
        LogService::record_action(
            db,
            principal,
            "CREATE_DONATION",
            format!("Donation ID: {} ({:.2})", donation.id, donation.amount),
        )
        .await;
        Ok(donation)
    }

    /// Inserts or refreshes a donation keyed by its external `message_id`.
    #[instrument(skip(db, record), fields(message_id = %record.message_id))]
    pub async fn upsert_record(
        db: &Database,
        record: &DonationRecord,
        source: &'static str,
    ) -> Result<Donation, AppError> {
        let donation: Donation = db.upsert(TABLE, record, "message_id").await?;
        info!(donation_id = donation.id, source, "Donation recorded");
        track_donation_recorded(source);
        Ok(donation)
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
        dto: UpdateDonationDto,
    ) -> Result<Donation, AppError> {
        let donation: Donation = db
            .update_by_id(TABLE, id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Donation not found")))?;
        LogService::record_action(db, principal, "UPDATE_DONATION", format!("Donation ID: {id}"))
            .await;
        Ok(donation)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        id: i64,
    ) -> Result<(), AppError> {
        if !db.delete_by_id(TABLE, id).await? {
            return Err(AppError::not_found(anyhow!("Donation not found")));
        }
        LogService::record_action(db, principal, "DELETE_DONATION", format!("Donation ID: {id}"))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crystaltides_db::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn admin() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(4),
            email: None,
            username: "Admin".to_string(),
            role: "admin".to_string(),
            minecraft_uuid: None,
        }
    }

    fn donation(amount: f64, created_at: &str) -> Donation {
        serde_json::from_value(json!({ "id": 1, "amount": amount, "created_at": created_at }))
            .unwrap()
    }

    #[test]
    fn test_monthly_totals_buckets() {
        let now: DateTime<Utc> = "2026-03-15T12:00:00Z".parse().unwrap();
        let rows = [
            donation(10.0, "2026-03-01T00:00:00Z"),
            donation(5.5, "2026-03-14T23:00:00Z"),
            donation(20.0, "2026-02-28T23:59:59Z"),
            donation(99.0, "2026-01-31T10:00:00Z"),
        ];
        assert_eq!(monthly_totals(&rows, now), (15.5, 20.0));
    }

    #[test]
    fn test_monthly_totals_across_year() {
        let now: DateTime<Utc> = "2026-01-05T00:00:00Z".parse().unwrap();
        let rows = [donation(3.0, "2025-12-24T00:00:00Z"), donation(4.0, "2026-01-02T00:00:00Z")];
        assert_eq!(monthly_totals(&rows, now), (4.0, 3.0));
    }

    #[tokio::test]
    async fn test_stats_without_table() {
        let db = Database::new(Arc::new(MemoryStore::new().without_table(TABLE)));
        assert_eq!(DonationService::stats(&db).await.unwrap(), DonationStats::default());
    }

    #[tokio::test]
    async fn test_paginates_and_redacts() {
        let db = Database::memory();
        for i in 0..45 {
            let dto: CreateDonationDto = serde_json::from_value(json!({
                "amount": 1.0 + i as f64,
                "from_name": format!("Donor {i}"),
                "buyer_email": "donor@example.com",
                "is_public": i != 0,
            }))
            .unwrap();
            DonationService::create(&db, &admin(), dto).await.unwrap();
        }

        let params: DonationListParams =
            serde_json::from_value(json!({ "page": 3, "limit": 20 })).unwrap();
        let (rows, meta) = DonationService::list(&db, &params).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(meta.total_pages, 3);
        assert!(rows.iter().all(|d| d.buyer_email.is_none()));

        let all: DonationListParams = serde_json::from_value(json!({ "limit": 100 })).unwrap();
        let (rows, _) = DonationService::list(&db, &all).await.unwrap();
        let hidden: Vec<_> = rows.iter().filter(|d| !d.is_public).collect();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].from_name.as_deref(), Some(ANONYMOUS_DONOR));
    }

    #[tokio::test]
    async fn test_upsert_by_message_id() {
        let db = Database::memory();
        let mut record = DonationRecord {
            message_id: "kofi-1".to_string(),
            created_at: Utc::now(),
            kind: Some("Donation".to_string()),
            from_name: "Jo".to_string(),
            message: None,
            amount: 3.0,
            currency: Some("USD".to_string()),
            url: None,
            is_public: true,
        };
        let first = DonationService::upsert_record(&db, &record, "kofi").await.unwrap();
        record.amount = 5.0;
        let second = DonationService::upsert_record(&db, &record, "kofi").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, 5.0);
        assert_eq!(db.count(TABLE, vec![]).await.unwrap(), 1);
    }
}
