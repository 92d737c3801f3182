use anyhow::anyhow;
use chrono::Utc;
use crystaltides_auth::{AuthenticatedPrincipal, TotpEnrollment, create_admin_token, totp};
use crystaltides_config::AuthConfig;
use crystaltides_core::AppError;
use crystaltides_db::{Condition, Database};
use crystaltides_models::two_factor::{AdminTokenResponse, TABLE};
use crystaltides_models::{TwoFactorRecord, TwoFactorStatus};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::modules::logs::service::LogService;

pub struct TwoFactorService;

impl TwoFactorService {
    async fn record(db: &Database, user_id: Uuid) -> Result<Option<TwoFactorRecord>, AppError> {
        match db.find(TABLE, vec![Condition::eq("user_id", user_id.to_string())]).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_missing_relation() => {
                warn!(error = %e, "two-factor table missing, treating every user as unenrolled");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(
        db: &Database,
        user_id: Uuid,
        secret: Option<String>,
        enabled: bool,
    ) -> Result<(), AppError> {
        let record = TwoFactorRecord {
            user_id,
            secret,
            enabled,
            updated_at: Some(Utc::now()),
        };
        db.upsert::<TwoFactorRecord, _>(TABLE, &record, "user_id").await?;
        Ok(())
    }

    fn invalid_code() -> AppError {
        AppError::bad_request(anyhow!("Invalid 2FA code"))
    }

    /// Whether `user_id` has a confirmed TOTP enrolment.
    #[instrument(skip(db))]
    pub async fn is_enabled(db: &Database, user_id: Uuid) -> Result<bool, AppError> {
        Ok(Self::record(db, user_id)
            .await?
            .is_some_and(|r| r.enabled && r.secret.is_some()))
    }

    /// Whether the admin gate must ask `user_id` for a step-up token. Unlike
    /// [`TwoFactorService::is_enabled`], a missing table denies the request
    /// instead of reading as unenrolled.
    #[instrument(skip(db))]
    pub async fn requires_step_up(db: &Database, user_id: Uuid) -> Result<bool, AppError> {
        match db
            .find::<TwoFactorRecord>(TABLE, vec![Condition::eq("user_id", user_id.to_string())])
            .await
        {
            Ok(record) => Ok(record.is_some_and(|r| r.enabled && r.secret.is_some())),
            Err(e) if e.is_missing_relation() => {
                error!(error = %e, "two-factor table missing, refusing admin access");
                Err(AppError::service_unavailable(
                    "Two-factor enrolment cannot be checked right now",
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn status(db: &Database, user_id: Uuid) -> Result<TwoFactorStatus, AppError> {
        Ok(TwoFactorStatus {
            enabled: Self::is_enabled(db, user_id).await?,
        })
    }

    /// A fresh secret for the caller to scan. Nothing is stored until
    /// [`TwoFactorService::enable`] confirms a code.
    #[instrument(skip(principal, config), fields(user_id = %principal.id))]
    pub fn setup(
        principal: &AuthenticatedPrincipal,
        config: &AuthConfig,
    ) -> Result<TotpEnrollment, AppError> {
        let account = principal.email.as_deref().unwrap_or(&principal.username);
        totp::enrollment(&totp::generate_secret(), &config.two_factor_issuer, account)
            .map_err(|e| e.into_app_error())
    }

    #[instrument(skip(db, principal, secret, code), fields(user_id = %principal.id))]
    pub async fn enable(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        secret: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let valid = totp::verify_code(secret, code)
            .map_err(|_| AppError::bad_request(anyhow!("Invalid 2FA secret")))?;
        if !valid {
            return Err(Self::invalid_code());
        }

        Self::store(db, principal.id, Some(secret.to_string()), true).await?;
        LogService::record_action(db, principal, "ENABLE_2FA", "Two-factor authentication enabled")
            .await;
        Ok(())
    }

    /// Disabling requires a current code from the enrolled authenticator.
    #[instrument(skip(db, principal, code), fields(user_id = %principal.id))]
    pub async fn disable(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        code: &str,
    ) -> Result<(), AppError> {
        let secret = Self::enrolled_secret(db, principal.id).await?;
        if !totp::verify_code(&secret, code).map_err(|e| e.into_app_error())? {
            return Err(Self::invalid_code());
        }

        Self::store(db, principal.id, None, false).await?;
        let details = "Two-factor authentication disabled";
        LogService::record_action(db, principal, "DISABLE_2FA", details).await;
        Ok(())
    }

    /// Checks a code and mints the step-up token admin routes expect.
    #[instrument(skip(db, principal, config, code), fields(user_id = %principal.id))]
    pub async fn verify(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        config: &AuthConfig,
        code: &str,
    ) -> Result<AdminTokenResponse, AppError> {
        let secret = Self::enrolled_secret(db, principal.id).await?;
        if !totp::verify_code(&secret, code).map_err(|e| e.into_app_error())? {
            warn!(user_id = %principal.id, "Rejected 2FA code");
            return Err(Self::invalid_code());
        }

        let admin_token = create_admin_token(principal.id, &principal.role, config)
            .map_err(|e| e.into_app_error())?;
        Ok(AdminTokenResponse {
            admin_token,
            expires_in: config.admin_token_expiry,
        })
    }

    async fn enrolled_secret(db: &Database, user_id: Uuid) -> Result<String, AppError> {
        Self::record(db, user_id)
            .await?
            .filter(|r| r.enabled)
            .and_then(|r| r.secret)
            .ok_or_else(|| AppError::bad_request(anyhow!("2FA is not enabled for this account")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use crystaltides_auth::verify_admin_token;
    use crystaltides_db::MemoryStore;

    fn principal() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(7),
            email: Some("admin@crystaltides.net".to_string()),
            username: "Admin".to_string(),
            role: "admin".to_string(),
            minecraft_uuid: None,
        }
    }

    fn config() -> AuthConfig {
        AuthConfig::with_secrets("jwt-secret", "admin-secret")
    }

    #[tokio::test]
    async fn test_enable_then_verify_mints_admin_token() {
        let db = Database::memory();
        let user = principal();
        assert!(!TwoFactorService::is_enabled(&db, user.id).await.unwrap());

        let enrollment = TwoFactorService::setup(&user, &config()).unwrap();
        assert!(enrollment.otpauth_url.starts_with("otpauth://totp/"));

        let code = totp::current_code(&enrollment.secret).unwrap();
        TwoFactorService::enable(&db, &user, &enrollment.secret, &code).await.unwrap();
        assert!(TwoFactorService::is_enabled(&db, user.id).await.unwrap());

        let response = TwoFactorService::verify(&db, &user, &config(), &code).await.unwrap();
        assert_eq!(response.expires_in, 3600);
        assert!(verify_admin_token(&response.admin_token, user.id, &config()).is_ok());
    }

    #[tokio::test]
    async fn test_verify_without_enrolment_is_rejected() {
        let db = Database::memory();
        let err = TwoFactorService::verify(&db, &principal(), &config(), "123456")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_code_is_rejected() {
        let db = Database::memory();
        let secret = totp::generate_secret();
        let err = TwoFactorService::enable(&db, &principal(), &secret, "12ab56")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!TwoFactorService::is_enabled(&db, principal().id).await.unwrap());
    }

    #[tokio::test]
    async fn test_disable_clears_enrolment() {
        let db = Database::memory();
        let user = principal();
        let secret = totp::generate_secret();
        let code = totp::current_code(&secret).unwrap();
        TwoFactorService::enable(&db, &user, &secret, &code).await.unwrap();

        TwoFactorService::disable(&db, &user, &code).await.unwrap();
        assert!(!TwoFactorService::status(&db, user.id).await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_missing_table_means_not_enrolled() {
        let db = Database::new(Arc::new(MemoryStore::new().without_table(TABLE)));
        assert!(!TwoFactorService::is_enabled(&db, Uuid::from_u128(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_table_closes_the_admin_gate() {
        let db = Database::new(Arc::new(MemoryStore::new().without_table(TABLE)));
        let err = TwoFactorService::requires_step_up(&db, Uuid::from_u128(1))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_step_up_follows_enrolment() {
        let db = Database::memory();
        let user = principal();
        assert!(!TwoFactorService::requires_step_up(&db, user.id).await.unwrap());

        let secret = totp::generate_secret();
        let code = totp::current_code(&secret).unwrap();
        TwoFactorService::enable(&db, &user, &secret, &code).await.unwrap();
        assert!(TwoFactorService::requires_step_up(&db, user.id).await.unwrap());
    }
}
