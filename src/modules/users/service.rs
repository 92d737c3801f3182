use anyhow::anyhow;
use chrono::Utc;
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::roles::{self, MAX_PRIORITY, STAFF_ROLES};
use crystaltides_core::{AppError, PaginationMeta};
use crystaltides_db::{Condition, Database, Direction, SelectQuery};
use crystaltides_models::users::{CurrentUser, TABLE, UserListParams, UserMetadataPatch};
use crystaltides_models::{Profile, Touched, UpdateProfileDto};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::logs::service::LogService;
use crate::modules::two_factor::service::TwoFactorService;

const DEFAULT_LIMIT: i64 = 20;

#[derive(Serialize)]
struct RolePatch<'a> {
    role: &'a str,
}

#[derive(Serialize)]
struct MetadataPatch {
    metadata: Value,
}

/// Whether a requester at `requester` may move a user at `target` to `new_role`.
///
/// Nobody grants a role above their own, and only the top priority may edit a
/// peer or superior.
pub fn check_role_change(requester: u8, target: u8, new_role: u8) -> Result<(), AppError> {
    if new_role > requester {
        return Err(AppError::forbidden(
            "You cannot assign a role above your own",
        ));
    }
    if target >= requester && requester < MAX_PRIORITY {
        return Err(AppError::forbidden(
            "You cannot modify a user with equal or higher authority",
        ));
    }
    Ok(())
}

/// Overlays the patch onto the stored metadata object, keeping other keys.
pub fn merge_metadata(current: Option<Value>, patch: &UserMetadataPatch) -> Value {
    let mut merged = match current {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Some(medals) = &patch.medals {
        merged.insert("medals".to_string(), Value::from(medals.clone()));
    }
    if let Some(achievements) = &patch.achievements {
        merged.insert("achievements".to_string(), Value::Array(achievements.clone()));
    }
    Value::Object(merged)
}

pub struct UserService;

impl UserService {
    async fn profile(db: &Database, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(db
            .find(TABLE, vec![Condition::eq("id", id.to_string())])
            .await?)
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn current_user(
        db: &Database,
        principal: &AuthenticatedPrincipal,
    ) -> Result<CurrentUser, AppError> {
        let two_factor_enabled = TwoFactorService::is_enabled(db, principal.id).await?;
        Ok(CurrentUser {
            id: principal.id,
            email: principal.email.clone(),
            username: principal.username.clone(),
            role: principal.role.clone(),
            minecraft_uuid: principal.minecraft_uuid.clone(),
            priority: principal.priority(),
            tier: roles::role_tier(&principal.role),
            is_admin: principal.is_admin(),
            is_staff: principal.is_staff(),
            two_factor_enabled,
        })
    }

    #[instrument(skip(db, principal, dto), fields(user_id = %principal.id))]
    pub async fn update_profile(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        dto: UpdateProfileDto,
    ) -> Result<Profile, AppError> {
        if dto.is_empty() {
            return Err(AppError::bad_request(anyhow!("No fields to update")));
        }

        if let Some(username) = dto.username.as_deref() {
            let taken = db
                .count(
                    TABLE,
                    vec![
                        Condition::eq("username", username),
                        Condition::neq("id", principal.id.to_string()),
                    ],
                )
                .await?;
            if taken > 0 {
                return Err(AppError::conflict(anyhow!("Username is already taken")));
            }
        }

        db.update(
            TABLE,
            vec![Condition::eq("id", principal.id.to_string())],
            &Touched::now(&dto),
        )
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Profile not found")))
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &Database,
        params: &UserListParams,
    ) -> Result<(Vec<Profile>, PaginationMeta), AppError> {
        let page = params.pagination.resolve(DEFAULT_LIMIT);
        let query = SelectQuery::new()
            .filter_opt(params.pagination.search().map(|term| {
                Condition::search(&["username", "full_name", "minecraft_nick"], term)
            }))
            .order_by("created_at", Direction::Desc)
            .range(page.offset(), page.limit);

        let (users, total) = db.list(TABLE, &query).await?;
        Ok((users, page.meta(total)))
    }

    /// Profiles holding a staff role, highest priority first.
    #[instrument(skip(db))]
    pub async fn staff(db: &Database) -> Result<Vec<Profile>, AppError> {
        let query = SelectQuery::new()
            .filter(Condition::is_in("role", STAFF_ROLES.iter().copied()))
            .order_by("username", Direction::Asc);
        let (mut staff, _) = db.list_or_empty::<Profile>(TABLE, &query).await?;
        staff.sort_by_key(|profile| {
            std::cmp::Reverse(roles::role_priority(profile.role.as_deref()))
        });
        Ok(staff)
    }

    #[instrument(skip(db))]
    pub async fn public_profile(db: &Database, username: &str) -> Result<Profile, AppError> {
        db.find(TABLE, vec![Condition::eq("username", username)])
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db, principal), fields(user_id = %principal.id))]
    pub async fn update_role(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        target_id: Uuid,
        role: &str,
    ) -> Result<Profile, AppError> {
        let role = roles::normalize_role(role);
        let target = Self::profile(db, target_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Target user not found")))?;

        check_role_change(
            principal.priority(),
            roles::role_priority(target.role.as_deref()),
            roles::role_priority(Some(&role)),
        )?;

        let updated: Profile = db
            .update(
                TABLE,
                vec![Condition::eq("id", target_id.to_string())],
                &Touched::now(&RolePatch { role: &role }),
            )
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Target user not found")))?;

        info!(target = %target_id, %role, "Role updated");
        LogService::record_action(
            db,
            principal,
            "UPDATE_ROLE",
            format!("Updated user {target_id} role to {role}"),
        )
        .await;
        Ok(updated)
    }

    #[instrument(skip(db, principal, patch), fields(user_id = %principal.id))]
    pub async fn update_metadata(
        db: &Database,
        principal: &AuthenticatedPrincipal,
        target_id: Uuid,
        patch: &UserMetadataPatch,
    ) -> Result<Profile, AppError> {
        let target = Self::profile(db, target_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Target user not found")))?;

        let metadata = merge_metadata(target.metadata, patch);
        let updated: Profile = db
            .update(
                TABLE,
                vec![Condition::eq("id", target_id.to_string())],
                &Touched {
                    patch: &MetadataPatch { metadata },
                    updated_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Target user not found")))?;

        LogService::record_action(
            db,
            principal,
            "UPDATE_METADATA",
            format!("Updated user {target_id} metadata"),
        )
        .await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crystaltides_models::logs;
    use serde_json::json;

    fn principal(role: &str) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            id: Uuid::from_u128(1),
            email: None,
            username: "Requester".to_string(),
            role: role.to_string(),
            minecraft_uuid: None,
        }
    }

    async fn seed(db: &Database, id: u128, username: &str, role: &str) {
        db.insert::<Profile, _>(
            TABLE,
            &json!({ "id": Uuid::from_u128(id), "username": username, "role": role }),
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_role_change_hierarchy() {
        // developer (90) promoting a user to admin (80)
        assert!(check_role_change(90, 0, 80).is_ok());
        // admin (80) cannot grant developer (90)
        assert_eq!(check_role_change(80, 0, 90).unwrap_err().status, StatusCode::FORBIDDEN);
        // developer cannot edit another developer
        assert_eq!(check_role_change(90, 90, 0).unwrap_err().status, StatusCode::FORBIDDEN);
        // the top priority may edit peers
        assert!(check_role_change(100, 100, 0).is_ok());
    }

    #[test]
    fn test_merge_metadata_keeps_other_keys() {
        let patch = UserMetadataPatch {
            medals: Some(vec![1, 2]),
            achievements: None,
        };
        let merged = merge_metadata(Some(json!({ "badge": "beta", "medals": [9] })), &patch);
        assert_eq!(merged, json!({ "badge": "beta", "medals": [1, 2] }));
        assert_eq!(merge_metadata(None, &patch), json!({ "medals": [1, 2] }));
    }

    #[tokio::test]
    async fn test_update_role_writes_and_audits() {
        let db = Database::memory();
        seed(&db, 2, "Steve", "user").await;

        let developer = principal("developer");
        let updated = UserService::update_role(&db, &developer, Uuid::from_u128(2), "Admin")
            .await
            .unwrap();
        assert_eq!(updated.role.as_deref(), Some("admin"));

        let (logs, _) = db
            .list::<crystaltides_models::AuditLog>(logs::TABLE, &SelectQuery::new())
            .await
            .unwrap();
        assert_eq!(logs[0].action, "UPDATE_ROLE");
    }

    #[tokio::test]
    async fn test_update_role_refuses_peer_and_missing_target() {
        let db = Database::memory();
        seed(&db, 2, "Dev", "developer").await;

        let err = UserService::update_role(&db, &principal("developer"), Uuid::from_u128(2), "user")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = UserService::update_role(&db, &principal("neroferno"), Uuid::from_u128(9), "user")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_staff_sorted_by_priority() {
        let db = Database::memory();
        seed(&db, 2, "Helper", "helper").await;
        seed(&db, 3, "Player", "user").await;
        seed(&db, 4, "Owner", "neroferno").await;
        seed(&db, 5, "Mod", "moderator").await;

        let staff = UserService::staff(&db).await.unwrap();
        let names: Vec<_> = staff.iter().filter_map(|p| p.username.as_deref()).collect();
        assert_eq!(names, vec!["Owner", "Mod", "Helper"]);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_username() {
        let db = Database::memory();
        seed(&db, 1, "Requester", "user").await;
        seed(&db, 2, "Steve", "user").await;

        let dto = UpdateProfileDto {
            username: Some("Steve".to_string()),
            ..Default::default()
        };
        let err = UserService::update_profile(&db, &principal("user"), dto)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let dto = UpdateProfileDto {
            bio: Some("Builder".to_string()),
            ..Default::default()
        };
        let profile = UserService::update_profile(&db, &principal("user"), dto)
            .await
            .unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Builder"));

        let err = UserService::update_profile(&db, &principal("user"), UpdateProfileDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
