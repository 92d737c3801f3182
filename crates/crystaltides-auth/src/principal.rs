//! The per-request authenticated identity.

use crystaltides_core::roles::{self, DEFAULT_ROLE, RoleSet};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AuthError;
use crate::claims::AccessTokenClaims;

/// Provider roles that never count as application roles.
const PROVIDER_ROLES: &[&str] = &["authenticated", "anon", "service_role"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedPrincipal {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: String,
    /// Lower-cased application role.
    pub role: String,
    pub minecraft_uuid: Option<String>,
}

fn application_role(candidate: Option<&str>) -> Option<String> {
    candidate
        .map(roles::normalize_role)
        .filter(|role| !role.is_empty() && !PROVIDER_ROLES.contains(&role.as_str()))
}

impl AuthenticatedPrincipal {
    /// Derives the principal from verified claims.
    ///
    /// The role comes from `app_metadata.role`, then `user_metadata.role`,
    /// else `user`. The username comes from `user_metadata.username`, then
    /// `full_name`, then the local part of the email.
    pub fn from_claims(claims: &AccessTokenClaims) -> Result<Self, AuthError> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidSubject)?;

        let role = application_role(claims.app_metadata.role.as_deref())
            .or_else(|| application_role(claims.user_metadata.role.as_deref()))
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        let username = [
            claims.user_metadata.username.as_deref(),
            claims.user_metadata.full_name.as_deref(),
            claims
                .email
                .as_deref()
                .and_then(|email| email.split('@').next()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or("user")
        .to_string();

        Ok(Self {
            id,
            email: claims.email.clone(),
            username,
            role,
            minecraft_uuid: claims.user_metadata.minecraft_uuid.clone(),
        })
    }

    /// Replaces the role, normalizing case.
    pub fn set_role(&mut self, role: &str) {
        if let Some(role) = application_role(Some(role)) {
            self.role = role;
        }
    }

    pub fn priority(&self) -> u8 {
        roles::role_priority(Some(&self.role))
    }

    pub fn is_admin(&self) -> bool {
        RoleSet::Admin.contains(&self.role)
    }

    pub fn is_staff(&self) -> bool {
        RoleSet::Staff.contains(&self.role)
    }

    pub fn in_set(&self, set: RoleSet) -> bool {
        set.contains(&self.role)
    }
}
