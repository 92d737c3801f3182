//! Request pipeline stages.
//!
//! - [`auth`]: bearer token verification and the [`auth::AuthUser`] extractor
//! - [`role`]: role-set gates and the two-factor step-up check
//! - [`rate_limit`]: per-IP request quotas
//!
//! Protected routes run `authenticate`, then a role gate, then (for admin
//! routes) `require_two_factor`, then the validating extractor and handler.
//! Each stage either continues or short-circuits with an error envelope.

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};

use crate::state::AppState;

pub mod auth;
pub mod rate_limit;
pub mod role;

/// Who may reach a group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Attaches a principal when a valid token is sent; never rejects.
    Optional,
    Authenticated,
    Staff,
    /// Admin roles, plus the two-factor step-up when enrolled.
    Admin,
}

/// Layers the stages for `access` onto every route currently in `router`.
pub fn protect(router: Router<AppState>, state: &AppState, access: Access) -> Router<AppState> {
    if access == Access::Optional {
        return router.route_layer(from_fn_with_state(state.clone(), auth::optional_authenticate));
    }

    let router = match access {
        Access::Staff => router.route_layer(from_fn(role::require_staff)),
        Access::Admin => router
            .route_layer(from_fn_with_state(state.clone(), role::require_two_factor))
            .route_layer(from_fn(role::require_admin)),
        Access::Optional | Access::Authenticated => router,
    };
    router.route_layer(from_fn_with_state(state.clone(), auth::authenticate))
}
