//! Role-based authorization.
//!
//! These stages run after [`authenticate`](crate::middleware::auth::authenticate)
//! has attached an [`AuthenticatedPrincipal`] to the request. They never
//! verify credentials themselves:
//!
//! ```rust,ignore
//! let admin_routes = Router::new()
//!     .route("/", post(create_rule))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_two_factor))
//!     .route_layer(middleware::from_fn(require_admin))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));
//! ```
//!
//! Route layers run outermost-last, so the listing above authenticates, then
//! checks the role, then the two-factor step-up.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use crystaltides_auth::{AuthenticatedPrincipal, verify_admin_token};
use crystaltides_core::errors::codes;
use crystaltides_core::{AppError, RoleSet};

use crate::metrics::track_authorization_denied;
use crate::modules::two_factor::service::TwoFactorService;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admits `principal` when its role belongs to `allowed`.
///
/// No principal is a 401; a role outside the set is a 403.
pub fn authorize(
    principal: Option<&AuthenticatedPrincipal>,
    allowed: RoleSet,
) -> Result<(), AppError> {
    let Some(principal) = principal else {
        return Err(AppError::unauthorized("Authentication required"));
    };

    if principal.in_set(allowed) {
        return Ok(());
    }

    track_authorization_denied(allowed.name(), &principal.role);
    tracing::warn!(
        user_id = %principal.id,
        role = %principal.role,
        required = allowed.name(),
        "Authorization denied"
    );
    Err(AppError::forbidden("Insufficient permissions"))
}

pub async fn require_roles(
    req: Request,
    next: Next,
    allowed: RoleSet,
) -> Result<Response, AppError> {
    authorize(req.extensions().get::<AuthenticatedPrincipal>(), allowed)?;
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    match require_roles(req, next, RoleSet::Admin).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub async fn require_staff(req: Request, next: Next) -> Response {
    match require_roles(req, next, RoleSet::Staff).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn two_factor_required(message: &str) -> AppError {
    AppError::forbidden(message.to_string()).with_code(codes::TWO_FACTOR_REQUIRED)
}

/// Checks the step-up token of a principal with two-factor enabled.
pub fn check_admin_token(
    headers: &HeaderMap,
    principal: &AuthenticatedPrincipal,
    state: &AppState,
) -> Result<(), AppError> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| two_factor_required("2FA verification required"))?;

    verify_admin_token(token, principal.id, &state.auth_config)
        .map(|_| ())
        .map_err(|e| {
            tracing::debug!(user_id = %principal.id, error = %e, "Admin token rejected");
            two_factor_required("Invalid or expired 2FA session")
        })
}

/// Requires an `x-admin-token` step-up token from principals who enabled
/// two-factor authentication. Principals without it pass through; if
/// enrolment cannot be read the request is refused with 503.
pub async fn require_two_factor(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .cloned()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    if TwoFactorService::requires_step_up(&state.db, principal.id).await? {
        if let Err(err) = check_admin_token(req.headers(), &principal, &state) {
            track_authorization_denied("two_factor", &principal.role);
            return Err(err);
        }
    }

    Ok(next.run(req).await)
}
