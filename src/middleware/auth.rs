use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use crystaltides_auth::AuthenticatedPrincipal;
use crystaltides_core::AppError;
use crystaltides_db::Condition;
use crystaltides_models::{Profile, users};
use tracing::{debug, warn};

use crate::state::AppState;

/// The principal attached by [`authenticate`] or [`optional_authenticate`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedPrincipal);

impl std::ops::Deref for AuthUser {
    type Target = AuthenticatedPrincipal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(AuthUser))
    }
}

/// The bearer token of the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies `token` and overlays the username and role stored in the profile.
async fn resolve_principal(
    state: &AppState,
    token: &str,
) -> Result<AuthenticatedPrincipal, AppError> {
    let mut principal = state
        .verifier
        .verify(token)
        .await
        .map_err(|e| e.into_app_error())?;

    match state
        .db
        .find::<Profile>(users::TABLE, vec![Condition::eq("id", principal.id.to_string())])
        .await
    {
        Ok(Some(profile)) => {
            if let Some(username) = profile.username.filter(|u| !u.trim().is_empty()) {
                principal.username = username;
            }
            if let Some(role) = profile.role {
                principal.set_role(&role);
            }
        }
        Ok(None) => debug!(user_id = %principal.id, "No profile row for principal"),
        Err(e) => {
            warn!(user_id = %principal.id, error = %e, "Profile lookup failed, using token claims")
        }
    }

    Ok(principal)
}

/// Requires a valid bearer token: 401 when absent, 403 when invalid.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::unauthorized("Access token required"))?
        .to_string();

    let principal = resolve_principal(&state, &token).await?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Attaches a principal when the request carries a valid token. Never rejects.
pub async fn optional_authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()).map(str::to_string) {
        match resolve_principal(&state, &token).await {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
            }
            Err(e) => debug!(error = %e.error, "Ignoring invalid optional token"),
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
