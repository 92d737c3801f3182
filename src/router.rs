use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use crystaltides_config::CorsConfig;
use crystaltides_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};

use crate::docs::ApiDoc;
use crate::logging::{REQUEST_ID_HEADER, logging_middleware};
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::api_rate_limit;
use crate::modules::{
    donations::init_donations_router, forum::init_forum_router, health::init_health_router,
    logs::init_logs_router, policies::init_policies_router, polls::init_polls_router,
    rules::init_rules_router, suggestions::init_suggestions_router, tickets::init_tickets_router,
    translation::init_translation_router, two_factor::init_two_factor_router,
    users::init_users_router, webhooks::init_webhooks_router, wiki::init_wiki_router,
};
use crate::state::AppState;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn route_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Route not found"))
}

/// Any origin is mirrored back when none are configured, since credentials
/// cannot be combined with a literal `*`.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let allowed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-admin-token"),
            header::HeaderName::from_static("x-bridge-secret"),
        ])
        .expose_headers([REQUEST_ID_HEADER])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/health", init_health_router())
        .nest("/forum", init_forum_router(&state))
        .nest("/rules", init_rules_router(&state))
        .nest("/policies", init_policies_router(&state))
        .nest("/wiki", init_wiki_router(&state))
        .nest("/polls", init_polls_router(&state))
        .nest("/suggestions", init_suggestions_router(&state))
        .nest("/tickets", init_tickets_router(&state))
        .nest("/donations", init_donations_router(&state))
        .nest("/logs", init_logs_router(&state))
        .nest("/webhooks", init_webhooks_router(&state))
        .nest("/translation", init_translation_router(&state))
        .nest("/users", init_users_router(&state))
        .nest("/auth/2fa", init_two_factor_router(&state))
        .layer(middleware::from_fn_with_state(state.clone(), api_rate_limit));

    Router::new()
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .route("/api/docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(cors_layer(&state.cors_config))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::convert::Infallible;
    use tower::Layer;

    fn apply(config: &CorsConfig) {
        let _ = cors_layer(config).layer(tower::service_fn(|_: Request<Body>| async {
            Ok::<_, Infallible>(())
        }));
    }

    #[test]
    fn test_cors_layer_is_usable_with_credentials() {
        apply(&CorsConfig::default());
        apply(&CorsConfig {
            allowed_origins: vec!["https://crystaltides.net".to_string()],
        });
    }
}
