//! Prometheus metrics, served on a separate port from the API.
//!
//! Recording is switched off with `METRICS_ENABLED=false`; every helper in
//! this module becomes a no-op and the exporter is never installed.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const REQUEST_DURATION: &str = "crystaltides_http_request_duration_seconds";
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

static ENABLED: OnceLock<bool> = OnceLock::new();

pub fn metrics_enabled() -> bool {
    *ENABLED.get_or_init(|| {
        std::env::var("METRICS_ENABLED")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off"))
            .unwrap_or(true)
    })
}

/// Installs the global recorder and spawns its upkeep loop.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !metrics_enabled() {
        return None;
    }

    let handle = match PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)
        .and_then(|builder| builder.install_recorder())
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed, metrics off");
            return None;
        }
    };

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(10));
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    Some(handle)
}

/// `/metrics` for the scrape port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// The route template (`/api/forum/threads/{id}`), so ids don't explode the
/// label set. Unmatched requests share one label.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned())
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !metrics_enabled() {
        return next.run(req).await;
    }

    let started = Instant::now();
    let method = req.method().to_string();
    let route = route_label(&req);

    gauge!("crystaltides_http_requests_in_flight").increment(1.0);
    let response = next.run(req).await;
    gauge!("crystaltides_http_requests_in_flight").decrement(1.0);

    let class = status_class(response.status());
    counter!(
        "crystaltides_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "class" => class
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "method" => method, "route" => route)
        .record(started.elapsed().as_secs_f64());

    response
}

pub fn track_thread_created(category_id: i64) {
    if metrics_enabled() {
        let category = category_id.to_string();
        counter!("crystaltides_forum_threads_created_total", "category" => category).increment(1);
    }
}

/// `source` is `kofi`, `manual` or `seed`.
pub fn track_donation_recorded(source: &'static str) {
    if metrics_enabled() {
        counter!("crystaltides_donations_recorded_total", "source" => source).increment(1);
    }
}

/// A request stopped by a role gate or the two-factor stage.
pub fn track_authorization_denied(gate: &'static str, role: &str) {
    if metrics_enabled() {
        counter!(
            "crystaltides_authorization_denied_total",
            "gate" => gate,
            "role" => role.to_string()
        )
        .increment(1);
    }
}

pub fn track_rate_limited(limiter: &'static str) {
    if metrics_enabled() {
        counter!("crystaltides_rate_limited_total", "limiter" => limiter).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(StatusCode::OK), "2xx");
        assert_eq!(status_class(StatusCode::FORBIDDEN), "4xx");
        assert_eq!(status_class(StatusCode::TOO_MANY_REQUESTS), "4xx");
        assert_eq!(status_class(StatusCode::SERVICE_UNAVAILABLE), "5xx");
    }

    #[test]
    fn test_unmatched_route_label() {
        let req = Request::builder()
            .uri("/api/forum/threads/42")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&req), "unmatched");
    }
}
