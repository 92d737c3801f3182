//! Per-client-IP rate limiting backed by `governor` keyed limiters.
//!
//! Two limiters exist: a general one applied to every `/api` route and a
//! stricter one for sensitive public writes (suggestions, translation,
//! security alerts, webhooks). Exceeding either answers 429 with a
//! `Retry-After` header.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{Extensions, HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use crystaltides_config::RateLimitConfig;
use crystaltides_core::AppError;
use governor::{
    DefaultKeyedRateLimiter, RateLimiter,
    clock::{Clock, DefaultClock},
};

use crate::metrics::track_rate_limited;
use crate::state::AppState;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone, Default)]
pub struct RateLimiters {
    pub api: Option<Arc<IpRateLimiter>>,
    pub sensitive: Option<Arc<IpRateLimiter>>,
}

impl std::fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiters")
            .field("api", &self.api.is_some())
            .field("sensitive", &self.sensitive.is_some())
            .finish()
    }
}

impl RateLimiters {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }
        Self {
            api: Some(Arc::new(RateLimiter::keyed(config.api_quota()))),
            sensitive: Some(Arc::new(RateLimiter::keyed(config.sensitive_quota()))),
        }
    }

    /// Drops state for clients that are back at full quota.
    pub fn retain_recent(&self) {
        for limiter in [&self.api, &self.sensitive].into_iter().flatten() {
            limiter.retain_recent();
        }
    }
}

/// The client address: first `x-forwarded-for` hop, then `x-real-ip`, then
/// the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let header_ip = |name: &str, first_hop: bool| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| if first_hop { v.split(',').next() } else { Some(v) })
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for", true)
        .or_else(|| header_ip("x-real-ip", false))
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Extractor for the resolved client address.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.headers, peer_addr(&parts.extensions))))
    }
}

fn check(limiter: &IpRateLimiter, name: &'static str, req: &Request) -> Result<(), Response> {
    let ip = client_ip(req.headers(), peer_addr(req.extensions()));

    limiter.check_key(&ip).map_err(|not_until| {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        tracing::warn!(
            limiter = name,
            %ip,
            retry_after_secs = wait.as_secs(),
            "Rate limit exceeded"
        );
        track_rate_limited(name);

        let mut response = AppError::too_many_requests().into_response();
        if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    })
}

pub async fn api_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(limiter) = &state.rate_limiters.api {
        if let Err(response) = check(limiter, "api", &req) {
            return response;
        }
    }
    next.run(req).await
}

pub async fn sensitive_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.rate_limiters.sensitive {
        if let Err(response) = check(limiter, "sensitive", &req) {
            return response;
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, None), "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, None), "198.51.100.2".parse::<IpAddr>().unwrap());

        let peer: SocketAddr = "192.0.2.9:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), peer.ip());

        let mut garbage = HeaderMap::new();
        garbage.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&garbage, None), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_disabled_config_builds_no_limiters() {
        let limiters = RateLimiters::from_config(&RateLimitConfig::disabled());
        assert!(limiters.api.is_none());
        assert!(limiters.sensitive.is_none());
    }

    #[test]
    fn test_limiter_exhausts_per_ip() {
        let config = RateLimitConfig {
            sensitive_max: 2,
            ..RateLimitConfig::default()
        };
        let limiters = RateLimiters::from_config(&config);
        let limiter = limiters.sensitive.unwrap();
        let a: IpAddr = "203.0.113.1".parse().unwrap();
        let b: IpAddr = "203.0.113.2".parse().unwrap();
        assert!(limiter.check_key(&a).is_ok());
        assert!(limiter.check_key(&a).is_ok());
        assert!(limiter.check_key(&a).is_err());
        assert!(limiter.check_key(&b).is_ok());
    }
}
