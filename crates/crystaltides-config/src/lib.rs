//! # CrystalTides Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`server`]: environment name, bind address, metrics port
//! - [`auth`]: bearer token verification and admin step-up tokens
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: general and sensitive request quotas
//! - [`integrations`]: Discord, Ko-fi, game bridge and translation endpoints
//!
//! # Example
//!
//! ```ignore
//! use crystaltides_config::{AuthConfig, CorsConfig, RateLimitConfig};
//!
//! let auth_config = AuthConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod auth;
pub mod cors;
pub mod integrations;
pub mod rate_limit;
pub mod server;

pub use auth::AuthConfig;
pub use cors::CorsConfig;
pub use integrations::IntegrationsConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| {
            let v = v.to_lowercase();
            v != "false" && v != "0" && v != "no"
        })
        .unwrap_or(default)
}
