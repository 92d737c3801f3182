//! Rate limiting configuration.
//!
//! Two quotas are applied per client IP:
//!
//! - **API**: every `/api` route (default 100 requests per 15 minutes)
//! - **Sensitive**: suggestions, translation, security alerts and webhooks
//!   (default 10 requests per hour)
//!
//! A quota of `max` requests per `window` is expressed as a governor
//! [`Quota`] with a burst of `max` that replenishes one request every
//! `window / max`.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: default `true`
//! - `RATE_LIMIT_API_MAX` / `RATE_LIMIT_API_WINDOW_SECS`: default 100 / 900
//! - `RATE_LIMIT_SENSITIVE_MAX` / `RATE_LIMIT_SENSITIVE_WINDOW_SECS`: default 10 / 3600

use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;

use crate::{env_flag, env_or};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub api_max: u32,
    pub api_window_secs: u64,
    pub sensitive_max: u32,
    pub sensitive_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_max: 100,
            api_window_secs: 900,
            sensitive_max: 10,
            sensitive_window_secs: 3600,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if variables are not set or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            api_max: env_or("RATE_LIMIT_API_MAX", defaults.api_max),
            api_window_secs: env_or("RATE_LIMIT_API_WINDOW_SECS", defaults.api_window_secs),
            sensitive_max: env_or("RATE_LIMIT_SENSITIVE_MAX", defaults.sensitive_max),
            sensitive_window_secs: env_or(
                "RATE_LIMIT_SENSITIVE_WINDOW_SECS",
                defaults.sensitive_window_secs,
            ),
        }
    }

    /// Rate limiting switched off, for tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn api_quota(&self) -> Quota {
        quota(self.api_max, self.api_window_secs)
    }

    #[must_use]
    pub fn sensitive_quota(&self) -> Quota {
        quota(self.sensitive_max, self.sensitive_window_secs)
    }
}

fn quota(max: u32, window_secs: u64) -> Quota {
    let burst = NonZeroU32::new(max).unwrap_or(NonZeroU32::MIN);
    let window = Duration::from_secs(window_secs.max(1));
    let period = window / burst.get();

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.api_max, 100);
        assert_eq!(config.api_window_secs, 900);
        assert_eq!(config.sensitive_max, 10);
        assert_eq!(config.sensitive_window_secs, 3600);
    }

    #[test]
    fn test_api_quota_burst_and_period() {
        let quota = RateLimitConfig::default().api_quota();
        assert_eq!(quota.burst_size().get(), 100);
        assert_eq!(quota.replenish_interval(), Duration::from_secs(9));
    }

    #[test]
    fn test_sensitive_quota() {
        let quota = RateLimitConfig::default().sensitive_quota();
        assert_eq!(quota.burst_size().get(), 10);
        assert_eq!(quota.replenish_interval(), Duration::from_secs(360));
    }

    #[test]
    fn test_zero_max_falls_back_to_one() {
        let config = RateLimitConfig {
            api_max: 0,
            ..RateLimitConfig::default()
        };
        assert_eq!(config.api_quota().burst_size().get(), 1);
    }

    #[test]
    fn test_disabled() {
        assert!(!RateLimitConfig::disabled().enabled);
    }
}
