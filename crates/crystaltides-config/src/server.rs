use std::net::SocketAddr;

use crate::{env_or, env_opt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// `APP_ENV`, `development` unless set.
    pub environment: String,
    pub bind_addr: SocketAddr,
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            metrics_port: 9090,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env_opt("APP_ENV")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.environment),
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            metrics_port: env_or("METRICS_PORT", defaults.metrics_port),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_production() {
        let config = ServerConfig::default();
        assert!(!config.is_production());
        assert_eq!(config.bind_addr.port(), 3001);
    }

    #[test]
    fn test_production_flag() {
        let config = ServerConfig {
            environment: "production".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.is_production());
    }
}
