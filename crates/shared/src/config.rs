//! Application configuration management.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Business calendar configuration.
    #[serde(default)]
    pub business: BusinessConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the identity provider.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Business calendar configuration.
///
/// Due dates are calendar dates in the company's local time, so "today" for
/// overdue checks is computed at this fixed offset rather than in UTC.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessConfig {
    /// Offset from UTC in whole hours (e.g. -5 for Bogotá).
    #[serde(default)]
    pub utc_offset_hours: i32,
}

impl BusinessConfig {
    /// The configured offset. Anything outside ±23h falls back to UTC.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Returns the current calendar date at the configured offset.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("OBRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_config_default_is_utc() {
        let business = BusinessConfig::default();
        assert_eq!(business.utc_offset_hours, 0);
        assert_eq!(business.today(), Utc::now().date_naive());
    }

    #[test]
    fn test_business_config_invalid_offset_falls_back() {
        let business = BusinessConfig {
            utc_offset_hours: 48,
        };
        assert_eq!(business.today(), Utc::now().date_naive());
    }

    #[test]
    fn test_business_config_extreme_offset_falls_back() {
        for hours in [i32::MAX, i32::MIN, 596_524] {
            let business = BusinessConfig {
                utc_offset_hours: hours,
            };
            assert_eq!(business.offset(), Utc.fix());
        }
    }

    #[test]
    fn test_business_config_offset_in_range() {
        let business = BusinessConfig {
            utc_offset_hours: -5,
        };
        assert_eq!(business.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("server.host", "127.0.0.1")
            .unwrap()
            .set_override("database.url", "postgres://localhost/obra")
            .unwrap()
            .set_override("jwt.secret", "secret")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.access_token_expiry_secs, 900);
        assert_eq!(config.business.utc_offset_hours, 0);
    }
}
