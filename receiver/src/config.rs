//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. Unparsable values
//! warn and fall back to defaults; nothing here panics.

use std::env;

use tracing::warn;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret for webhook signature verification.
    /// When absent, every delivery is rejected (the verifier fails closed).
    pub webhook_secret: Option<String>,

    /// Base URL of the main application that owns the event cache
    pub main_app_url: String,

    /// Key sent on the main application's internal endpoints
    pub internal_api_key: Option<String>,

    /// HTTP request timeout in milliseconds for forwarded cache calls
    pub request_timeout_ms: u64,

    /// TTL in hours for upserted cache entries
    pub cache_ttl_hours: u32,

    /// Deployment environment name; "production" hides the test endpoint
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_env("PORT", 8080),

            webhook_secret: env::var("WEBHOOK_SECRET").ok(),

            main_app_url: env::var("MAIN_APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            internal_api_key: env::var("INTERNAL_API_KEY").ok(),

            request_timeout_ms: parse_env("REQUEST_TIMEOUT_MS", 8000),

            cache_ttl_hours: parse_env("CACHE_TTL_HOURS", 24),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Whether the service runs in production.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Parse an environment variable, warning and defaulting on bad values.
fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> Config {
        Config {
            port: 8080,
            webhook_secret: None,
            main_app_url: "http://localhost:3000".to_string(),
            internal_api_key: None,
            request_timeout_ms: 8000,
            cache_ttl_hours: 24,
            environment: environment.to_string(),
        }
    }

    #[test]
    fn test_is_production() {
        assert!(config("production").is_production());
        assert!(config("PRODUCTION").is_production());
        assert!(!config("development").is_production());
        assert!(!config("staging").is_production());
    }

    #[test]
    fn test_parse_env_valid() {
        env::set_var("TEST_PARSE_ENV_VALID", "42");
        let result: u32 = parse_env("TEST_PARSE_ENV_VALID", 7);
        assert_eq!(result, 42);
        env::remove_var("TEST_PARSE_ENV_VALID");
    }

    #[test]
    fn test_parse_env_invalid_uses_default() {
        env::set_var("TEST_PARSE_ENV_INVALID", "not-a-number");
        let result: u32 = parse_env("TEST_PARSE_ENV_INVALID", 7);
        assert_eq!(result, 7);
        env::remove_var("TEST_PARSE_ENV_INVALID");
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        let result: u16 = parse_env("TEST_PARSE_ENV_NONEXISTENT", 9999);
        assert_eq!(result, 9999);
    }
}
