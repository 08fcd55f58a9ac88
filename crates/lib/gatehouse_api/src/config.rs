//! API server configuration.

use chrono::Duration;
use gatehouse_core::config::{
    AuthConfig, DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS,
    MAX_TOKEN_TTL_SECS,
};

/// Default listener address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// Token signing and lifetime settings.
    pub auth: AuthConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                   | Default            |
    /// |----------------------------|--------------------|
    /// | `BIND_ADDR`                | `127.0.0.1:8080`   |
    /// | `JWT_SECRET_KEY` / `JWT_SECRET` | none (issuance fails) |
    /// | `ACCESS_TOKEN_TTL_SECS`    | `86400`            |
    /// | `REFRESH_TOKEN_TTL_SECS`   | `86400`            |
    /// | `ROTATE_REFRESH_TOKENS`    | `false`            |
    ///
    /// Lifetimes outside `1..=MAX_TOKEN_TTL_SECS` fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret = lookup("JWT_SECRET_KEY")
            .filter(|s| !s.is_empty())
            .or_else(|| lookup("JWT_SECRET"))
            .unwrap_or_default();
        let ttl = |key: &str, default: i64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| (1..=MAX_TOKEN_TTL_SECS).contains(v))
                .and_then(Duration::try_seconds)
                .unwrap_or_else(|| Duration::seconds(default))
        };
        let rotate = lookup("ROTATE_REFRESH_TOKENS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            auth: AuthConfig::new(secret)
                .with_access_ttl(ttl("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS))
                .with_refresh_ttl(ttl("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS))
                .with_refresh_rotation(rotate),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.access_token_ttl.num_seconds(), 86_400);
        assert_eq!(config.auth.refresh_token_ttl.num_seconds(), 86_400);
        assert!(!config.auth.rotate_refresh_tokens);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("JWT_SECRET_KEY", "k"),
            ("ACCESS_TOKEN_TTL_SECS", "900"),
            ("REFRESH_TOKEN_TTL_SECS", "604800"),
            ("ROTATE_REFRESH_TOKENS", "true"),
        ]);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.auth.jwt_secret, "k");
        assert_eq!(config.auth.access_token_ttl.num_minutes(), 15);
        assert_eq!(config.auth.refresh_token_ttl.num_days(), 7);
        assert!(config.auth.rotate_refresh_tokens);
    }

    #[test]
    fn falls_back_to_jwt_secret_and_ignores_bad_ttls() {
        let config = config(&[
            ("JWT_SECRET", "fallback"),
            ("ACCESS_TOKEN_TTL_SECS", "soon"),
            ("REFRESH_TOKEN_TTL_SECS", "-1"),
        ]);
        assert_eq!(config.auth.jwt_secret, "fallback");
        assert_eq!(config.auth.access_token_ttl.num_seconds(), 86_400);
        assert_eq!(config.auth.refresh_token_ttl.num_seconds(), 86_400);
    }

    #[test]
    fn out_of_range_ttls_fall_back_to_defaults() {
        let config = config(&[
            ("ACCESS_TOKEN_TTL_SECS", "9223372036854775807"),
            ("REFRESH_TOKEN_TTL_SECS", "1000000000000000"),
        ]);
        assert_eq!(config.auth.access_token_ttl.num_seconds(), 86_400);
        assert_eq!(config.auth.refresh_token_ttl.num_seconds(), 86_400);
    }

    #[test]
    fn ttl_at_the_cap_is_accepted() {
        let max = MAX_TOKEN_TTL_SECS.to_string();
        let config = config(&[("ACCESS_TOKEN_TTL_SECS", max.as_str())]);
        assert_eq!(config.auth.access_token_ttl.num_seconds(), MAX_TOKEN_TTL_SECS);
    }
}
