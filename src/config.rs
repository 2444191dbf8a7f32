//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8083)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `NATS_URL` - Publish domain events to NATS when set
//! - `NATS_SUBJECT` - Subject prefix for events (default: orders.events)
//! - `ORDER_WEBHOOK_URL` - POST order summaries here when set
//! - `NOTIFY_TIMEOUT_SECS` - Webhook request timeout (default: 10)
//! - `STORE_CURRENCY` - Currency code used in notifications (default: MAD)
//! - `ORDER_STATUS_POLICY` - `open` or `strict` (default: open)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::domain::aggregates::StatusPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    pub nats_subject: String,
    pub webhook_url: Option<String>,
    pub notify_timeout: Duration,
    pub currency: String,
    pub status_policy: StatusPolicy,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(get);
        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            host: env.parsed("HOST", "0.0.0.0")?,
            port: env.parsed("PORT", "8083")?,
            max_connections: env.parsed("DATABASE_MAX_CONNECTIONS", "10")?,
            nats_url: env.optional("NATS_URL"),
            nats_subject: env.or_default("NATS_SUBJECT", "orders.events"),
            webhook_url: env.optional("ORDER_WEBHOOK_URL"),
            notify_timeout: Duration::from_secs(env.parsed("NOTIFY_TIMEOUT_SECS", "10")?),
            currency: env.or_default("STORE_CURRENCY", "MAD"),
            status_policy: env.parsed("ORDER_STATUS_POLICY", "open")?,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String { self.optional(key).unwrap_or_else(|| default.to_string()) }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default).parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = load(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(c.socket_addr().to_string(), "0.0.0.0:8083");
        assert_eq!(c.max_connections, 10);
        assert_eq!(c.nats_subject, "orders.events");
        assert_eq!(c.currency, "MAD");
        assert_eq!(c.status_policy, StatusPolicy::Open);
        assert_eq!(c.notify_timeout, Duration::from_secs(10));
        assert!(c.nats_url.is_none());
        assert!(c.webhook_url.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(k)) if k == "DATABASE_URL"));
        assert!(matches!(load(&[("DATABASE_URL", "  ")]), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let c = load(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("PORT", "9000"),
            ("ORDER_STATUS_POLICY", "Strict"),
            ("ORDER_WEBHOOK_URL", "https://hooks.example.com/orders"),
        ])
        .unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.status_policy, StatusPolicy::Strict);
        assert_eq!(c.webhook_url.as_deref(), Some("https://hooks.example.com/orders"));

        let err = load(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(k, _) if k == "PORT"));
        let err = load(&[("DATABASE_URL", "x"), ("ORDER_STATUS_POLICY", "lenient")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(k, _) if k == "ORDER_STATUS_POLICY"));
    }
}
