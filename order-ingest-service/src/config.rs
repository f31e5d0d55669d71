use dotenvy::dotenv;
use std::env;

use redis_utils::RedisSettings;

use crate::broker::START_AT_LATEST;
use crate::error::AppError;

/// Runtime configuration for both binaries, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub broker: RedisSettings,
    pub stream_name: String,
    pub start_id: String,
}

impl Config {
    /// Loads `.env` if present, then reads the environment. A missing
    /// required value is a startup error, never retried.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::build(|name| env::var(name).ok())
    }

    fn build<F>(var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = var("BROKER_HOST")
            .ok_or_else(|| AppError::Config("BROKER_HOST missing".into()))?;
        let port = var("BROKER_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(19536);
        let username = var("BROKER_USERNAME").unwrap_or_else(|| "default".to_string());
        let password = var("BROKER_PASSWORD")
            .ok_or_else(|| AppError::Config("BROKER_PASSWORD missing".into()))?;
        let db = var("BROKER_DB_INDEX")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let stream_name = var("STREAM_NAME").unwrap_or_else(|| "orders".to_string());
        let start_id = var("STREAM_START_ID").unwrap_or_else(|| START_AT_LATEST.to_string());

        Ok(Self {
            broker: RedisSettings {
                host,
                port,
                username,
                password,
                db,
            },
            stream_name,
            start_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn minimal_environment_gets_defaults() {
        let env = vars(&[("BROKER_HOST", "broker.local"), ("BROKER_PASSWORD", "pw")]);
        let config = Config::build(|name| env.get(name).cloned()).unwrap();

        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 19536);
        assert_eq!(config.broker.username, "default");
        assert_eq!(config.broker.db, 0);
        assert_eq!(config.stream_name, "orders");
        assert_eq!(config.start_id, "$");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let env = vars(&[
            ("BROKER_HOST", "broker.local"),
            ("BROKER_PASSWORD", "pw"),
            ("BROKER_PORT", "6380"),
            ("BROKER_USERNAME", "ingest"),
            ("BROKER_DB_INDEX", "3"),
            ("STREAM_NAME", "orders-test"),
            ("STREAM_START_ID", "0-0"),
        ]);
        let config = Config::build(|name| env.get(name).cloned()).unwrap();

        assert_eq!(config.broker.port, 6380);
        assert_eq!(config.broker.username, "ingest");
        assert_eq!(config.broker.db, 3);
        assert_eq!(config.stream_name, "orders-test");
        assert_eq!(config.start_id, "0-0");
    }

    #[test]
    fn missing_required_values_fail() {
        let no_host = vars(&[("BROKER_PASSWORD", "pw")]);
        let err = Config::build(|name| no_host.get(name).cloned()).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("BROKER_HOST")));

        let no_password = vars(&[("BROKER_HOST", "broker.local")]);
        let err = Config::build(|name| no_password.get(name).cloned()).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("BROKER_PASSWORD")));
    }
}
