//! Runtime configuration, read once from the environment at startup.
//!
//! Variables (a `.env` file is honoured when present):
//!   DATABASE_URL     - PostgreSQL connection string (required unless IN_MEMORY=true)
//!   JWT_SECRET       - HMAC secret for access tokens
//!   BIND_ADDR / PORT - listen address, defaults to 0.0.0.0:8080
//!   EMAIL_RELAY_URL  - HTTP endpoint that accepts outgoing emails as JSON
//!   EMAIL_FROM       - sender address for automation emails
//!   IN_MEMORY        - run against the in-process store instead of PostgreSQL

use std::env;
use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: u64,
    pub bind_addr: String,
    pub port: u16,
    pub email_relay_url: Option<String>,
    pub email_from: String,
    pub in_memory: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            email_relay_url: None,
            email_from: "noreply@taskflow.local".to_string(),
            in_memory: false,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let in_memory = match lookup("IN_MEMORY") {
            Some(v) => parse_bool("IN_MEMORY", &v)?,
            None => false,
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        if database_url.is_none() && !in_memory {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                log::warn!("JWT_SECRET not set, using the insecure development default");
                defaults.jwt_secret
            }
        };

        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v.clone(),
            })?,
            None => defaults.port,
        };

        let jwt_ttl_hours = match lookup("JWT_TTL_HOURS") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                value: v.clone(),
            })?,
            None => defaults.jwt_ttl_hours,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            email_relay_url: lookup("EMAIL_RELAY_URL").filter(|v| !v.is_empty()),
            email_from: lookup("EMAIL_FROM").unwrap_or(defaults.email_from),
            in_memory,
        })
    }

    /// The PostgreSQL URL for processes that must share state with the API
    /// server. The in-memory store is private to one process.
    pub fn shared_database_url(&self) -> Result<&str, ConfigError> {
        if self.in_memory {
            return Err(ConfigError::Invalid {
                name: "IN_MEMORY",
                value: "true".to_string(),
            });
        }
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_database_url_required_without_in_memory() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_in_memory_does_not_need_database() {
        let config = AppConfig::from_lookup(lookup_from(&[("IN_MEMORY", "true")])).unwrap();
        assert!(config.in_memory);
        assert!(config.database_url.is_none());
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "secret");
    }

    #[test]
    fn test_values_are_read() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/taskflow"),
            ("JWT_SECRET", "s3cr3t"),
            ("PORT", "9000"),
            ("EMAIL_RELAY_URL", "http://mail.local/send"),
        ]))
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/taskflow")
        );
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.email_relay_url.as_deref(),
            Some("http://mail.local/send")
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("IN_MEMORY", "1"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("IN_MEMORY", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_database_url() {
        let in_memory = AppConfig::from_lookup(lookup_from(&[
            ("IN_MEMORY", "true"),
            ("DATABASE_URL", "postgres://localhost/taskflow"),
        ]))
        .unwrap();
        assert!(matches!(
            in_memory.shared_database_url(),
            Err(ConfigError::Invalid { name: "IN_MEMORY", .. })
        ));

        let missing = AppConfig::default();
        assert_eq!(
            missing.shared_database_url(),
            Err(ConfigError::Missing("DATABASE_URL"))
        );

        let postgres = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/taskflow",
        )]))
        .unwrap();
        assert_eq!(
            postgres.shared_database_url(),
            Ok("postgres://localhost/taskflow")
        );
    }
}
