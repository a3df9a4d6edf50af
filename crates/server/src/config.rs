//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCADITO_DATABASE_URL` - `SQLite` connection string
//!   (e.g., `sqlite://mercadito.db`)
//!
//! ## Optional
//! - `MERCADITO_HOST` - Bind address (default: 127.0.0.1)
//! - `MERCADITO_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database connection URL (may carry credentials for remote stores)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("MERCADITO_DATABASE_URL")?;

        let host = optional("MERCADITO_HOST")
            .map_or(Ok(IpAddr::from([127, 0, 0, 1])), |raw| {
                raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar("MERCADITO_HOST".to_owned(), raw)
                })
            })?;

        let port = optional("MERCADITO_PORT").map_or(Ok(3000), |raw| {
            raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("MERCADITO_PORT".to_owned(), raw)
            })
        })?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Socket address to bind the listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("sqlite::memory:".to_owned()),
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            sentry_dsn: None,
            sentry_environment: None,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }
}
