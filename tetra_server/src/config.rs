//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use tetra_tourney::db::DatabaseConfig;
use tetra_tourney::tetrio::TetrioConfig;
use tetra_tourney::tournament::DEFAULT_MAX_ATTEMPTS;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Keep everything in memory instead of PostgreSQL
    pub in_memory: bool,
    /// TETR.IO API client configuration
    pub tetrio: TetrioConfig,
    /// Registration behavior
    pub registration: RegistrationConfig,
}

/// Registration settings
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Conditional write attempts before a registration gives up
    pub max_attempts: usize,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub tetrio_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?
            }
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = overrides.database_url {
            database.database_url = url;
        }

        let mut tetrio = TetrioConfig::from_env();
        if let Some(url) = overrides.tetrio_url {
            tetrio.base_url = url.trim_end_matches('/').to_string();
        }

        let registration = RegistrationConfig {
            max_attempts: parse_env_or("REGISTRATION_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
        };

        Ok(ServerConfig {
            bind,
            database,
            in_memory: overrides.in_memory || parse_env_or("IN_MEMORY_STORE", false),
            tetrio,
            registration,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.in_memory {
            self.database
                .validate()
                .map_err(|reason| ConfigError::Invalid {
                    var: "DB_*".to_string(),
                    reason,
                })?;
        }

        if !self.tetrio.base_url.starts_with("http://")
            && !self.tetrio.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                var: "TETRIO_API_URL".to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }

        if self.tetrio.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "TETRIO_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.registration.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "REGISTRATION_MAX_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::development(),
            in_memory: false,
            tetrio: TetrioConfig::default(),
            registration: RegistrationConfig { max_attempts: 3 },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_overrides_win() {
        let loaded = ServerConfig::from_env(Overrides {
            bind: Some("0.0.0.0:9000".parse().unwrap()),
            database_url: Some("postgres://override/db".to_string()),
            tetrio_url: Some("http://localhost:4000/api/".to_string()),
            in_memory: true,
        })
        .unwrap();

        assert_eq!(loaded.bind.port(), 9000);
        assert_eq!(loaded.database.database_url, "postgres://override/db");
        assert_eq!(loaded.tetrio.base_url, "http://localhost:4000/api");
        assert!(loaded.in_memory);
    }

    #[test]
    fn test_config_validation_tetrio_url() {
        let mut config = config();
        config.tetrio.base_url = "ch.tetr.io/api".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TETRIO_API_URL"));
    }

    #[test]
    fn test_config_validation_attempts_zero() {
        let mut config = config();
        config.registration.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_in_memory_skips_database_checks() {
        let mut config = config();
        config.database.database_url = String::new();
        assert!(config.validate().is_err());
        config.in_memory = true;
        assert!(config.validate().is_ok());
    }
}
