//! Database configuration module.

use std::env;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (default: development URL)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT_SECS`: Connection timeout in seconds (default: 5)
    /// - `DB_IDLE_TIMEOUT_SECS`: Idle timeout in seconds (default: 300)
    /// - `DB_MAX_LIFETIME_SECS`: Max lifetime in seconds (default: 1800)
    ///
    /// Unparsable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::development();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    /// Default configuration for local development
    ///
    /// Uses `postgres://postgres@localhost/tetra_tourney` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/tetra_tourney".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        }
    }

    /// Reject pool settings sqlx would refuse or silently misbehave with.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.trim().is_empty() {
            return Err("DATABASE_URL must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be greater than 0".to_string());
        }
        if self.min_connections > self.max_connections {
            return Err(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.min_connections, self.max_connections
            ));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_is_valid() {
        let config = DatabaseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let config = DatabaseConfig {
            min_connections: 20,
            max_connections: 5,
            ..DatabaseConfig::development()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = DatabaseConfig {
            database_url: " ".to_string(),
            ..DatabaseConfig::development()
        };
        assert!(config.validate().is_err());
    }
}
