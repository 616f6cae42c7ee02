use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when running in {0:?} mode")]
    MissingSecret(Environment),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_minutes: u64,
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
    /// Paths that skip the access gate. An entry matches itself and anything
    /// below it at a `/` boundary.
    pub bypass_paths: Vec<String>,
    pub admin_email: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

const DEV_SECRET: &str = "development-only-secret-change-me";

/// One year.
pub const MAX_TOKEN_MINUTES: u64 = 365 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = parse("SERVER_PORT", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = parse("JWT_EXPIRY_MINUTES", &v)?;
        }
        if let Ok(v) = env::var("PASSWORD_HASH_COST") {
            self.security.password_cost = parse("PASSWORD_HASH_COST", &v)?;
        }
        if let Ok(v) = env::var("AUTH_BYPASS_PATHS") {
            self.security.bypass_paths = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.security.admin_email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.admin_password = Some(v);
        }

        // Query overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_PAGE_SIZE") {
            self.query.default_page_size = parse("QUERY_DEFAULT_PAGE_SIZE", &v)?;
        }
        if let Ok(v) = env::var("QUERY_MAX_PAGE_SIZE") {
            self.query.max_page_size = parse("QUERY_MAX_PAGE_SIZE", &v)?;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty()
            || (self.environment != Environment::Development && self.security.jwt_secret == DEV_SECRET)
        {
            return Err(ConfigError::MissingSecret(self.environment));
        }
        if !(1..=MAX_TOKEN_MINUTES).contains(&self.security.jwt_expiry_minutes) {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRY_MINUTES",
                value: self.security.jwt_expiry_minutes.to_string(),
            });
        }
        if !(MIN_COST..=MAX_COST).contains(&self.security.password_cost) {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_HASH_COST",
                value: self.security.password_cost.to_string(),
            });
        }
        if self.query.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUERY_DEFAULT_PAGE_SIZE",
                value: "0".to_string(),
            });
        }
        if self.query.max_page_size < self.query.default_page_size {
            return Err(ConfigError::InvalidValue {
                key: "QUERY_MAX_PAGE_SIZE",
                value: self.query.max_page_size.to_string(),
            });
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            security: SecurityConfig {
                jwt_secret: DEV_SECRET.to_string(),
                jwt_expiry_minutes: 60,
                password_cost: DEFAULT_COST,
                bypass_paths: default_bypass_paths(),
                admin_email: None,
                admin_password: None,
            },
            query: QueryConfig {
                default_page_size: 10,
                max_page_size: 100,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.security.jwt_secret = String::new();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_minutes = 30;
        config.query.max_page_size = 50;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config
    }
}

fn default_bypass_paths() -> Vec<String> {
    vec![
        "/auth/login".to_string(),
        "/user/signUp".to_string(),
        "/health".to_string(),
    ]
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.query.default_page_size, 10);
        assert_eq!(config.security.jwt_expiry_minutes, 60);
        assert!(config.security.bypass_paths.contains(&"/auth/login".to_string()));
        assert!(config.security.bypass_paths.contains(&"/user/signUp".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::MissingSecret(Environment::Production))));

        let mut config = AppConfig::production();
        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_page_size_must_cover_default() {
        let mut config = AppConfig::development();
        config.query.max_page_size = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "QUERY_MAX_PAGE_SIZE", .. })
        ));
    }

    #[test]
    fn test_token_lifetime_must_be_bounded() {
        for minutes in [0, MAX_TOKEN_MINUTES + 1, u64::MAX / 2] {
            let mut config = AppConfig::development();
            config.security.jwt_expiry_minutes = minutes;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { key: "JWT_EXPIRY_MINUTES", .. })
            ));
        }

        let mut config = AppConfig::development();
        config.security.jwt_expiry_minutes = MAX_TOKEN_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_cost_must_be_a_bcrypt_cost() {
        for cost in [0, 3, 32] {
            let mut config = AppConfig::development();
            config.security.password_cost = cost;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { key: "PASSWORD_HASH_COST", .. })
            ));
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse::<u16>("SERVER_PORT", "eighty").is_err());
        assert_eq!(parse::<u16>("SERVER_PORT", " 8080 ").unwrap(), 8080);
    }
}
