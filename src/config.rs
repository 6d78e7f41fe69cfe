use chrono::Duration;
use derive_more::{Display, Error};

pub const DEFAULT_DATABASE_URL: &str = "todo.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 3600;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[display("missing required setting {key}")]
    Missing { key: &'static str },

    #[display("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Read settings from the process environment. `main` loads `.env`
    /// beforehand.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;

        let token_ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if token_ttl_secs < 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                reason: "must not be negative".to_string(),
            });
        }

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: e.to_string(),
            })?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("{} is outside 4..=31", bcrypt_cost),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            token_ttl: Duration::seconds(token_ttl_secs),
            bcrypt_cost,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.token_ttl, Duration::days(1));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { key: "JWT_SECRET" });

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { key: "JWT_SECRET" });
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", ":memory:"),
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("TOKEN_TTL_SECS", "900"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.token_ttl, Duration::minutes(15));
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("TOKEN_TTL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. }));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("TOKEN_TTL_SECS", "-5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. }));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("BCRYPT_COST", "2")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BCRYPT_COST", .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "hunter2")])).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
