//! Runtime server configuration
//!
//! ServerConfig is resolved once at startup from environment variables and
//! is immutable for the process lifetime. Unset variables fall back to
//! defaults; set-but-invalid variables are startup errors.

use axum::http::HeaderValue;
use orgtree_core::services::DEFAULT_FOREST_TTL;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(10 * 60);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {var}='{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to get home directory; set ORGTREE_DB_PATH explicitly")]
    NoHomeDirectory,
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on (`ORGTREE_BIND`)
    pub bind: IpAddr,

    /// Listen port (`ORGTREE_PORT`)
    pub port: u16,

    /// libsql database file (`ORGTREE_DB_PATH`)
    pub database_path: PathBuf,

    /// Forest snapshot lifetime (`ORGTREE_CACHE_TTL_SECS`)
    pub cache_ttl: Duration,

    /// Requests allowed per client per window (`ORGTREE_RATE_LIMIT_MAX`)
    pub rate_limit_max: u32,

    /// Rate limit window (`ORGTREE_RATE_LIMIT_WINDOW_SECS`)
    pub rate_limit_window: Duration,

    /// Single allowed CORS origin (`CORS_ALLOW_ORIGIN`); any origin when unset
    pub cors_allow_origin: Option<HeaderValue>,
}

impl ServerConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("ORGTREE_DB_PATH") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_database_path()?,
        };

        let cors_allow_origin = lookup("CORS_ALLOW_ORIGIN")
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| ConfigError::invalid("CORS_ALLOW_ORIGIN", &origin, e))
            })
            .transpose()?;

        let rate_limit_max = parse_or(&lookup, "ORGTREE_RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?;
        if rate_limit_max == 0 {
            return Err(ConfigError::invalid(
                "ORGTREE_RATE_LIMIT_MAX",
                "0",
                "must allow at least one request",
            ));
        }

        Ok(Self {
            bind: parse_or(&lookup, "ORGTREE_BIND", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(&lookup, "ORGTREE_PORT", DEFAULT_PORT)?,
            database_path,
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "ORGTREE_CACHE_TTL_SECS",
                DEFAULT_FOREST_TTL.as_secs(),
            )?),
            rate_limit_max,
            rate_limit_window: Duration::from_secs(parse_or(
                &lookup,
                "ORGTREE_RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW.as_secs(),
            )?),
            cors_allow_origin,
        })
    }

    pub fn listen_addr(&self) -> std::net::SocketAddr {
        (self.bind, self.port).into()
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(var, &raw, e)),
    }
}

/// Default: ~/.orgtree/database/orgtree.db
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir.join(".orgtree").join("database").join("orgtree.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("ORGTREE_DB_PATH", "/tmp/org.db")])).unwrap();

        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.database_path, PathBuf::from("/tmp/org.db"));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(600));
        assert!(config.cors_allow_origin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ORGTREE_DB_PATH", "/data/org.db"),
            ("ORGTREE_BIND", "0.0.0.0"),
            ("ORGTREE_PORT", " 8080 "),
            ("ORGTREE_CACHE_TTL_SECS", "5"),
            ("ORGTREE_RATE_LIMIT_MAX", "3"),
            ("ORGTREE_RATE_LIMIT_WINDOW_SECS", "60"),
            ("CORS_ALLOW_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.rate_limit_max, 3);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(
            config.cors_allow_origin,
            Some(HeaderValue::from_static("http://localhost:5173"))
        );
    }

    #[test]
    fn test_invalid_values_are_errors() {
        for (var, value) in [
            ("ORGTREE_PORT", "seventy"),
            ("ORGTREE_PORT", "70000"),
            ("ORGTREE_BIND", "localhost:80"),
            ("ORGTREE_CACHE_TTL_SECS", "-1"),
            ("ORGTREE_RATE_LIMIT_MAX", "0"),
            ("CORS_ALLOW_ORIGIN", "http://bad\norigin"),
        ] {
            let err = ServerConfig::from_lookup(lookup(&[("ORGTREE_DB_PATH", "/tmp/x.db"), (var, value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: v, .. } if v == var),
                "{var}={value:?} gave {err}"
            );
        }
    }
}
