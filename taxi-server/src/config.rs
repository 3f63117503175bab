//! Service configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then environment:
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `TAXI_BIND`: listen address (e.g. `0.0.0.0:8000`)
//! - `TAXI_MAX_CONNECTIONS`: pool size
//! - `TAXI_SESSION_TTL_SECS`: session lifetime in seconds
//!
//! Command-line flags are applied on top by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Two weeks
const DEFAULT_SESSION_TTL_SECS: i64 = 1_209_600;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// PostgreSQL URL; required unless serving from memory
    pub database_url: Option<String>,

    pub max_connections: u32,

    /// Session lifetime, also the cookie Max-Age
    pub session_ttl_secs: i64,

    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,

    /// Allow permissive CORS (default: false = localhost only)
    pub cors_permissive: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            secure_cookies: false,
            cors_permissive: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` if given, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Override fields from environment lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(value) = lookup("TAXI_BIND") {
            self.bind_addr = parse_env("TAXI_BIND", value)?;
        }
        if let Some(value) = lookup("TAXI_MAX_CONNECTIONS") {
            self.max_connections = parse_env("TAXI_MAX_CONNECTIONS", value)?;
        }
        if let Some(value) = lookup("TAXI_SESSION_TTL_SECS") {
            self.session_ttl_secs = parse_env("TAXI_SESSION_TTL_SECS", value)?;
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs.max(1))
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.session_ttl().num_days(), 14);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"0.0.0.0:9000\"\nmax_connections = 12").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://db/taxi"),
            ("TAXI_SESSION_TTL_SECS", "60"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://db/taxi"));
        assert_eq!(config.session_ttl_secs, 60);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|name| (name == "TAXI_BIND").then(|| "nowhere".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "TAXI_BIND", .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/taxi.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
