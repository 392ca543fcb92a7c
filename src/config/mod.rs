use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign access tokens
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Signing algorithm, e.g. HS256
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Access token lifetime in minutes
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            algorithm: default_algorithm(),
            token_ttl_minutes: default_token_ttl_minutes(),
        }
    }
}

fn default_secret_key() -> String {
    // Generate a random secret if not provided; tokens will not survive
    // a restart without an explicit secret
    uuid::Uuid::new_v4().to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    /// Apply the same-day duplicate guard to teacher marks as well as
    /// self-check-ins. Off by default: teachers may create duplicate
    /// records for the same class and day.
    #[serde(default)]
    pub dedupe_marks: bool,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            dedupe_marks: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            attendance: AttendanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment takes precedence over the config file for auth settings
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("ROLLCALL_SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Ok(algorithm) = std::env::var("ROLLCALL_ALGORITHM") {
            self.auth.algorithm = algorithm;
        }
        if let Ok(ttl) = std::env::var("ROLLCALL_TOKEN_TTL_MINUTES") {
            if let Ok(minutes) = ttl.parse() {
                self.auth.token_ttl_minutes = minutes;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.algorithm, "HS256");
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert!(!config.attendance.dedupe_marks);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [auth]
            secret_key = "test-secret"
            token_ttl_minutes = 5

            [attendance]
            dedupe_marks = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.secret_key, "test-secret");
        assert_eq!(config.auth.token_ttl_minutes, 5);
        assert!(config.attendance.dedupe_marks);
    }

    #[test]
    fn test_random_secret_when_unset() {
        let a: Config = toml::from_str("").unwrap();
        let b: Config = toml::from_str("").unwrap();
        assert_ne!(a.auth.secret_key, b.auth.secret_key);
    }
}
