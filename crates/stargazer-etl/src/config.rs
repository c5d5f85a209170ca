use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Public NASA API root.
pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov";

/// Shared, heavily rate-limited key NASA hands out for experimentation.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Environment variable consulted when no key is configured.
pub const NASA_API_KEY_VAR: &str = "NASA_API_KEY";

/// Configuration for stargazer.
///
/// Configuration is loaded once at startup from multiple sources with the
/// following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (APOD_* prefix)
/// 3. Config file (~/.config/stargazer/config.toml)
/// 4. Built-in defaults (lowest priority)
///
/// The loaded value is passed by reference to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// NASA API key.
    ///
    /// Can be set via:
    /// - CLI: --api-key KEY
    /// - ENV: APOD_API_KEY, then NASA_API_KEY
    /// - Config: api_key = "..."
    /// - Default: DEMO_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --database /path/to/db
    /// - ENV: APOD_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/stargazer/apod.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Retries after the first attempt on network errors, 429 and 5xx.
    #[serde(
        default = "default_max_retries",
        deserialize_with = "number_or_string"
    )]
    pub max_retries: u32,

    /// Seconds to wait between retries when the server gives no hint.
    #[serde(
        default = "default_retry_wait_secs",
        deserialize_with = "number_or_string"
    )]
    pub retry_wait_secs: u64,

    /// API root; override to point at a mirror or a test server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            database_path: default_db_path(),
            max_retries: default_max_retries(),
            retry_wait_secs: default_retry_wait_secs(),
            base_url: default_base_url(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/stargazer/config.toml
    /// Reads environment variables with APOD_ prefix, and `NASA_API_KEY`
    /// when no key was found elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("apod");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        if config.api_key.is_none() {
            config.api_key = std::env::var(NASA_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the retry loop misbehave.
    ///
    /// # Errors
    ///
    /// Returns an error if `retry_wait_secs` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.retry_wait_secs == 0 {
            anyhow::bail!("retry_wait_secs must be at least 1 second");
        }
        Ok(())
    }

    /// The configured API key, or NASA's demo key.
    pub fn api_key_or_demo(&self) -> String {
        self.api_key
            .clone()
            .unwrap_or_else(|| DEMO_API_KEY.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_wait_secs))
    }

    /// Apply CLI overrides on top of the loaded values.
    ///
    /// # Errors
    ///
    /// Returns an error if the result fails [`Config::validate`].
    pub fn with_overrides(
        mut self,
        database_path: Option<PathBuf>,
        api_key: Option<String>,
        max_retries: Option<u32>,
        retry_wait_secs: Option<u64>,
    ) -> Result<Self> {
        if let Some(path) = database_path {
            self.database_path = path;
        }
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        if let Some(n) = max_retries {
            self.max_retries = n;
        }
        if let Some(secs) = retry_wait_secs {
            self.retry_wait_secs = secs;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Accept `3` or `"3"`; environment values arrive as strings.
fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/stargazer/apod.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stargazer")
        .join("apod.db")
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_wait_secs() -> u64 {
    5
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/stargazer/config.toml
/// - macOS: ~/Library/Application Support/stargazer/config.toml
/// - Windows: %APPDATA%\stargazer\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stargazer")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Stargazer Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (APOD_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# NASA API key
#
# Register for a free key at: https://api.nasa.gov
# Without one, the shared DEMO_KEY is used and rate limits come quickly.
#
# Can also be set via:
# - Environment: APOD_API_KEY=your-key-here (or NASA_API_KEY)
# - CLI: stargazer ingest --api-key your-key-here
#api_key = "your-nasa-api-key-here"

# Path to the SQLite database holding APOD entries
#
# Can also be set via:
# - CLI: stargazer --database /custom/path.db ingest
# - Environment: APOD_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/apod.db"

# Retries after the first attempt on network errors, HTTP 429 and 5xx
#max_retries = 3

# Seconds between retries when the server sends no Retry-After header
#retry_wait_secs = 5

# API root
#base_url = "https://api.nasa.gov"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Numbers {
        #[serde(deserialize_with = "number_or_string")]
        retries: u32,
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert!(config.api_key.is_none());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_wait_secs, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_api_key_falls_back_to_demo() {
        let config = Config::default();
        assert_eq!(config.api_key_or_demo(), DEMO_API_KEY);

        let config = Config::default()
            .with_overrides(None, Some("abc".to_string()), None, None)
            .unwrap();
        assert_eq!(config.api_key_or_demo(), "abc");
    }

    #[test]
    fn test_overrides() {
        let custom_path = PathBuf::from("/tmp/test.db");
        let config = Config::default()
            .with_overrides(Some(custom_path.clone()), None, Some(0), Some(1))
            .unwrap();

        assert_eq!(config.database_path, custom_path);
        assert_eq!(config.max_retries, 0);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(0, Duration::from_secs(1))
        );
    }

    #[test]
    fn test_zero_retry_wait_is_rejected() {
        let result = Config::default().with_overrides(None, None, Some(2), Some(0));
        assert!(result.is_err());

        let config = Config {
            retry_wait_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_wait_secs"));
    }

    #[test]
    fn test_numbers_accept_strings() {
        let from_number: Numbers = serde_json::from_str(r#"{"retries": 4}"#).unwrap();
        let from_string: Numbers = serde_json::from_str(r#"{"retries": "4"}"#).unwrap();
        assert_eq!(from_number.retries, 4);
        assert_eq!(from_string.retries, 4);

        let bad: std::result::Result<Numbers, _> =
            serde_json::from_str(r#"{"retries": "four"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_example_config_documents_keys() {
        let example = example_config();
        assert!(example.contains("api_key"));
        assert!(example.contains("database_path"));
        assert!(example.contains("max_retries"));
    }
}
