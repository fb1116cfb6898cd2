//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/reflect/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/reflect/` (~/.config/reflect/)
//! - Data: `$XDG_DATA_HOME/reflect/` (~/.local/share/reflect/)
//! - State/Logs: `$XDG_STATE_HOME/reflect/` (~/.local/state/reflect/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Analysis provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to bind (host only)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Database file path; defaults to the XDG data directory
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// The configured path, or `$XDG_DATA_HOME/reflect/journal.db`
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Config::database_path)
    }
}

/// Analysis provider configuration
///
/// When an API key is present, new and edited entries are analyzed for
/// cognitive distortions. Without one the journal works normally and
/// entries simply stay unanalyzed.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// API key (can also come from the REFLECT_PROVIDER_API_KEY env var)
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_provider_model")]
    pub model: String,

    /// API endpoint base URL
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_provider_max_retries")]
    pub max_retries: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_provider_model(),
            endpoint: default_provider_endpoint(),
            timeout_secs: default_provider_timeout(),
            max_retries: default_provider_max_retries(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key from config or environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("REFLECT_PROVIDER_API_KEY").ok())
    }

    /// Check if the provider is configured well enough to call
    pub fn is_ready(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config(
                "provider.endpoint must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "provider.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_provider_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_provider_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_provider_max_retries() -> usize {
    3
}

/// Analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Default lookback window in days
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Max example sentences kept per distortion kind
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Max entries processed per batch-analyze call
    #[serde(default = "default_batch_limit")]
    pub max_batch_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            max_examples: default_max_examples(),
            max_batch_size: default_batch_limit(),
        }
    }
}

impl AnalyticsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.default_window_days == 0 || self.default_window_days > 365 {
            return Err(Error::Config(
                "analytics.default_window_days must be between 1 and 365".to_string(),
            ));
        }
        if self.max_examples == 0 {
            return Err(Error::Config(
                "analytics.max_examples must be at least 1".to_string(),
            ));
        }
        if self.max_batch_size == 0 || self.max_batch_size > 20 {
            return Err(Error::Config(
                "analytics.max_batch_size must be between 1 and 20".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_window_days() -> u32 {
    30
}

fn default_max_examples() -> usize {
    3
}

fn default_batch_limit() -> usize {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.analytics.validate()?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/reflect/config.toml` (~/.config/reflect/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("reflect").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/reflect/` (~/.local/share/reflect/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("reflect")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/reflect/` (~/.local/state/reflect/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("reflect")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/reflect/journal.db` (~/.local/share/reflect/journal.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("journal.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/reflect/reflect.log` (~/.local/state/reflect/reflect.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("reflect.log")
    }
}
