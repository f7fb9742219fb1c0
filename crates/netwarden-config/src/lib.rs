//! Configuration for the netwarden CLI and monitor.
//!
//! One TOML file, figment merge order: built-in defaults, then the file,
//! then `NETWARDEN_*` environment variables (double underscore separates
//! sections, e.g. `NETWARDEN_ROUTER__PASSWORD`). Paths for persisted state
//! default into the platform data directory.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use netwarden_api::{GatewayConfig, TransportConfig};
use netwarden_core::AllowlistEntry;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Optional Telegram notification channel. Absent means transitions
    /// are logged but never pushed anywhere.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    #[serde(default)]
    pub allowlist: AllowlistConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Gateway connection settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct RouterConfig {
    /// Gateway root URL.
    #[serde(default = "default_router_url")]
    pub url: String,

    #[serde(default)]
    pub username: String,

    /// Plaintext password -- prefer `NETWARDEN_ROUTER__PASSWORD` in the
    /// environment over putting this in the file.
    #[serde(default)]
    pub password: String,

    /// Per-request timeout for reads, in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Per-request timeout for filter-table writes, in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            url: default_router_url(),
            username: String::new(),
            password: String::new(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
        }
    }
}

fn default_router_url() -> String {
    "http://192.168.0.1".into()
}
fn default_read_timeout() -> u64 {
    10
}
fn default_write_timeout() -> u64 {
    15
}

/// Presence monitor settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Poll interval in seconds.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Case-insensitive name substrings; matching devices' transitions are
    /// pushed to the notification channel. Everything is logged regardless.
    #[serde(default)]
    pub notify_patterns: Vec<String>,

    /// Mark devices stale after this many seconds offline (display only).
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            notify_patterns: Vec::new(),
            stale_after_secs: default_stale_after(),
        }
    }
}

fn default_interval() -> u64 {
    30
}
fn default_stale_after() -> i64 {
    86_400
}

/// Telegram Bot API channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Infrastructure devices seeded into a fresh allowlist.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AllowlistConfig {
    #[serde(default)]
    pub infrastructure: Vec<InfrastructureDevice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfrastructureDevice {
    pub name: String,
    pub mac: String,
    #[serde(default = "default_infra_reason")]
    pub reason: String,
}

fn default_infra_reason() -> String {
    "Infrastructure".into()
}

/// Where persisted state lives. Every path defaults into the platform data
/// directory when unset.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub allowlist_path: Option<PathBuf>,
    pub lockdown_state_path: Option<PathBuf>,
    pub presence_log_path: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "netwarden", "netwarden")
}

/// Default config file location (`~/.config/netwarden/config.toml` on Linux).
pub fn config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("netwarden.toml"))
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl StorageConfig {
    pub fn allowlist_path(&self) -> PathBuf {
        self.allowlist_path
            .clone()
            .unwrap_or_else(|| data_dir().join("allowlist.json"))
    }

    pub fn lockdown_state_path(&self) -> PathBuf {
        self.lockdown_state_path
            .clone()
            .unwrap_or_else(|| data_dir().join("lockdown_state.json"))
    }

    pub fn presence_log_path(&self) -> PathBuf {
        self.presence_log_path
            .clone()
            .unwrap_or_else(|| data_dir().join("presence_history.csv"))
    }
}

// ── Loading ─────────────────────────────────────────────────────────

impl Config {
    /// Load from the given file (or the default location), merged with
    /// defaults and `NETWARDEN_*` environment overrides.
    pub fn load(path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        let file = path.cloned().unwrap_or_else(config_path);
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("NETWARDEN_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.router_url()?;
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "monitor.interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn router_url(&self) -> Result<Url, ConfigError> {
        self.router.url.parse().map_err(|_| ConfigError::Validation {
            field: "router.url".into(),
            reason: format!("invalid URL: {}", self.router.url),
        })
    }

    /// Translate into the api crate's connection config.
    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        Ok(GatewayConfig {
            base_url: self.router_url()?,
            username: self.router.username.clone(),
            password: SecretString::from(self.router.password.clone()),
            transport: TransportConfig {
                read_timeout: Duration::from_secs(self.router.read_timeout_secs),
                write_timeout: Duration::from_secs(self.router.write_timeout_secs),
                ..TransportConfig::default()
            },
        })
    }

    /// Infrastructure devices as allowlist entries.
    pub fn infrastructure_entries(&self) -> Vec<AllowlistEntry> {
        self.allowlist
            .infrastructure
            .iter()
            .map(|d| AllowlistEntry {
                name: d.name.clone(),
                mac: d.mac.clone(),
                reason: d.reason.clone(),
            })
            .collect()
    }

    /// Serialize back to TOML (for `config init` / `config show`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
