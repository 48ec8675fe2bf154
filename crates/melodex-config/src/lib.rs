//! Configuration for the melodex CLI.
//!
//! TOML config with environment overrides, the persisted session token,
//! and translation to `melodex_core::EngineConfig`. Core never reads
//! files; everything disk-shaped lives here.

mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use melodex_core::{EngineConfig, ReconcilePolicy, TlsMode};

pub use session::{TOKEN_ENV, clear_token, load_token, resolve_token, save_token, session_path};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse session file: {0}")]
    Session(#[from] toml::de::Error),

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
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// Where the catalog backend lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// API root, e.g. "https://catalog.example.com/api".
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Reconciliation and refresh tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_reconcile_delay_ms")]
    pub reconcile_delay_ms: u64,

    /// 0 disables reconciliation.
    #[serde(default = "default_reconcile_attempts")]
    pub reconcile_attempts: u32,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: u32,

    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    #[serde(default = "default_focus_debounce_ms")]
    pub focus_debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconcile_delay_ms: default_reconcile_delay_ms(),
            reconcile_attempts: default_reconcile_attempts(),
            backoff_factor: default_backoff_factor(),
            bus_capacity: default_bus_capacity(),
            focus_debounce_ms: default_focus_debounce_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".into()
}
fn default_timeout() -> u64 {
    15
}
fn default_reconcile_delay_ms() -> u64 {
    1000
}
fn default_reconcile_attempts() -> u32 {
    3
}
fn default_backoff_factor() -> u32 {
    2
}
fn default_bus_capacity() -> usize {
    256
}
fn default_focus_debounce_ms() -> u64 {
    500
}

impl Config {
    /// Validate and translate into the engine's runtime configuration.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let base_url: url::Url =
            self.server
                .base_url
                .parse()
                .map_err(|e| ConfigError::Validation {
                    field: "server.base_url".into(),
                    reason: format!("{e}: {}", self.server.base_url),
                })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ConfigError::Validation {
                field: "server.base_url".into(),
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }

        if self.server.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "server.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.sync.bus_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "sync.bus_capacity".into(),
                reason: "must be positive".into(),
            });
        }
        if self.sync.backoff_factor == 0 {
            return Err(ConfigError::Validation {
                field: "sync.backoff_factor".into(),
                reason: "must be at least 1".into(),
            });
        }

        let tls = if self.server.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.server.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        Ok(EngineConfig {
            base_url,
            timeout: Duration::from_secs(self.server.timeout),
            tls,
            reconcile: ReconcilePolicy {
                initial_delay: Duration::from_millis(self.sync.reconcile_delay_ms),
                max_attempts: self.sync.reconcile_attempts,
                backoff_factor: self.sync.backoff_factor,
            },
            bus_capacity: self.sync.bus_capacity,
            focus_debounce: Duration::from_millis(self.sync.focus_debounce_ms),
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "melodex", "melodex")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

pub(crate) fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("melodex");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

const CLI_ENV_KEYS: &[&str] = &["token", "url", "timeout", "insecure", "config", "output", "color"];

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `MELODEX_*` variables.
///
/// Nested keys use a double underscore: `MELODEX_SERVER__BASE_URL`.
/// Variables read directly by the CLI (`MELODEX_TOKEN`, `MELODEX_URL`, ...)
/// are skipped.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("MELODEX_")
                .ignore(CLI_ENV_KEYS)
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML at the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
