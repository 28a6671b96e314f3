//! Configuration management for keyprobe.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Everything is validated once at startup
//! so that a bad value fails the process before any probe is sent.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Code, DestinationId, Keyspace, MAX_CODE_WIDTH};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the code in [`ProbeConfig::join_url_template`].
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Largest accepted worker pool.
pub const MAX_WORKERS: usize = 1024;

/// Largest accepted batch; a batch is materialized in memory before dispatch.
pub const MAX_BATCH_SIZE: u64 = 1_000_000;

/// Destination id used for the webhook supplied through `KEYPROBE_WEBHOOK_URL`.
pub const ENV_WEBHOOK_DESTINATION: &str = "default";

/// Main application configuration.
///
/// This is loaded from `~/.config/keyprobe/config.toml` (or platform equivalent)
/// unless an explicit path is given. Missing sections fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Keyspace and worker pool settings
    pub scanning: ScanningConfig,
    /// Remote probe endpoint settings
    pub probe: ProbeConfig,
    /// Notification delivery settings
    pub notify: NotifyConfig,
    /// Liveness endpoint settings
    pub liveness: LivenessConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `KEYPROBE_ENDPOINT`: Override the probe endpoint URL
    /// - `KEYPROBE_WORKERS`: Override the worker count
    /// - `KEYPROBE_REQUEST_DELAY_MS`: Override the per-request delay
    /// - `KEYPROBE_WEBHOOK_URL`: Register a webhook under the `default` destination
    /// - `KEYPROBE_LIVENESS_ADDR`: Override the liveness bind address
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// # Errors
    /// Returns error if a numeric override cannot be parsed.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("KEYPROBE_ENDPOINT") {
            tracing::debug!("Override probe.endpoint from env");
            self.probe.endpoint = val;
        }

        if let Some(val) = lookup("KEYPROBE_WORKERS") {
            self.scanning.workers = val.parse().map_err(|_| {
                ConfigError::invalid("KEYPROBE_WORKERS", format!("not a number: '{val}'"))
            })?;
            tracing::debug!(
                "Override scanning.workers from env: {}",
                self.scanning.workers
            );
        }

        if let Some(val) = lookup("KEYPROBE_REQUEST_DELAY_MS") {
            self.scanning.request_delay_ms = val.parse().map_err(|_| {
                ConfigError::invalid("KEYPROBE_REQUEST_DELAY_MS", format!("not a number: '{val}'"))
            })?;
            tracing::debug!(
                "Override scanning.request_delay_ms from env: {}",
                self.scanning.request_delay_ms
            );
        }

        if let Some(url) = lookup("KEYPROBE_WEBHOOK_URL") {
            tracing::debug!("Registering webhook destination '{ENV_WEBHOOK_DESTINATION}' from env");
            self.notify
                .webhooks
                .retain(|w| w.destination != ENV_WEBHOOK_DESTINATION);
            self.notify.webhooks.push(WebhookConfig {
                destination: ENV_WEBHOOK_DESTINATION.to_string(),
                url,
            });
        }

        if let Some(val) = lookup("KEYPROBE_LIVENESS_ADDR") {
            tracing::debug!("Override liveness.bind_addr from env: {}", val);
            self.liveness.bind_addr = val;
        }

        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns the first invalid value found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.scanning.validate()?;
        self.probe.validate()?;
        self.notify.validate()?;
        self.liveness.validate()?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/keyprobe/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "keyprobe", "keyprobe").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Keyspace and worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Inclusive lower bound of the keyspace
    pub lower_bound: u64,
    /// Exclusive upper bound of the keyspace
    pub upper_bound: u64,
    /// Digits per code (zero-padded)
    pub code_width: usize,
    /// Codes per batch
    pub batch_size: u64,
    /// Number of concurrent probe workers
    pub workers: usize,
    /// Delay each worker waits after every request, in milliseconds
    pub request_delay_ms: u64,
    /// Emit a progress note every this many checked codes
    pub progress_interval: u64,
    /// Start a new pass once the keyspace is exhausted
    pub continuous: bool,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            lower_bound: 100_000,
            upper_bound: 1_000_000,
            code_width: 6,
            batch_size: 10_000,
            workers: 5,
            request_delay_ms: 50,
            progress_interval: 1000,
            continuous: false,
        }
    }
}

impl ScanningConfig {
    /// Build the keyspace described by the bounds and width.
    ///
    /// # Errors
    /// Returns error if the bounds are inverted or do not fit the width.
    pub fn keyspace(&self) -> ConfigResult<Keyspace> {
        Keyspace::new(self.lower_bound, self.upper_bound, self.code_width)
            .map_err(|e| ConfigError::invalid("scanning", e.to_string()))
    }

    /// Per-request delay as a `Duration`.
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.upper_bound <= self.lower_bound {
            return Err(ConfigError::invalid(
                "scanning.upper_bound",
                format!(
                    "must be greater than lower_bound ({} <= {})",
                    self.upper_bound, self.lower_bound
                ),
            ));
        }
        if self.code_width == 0 || self.code_width > MAX_CODE_WIDTH {
            return Err(ConfigError::invalid(
                "scanning.code_width",
                format!("must be between 1 and {MAX_CODE_WIDTH}"),
            ));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::invalid(
                "scanning.batch_size",
                format!("must be between 1 and {MAX_BATCH_SIZE}"),
            ));
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::invalid(
                "scanning.workers",
                format!("must be between 1 and {MAX_WORKERS}"),
            ));
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::invalid(
                "scanning.progress_interval",
                "must be greater than zero",
            ));
        }
        self.keyspace()?;
        Ok(())
    }
}

/// Remote probe endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// URL receiving the `code` form field
    pub endpoint: String,
    /// Join link template; `{code}` is replaced with the discovered code
    pub join_url_template: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.gimkit.com/api/matchmaker/find-info-from-code".to_string(),
            join_url_template: "https://gimkit.com/join?gc={code}".to_string(),
            timeout_secs: 10,
            user_agent: concat!("keyprobe/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProbeConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the join link for a code.
    #[must_use]
    pub fn join_link(&self, code: &Code) -> String {
        self.join_url_template
            .replace(CODE_PLACEHOLDER, code.as_str())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("probe.endpoint", "is required"));
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::invalid("probe.endpoint", e.to_string()))?;
        if !self.join_url_template.contains(CODE_PLACEHOLDER) {
            return Err(ConfigError::invalid(
                "probe.join_url_template",
                format!("must contain {CODE_PLACEHOLDER}"),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "probe.timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Seconds between dispatch cycles
    pub dispatch_period_secs: u64,
    /// Register a target that writes every message to the log
    pub log_target: bool,
    /// Author name shown on webhook embeds
    pub author_name: String,
    /// Embed accent color (RGB)
    pub embed_color: u32,
    /// Webhook destinations
    pub webhooks: Vec<WebhookConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dispatch_period_secs: 5,
            log_target: true,
            author_name: "Slime Bot".to_string(),
            embed_color: 0x0050_B4E6,
            webhooks: Vec::new(),
        }
    }
}

impl NotifyConfig {
    /// Dispatch period as a `Duration`.
    #[must_use]
    pub fn dispatch_period(&self) -> Duration {
        Duration::from_secs(self.dispatch_period_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.dispatch_period_secs == 0 {
            return Err(ConfigError::invalid(
                "notify.dispatch_period_secs",
                "must be greater than zero",
            ));
        }
        if self.embed_color > 0x00FF_FFFF {
            return Err(ConfigError::invalid(
                "notify.embed_color",
                "must be a 24-bit RGB value",
            ));
        }

        let mut seen = HashSet::new();
        for webhook in &self.webhooks {
            DestinationId::new(&webhook.destination)
                .map_err(|e| ConfigError::invalid("notify.webhooks.destination", e.to_string()))?;
            if !seen.insert(webhook.destination.as_str()) {
                return Err(ConfigError::invalid(
                    "notify.webhooks.destination",
                    format!("duplicate destination '{}'", webhook.destination),
                ));
            }
            url::Url::parse(&webhook.url).map_err(|e| {
                ConfigError::invalid(
                    "notify.webhooks.url",
                    format!("destination '{}': {e}", webhook.destination),
                )
            })?;
        }
        Ok(())
    }
}

/// A webhook destination.
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Destination id the webhook is registered under
    pub destination: String,
    /// Webhook URL (a secret: it grants posting rights)
    pub url: String,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("destination", &self.destination)
            .field("url", &"<redacted>")
            .finish()
    }
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Serve the liveness endpoint
    pub enabled: bool,
    /// Address to bind
    pub bind_addr: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl LivenessConfig {
    /// Parsed bind address.
    ///
    /// # Errors
    /// Returns error if the address is not `host:port`.
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigError::invalid("liveness.bind_addr", format!("{e}")))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.enabled {
            self.socket_addr()?;
        }
        Ok(())
    }
}
