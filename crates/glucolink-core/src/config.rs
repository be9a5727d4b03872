//! Configuration module for GlucoLink.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, PatientId, Region};
use crate::ports::Credentials;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for GlucoLink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub librelink: LibreLinkConfig,
    pub nightscout: NightscoutConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// LibreLink Up account settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibreLinkConfig {
    /// Account e-mail address.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Regional endpoint code, e.g. `EU` or `US`.
    pub region: String,
    /// Patient id to relay when the account follows several patients.
    pub connection: Option<String>,
}

/// Nightscout sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NightscoutConfig {
    /// Host (and optional path) of the Nightscout site, without scheme.
    pub url: String,
    /// API secret (v1) or access token (v3).
    pub api_token: String,
    /// Use the v3 API instead of v1.
    pub api_v3: bool,
    /// Talk plain HTTP instead of HTTPS.
    pub disable_https: bool,
    /// Device name stamped on every uploaded entry.
    pub device: String,
    /// Application name stamped on v3 entries.
    pub app: String,
}

/// Tick scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minutes between ticks.
    pub interval_minutes: u64,
    /// Run one tick and exit.
    pub single_shot: bool,
    /// Ignore the sink watermark and resend every reading.
    pub all_data: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics` while the daemon runs.
    pub enabled: bool,
    /// Listen address, `host:port`.
    pub endpoint: String,
}

impl std::fmt::Debug for LibreLinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreLinkConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .field("connection", &self.connection)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/glucolink/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("glucolink")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

/// Device name used when none is configured.
pub const DEFAULT_DEVICE_NAME: &str = "nightscout-librelink-up";

impl Default for LibreLinkConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            region: Region::default().code().to_string(),
            connection: None,
        }
    }
}

impl Default for NightscoutConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_token: String::new(),
            api_v3: false,
            disable_https: false,
            device: DEFAULT_DEVICE_NAME.to_string(),
            app: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            single_shot: false,
            all_data: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "127.0.0.1:9100".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

impl LibreLinkConfig {
    /// Login credentials.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Parsed regional endpoint.
    pub fn region(&self) -> Result<Region, DomainError> {
        self.region.parse()
    }

    /// Parsed patient preference; blank counts as unset.
    pub fn preferred_patient(&self) -> Result<Option<PatientId>, DomainError> {
        match self.connection.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(id) => PatientId::new(id).map(Some),
        }
    }
}

impl NightscoutConfig {
    /// Base URL with scheme and without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.url.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        let scheme = if self.disable_https { "http" } else { "https" };
        format!("{scheme}://{host}")
    }
}

impl MetricsConfig {
    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.endpoint.parse()
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Apply overrides from the process environment.
    ///
    /// Returns one [`ValidationError`] per variable whose value could not be
    /// parsed; the remaining variables are still applied.
    pub fn apply_env(&mut self) -> Vec<ValidationError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        if let Some(v) = lookup("LINK_UP_USERNAME") {
            self.librelink.username = v;
        }
        if let Some(v) = lookup("LINK_UP_PASSWORD") {
            self.librelink.password = v;
        }
        if let Some(v) = lookup("LINK_UP_REGION") {
            self.librelink.region = v;
        }
        if let Some(v) = lookup("LINK_UP_CONNECTION") {
            self.librelink.connection = Some(v);
        }
        if let Some(v) = lookup("LINK_UP_TIME_INTERVAL") {
            match v.trim().parse() {
                Ok(minutes) => self.sync.interval_minutes = minutes,
                Err(_) => errors.push(env_error("LINK_UP_TIME_INTERVAL", &v, "a whole number")),
            }
        }

        if let Some(v) = lookup("NIGHTSCOUT_URL") {
            self.nightscout.url = v;
        }
        if let Some(v) = lookup("NIGHTSCOUT_API_TOKEN") {
            self.nightscout.api_token = v;
        }
        if let Some(v) = lookup("DEVICE_NAME") {
            self.nightscout.device = v;
        }

        let flags: [(&str, &mut bool); 5] = [
            ("NIGHTSCOUT_DISABLE_HTTPS", &mut self.nightscout.disable_https),
            ("NIGHTSCOUT_API_V3", &mut self.nightscout.api_v3),
            ("SINGLE_SHOT", &mut self.sync.single_shot),
            ("ALL_DATA", &mut self.sync.all_data),
            ("METRICS_ENABLED", &mut self.metrics.enabled),
        ];
        for (key, target) in flags {
            if let Some(v) = lookup(key) {
                match parse_bool(&v) {
                    Some(b) => *target = b,
                    None => errors.push(env_error(key, &v, "true or false")),
                }
            }
        }

        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v.trim().to_lowercase();
        }
        if let Some(v) = lookup("METRICS_ENDPOINT") {
            self.metrics.endpoint = v;
        }

        errors
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn env_error(key: &str, value: &str, expected: &str) -> ValidationError {
    ValidationError {
        field: key.to_string(),
        message: format!("invalid value '{value}'; expected {expected}"),
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_minutes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- librelink ---
        if self.librelink.username.trim().is_empty() {
            errors.push(ValidationError {
                field: "librelink.username".into(),
                message: "must be set (LINK_UP_USERNAME)".into(),
            });
        }
        if self.librelink.password.is_empty() {
            errors.push(ValidationError {
                field: "librelink.password".into(),
                message: "must be set (LINK_UP_PASSWORD)".into(),
            });
        }
        if let Err(e) = self.librelink.region() {
            let valid: Vec<&str> = Region::ALL.iter().map(Region::code).collect();
            errors.push(ValidationError {
                field: "librelink.region".into(),
                message: format!("{e}; valid options: {}", valid.join(", ")),
            });
        }
        if let Err(e) = self.librelink.preferred_patient() {
            errors.push(ValidationError {
                field: "librelink.connection".into(),
                message: e.to_string(),
            });
        }

        // --- nightscout ---
        if self.nightscout.url.trim().is_empty() {
            errors.push(ValidationError {
                field: "nightscout.url".into(),
                message: "must be set (NIGHTSCOUT_URL)".into(),
            });
        } else if let Err(e) = url::Url::parse(&self.nightscout.base_url()) {
            errors.push(ValidationError {
                field: "nightscout.url".into(),
                message: format!("invalid URL '{}': {e}", self.nightscout.base_url()),
            });
        }
        if self.nightscout.api_token.is_empty() {
            errors.push(ValidationError {
                field: "nightscout.api_token".into(),
                message: "must be set (NIGHTSCOUT_API_TOKEN)".into(),
            });
        }
        if self.nightscout.device.trim().is_empty() {
            errors.push(ValidationError {
                field: "nightscout.device".into(),
                message: "must not be empty".into(),
            });
        }

        // --- sync ---
        if self.sync.interval_minutes == 0 {
            errors.push(ValidationError {
                field: "sync.interval_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- metrics ---
        if self.metrics.enabled && self.metrics.socket_addr().is_err() {
            errors.push(ValidationError {
                field: "metrics.endpoint".into(),
                message: format!("invalid socket address '{}'", self.metrics.endpoint),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use glucolink_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .librelink_credentials("me@example.com", "secret")
///     .librelink_region("US")
///     .nightscout_url("ns.example.com")
///     .nightscout_api_token("token")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- librelink ---

    pub fn librelink_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.librelink.username = username.into();
        self.config.librelink.password = password.into();
        self
    }

    pub fn librelink_region(mut self, region: impl Into<String>) -> Self {
        self.config.librelink.region = region.into();
        self
    }

    pub fn librelink_connection(mut self, patient_id: impl Into<String>) -> Self {
        self.config.librelink.connection = Some(patient_id.into());
        self
    }

    // --- nightscout ---

    pub fn nightscout_url(mut self, url: impl Into<String>) -> Self {
        self.config.nightscout.url = url.into();
        self
    }

    pub fn nightscout_api_token(mut self, token: impl Into<String>) -> Self {
        self.config.nightscout.api_token = token.into();
        self
    }

    pub fn nightscout_api_v3(mut self, enabled: bool) -> Self {
        self.config.nightscout.api_v3 = enabled;
        self
    }

    pub fn nightscout_disable_https(mut self, disabled: bool) -> Self {
        self.config.nightscout.disable_https = disabled;
        self
    }

    pub fn nightscout_device(mut self, device: impl Into<String>) -> Self {
        self.config.nightscout.device = device.into();
        self
    }

    // --- sync ---

    pub fn sync_interval_minutes(mut self, minutes: u64) -> Self {
        self.config.sync.interval_minutes = minutes;
        self
    }

    pub fn sync_single_shot(mut self, single_shot: bool) -> Self {
        self.config.sync.single_shot = single_shot;
        self
    }

    pub fn sync_all_data(mut self, all_data: bool) -> Self {
        self.config.sync.all_data = all_data;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- metrics ---

    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics.enabled = enabled;
        self
    }

    pub fn metrics_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.metrics.endpoint = endpoint.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
