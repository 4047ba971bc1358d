//! Client configuration module.
//!
//! Handles loading, validating, and merging a `koukoutu.toml` file on top of
//! the stock defaults. Every key is optional; a missing file means "all
//! defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! endpoint = "https://sync.koukoutu.com/v1/create"
//! timeout_secs = 60            # Per-request timeout for the create call
//! download_timeout_secs = 30   # Timeout for fetching result links (url mode)
//! max_retries = 5              # Extra attempts after a transient failure
//!
//! [defaults]
//! model = "general"            # general | stamp
//! output_format = "webp"       # png | webp
//! crop = false                 # Crop the result to the subject's bounds
//! stamp_crop = false           # Auto-detect and crop printed stamps
//! border = "none"              # none | standard | high
//! response = "file"            # file | url
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "koukoutu.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `koukoutu.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Remote API connection settings.
    pub api: ApiConfig,
    /// Default node inputs used when the caller does not set them.
    pub defaults: DefaultsConfig,
}

impl ClientConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.api.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Validation(
                "api.endpoint must be an http(s) URL".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be positive".into(),
            ));
        }
        if self.api.download_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.download_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Remote API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// URL of the synchronous create endpoint.
    pub endpoint: String,
    /// Per-request timeout for the create call, in seconds.
    pub timeout_secs: u64,
    /// Timeout for downloading a result link, in seconds.
    pub download_timeout_secs: u64,
    /// Extra attempts after a transient failure (total attempts = 1 + this).
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://sync.koukoutu.com/v1/create".to_string(),
            timeout_secs: 60,
            download_timeout_secs: 30,
            max_retries: 5,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Default node inputs. Values are labels, resolved the same way host
/// labels are, so unknown values fall back rather than fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub model: String,
    pub output_format: String,
    pub crop: bool,
    pub stamp_crop: bool,
    pub border: String,
    pub response: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: "general".to_string(),
            output_format: "webp".to_string(),
            crop: false,
            stamp_crop: false,
            border: "none".to_string(),
            response: "file".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `ClientConfig::default()` as TOML, the layer a user file is laid over.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ClientConfig::default()).expect("default config must serialize")
}

/// Lay a user config over `base` one section at a time.
///
/// Both `[api]` and `[defaults]` are flat, so a section present in both is
/// merged key by key and anything else in `overlay` replaces what `base` had.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let toml::Value::Table(overlay) = overlay else {
        return overlay;
    };
    let toml::Value::Table(mut sections) = base else {
        return toml::Value::Table(overlay);
    };
    for (name, section) in overlay {
        let merged = match (sections.remove(&name), section) {
            (Some(toml::Value::Table(mut stock)), toml::Value::Table(user)) => {
                stock.extend(user);
                toml::Value::Table(stock)
            }
            (_, user) => user,
        };
        sections.insert(name, merged);
    }
    toml::Value::Table(sections)
}

/// Read `path` as raw TOML, or `None` when there is no such file.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Deserialize `base` with the optional user layer on top, then validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ClientConfig, ConfigError> {
    let layered = match overlay {
        Some(user) => merge_toml(base, user),
        None => base,
    };
    let config: ClientConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults and validated.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        log::debug!("Loaded config overrides from {}", path.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `koukoutu.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Koukoutu Background Removal Configuration
# =========================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Remote API
# ---------------------------------------------------------------------------
[api]
# Synchronous create endpoint.
endpoint = "https://sync.koukoutu.com/v1/create"

# Per-request timeout for the create call, in seconds.
timeout_secs = 60

# Timeout for downloading a result link (response = "url"), in seconds.
download_timeout_secs = 30

# Extra attempts after a transient failure (HTTP 500/502/503/504 in the
# status envelope, or a network error). Retries are immediate.
max_retries = 5

# ---------------------------------------------------------------------------
# Default inputs
# ---------------------------------------------------------------------------
[defaults]
# general | stamp
model = "general"

# png | webp
output_format = "webp"

# Crop the result to the subject's bounding box.
crop = false

# Auto-detect and crop printed stamps.
stamp_crop = false

# Edge enhancement: none | standard | high
border = "none"

# file: raw image bytes; url: JSON with a download link
response = "file"
"##
}
