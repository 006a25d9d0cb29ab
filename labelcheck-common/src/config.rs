//! Configuration loading
//!
//! Resolution order for the config file path:
//! 1. Explicit path (command-line argument)
//! 2. `LABELCHECK_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/labelcheck/labelcheck.toml` on Linux)
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! Values that have no safe default (the OCR API key, the UL moderate
//! fraction) are resolved by the command that needs them and fail fast there.

use crate::retry::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "LABELCHECK_CONFIG";

/// Environment variable overriding `[ocr] api_key`
pub const OCR_API_KEY_ENV_VAR: &str = "LABELCHECK_OCR_API_KEY";

const DEFAULT_OCR_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub ul: UlConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
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

/// Taxonomy / product database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite reference database
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// OCR collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ocr_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_ocr_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_ocr_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
            api_key: None,
            timeout_ms: default_ocr_timeout_ms(),
            max_attempts: default_ocr_max_attempts(),
            initial_backoff_ms: default_ocr_backoff_ms(),
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.initial_backoff_ms))
    }
}

/// Reference-table read settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Ids per batched `IN (...)` query
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_reference_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_reference_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_attempts: default_reference_max_attempts(),
            initial_backoff_ms: default_reference_backoff_ms(),
        }
    }
}

impl ReferenceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.initial_backoff_ms))
    }
}

/// Upper-limit warning settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UlConfig {
    /// Fraction of the UL at which the moderate tier starts. No default:
    /// it must be confirmed against the full UL computation before use.
    #[serde(default)]
    pub moderate_fraction: Option<f64>,
}

impl UlConfig {
    /// Resolve the moderate fraction, failing when absent or out of (0, 1]
    pub fn require_moderate_fraction(&self) -> Result<f64> {
        match self.moderate_fraction {
            Some(fraction) if fraction > 0.0 && fraction <= 1.0 => Ok(fraction),
            Some(fraction) => Err(Error::Config(format!(
                "ul.moderate_fraction must be in (0, 1], got {}",
                fraction
            ))),
            None => Err(Error::Config(
                "ul.moderate_fraction is not configured".to_string(),
            )),
        }
    }
}

/// Offline root-cause diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            seed: 0,
            top_n: default_top_n(),
            max_examples: default_max_examples(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:5740".to_string()
}

fn default_ocr_endpoint() -> String {
    DEFAULT_OCR_ENDPOINT.to_string()
}

fn default_ocr_timeout_ms() -> u64 {
    20_000
}

fn default_ocr_max_attempts() -> u32 {
    2
}

fn default_ocr_backoff_ms() -> u64 {
    500
}

fn default_chunk_size() -> usize {
    200
}

fn default_reference_max_attempts() -> u32 {
    3
}

fn default_reference_backoff_ms() -> u64 {
    100
}

fn default_sample_size() -> usize {
    1_000
}

fn default_top_n() -> usize {
    20
}

fn default_max_examples() -> usize {
    25
}

/// Resolve the config file path (explicit → env → platform default)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|d| d.join("labelcheck").join("labelcheck.toml"))
}

/// Load TOML config, falling back to defaults when the file is missing.
///
/// A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file location available, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the config location and load it: `--config`, then
/// `LABELCHECK_CONFIG`, then the platform config directory
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let path = resolve_config_path(cli_arg);
    load_toml_config(path.as_deref())
}

/// Resolve the OCR API key: environment first, then TOML
pub fn resolve_ocr_api_key(config: &OcrConfig) -> Result<String> {
    if let Ok(key) = std::env::var(OCR_API_KEY_ENV_VAR) {
        if is_valid_key(&key) {
            info!("OCR API key loaded from environment variable");
            return Ok(key);
        }
    }

    if let Some(key) = config.api_key.as_ref().filter(|k| is_valid_key(k)) {
        info!("OCR API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(format!(
        "OCR API key not configured. Set {} or [ocr] api_key in the config file",
        OCR_API_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the reference database path, failing when none is configured
pub fn require_database_path(config: &DatabaseConfig, cli_arg: Option<&Path>) -> Result<PathBuf> {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.path.clone())
        .ok_or_else(|| Error::Config("database path is not configured ([database] path)".to_string()))
}
