//! Configuration management for the fair value services.
//!
//! The calculator and its HTTP front share one configuration file at
//! `~/.fairvalue/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (FAIR_VALUE_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `FAIR_VALUE_LOG_LEVEL` → observability.log_level
//! - `FAIR_VALUE_PORT` → server.port
//! - `FAIR_VALUE_BIND_ADDRESS` → server.host
//! - `FAIR_VALUE_DATA_DIR` → data.snapshot_dir

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".fairvalue"),
        |dirs| dirs.home_dir().join(".fairvalue"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Where a configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A config file on disk
    File(PathBuf),
    /// Nothing at the default location, built-in defaults apply
    Defaults(PathBuf),
}

impl ConfigSource {
    /// An explicit path always wins; otherwise probe the default location.
    pub fn resolve(path: Option<&Path>) -> Self {
        Self::resolve_with(path, config_path())
    }

    fn resolve_with(path: Option<&Path>, default_path: PathBuf) -> Self {
        match path {
            Some(p) => Self::File(p.to_path_buf()),
            None if default_path.exists() => Self::File(default_path),
            None => Self::Defaults(default_path),
        }
    }

    /// Report the source. Call once logging is initialized.
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::debug!(path = %path.display(), "Loaded config"),
            Self::Defaults(path) => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults")
            }
        }
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// HTTP server bind settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot source and cache settings
    #[serde(default)]
    pub data: DataConfig,

    /// Valuation defaults and constants
    #[serde(default)]
    pub valuation: ValuationSettings,
}

impl Config {
    /// Load configuration from a resolved source.
    pub fn load(source: &ConfigSource) -> Result<Self> {
        match source {
            ConfigSource::File(path) => Self::load_from(path),
            ConfigSource::Defaults(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration and apply environment overrides.
    pub fn load_with_env(source: &ConfigSource) -> Result<Self> {
        let mut config = Self::load(source)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("FAIR_VALUE_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(port) = std::env::var("FAIR_VALUE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(bind) = std::env::var("FAIR_VALUE_BIND_ADDRESS") {
            self.server.host = bind;
        }
        if let Ok(dir) = std::env::var("FAIR_VALUE_DATA_DIR") {
            self.data.snapshot_dir = Some(dir);
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to hold at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    4480
}

// ============================================================================
// Data
// ============================================================================

/// Snapshot source and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `<TICKER>.json` market snapshots.
    /// Defaults to `~/.fairvalue/snapshots`.
    #[serde(default)]
    pub snapshot_dir: Option<String>,

    /// Lifetime of a cached snapshot in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: i64,

    /// Width of the timestamp bucket that forms part of the cache key
    #[serde(default = "default_cache_bucket")]
    pub cache_bucket_secs: i64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            cache_ttl_secs: default_cache_ttl(),
            cache_bucket_secs: default_cache_bucket(),
        }
    }
}

impl DataConfig {
    /// Resolve the snapshot directory, expanding `~`.
    pub fn snapshot_dir(&self) -> PathBuf {
        match &self.snapshot_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => config_dir().join("snapshots"),
        }
    }
}

fn default_cache_ttl() -> i64 {
    3600
}

fn default_cache_bucket() -> i64 {
    3600
}

// ============================================================================
// Valuation
// ============================================================================

/// Valuation constants and user-parameter defaults.
///
/// Percent-valued fields are whole percentage points (8.5 means 8.5%);
/// `market_return` and `default_risk_free_rate` are decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSettings {
    /// Assumed market return for CAPM
    #[serde(default = "default_market_return")]
    pub market_return: f64,

    /// WACC used when the CAPM estimate is non-positive or NaN (%)
    #[serde(default = "default_fallback_wacc")]
    pub fallback_wacc_percent: f64,

    /// Risk-free rate used when no yield quote is available
    #[serde(default = "default_risk_free_rate")]
    pub default_risk_free_rate: f64,

    #[serde(default = "default_terminal_growth")]
    pub default_terminal_growth_percent: f64,

    #[serde(default = "default_sector_pe")]
    pub default_sector_pe: f64,

    #[serde(default = "default_forward_growth")]
    pub default_forward_growth_percent: f64,

    /// Divide cash flow by one share when shares outstanding is unknown.
    /// Off by default: the per-share figure is meaningless in that case.
    #[serde(default)]
    pub unit_share_fallback: bool,

    /// P/E gauge anchors
    #[serde(default)]
    pub gauge: GaugeSettings,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            market_return: default_market_return(),
            fallback_wacc_percent: default_fallback_wacc(),
            default_risk_free_rate: default_risk_free_rate(),
            default_terminal_growth_percent: default_terminal_growth(),
            default_sector_pe: default_sector_pe(),
            default_forward_growth_percent: default_forward_growth(),
            unit_share_fallback: false,
            gauge: GaugeSettings::default(),
        }
    }
}

/// P/E values at which the gauge changes band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GaugeSettings {
    #[serde(default = "default_cheap_pe")]
    pub cheap_pe: f64,
    #[serde(default = "default_fair_pe")]
    pub fair_pe: f64,
    #[serde(default = "default_rich_pe")]
    pub rich_pe: f64,
}

impl Default for GaugeSettings {
    fn default() -> Self {
        Self {
            cheap_pe: default_cheap_pe(),
            fair_pe: default_fair_pe(),
            rich_pe: default_rich_pe(),
        }
    }
}

fn default_market_return() -> f64 {
    0.10
}

fn default_fallback_wacc() -> f64 {
    8.5
}

fn default_risk_free_rate() -> f64 {
    0.04
}

fn default_terminal_growth() -> f64 {
    2.5
}

fn default_sector_pe() -> f64 {
    15.0
}

fn default_forward_growth() -> f64 {
    10.0
}

fn default_cheap_pe() -> f64 {
    15.0
}

fn default_fair_pe() -> f64 {
    20.0
}

fn default_rich_pe() -> f64 {
    25.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4480);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.observability.log_level, "info");
        assert!((config.valuation.market_return - 0.10).abs() < f64::EPSILON);
        assert!(!config.valuation.unit_share_fallback);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{
            "server": { "port": 9000 },
            "valuation": { "default_sector_pe": 22.5, "gauge": { "fair_pe": 18.0 } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!((config.valuation.default_sector_pe - 22.5).abs() < f64::EPSILON);
        assert!((config.valuation.fallback_wacc_percent - 8.5).abs() < f64::EPSILON);
        assert!((config.valuation.gauge.fair_pe - 18.0).abs() < f64::EPSILON);
        assert!((config.valuation.gauge.rich_pe - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.data.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_log_aliases() {
        let json = r#"{ "observability": { "level": "debug", "format": "json" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.server.port = 5123;
        config.data.snapshot_dir = Some("/tmp/snaps".into());
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load(&ConfigSource::File(path)).unwrap();
        assert_eq!(loaded.server.port, 5123);
        assert_eq!(loaded.data.snapshot_dir(), PathBuf::from("/tmp/snaps"));
    }

    #[test]
    fn test_resolve_source() {
        let dir = tempfile::tempdir().unwrap();
        let default_path = dir.path().join("config.json");

        let source = ConfigSource::resolve_with(None, default_path.clone());
        assert_eq!(source, ConfigSource::Defaults(default_path.clone()));
        assert_eq!(Config::load(&source).unwrap().server.port, 4480);

        fs::write(&default_path, "{}").unwrap();
        let source = ConfigSource::resolve_with(None, default_path.clone());
        assert_eq!(source, ConfigSource::File(default_path.clone()));

        let explicit = dir.path().join("other.json");
        let source = ConfigSource::resolve_with(Some(&explicit), default_path);
        assert_eq!(source, ConfigSource::File(explicit));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::File(dir.path().join("absent.json"));
        assert!(Config::load(&source).is_err());
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_default_snapshot_dir() {
        let data = DataConfig::default();
        assert!(data.snapshot_dir().ends_with("snapshots"));
    }
}
