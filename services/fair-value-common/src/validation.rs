//! Configuration validation.
//!
//! Checks that configured values are present and within ranges the
//! valuation formulas can work with.

use thiserror::Error;

use crate::config::{
    Config, ConfigSource, DataConfig, GaugeSettings, ObservabilityConfig, ServerConfig, ValuationSettings,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let sections: [&dyn Validate; 4] =
            [&self.observability, &self.server, &self.data, &self.valuation];
        for section in sections {
            if let Err(e) = section.validate() {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load, apply environment overrides and validate.
    pub fn load_and_validate(source: &ConfigSource) -> anyhow::Result<Self> {
        let config = Self::load_with_env(source)?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }

        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "server.host".into(),
            });
        }

        Ok(())
    }
}

impl Validate for DataConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.cache_ttl_secs <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "data.cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.cache_bucket_secs <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "data.cache_bucket_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ValuationSettings {
    fn validate(&self) -> ValidationResult<()> {
        if !self.market_return.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "valuation.market_return".into(),
                reason: "must be a finite decimal rate".into(),
            });
        }

        if self.fallback_wacc_percent.is_nan() || self.fallback_wacc_percent <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "valuation.fallback_wacc_percent".into(),
                reason: "must be greater than 0".into(),
            });
        }

        self.gauge.validate()
    }
}

impl Validate for GaugeSettings {
    fn validate(&self) -> ValidationResult<()> {
        if !(0.0 < self.cheap_pe && self.cheap_pe < self.fair_pe && self.fair_pe < self.rich_pe) {
            return Err(ValidationError::InvalidValue {
                field: "valuation.gauge".into(),
                reason: format!(
                    "anchors must satisfy 0 < cheap_pe < fair_pe < rich_pe (got {}, {}, {})",
                    self.cheap_pe, self.fair_pe, self.rich_pe
                ),
            });
        }

        Ok(())
    }
}
