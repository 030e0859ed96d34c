//! Fair Value Common - configuration, errors and logging for the fair value services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    Config, ConfigSource, DataConfig, GaugeSettings, ObservabilityConfig, ServerConfig, ValuationSettings,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
