//! Configuration management for artfetch
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ARTFETCH__<section>__<key>`
//!
//! Examples:
//! - `ARTFETCH__SITE__ORIGIN=https://gallery.test`
//! - `ARTFETCH__WORKERS__CONCURRENCY=8`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/artfetch.toml`.
//! This can be overridden using the `ARTFETCH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, HttpConfig, ImportConfig, SiteConfig, WorkersConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails (bad origin, zero concurrency, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
