//! Configuration management for the EaaS client
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `EAAS__<section>__<key>` environment variables
//! 4. `AFFECTIVA_API_SERVICE_URL`, `AFFECTIVA_API_USER`, `AFFECTIVA_API_PASSWORD`
//! 5. Explicit arguments passed to [`Config::with_credentials`]
//!
//! # Usage
//!
//! ```no_run
//! use eaas::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Discovery endpoint: {}", config.service.discovery_url);
//! ```
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/eaas.toml`.
//! This can be overridden using the `EAAS_CONFIG` environment variable.
//! Credentials are only ever read from the environment or from arguments.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, Credentials, CredentialsConfig, DEFAULT_DISCOVERY_URL, DEFAULT_VERSION, HttpConfig,
    ServiceConfig, TelemetryConfig,
};
pub use sources::{PASSWORD_ENV_VAR, SERVICE_URL_ENV_VAR, USER_ENV_VAR};
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
    /// Validation is deferred to [`Config::validate`] so that explicit
    /// credentials can still be applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(sources::load()?)
    }

    /// Load configuration from a specific path, ignoring `EAAS_CONFIG`
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        Ok(sources::load_from_sources(path)?)
    }

    /// Apply explicit credentials; a non-empty argument wins over the environment
    pub fn with_credentials(mut self, user: Option<&str>, password: Option<&str>) -> Self {
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            self.credentials.username = Some(user.to_string());
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.credentials.password = Some(password.to_string());
        }
        self
    }

    /// Check the configuration and return the resolved credentials
    pub fn validate(&self) -> Result<Credentials, ConfigError> {
        Ok(validation::validate(self)?)
    }
}
