use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "EAAS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/eaas.toml";
const ENV_PREFIX: &str = "EAAS";
const ENV_SEPARATOR: &str = "__";

pub const USER_ENV_VAR: &str = "AFFECTIVA_API_USER";
pub const PASSWORD_ENV_VAR: &str = "AFFECTIVA_API_PASSWORD";
pub const SERVICE_URL_ENV_VAR: &str = "AFFECTIVA_API_SERVICE_URL";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables, including the `AFFECTIVA_API_*` names
pub fn load() -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    apply_env_overrides(&mut config, |name| env::var(name).ok());

    Ok(config)
}

/// Apply the service URL override and credentials from the environment.
/// Credentials are never read from TOML files.
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(SERVICE_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        tracing::info!(url = %url, "Using service URL override from {}", SERVICE_URL_ENV_VAR);
        config.service.discovery_url = url;
    }
    if let Some(user) = lookup(USER_ENV_VAR) {
        config.credentials.username = Some(user);
    }
    if let Some(password) = lookup(PASSWORD_ENV_VAR) {
        config.credentials.password = Some(password);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // EAAS__SERVICE__VERSION -> service.version
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
