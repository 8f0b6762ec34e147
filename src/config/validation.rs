use super::models::{Config, Credentials, CredentialsConfig};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No username provided.")]
    MissingUsername,

    #[error("No password provided.")]
    MissingPassword,

    #[error("Invalid discovery URL '{url}': {reason}")]
    InvalidDiscoveryUrl { url: String, reason: String },

    #[error("Service version must not be empty")]
    EmptyVersion,
}

/// Validate the entire configuration and return the resolved credentials
pub fn validate(config: &Config) -> Result<Credentials, ValidationError> {
    let credentials = validate_credentials(&config.credentials)?;
    validate_service(config)?;
    Ok(credentials)
}

/// Both slots must hold a non-empty value
fn validate_credentials(slots: &CredentialsConfig) -> Result<Credentials, ValidationError> {
    let username = non_empty(slots.username.as_deref()).ok_or(ValidationError::MissingUsername)?;
    let password = non_empty(slots.password.as_deref()).ok_or(ValidationError::MissingPassword)?;

    Ok(Credentials::new_unchecked(
        username.to_string(),
        password.to_string(),
    ))
}

fn validate_service(config: &Config) -> Result<(), ValidationError> {
    let url = &config.service.discovery_url;
    reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidDiscoveryUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    if config.service.version.trim().is_empty() {
        return Err(ValidationError::EmptyVersion);
    }

    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
