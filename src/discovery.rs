//! Service discovery against the versioned endpoint index

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{Error, Result};
use crate::transport::Transport;

pub const JOBS_KEY: &str = "jobs";
pub const ENTRIES_KEY: &str = "entries";

/// Endpoints published for one API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIndex {
    version: String,
    endpoints: BTreeMap<String, String>,
}

impl ServiceIndex {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Job collection URL
    pub fn jobs(&self) -> &str {
        // presence checked in `parse`
        self.endpoints.get(JOBS_KEY).map(String::as_str).unwrap_or_default()
    }

    /// Entry collection URL, when the version publishes one
    pub fn entries(&self) -> Option<&str> {
        self.endpoint(ENTRIES_KEY)
    }

    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.endpoints.get(name).map(String::as_str)
    }

    /// Extract the index for `version` from a discovery payload
    pub fn parse(payload: &Value, version: &str) -> Result<Self> {
        let versions = payload.as_object().ok_or_else(|| {
            Error::ServiceDiscovery("discovery response is not a JSON object".to_string())
        })?;

        let entry = versions.get(version).ok_or_else(|| {
            let available: Vec<&str> = versions.keys().map(String::as_str).collect();
            Error::ServiceDiscovery(format!(
                "version '{}' not published; available versions: {:?}",
                version, available
            ))
        })?;

        let endpoints: BTreeMap<String, String> = entry
            .as_object()
            .ok_or_else(|| {
                Error::ServiceDiscovery(format!("version '{}' has no endpoint mapping", version))
            })?
            .iter()
            .filter_map(|(name, url)| url.as_str().map(|u| (name.clone(), u.to_string())))
            .collect();

        if !endpoints.contains_key(JOBS_KEY) {
            return Err(Error::ServiceDiscovery(format!(
                "version '{}' does not publish a '{}' endpoint",
                version, JOBS_KEY
            )));
        }

        Ok(Self {
            version: version.to_string(),
            endpoints,
        })
    }
}

/// Fetch the discovery document and resolve `version`
pub async fn resolve(transport: &Transport, discovery_url: &str, version: &str) -> Result<ServiceIndex> {
    let payload = transport.get_anonymous(discovery_url).await?;
    let index = ServiceIndex::parse(&payload, version)?;

    info!(
        discovery_url,
        version,
        jobs = index.jobs(),
        entries = index.entries().unwrap_or("-"),
        "Resolved service index"
    );

    Ok(index)
}
