use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("service discovery failed: {0}")]
    ServiceDiscovery(String),

    #[error("request to {url} failed with HTTP {status}: {body}")]
    Request {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not match content_type '{requested}'; available content types: {available:?}")]
    ContentTypeNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("cannot upload {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed resource payload: {0}")]
    Payload(String),
}

impl Error {
    /// HTTP status of a failed request, if this error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn upload(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Upload {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
