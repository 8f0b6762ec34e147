use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tracing::{info, warn};

use super::{Deletable, Fetchable};
use crate::error::{Error, Result};
use crate::transport::{Payload, Transport, UploadForm, copy_body};

/// Representation payload as embedded in job and entry details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationDetails {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// Servers send `null` for unset descriptor strings
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RepresentationDetails {
    /// Explicit `media` URL, else the `<self>/media` convention
    pub fn media_url(&self) -> Option<String> {
        self.media.clone().or_else(|| {
            self.url
                .as_ref()
                .map(|url| format!("{}/media", url.trim_end_matches('/')))
        })
    }
}

/// Representation descriptor: inline payload or a link to one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepresentationRef {
    Url(String),
    Inline(RepresentationDetails),
}

impl RepresentationRef {
    pub fn inline(&self) -> Option<&RepresentationDetails> {
        match self {
            RepresentationRef::Inline(details) => Some(details),
            RepresentationRef::Url(_) => None,
        }
    }
}

/// First representation whose content type equals `content_type` exactly
pub fn select_by_content_type<'a>(
    representations: &[&'a RepresentationDetails],
    content_type: &str,
) -> Result<&'a RepresentationDetails> {
    representations
        .iter()
        .copied()
        .find(|r| r.content_type == content_type)
        .ok_or_else(|| Error::ContentTypeNotFound {
            requested: content_type.to_string(),
            available: representations
                .iter()
                .map(|r| r.content_type.clone())
                .collect(),
        })
}

/// One physical media asset attached to a job or entry
#[derive(Debug, Clone)]
pub struct Representation {
    transport: Arc<Transport>,
    details: RepresentationDetails,
}

impl Representation {
    pub fn from_details(transport: Arc<Transport>, details: RepresentationDetails) -> Self {
        Self { transport, details }
    }

    /// Build from a descriptor, fetching it when only a URL is given
    pub async fn from_ref(transport: Arc<Transport>, descriptor: RepresentationRef) -> Result<Self> {
        match descriptor {
            RepresentationRef::Inline(details) => Ok(Self::from_details(transport, details)),
            RepresentationRef::Url(url) => Self::fetch(transport, &url).await,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.details.url.as_deref()
    }

    pub fn file_name(&self) -> &str {
        &self.details.file_name
    }

    pub fn file_size(&self) -> Option<u64> {
        self.details.file_size
    }

    pub fn content_type(&self) -> &str {
        &self.details.content_type
    }

    pub fn details(&self) -> &RepresentationDetails {
        &self.details
    }

    pub fn media_url(&self) -> Result<String> {
        self.details.media_url().ok_or_else(|| {
            Error::Payload(format!(
                "representation '{}' has neither 'media' nor 'self'",
                self.details.file_name
            ))
        })
    }

    /// Stream the media bytes to `destination`, returning the byte count
    pub async fn save_media(&self, destination: impl AsRef<Path>) -> Result<u64> {
        let media_url = self.media_url()?;
        download_to_path(&self.transport, &media_url, destination.as_ref()).await
    }

    /// Replace this representation's media in place (multipart PUT)
    pub async fn replace_media(&self, media_path: &Path, mimetype: &str) -> Result<()> {
        let url = self.require_url()?;
        let form = UploadForm::new()
            .file("media", media_path, Some(mimetype))
            .await?;

        self.transport
            .request(Method::PUT, url, Payload::Multipart(form))
            .await?;

        info!(url, path = %media_path.display(), "Representation media replaced");
        Ok(())
    }

    fn require_url(&self) -> Result<&str> {
        self.url().ok_or_else(|| {
            Error::Payload(format!(
                "representation '{}' has no 'self' URL",
                self.details.file_name
            ))
        })
    }
}

#[async_trait]
impl Fetchable for Representation {
    async fn fetch(transport: Arc<Transport>, url: &str) -> Result<Self> {
        let payload = transport.get(url).await?;
        let mut details: RepresentationDetails = serde_json::from_value(payload)?;
        details.url.get_or_insert_with(|| url.to_string());
        Ok(Self::from_details(transport, details))
    }
}

#[async_trait]
impl Deletable for Representation {
    async fn delete(&self) -> Result<()> {
        let url = self.require_url()?;
        self.transport.delete(url).await?;
        info!(url, "Representation deleted");
        Ok(())
    }
}

/// Final path component of a server-supplied file name
pub(crate) fn safe_file_name(name: &str) -> Result<String> {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Payload(format!("unusable file name '{}'", name)))
}

/// Sibling file the download is staged in until it completes
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.part", name))
}

/// Stream `url` to `destination`.
///
/// Nothing touches `destination` until the server accepted the request and
/// the whole body arrived; an existing file survives a failed download.
async fn download_to_path(
    transport: &Transport,
    url: &str,
    destination: &Path,
) -> Result<u64> {
    let response = transport.open_download(url).await?;

    let partial = partial_path(destination);
    let mut file = File::create(&partial).await?;
    let copied = copy_body(url, response, &mut file).await;
    drop(file);

    let result = match copied {
        Ok(bytes) => tokio::fs::rename(&partial, destination)
            .await
            .map(|()| bytes)
            .map_err(Error::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(bytes) => {
            info!(url, path = %destination.display(), bytes, "Media saved");
            Ok(bytes)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial download");
            }
            Err(e)
        }
    }
}
