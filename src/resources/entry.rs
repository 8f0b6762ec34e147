use async_trait::async_trait;
use bon::Builder;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::annotation::{self, Annotation, AnnotationData};
use super::representation::{Representation, RepresentationDetails, RepresentationRef};
use super::{Deletable, Fetchable};
use crate::error::{Error, Result};
use crate::transport::{Payload, Transport, UploadForm};

/// Entry payload; also the shape of a job's `input` and `result`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Value>,
    /// Annotation sub-collection URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<String>,
    /// Representation creation URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation_self: Option<String>,
    #[serde(default)]
    pub representations: Vec<RepresentationRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upload request for a new entry
#[derive(Debug, Clone, Builder)]
pub struct NewEntry {
    #[builder(into)]
    media_path: PathBuf,
    /// Applied one by one after the upload succeeds
    #[builder(default)]
    annotations: Vec<AnnotationData>,
    #[builder(default)]
    extra_fields: Vec<(String, String)>,
}

impl NewEntry {
    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    pub fn annotations(&self) -> &[AnnotationData] {
        &self.annotations
    }
}

/// Raw uploaded media with its representations and annotations
#[derive(Debug, Clone)]
pub struct Entry {
    transport: Arc<Transport>,
    url: String,
    details: EntryDetails,
}

impl Entry {
    /// Build from a detail payload; the payload must carry `self`
    pub fn from_details(transport: Arc<Transport>, details: EntryDetails) -> Result<Self> {
        let url = details
            .url
            .clone()
            .ok_or_else(|| Error::Payload("entry payload has no 'self' URL".to_string()))?;
        Ok(Self {
            transport,
            url,
            details,
        })
    }

    /// Upload the media, then apply the requested annotations in order.
    ///
    /// Annotation failures leave earlier annotations in place.
    pub async fn create(
        transport: Arc<Transport>,
        entries_url: &str,
        request: &NewEntry,
    ) -> Result<Self> {
        let form = UploadForm::new()
            .file("entry[media]", &request.media_path, None)
            .await?
            .texts(request.extra_fields.iter().cloned());

        let payload = transport
            .request(Method::POST, entries_url, Payload::Multipart(form))
            .await?;
        let entry = Self::from_details(Arc::clone(&transport), serde_json::from_value(payload)?)?;

        info!(url = %entry.url, path = %request.media_path.display(), "Entry created");

        entry.add_annotations(&request.annotations).await?;
        Ok(entry)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cached detail payload from the last fetch
    pub fn details(&self) -> &EntryDetails {
        &self.details
    }

    fn annotations_url(&self) -> Result<&str> {
        self.details.annotations.as_deref().ok_or_else(|| {
            Error::Payload(format!("entry {} has no 'annotations' URL", self.url))
        })
    }

    pub async fn annotations(&self) -> Result<Vec<Annotation>> {
        annotation::list(Arc::clone(&self.transport), self.annotations_url()?).await
    }

    /// Create each annotation in order, stopping at the first failure
    pub async fn add_annotations(&self, annotations: &[AnnotationData]) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }

        let collection_url = self.annotations_url()?;
        for data in annotations {
            annotation::create(Arc::clone(&self.transport), collection_url, data).await?;
        }

        debug!(url = %self.url, count = annotations.len(), "Annotations added");
        Ok(())
    }

    /// Delete the first annotation matching `(source, key)`; no match is a no-op
    pub async fn delete_annotation(&self, source: &str, key: &str) -> Result<()> {
        let existing = self.annotations().await?;
        match existing.iter().find(|a| a.data().matches(source, key)) {
            Some(annotation) => annotation.delete().await,
            None => {
                debug!(url = %self.url, source, key, "No matching annotation to delete");
                Ok(())
            }
        }
    }

    /// Re-fetch the entry and return a handle per listed representation
    pub async fn representations(&mut self) -> Result<Vec<Representation>> {
        self.refresh().await?;

        let mut handles = Vec::with_capacity(self.details.representations.len());
        for descriptor in self.details.representations.iter().cloned() {
            handles.push(Representation::from_ref(Arc::clone(&self.transport), descriptor).await?);
        }
        Ok(handles)
    }

    /// Upload an additional representation.
    ///
    /// The server rejects a file name that already exists on the entry.
    pub async fn add_representation(
        &self,
        media_path: impl AsRef<Path>,
        mimetype: &str,
    ) -> Result<Representation> {
        let media_path = media_path.as_ref();
        let url = self.details.representation_self.as_deref().ok_or_else(|| {
            Error::Payload(format!("entry {} has no 'representation_self' URL", self.url))
        })?;

        let form = UploadForm::new()
            .file("media", media_path, Some(mimetype))
            .await?;
        let payload = self
            .transport
            .request(Method::POST, url, Payload::Multipart(form))
            .await?;

        let details: RepresentationDetails = serde_json::from_value(payload)?;
        info!(
            entry = %self.url,
            file_name = %details.file_name,
            content_type = %details.content_type,
            "Representation added"
        );
        Ok(Representation::from_details(
            Arc::clone(&self.transport),
            details,
        ))
    }

    /// Replace a representation's media in place
    pub async fn update_representation(
        &self,
        representation: &Representation,
        media_path: impl AsRef<Path>,
        mimetype: &str,
    ) -> Result<()> {
        representation
            .replace_media(media_path.as_ref(), mimetype)
            .await
    }

    pub async fn delete_representation(&self, representation: &Representation) -> Result<()> {
        representation.delete().await
    }

    async fn refresh(&mut self) -> Result<()> {
        let payload = self.transport.get(&self.url).await?;
        let mut details: EntryDetails = serde_json::from_value(payload)?;
        details.url.get_or_insert_with(|| self.url.clone());
        self.details = details;
        Ok(())
    }
}

#[async_trait]
impl Fetchable for Entry {
    async fn fetch(transport: Arc<Transport>, url: &str) -> Result<Self> {
        let payload = transport.get(url).await?;
        let mut details: EntryDetails = serde_json::from_value(payload)?;
        details.url.get_or_insert_with(|| url.to_string());
        Self::from_details(transport, details)
    }
}
