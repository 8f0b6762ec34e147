use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Deletable, Fetchable};
use crate::error::{Error, Result};
use crate::transport::{Payload, Transport};

/// `(source, key, value)` triple as sent to and received from the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub source: String,
    pub key: String,
    pub value: String,
}

impl AnnotationData {
    pub fn new(
        source: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, source: &str, key: &str) -> bool {
        self.source == source && self.key == key
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotationDetails {
    #[serde(rename = "self", default)]
    url: Option<String>,
    #[serde(flatten)]
    data: AnnotationData,
}

#[derive(Debug, Clone)]
struct Persisted {
    transport: Arc<Transport>,
    url: Option<String>,
}

/// Metadata attached to an entry
#[derive(Debug, Clone)]
pub struct Annotation {
    data: AnnotationData,
    remote: Option<Persisted>,
}

impl Annotation {
    /// Not-yet-persisted annotation awaiting [`Annotation::create`]
    pub fn new(
        source: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            data: AnnotationData::new(source, key, value),
            remote: None,
        }
    }

    pub(crate) fn from_details(transport: Arc<Transport>, details: AnnotationDetails) -> Self {
        Self {
            data: details.data,
            remote: Some(Persisted {
                transport,
                url: details.url,
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.data.source
    }

    pub fn key(&self) -> &str {
        &self.data.key
    }

    pub fn value(&self) -> &str {
        &self.data.value
    }

    pub fn data(&self) -> &AnnotationData {
        &self.data
    }

    pub fn url(&self) -> Option<&str> {
        self.remote.as_ref().and_then(|r| r.url.as_deref())
    }

    pub fn is_persisted(&self) -> bool {
        self.remote.is_some()
    }

    /// POST this annotation to an entry's annotation collection
    pub async fn create(&self, transport: Arc<Transport>, collection_url: &str) -> Result<Self> {
        create(transport, collection_url, &self.data).await
    }
}

/// POST `data` to `collection_url` and return the stored annotation
pub(crate) async fn create(
    transport: Arc<Transport>,
    collection_url: &str,
    data: &AnnotationData,
) -> Result<Annotation> {
    let payload = transport
        .request(
            Method::POST,
            collection_url,
            Payload::Json(json!({ "annotation": data })),
        )
        .await?;

    debug!(collection_url, source = %data.source, key = %data.key, "Annotation created");

    let details = match payload {
        serde_json::Value::Null => AnnotationDetails {
            url: None,
            data: data.clone(),
        },
        payload => serde_json::from_value(payload)?,
    };
    Ok(Annotation::from_details(transport, details))
}

/// GET every annotation in a collection, in server order
pub(crate) async fn list(transport: Arc<Transport>, collection_url: &str) -> Result<Vec<Annotation>> {
    let payload = transport.get(collection_url).await?;
    let items: Vec<AnnotationDetails> = serde_json::from_value(payload)?;

    Ok(items
        .into_iter()
        .map(|details| Annotation::from_details(Arc::clone(&transport), details))
        .collect())
}

#[async_trait]
impl Fetchable for Annotation {
    async fn fetch(transport: Arc<Transport>, url: &str) -> Result<Self> {
        let payload = transport.get(url).await?;
        let mut details: AnnotationDetails = serde_json::from_value(payload)?;
        details.url.get_or_insert_with(|| url.to_string());
        Ok(Self::from_details(transport, details))
    }
}

#[async_trait]
impl Deletable for Annotation {
    async fn delete(&self) -> Result<()> {
        let (transport, url) = match &self.remote {
            Some(Persisted {
                transport,
                url: Some(url),
            }) => (transport, url),
            _ => {
                return Err(Error::Payload(format!(
                    "annotation {}/{} has no URL to delete",
                    self.data.source, self.data.key
                )));
            }
        };

        transport.delete(url).await?;
        info!(url = %url, source = %self.data.source, key = %self.data.key, "Annotation deleted");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Annotation {
    type Item = &'a str;
    type IntoIter = std::array::IntoIter<&'a str, 3>;

    fn into_iter(self) -> Self::IntoIter {
        [self.source(), self.key(), self.value()].into_iter()
    }
}

impl From<Annotation> for (String, String, String) {
    fn from(annotation: Annotation) -> Self {
        let AnnotationData { source, key, value } = annotation.data;
        (source, key, value)
    }
}

impl From<AnnotationData> for Annotation {
    fn from(data: AnnotationData) -> Self {
        Self { data, remote: None }
    }
}
