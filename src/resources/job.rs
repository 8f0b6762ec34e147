use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::Fetchable;
use super::entry::EntryDetails;
use super::representation::{
    Representation, RepresentationDetails, safe_file_name, select_by_content_type,
};
use crate::error::{Error, Result};
use crate::transport::{Payload, Transport, UploadForm};

pub const DEFAULT_JOB_NAME: &str = "multiface";
pub const SESSION_METRICS_CONTENT_TYPE: &str = "application/vnd.affectiva.session.v0+json";
const INPUT_MEDIA_PREFIX: &str = "EAAS";

/// Server-defined job status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Complete,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Other(s) => s,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, JobStatus::Complete)
    }

    /// No further transitions without a requeue
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "complete" => JobStatus::Complete,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full job payload returned by query, create, update and requeue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    #[serde(rename = "self")]
    pub url: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<EntryDetails>,
    /// Present once processing completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EntryDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Item of the job collection listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(rename = "self")]
    pub url: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upload request for a new job
#[derive(Debug, Clone, Builder)]
pub struct NewJob {
    #[builder(into)]
    media_path: PathBuf,
    /// Classifier set to run
    #[builder(into, default = DEFAULT_JOB_NAME.to_string())]
    name: String,
    #[builder(default)]
    extra_fields: Vec<(String, String)>,
}

impl NewJob {
    pub fn media_path(&self) -> &Path {
        &self.media_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_fields(&self) -> &[(String, String)] {
        &self.extra_fields
    }
}

/// Partial update; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Local naming policy for downloaded input media
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputNaming {
    /// Wins over everything else
    pub filename: Option<String>,
    /// `EAAS_<stem>_<job-id><ext>`
    pub add_job_id: bool,
}

/// Final non-empty path segment of a job URL
pub fn job_id(job_url: &str) -> &str {
    job_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(job_url)
}

/// Local file name for downloaded input media
pub fn input_file_name(job_url: &str, server_file_name: &str, naming: &InputNaming) -> Result<String> {
    if let Some(explicit) = &naming.filename {
        return Ok(explicit.clone());
    }

    let server_file_name = safe_file_name(server_file_name)?;
    if !naming.add_job_id {
        return Ok(server_file_name);
    }

    let path = Path::new(&server_file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    Ok(format!(
        "{}_{}_{}{}",
        INPUT_MEDIA_PREFIX,
        stem,
        job_id(job_url),
        extension
    ))
}

/// Submitted processing job
#[derive(Debug, Clone)]
pub struct Job {
    transport: Arc<Transport>,
    details: JobDetails,
}

impl Job {
    pub fn from_details(transport: Arc<Transport>, details: JobDetails) -> Self {
        Self { transport, details }
    }

    /// Upload media and metadata as a new job
    pub async fn create(transport: Arc<Transport>, jobs_url: &str, request: &NewJob) -> Result<Self> {
        let form = UploadForm::new()
            .text("entry_job[name]", request.name.clone())
            .file("entry_job[input]", &request.media_path, None)
            .await?
            .texts(request.extra_fields.iter().cloned());

        let payload = transport
            .request(Method::POST, jobs_url, Payload::Multipart(form))
            .await?;
        let job = Self::from_details(transport, serde_json::from_value(payload)?);

        info!(
            url = %job.url(),
            name = %request.name,
            path = %request.media_path.display(),
            status = %job.status(),
            "Job created"
        );
        Ok(job)
    }

    /// Every job visible to the account
    pub async fn list(transport: &Transport, jobs_url: &str) -> Result<Vec<JobSummary>> {
        let payload = transport.get(jobs_url).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub fn url(&self) -> &str {
        &self.details.url
    }

    pub fn id(&self) -> &str {
        job_id(&self.details.url)
    }

    pub fn status(&self) -> &JobStatus {
        &self.details.status
    }

    pub fn details(&self) -> &JobDetails {
        &self.details
    }

    /// Query the job again
    pub async fn refresh(&self) -> Result<Self> {
        Self::fetch(Arc::clone(&self.transport), self.url()).await
    }

    /// Send the job back through processing
    pub async fn requeue(&self) -> Result<Self> {
        Self::requeue_at(Arc::clone(&self.transport), self.url()).await
    }

    /// POST `<job_url>/requeue` without querying the job first
    pub async fn requeue_at(transport: Arc<Transport>, job_url: &str) -> Result<Self> {
        let url = format!("{}/requeue", job_url.trim_end_matches('/'));
        let payload = transport
            .request(Method::POST, &url, Payload::Empty)
            .await?;

        info!(url = %job_url, "Job requeued");
        Self::from_payload_or_fetch(transport, job_url, payload).await
    }

    /// PATCH only the fields set in `update`
    pub async fn update(&self, update: &JobUpdate) -> Result<Self> {
        Self::update_at(Arc::clone(&self.transport), self.url(), update).await
    }

    pub async fn update_at(
        transport: Arc<Transport>,
        job_url: &str,
        update: &JobUpdate,
    ) -> Result<Self> {
        let payload = transport
            .request(
                Method::PATCH,
                job_url,
                Payload::Json(json!({ "entry_job": update })),
            )
            .await?;

        debug!(url = %job_url, ?update, "Job updated");
        Self::from_payload_or_fetch(transport, job_url, payload).await
    }

    /// Result representation with exactly `content_type`
    pub async fn result_representation(&self, content_type: &str) -> Result<Representation> {
        self.select(self.details.result.as_ref(), content_type).await
    }

    /// Input representation with exactly `content_type`
    pub async fn input_representation(&self, content_type: &str) -> Result<Representation> {
        self.select(self.details.input.as_ref(), content_type).await
    }

    /// Stream a result artifact to `output_dir/<file_name>`
    pub async fn download_result(
        &self,
        content_type: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let representation = self.result_representation(content_type).await?;
        let local_path = output_dir
            .as_ref()
            .join(safe_file_name(representation.file_name())?);

        representation.save_media(&local_path).await?;
        Ok(local_path)
    }

    /// Stream the submitted media (or a rendition of it) to `output_dir`
    pub async fn download_input_media(
        &self,
        content_type: &str,
        output_dir: impl AsRef<Path>,
        naming: &InputNaming,
    ) -> Result<PathBuf> {
        let representation = self.input_representation(content_type).await?;
        let file_name = input_file_name(self.url(), representation.file_name(), naming)?;
        let local_path = output_dir.as_ref().join(file_name);

        representation.save_media(&local_path).await?;
        Ok(local_path)
    }

    /// Parsed session metrics; an empty array when none were produced
    pub async fn session_metrics(&self) -> Result<Value> {
        let representation = match self.result_representation(SESSION_METRICS_CONTENT_TYPE).await {
            Ok(representation) => representation,
            Err(Error::ContentTypeNotFound { .. }) => {
                debug!(url = %self.url(), "Job has no session metrics");
                return Ok(Value::Array(Vec::new()));
            }
            Err(e) => return Err(e),
        };

        let mut body = Vec::new();
        self.transport
            .stream_download(&representation.media_url()?, &mut body)
            .await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Array(Vec::new()));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// First representation of `set` with exactly `content_type`.
    ///
    /// URL-only descriptors are fetched so that every listed representation
    /// takes part in the match.
    async fn select(&self, set: Option<&EntryDetails>, content_type: &str) -> Result<Representation> {
        let descriptors = set.map(|s| s.representations.as_slice()).unwrap_or_default();

        let mut resolved = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            resolved.push(
                Representation::from_ref(Arc::clone(&self.transport), descriptor.clone()).await?,
            );
        }

        let candidates: Vec<&RepresentationDetails> =
            resolved.iter().map(Representation::details).collect();
        let details = select_by_content_type(&candidates, content_type)?;
        Ok(Representation::from_details(
            Arc::clone(&self.transport),
            details.clone(),
        ))
    }

    async fn from_payload_or_fetch(
        transport: Arc<Transport>,
        job_url: &str,
        payload: Value,
    ) -> Result<Self> {
        if payload.is_null() {
            return Self::fetch(transport, job_url).await;
        }
        Ok(Self::from_details(transport, serde_json::from_value(payload)?))
    }
}

#[async_trait]
impl Fetchable for Job {
    async fn fetch(transport: Arc<Transport>, url: &str) -> Result<Self> {
        let payload = transport.get(url).await?;
        Ok(Self::from_details(transport, serde_json::from_value(payload)?))
    }
}
