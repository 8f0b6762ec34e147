//! Client facade over discovery, transport and resources

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::discovery::{self, ENTRIES_KEY, ServiceIndex};
use crate::error::{Error, Result};
use crate::resources::{
    Entry, Fetchable, InputNaming, Job, JobSummary, JobUpdate, NewEntry, NewJob,
};
use crate::transport::Transport;

/// Connected client; endpoints are resolved once at construction
#[derive(Debug, Clone)]
pub struct EmotionApi {
    transport: Arc<Transport>,
    index: ServiceIndex,
}

impl EmotionApi {
    /// Connect with explicit credentials, falling back to the environment
    pub async fn new(user: Option<&str>, password: Option<&str>) -> Result<Self> {
        let config = Config::load()?.with_credentials(user, password);
        Self::from_config(&config).await
    }

    /// Validate `config`, then resolve the service index
    pub async fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.validate()?;
        let transport = Transport::new(&config.http, credentials)?;
        let index = discovery::resolve(
            &transport,
            &config.service.discovery_url,
            &config.service.version,
        )
        .await?;

        info!(
            user = transport.credentials().username(),
            version = index.version(),
            "Client ready"
        );

        Ok(Self {
            transport: Arc::new(transport),
            index,
        })
    }

    pub fn index(&self) -> &ServiceIndex {
        &self.index
    }

    pub fn transport(&self) -> Arc<Transport> {
        Arc::clone(&self.transport)
    }

    pub async fn create_job(&self, request: &NewJob) -> Result<Job> {
        Job::create(self.transport(), self.index.jobs(), request).await
    }

    pub async fn query_job(&self, job_url: &str) -> Result<Job> {
        Job::fetch(self.transport(), job_url).await
    }

    pub async fn requeue_job(&self, job_url: &str) -> Result<Job> {
        Job::requeue_at(self.transport(), job_url).await
    }

    pub async fn update_job(&self, job_url: &str, update: &JobUpdate) -> Result<Job> {
        Job::update_at(self.transport(), job_url, update).await
    }

    pub async fn jobs(&self) -> Result<Vec<JobSummary>> {
        Job::list(&self.transport, self.index.jobs()).await
    }

    /// Query the job and stream the `content_type` result into `output_dir`
    pub async fn download_results(
        &self,
        job_url: &str,
        content_type: &str,
        output_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        self.query_job(job_url)
            .await?
            .download_result(content_type, output_dir)
            .await
    }

    pub async fn download_input_media(
        &self,
        job_url: &str,
        content_type: &str,
        output_dir: impl AsRef<Path>,
        naming: &InputNaming,
    ) -> Result<PathBuf> {
        self.query_job(job_url)
            .await?
            .download_input_media(content_type, output_dir, naming)
            .await
    }

    pub async fn session_metrics(&self, job_url: &str) -> Result<Value> {
        self.query_job(job_url).await?.session_metrics().await
    }

    pub async fn create_entry(&self, request: &NewEntry) -> Result<Entry> {
        let entries_url = self.index.entries().ok_or_else(|| {
            Error::ServiceDiscovery(format!(
                "version '{}' does not publish an '{}' endpoint",
                self.index.version(),
                ENTRIES_KEY
            ))
        })?;
        Entry::create(self.transport(), entries_url, request).await
    }

    pub async fn entry(&self, entry_url: &str) -> Result<Entry> {
        Entry::fetch(self.transport(), entry_url).await
    }
}
