//! Client for the Emotion-as-a-Service media analysis API.
//!
//! ```no_run
//! use eaas::{EmotionApi, NewJob};
//!
//! # async fn example() -> eaas::Result<()> {
//! let api = EmotionApi::new(Some("username"), Some("password")).await?;
//! let job = api
//!     .create_job(&NewJob::builder().media_path("video.mp4").build())
//!     .await?;
//!
//! // Results appear once the job completes; poll with `query_job`
//! let job = api.query_job(job.url()).await?;
//! if job.status().is_complete() {
//!     job.download_result("application/csv", ".").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod observability;
pub mod resources;
pub mod transport;

pub use client::EmotionApi;
pub use discovery::ServiceIndex;
pub use error::{Error, Result};
pub use resources::{
    Annotation, AnnotationData, Deletable, Entry, Fetchable, InputNaming, Job, JobStatus,
    JobSummary, JobUpdate, NewEntry, NewJob, Representation, SESSION_METRICS_CONTENT_TYPE,
};
