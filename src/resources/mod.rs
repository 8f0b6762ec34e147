//! Remote resources exposed by the EaaS API
//!
//! ## Key Components
//!
//! - [`Job`] - A processing job: upload, polling, requeue, result download
//! - [`Entry`] - Raw uploaded media holding representations and annotations
//! - [`Representation`] - One media asset, selected by content type
//! - [`Annotation`] - `(source, key, value)` metadata scoped to an entry
//!
//! Child resources are built from the parent's cached payload; only
//! [`Entry::representations`] re-fetches the parent first.

pub mod annotation;
pub mod entry;
pub mod job;
pub mod representation;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::transport::Transport;

pub use annotation::{Annotation, AnnotationData};
pub use entry::{Entry, EntryDetails, NewEntry};
pub use job::{
    DEFAULT_JOB_NAME, InputNaming, Job, JobDetails, JobStatus, JobSummary, JobUpdate, NewJob,
    SESSION_METRICS_CONTENT_TYPE,
};
pub use representation::{
    Representation, RepresentationDetails, RepresentationRef, select_by_content_type,
};

/// Resources that can be retrieved by URL
#[async_trait]
pub trait Fetchable: Sized {
    async fn fetch(transport: Arc<Transport>, url: &str) -> Result<Self>;
}

/// Resources that can be removed by their own URL
#[async_trait]
pub trait Deletable {
    async fn delete(&self) -> Result<()>;
}
