//! Streamed multipart upload bodies

use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{Error, Result};

/// Multipart form whose file parts stream from disk
#[derive(Debug, Default)]
pub struct UploadForm {
    form: Form,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form = self.form.text(name.into(), value.into());
        self
    }

    /// Add all `(name, value)` pairs as text fields, in order
    pub fn texts<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        fields
            .into_iter()
            .fold(self, |form, (name, value)| form.text(name, value))
    }

    /// Add a file part streamed from `path`.
    ///
    /// Without an explicit `mimetype` the type is guessed from the file extension.
    pub async fn file(
        mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        mimetype: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content_type = match mimetype {
            Some(explicit) => parse_mimetype(path, explicit)?,
            None => mime_guess::from_path(path).first_or_octet_stream(),
        };

        let file = File::open(path).await.map_err(|e| Error::upload(path, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| Error::upload(path, e))?
            .len();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::upload(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;

        debug!(
            path = %path.display(),
            bytes = length,
            content_type = %content_type,
            "Streaming file part"
        );

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(content_type.as_ref())?;

        self.form = self.form.part(name.into(), part);
        Ok(self)
    }

    pub(crate) fn into_form(self) -> Form {
        self.form
    }
}

fn parse_mimetype(path: &Path, mimetype: &str) -> Result<mime::Mime> {
    mimetype.parse::<mime::Mime>().map_err(|e| {
        Error::upload(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid mimetype '{}': {}", mimetype, e),
            ),
        )
    })
}
