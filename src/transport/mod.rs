//! Authenticated HTTP transport for the EaaS API

mod multipart;

pub use multipart::UploadForm;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::{Credentials, HttpConfig};
use crate::error::{Error, Result};

const APPLICATION_JSON: &str = "application/json";

/// Request body variants
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(UploadForm),
}

/// HTTP client carrying the account credentials
#[derive(Debug)]
pub struct Transport {
    client: Client,
    credentials: Credentials,
}

impl Transport {
    /// Create a new transport
    pub fn new(config: &HttpConfig, credentials: Credentials) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent);

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Perform one authenticated call and decode the JSON response.
    ///
    /// An empty success body decodes to `Value::Null`.
    pub async fn request(&self, method: Method, url: &str, payload: Payload) -> Result<Value> {
        debug!(%method, url, "Sending request");

        let mut request = self.authorized(method.clone(), url);
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request
                .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
                .body(serde_json::to_vec(&body)?),
            Payload::Multipart(form) => request.multipart(form.into_form()),
        };

        let response = check_status(url, request.send().await?).await?;
        let status = response.status().as_u16();
        let value = decode_json(response).await?;

        debug!(%method, url, status, "Request completed");
        Ok(value)
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.request(Method::GET, url, Payload::Empty).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.request(Method::DELETE, url, Payload::Empty).await
    }

    /// Unauthenticated GET, used for the public discovery index
    pub async fn get_anonymous(&self, url: &str) -> Result<Value> {
        debug!(url, "Sending anonymous request");

        let request = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        let response = check_status(url, request.send().await?).await?;
        decode_json(response).await
    }

    /// Stream an authenticated GET into `sink` chunk by chunk.
    ///
    /// Returns the number of bytes written.
    pub async fn stream_download<W>(&self, url: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let response = self.open_download(url).await?;
        copy_body(url, response, sink).await
    }

    /// Authenticated GET without an `Accept` preference; fails on 4xx/5xx
    /// before any body is read
    pub(crate) async fn open_download(&self, url: &str) -> Result<Response> {
        debug!(url, "Starting download");

        let request = self
            .client
            .get(url)
            .basic_auth(self.credentials.username(), Some(self.credentials.password()));
        check_status(url, request.send().await?).await
    }

    fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
    }
}

/// Turn 4xx/5xx responses into `Error::Request`, keeping the body
async fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(url, status = status.as_u16(), "Request rejected");

    Err(Error::Request {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Copy a response body into `sink` as chunks arrive
pub(crate) async fn copy_body<W>(url: &str, mut response: Response, sink: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;

    debug!(url, bytes = written, "Download completed");
    Ok(written)
}

async fn decode_json(response: Response) -> Result<Value> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
