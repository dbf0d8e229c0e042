//! HTTP client used for multipart media uploads.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::debug;

use mirai_core::{HttpClientConfig, TransportError, TransportResult};

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name carrying the file.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type of the payload.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// A multipart request body: plain text fields plus at most one file.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl MultipartBody {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Attaches the file part.
    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    fn into_form(self) -> TransportResult<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|e| TransportError::InvalidConfig(format!("invalid mime type: {e}")))?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Creates a client for the given config.
    pub fn new(config: HttpClientConfig) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// POSTs a multipart body to `path` and parses the JSON reply.
    pub async fn post_multipart(&self, path: &str, body: MultipartBody) -> TransportResult<Value> {
        let url = self.config.url_for(path);
        debug!(url = %url, "Posting multipart request");

        let resp = self
            .client
            .post(&url)
            .multipart(body.into_form()?)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TransportError::Io(format!(
                "HTTP {} error: {}",
                status.as_u16(),
                text
            )));
        }

        resp.json()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
