use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::template::wrap_document;

/// Longest renderer error body kept for logging.
const MAX_ERROR_BODY: usize = 512;

/// Converts an HTML body and stylesheet into a PDF.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `html` styled with `css`. Any non-success answer is an error.
    async fn render(&self, html: &str, css: &str) -> Result<Bytes, RenderError>;
}

/// [`Renderer`] backed by a Gotenberg-compatible HTTP service.
pub struct GotenbergClient {
    config: RenderConfig,
    endpoint: String,
    client: Client,
}

impl std::fmt::Debug for GotenbergClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotenbergClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl GotenbergClient {
    /// Create a client with its own connection pool.
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client sharing an existing `reqwest` pool.
    pub fn with_client(config: RenderConfig, client: Client) -> Self {
        let endpoint = config.endpoint();
        Self {
            config,
            endpoint,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(&self, document: String) -> Result<Form, RenderError> {
        let index = Part::text(document)
            .file_name("index.html")
            .mime_str("text/html; charset=utf-8")?;
        let mut form = Form::new().part("files", index);
        for (name, value) in self.config.layout.fields() {
            form = form.text(name, value.to_owned());
        }
        Ok(form)
    }
}

#[async_trait]
impl Renderer for GotenbergClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, html_len = html.len()))]
    async fn render(&self, html: &str, css: &str) -> Result<Bytes, RenderError> {
        let form = self.form(wrap_document(html, css))?;

        debug!("submitting document to renderer");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            warn!(status = status.as_u16(), "renderer rejected document");
            return Err(RenderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let pdf = response.bytes().await?;
        info!(size = pdf.len(), "document rendered");
        Ok(pdf)
    }
}
