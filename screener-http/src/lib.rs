//! screener-http
//!
//! Backend that implements `ScreenerBackend` over the screening service's
//! HTTP/JSON API: paginated `POST /screen` rounds, the legacy
//! `GET /progress` and `GET /results` pair, and `POST /export/{format}`.
#![warn(missing_docs)]

/// Builder for [`HttpScreener`].
pub mod builder;
/// Raw wire shapes and their normalization.
pub mod wire;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use screener_core::{
    BatchOutcome, BatchRequest, BatchSource, ExportFile, ExportProvider, ExportRequest,
    LegacyResults, ProgressSource, ScreenerBackend, ScreenerError, ServerProgress,
    export_file_name,
};

pub use builder::HttpScreenerBuilder;
use wire::{ScreenResponse, sanitize_non_finite};

/// Screening backend talking to the service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpScreener {
    client: Client,
    base: Url,
}

impl HttpScreener {
    /// Static backend name used in logs.
    pub const NAME: &'static str = "screener-http";

    /// Backend with default client settings for the given service root.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `base_url` is not an absolute URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ScreenerError> {
        Self::builder(base_url).build()
    }

    /// Start building a backend for the given service root.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> HttpScreenerBuilder {
        HttpScreenerBuilder::new(base_url)
    }

    pub(crate) const fn from_parts(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Service root every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ScreenerError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ScreenerError::InvalidArg(format!("endpoint '{path}': {e}")))
    }

    fn transport_error(e: &reqwest::Error) -> ScreenerError {
        if e.is_decode() {
            ScreenerError::Decode(e.to_string())
        } else if e.is_timeout() {
            ScreenerError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ScreenerError::Network(format!("connection failed: {e}"))
        } else {
            ScreenerError::Network(e.to_string())
        }
    }

    fn check_status(resp: Response) -> Result<Response, ScreenerError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(ScreenerError::Http {
                status: status.as_u16(),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ScreenerError> {
        let body = resp.text().await.map_err(|e| Self::transport_error(&e))?;
        serde_json::from_str(&sanitize_non_finite(&body))
            .map_err(|e| ScreenerError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ScreenerError> {
        let resp = self
            .client
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;
        Self::read_json(Self::check_status(resp)?).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "screener_http::screen",
            skip(self),
            fields(date = %req.date, batch_start = req.batch_start, batch_size = req.batch_size),
        )
    )]
    async fn screen(&self, req: &BatchRequest) -> Result<BatchOutcome, ScreenerError> {
        let resp = self
            .client
            .post(self.endpoint("screen")?)
            .json(req)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;
        let body: ScreenResponse = Self::read_json(Self::check_status(resp)?).await?;
        body.into_outcome()
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "screener_http::export",
            skip(self, req),
            fields(format = %req.format, records = req.payload.results.len()),
        )
    )]
    async fn download(&self, req: &ExportRequest) -> Result<ExportFile, ScreenerError> {
        let resp = self
            .client
            .post(self.endpoint(&req.path())?)
            .json(&req.payload)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;
        let resp = Self::check_status(resp)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| req.format.content_type().to_string(), str::to_string);
        let bytes = resp.bytes().await.map_err(|e| Self::transport_error(&e))?;
        Ok(ExportFile {
            file_name: export_file_name(req.format, Utc::now()),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

impl ScreenerBackend for HttpScreener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn as_batch_source(&self) -> Option<&dyn BatchSource> {
        Some(self as &dyn BatchSource)
    }

    fn as_progress_source(&self) -> Option<&dyn ProgressSource> {
        Some(self as &dyn ProgressSource)
    }

    fn as_export_provider(&self) -> Option<&dyn ExportProvider> {
        Some(self as &dyn ExportProvider)
    }
}

#[async_trait]
impl BatchSource for HttpScreener {
    async fn fetch_batch(&self, req: &BatchRequest) -> BatchOutcome {
        let outcome = self.screen(req).await;
        #[cfg(feature = "tracing")]
        {
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, batch_start = req.batch_start, "screening round failed");
            }
        }
        BatchOutcome::from(outcome)
    }
}

#[async_trait]
impl ProgressSource for HttpScreener {
    async fn progress(&self) -> Result<ServerProgress, ScreenerError> {
        self.get_json("progress").await
    }

    async fn results(&self) -> Result<LegacyResults, ScreenerError> {
        self.get_json("results").await
    }
}

#[async_trait]
impl ExportProvider for HttpScreener {
    async fn export(&self, req: &ExportRequest) -> Result<ExportFile, ScreenerError> {
        self.download(req).await
    }
}
