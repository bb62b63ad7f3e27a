use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ProcessingResult,
    error::ErrorResponse,
    protocol::{ProcessRequest, ProcessResponse},
};
use tracing::{info, warn};

pub mod config;
pub mod controller;
pub mod data_url;
pub mod error;
pub mod pipeline;

pub use config::{ApiConfig, Settings};
pub use controller::{render, RegionView, UploadController, UploadEvent, UploadState};
pub use data_url::{read_data_url, DataUrl};
pub use error::{DataUrlError, ProcessError};
pub use pipeline::run_upload_cycle;

/// Remote collaborator that turns an uploaded image into a processed one.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(&self, image: &DataUrl) -> Result<ProcessingResult, ProcessError>;
}

#[derive(Debug, Clone)]
pub struct ProcessingClient {
    http: Client,
    config: ApiConfig,
}

impl ProcessingClient {
    pub fn new(config: ApiConfig) -> Result<Self, ProcessError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// POSTs `{"image": <data url>}` to `/process`.
    ///
    /// The body is parsed as JSON before the status is looked at, so a
    /// non-JSON error page surfaces as [`ProcessError::MalformedResponse`].
    pub async fn submit(&self, image: &DataUrl) -> Result<ProcessingResult, ProcessError> {
        let url = self.config.process_url();
        info!(url = %url, size_bytes = image.as_str().len(), "processing: submitting image");

        let response = self
            .http
            .post(&url)
            .json(&ProcessRequest {
                image: image.as_str().to_string(),
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;

        if !status.is_success() {
            let message = serde_json::from_value::<ErrorResponse>(value)
                .unwrap_or_default()
                .message_or_fallback();
            warn!(status = status.as_u16(), %message, "processing: server rejected image");
            return Err(ProcessError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let response: ProcessResponse = serde_json::from_value(value)?;
        info!(output_path = %response.output_path, "processing: image processed");
        Ok(response.into())
    }

    /// Fetches the processed artifact behind a download link.
    pub async fn download(&self, output_path: &str) -> Result<Vec<u8>, ProcessError> {
        let url = self.config.download_url(output_path);
        let bytes = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        info!(url = %url, size_bytes = bytes.len(), "processing: downloaded result");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageProcessor for ProcessingClient {
    async fn process(&self, image: &DataUrl) -> Result<ProcessingResult, ProcessError> {
        self.submit(image).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
