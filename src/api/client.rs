//! Sentinel API Client
//!
//! HTTP client for communicating with the Sentinel detection service.

use std::time::Duration;

use super::types::{MessageResponse, Snapshot, StartRequest};
use super::SentinelApi;
use crate::error::ApiError;
use crate::logic::config::SentinelConfig;

/// Sentinel API client
#[derive(Debug, Clone)]
pub struct SentinelClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl SentinelClient {
    /// Create new client
    pub fn new(config: &SentinelConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current status snapshot
    pub async fn fetch_status(&self) -> Result<Snapshot, ApiError> {
        let url = format!("{}/status", self.base_url);

        let response = self.http_client
            .get(&url)
            .send()
            .await?;

        if response.status().is_success() {
            let snapshot: Snapshot = response.json().await
                .map_err(|e| ApiError::Parse(e.to_string()))?;
            snapshot.validate()
        } else {
            Err(rejection(response).await)
        }
    }

    /// Ask the service to start monitoring a folder
    pub async fn start_monitoring(&self, request: &StartRequest) -> Result<MessageResponse, ApiError> {
        let url = format!("{}/start", self.base_url);

        log::info!("Requesting monitoring of {} ({} whitelisted)", request.path, request.whitelist.len());

        let response = self.http_client
            .post(&url)
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(message_body(response).await)
        } else {
            Err(rejection(response).await)
        }
    }

    /// Ask the service to stop monitoring
    pub async fn stop_monitoring(&self) -> Result<MessageResponse, ApiError> {
        let url = format!("{}/stop", self.base_url);

        log::info!("Requesting monitoring stop");

        let response = self.http_client
            .post(&url)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(message_body(response).await)
        } else {
            Err(rejection(response).await)
        }
    }
}

impl SentinelApi for SentinelClient {
    async fn status(&self) -> Result<Snapshot, ApiError> {
        self.fetch_status().await
    }

    async fn start(&self, request: StartRequest) -> Result<MessageResponse, ApiError> {
        self.start_monitoring(&request).await
    }

    async fn stop(&self) -> Result<MessageResponse, ApiError> {
        self.stop_monitoring().await
    }
}

/// Success bodies are informational; an empty or odd body is not an error
async fn message_body(response: reqwest::Response) -> MessageResponse {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or_default()
}

/// Turn a non-2xx response into an error, keeping the server's message
async fn rejection(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageResponse>(&text)
        .ok()
        .and_then(|body| body.message);

    log::debug!("Sentinel answered {}: {}", status, text);

    ApiError::Server { status, message }
}
