// Client for the civic-assistant and analyze-misinformation functions

mod image;

pub use image::{image_data_url, MAX_IMAGE_BYTES};

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, Result};
use crate::i18n::Language;
use crate::models::{AnalysisRequest, AnalysisResponse, AppConfig, ChatRequest, ErrorBody};
use crate::stream::{event_stream, ChatEventStream};

pub const ASSISTANT_PATH: &str = "/functions/v1/civic-assistant";
pub const ANALYZE_PATH: &str = "/functions/v1/analyze-misinformation";

#[derive(Debug, Clone)]
pub struct AssistantClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AssistantClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.gateway_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}{path}", self.base_url));
        if self.api_key.is_empty() {
            request
        } else {
            request
                .bearer_auth(&self.api_key)
                .header("apikey", &self.api_key)
        }
    }

    /// Open the assistant stream.
    ///
    /// Errors here happen before any text was produced. Once the returned
    /// stream is live, transport failures arrive as `Err` items and
    /// cancelling `cancel` ends it silently.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatEventStream> {
        let send = self.post(ASSISTANT_PATH).json(request).send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            response = send => response?,
        };

        let response = error_for_status(response, request.language).await?;
        tracing::debug!(
            messages = request.messages.len(),
            language = request.language.code(),
            "Assistant stream opened"
        );

        Ok(event_stream(response.bytes_stream(), cancel))
    }

    pub async fn analyze_misinformation(&self, request: &AnalysisRequest) -> Result<String> {
        let response = self.post(ANALYZE_PATH).json(request).send().await?;
        let response = error_for_status(response, request.language).await?;

        let body = response
            .json::<AnalysisResponse>()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        Ok(body.analysis)
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }
}

/// Map a non-2xx response to the matching [`ChatError`].
async fn error_for_status(response: Response, language: Language) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited(if message.is_empty() {
            language.rate_limited().to_string()
        } else {
            message
        }),
        StatusCode::PAYMENT_REQUIRED => ChatError::PaymentRequired(if message.is_empty() {
            language.payment_required().to_string()
        } else {
            message
        }),
        _ => ChatError::Upstream {
            status: status.as_u16(),
            message,
        },
    })
}
