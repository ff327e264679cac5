// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini REST API.
//!
//! Provides [`GeminiClient`] which handles authentication, JSON request
//! construction, and transient error retry for the `embedContent` and
//! `generateContent` endpoints.

use std::time::Duration;

use mnemo_core::MnemoError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, Content, EmbedContentRequest, EmbedContentResponse, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig,
};

/// Which upstream service a call belongs to; selects the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Embedding,
    Generation,
}

impl Service {
    fn error(
        self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> MnemoError {
        match self {
            Service::Embedding => MnemoError::EmbeddingService { message, source },
            Service::Generation => MnemoError::GenerationService { message, source },
        }
    }
}

/// HTTP client for Gemini API communication.
///
/// Retries transient errors (429, 500, 503) up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl GeminiClient {
    /// Creates a new Gemini client.
    ///
    /// The API key travels in the `x-goog-api-key` header, never in the URL.
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, MnemoError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| MnemoError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MnemoError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            max_retries,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shortens the delay between retries (keeps wiremock tests fast).
    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Embeds a single text with `model` and returns its vector.
    pub async fn embed_content(&self, model: &str, text: &str) -> Result<Vec<f32>, MnemoError> {
        let request = EmbedContentRequest {
            model: format!("models/{model}"),
            content: Content::text(text),
        };
        let response: EmbedContentResponse = self
            .post(Service::Embedding, &format!("models/{model}:embedContent"), &request)
            .await?;
        Ok(response.embedding.values)
    }

    /// Runs a single-prompt generation and returns the first candidate's text.
    ///
    /// A response without any text (blocked or empty candidate) yields `"[]"`,
    /// which callers treat as "nothing to report".
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, MnemoError> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        };
        let response: GenerateContentResponse = self
            .post(Service::Generation, &format!("models/{model}:generateContent"), &request)
            .await?;
        match response.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                debug!(model, "generation returned no text");
                Ok("[]".to_string())
            }
        }
    }

    async fn post<Req, Resp>(
        &self,
        service: Service,
        endpoint: &str,
        request: &Req,
    ) -> Result<Resp, MnemoError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, endpoint, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self.client.post(&url).json(request).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(MnemoError::Timeout {
                        duration: self.timeout,
                    });
                }
                Err(e) => {
                    return Err(service.error(
                        format!("HTTP request failed: {e}"),
                        Some(Box::new(e)),
                    ));
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, endpoint, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    service.error(
                        format!("failed to read response body: {e}"),
                        Some(Box::new(e)),
                    )
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    service.error(
                        format!("failed to parse API response: {e}"),
                        Some(Box::new(e)),
                    )
                });
            }

            let body = response.text().await.unwrap_or_default();

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(service.error(format!("API returned {status}: {body}"), None));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({} {}): {}",
                    api_err.error.code, api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(service.error(message, None));
        }

        Err(last_error
            .unwrap_or_else(|| service.error("request failed after retries".to_string(), None)))
    }
}

/// Returns true for HTTP status codes that warrant a retry.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
