// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini adapters for Mnemo.
//!
//! [`GeminiEmbedder`] implements [`EmbeddingAdapter`] over `embedContent` and
//! [`GeminiGenerator`] implements [`GenerationAdapter`] over
//! `generateContent`. Both share one [`GeminiClient`].

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use mnemo_config::MnemoConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::{EmbeddingAdapter, GenerationAdapter, PluginAdapter};
use mnemo_core::types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, GenerationRequest, GenerationResponse,
    HealthStatus,
};
use tracing::{debug, info};

pub use crate::client::GeminiClient;

/// Gemini embedding adapter.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
}

impl GeminiEmbedder {
    pub fn with_client(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Gemini text generation adapter.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiGenerator {
    pub fn with_client(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Builds both adapters from configuration, sharing one HTTP client.
///
/// # API Key Resolution
/// 1. `config.gemini.api_key` if set and non-empty
/// 2. `GEMINI_API_KEY` environment variable
/// 3. Returns error if neither is available
pub fn adapters_from_config(
    config: &MnemoConfig,
) -> Result<(GeminiEmbedder, GeminiGenerator), MnemoError> {
    let api_key = resolve_api_key(&config.gemini.api_key)?;
    let client = GeminiClient::new(
        &api_key,
        config.gemini.base_url.clone(),
        Duration::from_secs(config.memory.request_timeout_secs),
        config.gemini.max_retries,
    )?;

    info!(
        embedding_model = config.gemini.embedding_model,
        generation_model = config.gemini.generation_model,
        "Gemini adapters initialized"
    );

    Ok((
        GeminiEmbedder::with_client(client.clone(), config.gemini.embedding_model.clone()),
        GeminiGenerator::with_client(client, config.gemini.generation_model.clone()),
    ))
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, MnemoError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GEMINI_API_KEY").map_err(|_| {
        MnemoError::Config(
            "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
        )
    })
}

#[async_trait]
impl PluginAdapter for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini-embedding"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        debug!("Gemini embedding adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for GeminiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.client.embed_content(&self.model, text).await?);
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[async_trait]
impl PluginAdapter for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini-generation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemoError> {
        debug!("Gemini generation adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for GeminiGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, MnemoError> {
        let text = self
            .client
            .generate_content(
                &self.model,
                &request.prompt,
                request.temperature,
                request.max_output_tokens,
            )
            .await?;
        Ok(GenerationResponse { text })
    }
}
