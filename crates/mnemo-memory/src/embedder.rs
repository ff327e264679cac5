// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-vector embedding on top of an [`EmbeddingAdapter`].
//!
//! Adds what the raw adapter does not guarantee: a per-call timeout,
//! cooperative cancellation, a dimensionality check on every vector, and an
//! optional exact-text cache.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use mnemo_config::model::MemoryConfig;
use mnemo_core::types::EmbeddingInput;
use mnemo_core::{EmbeddingAdapter, MnemoError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Embeds single texts into fixed-length vectors.
pub struct Embedder {
    adapter: Arc<dyn EmbeddingAdapter>,
    dimensions: usize,
    timeout: Duration,
    cache: Option<EmbeddingCache>,
}

impl Embedder {
    /// Creates an embedder without a cache.
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, dimensions: usize, timeout: Duration) -> Self {
        Self {
            adapter,
            dimensions,
            timeout,
            cache: None,
        }
    }

    /// Creates an embedder using the memory section of the configuration.
    pub fn from_config(adapter: Arc<dyn EmbeddingAdapter>, config: &MemoryConfig) -> Self {
        Self::new(
            adapter,
            config.embedding_dimensions,
            Duration::from_secs(config.request_timeout_secs),
        )
        .with_cache(config.embed_cache_capacity)
    }

    /// Enables a bounded FIFO cache. A capacity of 0 disables caching.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| EmbeddingCache::new(capacity));
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn adapter(&self) -> &Arc<dyn EmbeddingAdapter> {
        &self.adapter
    }

    /// Embed `text`, failing with `EmbeddingService` on a bad upstream
    /// response and `Timeout` when the call exceeds the configured limit.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(text).await
        {
            debug!("embedding cache hit");
            return Ok(hit);
        }

        let call = self.adapter.embed(EmbeddingInput {
            texts: vec![text.to_string()],
        });
        let output = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| MnemoError::Timeout {
                duration: self.timeout,
            })?
            .map_err(into_embedding_error)?;

        let vector = output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MnemoError::embedding("embedding service returned no vector"))?;

        if vector.len() != self.dimensions {
            warn!(
                expected = self.dimensions,
                actual = vector.len(),
                "embedding service returned vector of wrong length"
            );
            return Err(MnemoError::embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(MnemoError::embedding(
                "embedding service returned non-finite values",
            ));
        }

        if let Some(cache) = &self.cache {
            cache.insert(text, vector.clone()).await;
        }
        Ok(vector)
    }

    /// Like [`Embedder::embed`], but abandons the call when `cancel` fires.
    pub async fn embed_cancellable(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<f32>, MnemoError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MnemoError::Cancelled),
            result = self.embed(text) => result,
        }
    }
}

/// Keeps service failures as they are and wraps anything else the adapter
/// reports (missing key, bad header) as an embedding failure.
fn into_embedding_error(e: MnemoError) -> MnemoError {
    if e.is_service_failure() {
        e
    } else {
        MnemoError::EmbeddingService {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

/// Bounded exact-text cache with first-in-first-out eviction.
struct EmbeddingCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
}

impl EmbeddingCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    async fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.inner.lock().await.entries.get(text).cloned()
    }

    async fn insert(&self, text: &str, vector: Vec<f32>) {
        let mut inner = self.inner.lock().await;
        if inner.entries.contains_key(text) {
            return;
        }
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(text.to_string());
        inner.entries.insert(text.to_string(), vector);
    }
}
