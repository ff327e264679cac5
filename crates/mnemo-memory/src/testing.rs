// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate fakes for unit tests. Integration tests use `mnemo-test-utils`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mnemo_core::types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, GenerationRequest, GenerationResponse,
    HealthStatus,
};
use mnemo_core::{EmbeddingAdapter, GenerationAdapter, MnemoError, PluginAdapter, Scope};
use tokio::sync::Mutex;

use crate::store::{InMemoryStore, MemoryStore};
use crate::types::MemoryRecord;

/// Deterministic embedding adapter.
///
/// Unknown texts get a stable vector derived from their bytes.
pub(crate) struct FakeEmbedder {
    dims: usize,
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    empty: bool,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub(crate) fn new(dims: usize) -> Self {
        Self {
            dims,
            vectors: HashMap::new(),
            failing: HashSet::new(),
            delay: None,
            empty: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub(crate) fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn returning_nothing(mut self) -> Self {
        self.empty = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.vectors.get(text) {
            return v.clone();
        }
        let seed = text.bytes().fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b.into()));
        (0..self.dims)
            .map(|i| ((seed.wrapping_add(i as u32) % 13) + 1) as f32)
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for FakeEmbedder {
    fn name(&self) -> &str {
        "fake-embedder"
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
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for FakeEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.empty {
            return Ok(EmbeddingOutput {
                embeddings: vec![],
                dimensions: self.dims,
            });
        }
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            if self.failing.contains(text) {
                return Err(MnemoError::embedding(format!("fake failure for {text:?}")));
            }
            embeddings.push(self.vector_for(text));
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dims,
        })
    }
}

/// Generative adapter popping scripted responses from a FIFO queue.
///
/// An exhausted queue answers `[]`.
pub(crate) struct FakeGenerator {
    responses: Mutex<VecDeque<Result<String, MnemoError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub(crate) fn with_responses(responses: Vec<&str>) -> Self {
        Self::from_queue(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub(crate) fn failing() -> Self {
        Self::from_queue(VecDeque::from([Err(MnemoError::generation("fake outage"))]))
    }

    fn from_queue(responses: VecDeque<Result<String, MnemoError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().await.last().cloned()
    }
}

#[async_trait]
impl PluginAdapter for FakeGenerator {
    fn name(&self) -> &str {
        "fake-generator"
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
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for FakeGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, MnemoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(request.prompt);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("[]".to_string()));
        next.map(|text| GenerationResponse { text })
    }
}

/// In-memory store whose inserts take `insert_delay` each.
pub(crate) struct SlowStore {
    inner: InMemoryStore,
    insert_delay: Duration,
}

impl SlowStore {
    pub(crate) fn new(dims: usize, insert_delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(dims),
            insert_delay,
        }
    }

    pub(crate) fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

#[async_trait]
impl MemoryStore for SlowStore {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn insert(&self, record: MemoryRecord) -> Result<String, MnemoError> {
        tokio::time::sleep(self.insert_delay).await;
        self.inner.insert(record).await
    }

    async fn all_for_scope(&self, scope: &Scope) -> Result<Vec<MemoryRecord>, MnemoError> {
        self.inner.all_for_scope(scope).await
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<usize, MnemoError> {
        self.inner.clear_scope(scope).await
    }

    async fn clear_character(&self, character_id: &str) -> Result<usize, MnemoError> {
        self.inner.clear_character(character_id).await
    }

    async fn list_for_scope(
        &self,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MnemoError> {
        self.inner.list_for_scope(scope, limit).await
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, MnemoError> {
        self.inner.count_for_user(user_id).await
    }
}
