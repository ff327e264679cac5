// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding adapter for deterministic testing.
//!
//! `MockEmbedder` returns vectors from a lookup table, so tests can pin the
//! exact cosine similarity between a query and each stored memory.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mnemo_core::MnemoError;
use mnemo_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnemo_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// A mock embedding adapter backed by a text -> vector table.
///
/// Texts missing from the table get a deterministic, strictly positive
/// vector derived from their bytes. Texts registered with
/// [`MockEmbedder::fail_on`] fail with an embedding service error.
pub struct MockEmbedder {
    dimensions: usize,
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    /// Create a mock embedder producing `dimensions`-length vectors.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pin the vector returned for `text`.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.set_vector(text, vector);
        self
    }

    /// Pin the vector returned for `text` on a shared instance.
    pub fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        if let Ok(mut vectors) = self.vectors.lock() {
            vectors.insert(text.into(), vector);
        }
    }

    /// Make every embedding request for `text` fail.
    pub fn fail_on(&self, text: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(text.into());
        }
    }

    /// Number of `embed` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn lookup(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| MnemoError::Internal("mock embedder lock poisoned".into()))?;
        if failing.contains(text) {
            return Err(MnemoError::embedding(format!("mock failure for {text:?}")));
        }
        drop(failing);

        let vectors = self
            .vectors
            .lock()
            .map_err(|_| MnemoError::Internal("mock embedder lock poisoned".into()))?;
        if let Some(v) = vectors.get(text) {
            return Ok(v.clone());
        }

        let seed = text
            .bytes()
            .fold(17u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b.into()));
        Ok((0..self.dimensions)
            .map(|i| ((seed.rotate_left(i as u32) % 97) + 1) as f32)
            .collect())
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
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
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.lookup(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }
}
