// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end memory testing.
//!
//! `TestHarness` assembles a [`MemoryManager`] over a temp SQLite database
//! with mock embedding and generation adapters.

use std::path::PathBuf;
use std::sync::Arc;

use mnemo_config::MnemoConfig;
use mnemo_config::model::StorageConfig;
use mnemo_core::MnemoError;
use mnemo_memory::{MemoryManager, SqliteMemoryStore};
use mnemo_storage::Database;

use crate::mock_embedder::MockEmbedder;
use crate::mock_generator::MockGenerator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    dimensions: usize,
    vectors: Vec<(String, Vec<f32>)>,
    similarity_threshold: Option<f64>,
    dedup_threshold: Option<f64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            dimensions: 3,
            vectors: Vec::new(),
            similarity_threshold: None,
            dedup_threshold: None,
        }
    }

    /// Set mock generator responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Set the embedding dimensionality (default 3).
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Pin the embedding of `text`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.push((text.into(), vector));
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_dedup_threshold(mut self, threshold: f64) -> Self {
        self.dedup_threshold = Some(threshold);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, MnemoError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MnemoError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("memories.db");

        let mut config = MnemoConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..MnemoConfig::default()
        };
        config.memory.embedding_dimensions = self.dimensions;
        config.memory.dedup_threshold = self.dedup_threshold;
        if let Some(threshold) = self.similarity_threshold {
            config.memory.similarity_threshold = threshold;
        }

        let database = Database::open_with_config(&config.storage).await?;
        let store = Arc::new(SqliteMemoryStore::new(&database, self.dimensions));

        let embedder = Arc::new(MockEmbedder::new(self.dimensions));
        for (text, vector) in self.vectors {
            embedder.set_vector(text, vector);
        }
        let generator = Arc::new(MockGenerator::with_responses(self.responses));

        let manager = Arc::new(MemoryManager::from_config(
            &config,
            store,
            embedder.clone(),
            generator.clone(),
        )?);

        Ok(TestHarness {
            manager,
            embedder,
            generator,
            database,
            config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The memory manager under test.
    pub manager: Arc<MemoryManager>,
    /// The mock embedding adapter.
    pub embedder: Arc<MockEmbedder>,
    /// The mock generation adapter.
    pub generator: Arc<MockGenerator>,
    /// Database backing the manager's store.
    pub database: Database,
    /// Effective configuration.
    pub config: MnemoConfig,
    db_path: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Path of the temp SQLite file.
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// A manager over a fresh connection to the same database file, sharing
    /// the mock adapters. Used to check that memories survive a restart.
    pub async fn reopen(&self) -> Result<MemoryManager, MnemoError> {
        let database = Database::open_with_config(&self.config.storage).await?;
        let store = Arc::new(SqliteMemoryStore::new(
            &database,
            self.config.memory.embedding_dimensions,
        ));
        MemoryManager::from_config(
            &self.config,
            store,
            self.embedder.clone(),
            self.generator.clone(),
        )
    }
}
