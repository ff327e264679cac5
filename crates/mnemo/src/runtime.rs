// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of storage, adapters and the memory manager for CLI commands.

use std::sync::Arc;

use mnemo_config::MnemoConfig;
use mnemo_core::MnemoError;
use mnemo_gemini::{GeminiEmbedder, GeminiGenerator};
use mnemo_memory::{MemoryManager, SqliteMemoryStore};
use mnemo_storage::Database;
use tracing::debug;

/// A manager over the configured database and Gemini adapters.
///
/// Every memory command goes through the manager so clears share its
/// per-scope locking. Building the adapters needs an API key but sends no
/// request; only `recall`, `extract` and `remember` call the API.
pub struct ManagerRuntime {
    pub database: Database,
    pub manager: MemoryManager,
    pub embedder: Arc<GeminiEmbedder>,
    pub generator: Arc<GeminiGenerator>,
}

impl ManagerRuntime {
    pub async fn open(config: &MnemoConfig) -> Result<Self, MnemoError> {
        let (embedder, generator) = mnemo_gemini::adapters_from_config(config)?;
        let embedder = Arc::new(embedder);
        let generator = Arc::new(generator);

        let database = Database::open_with_config(&config.storage).await?;
        let store = Arc::new(SqliteMemoryStore::new(
            &database,
            config.memory.embedding_dimensions,
        ));
        let manager =
            MemoryManager::from_config(config, store, embedder.clone(), generator.clone())?;
        debug!(path = %config.storage.database_path, "memory manager ready");

        Ok(Self {
            database,
            manager,
            embedder,
            generator,
        })
    }

    pub async fn close(self) -> Result<(), MnemoError> {
        drop(self.manager);
        self.database.close().await
    }
}
