// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local memory store, for tests and ephemeral sessions.

use async_trait::async_trait;
use mnemo_core::{MnemoError, Scope};
use tokio::sync::RwLock;

use super::{MemoryStore, validate_record};
use crate::types::MemoryRecord;

/// Vec-backed store. Iteration order is insertion order.
pub struct InMemoryStore {
    dimensions: usize,
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Total number of records across all scopes.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn insert(&self, record: MemoryRecord) -> Result<String, MnemoError> {
        validate_record(&record, self.dimensions)?;
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(MnemoError::Validation(format!(
                "memory id {} already exists",
                record.id
            )));
        }
        let id = record.id.clone();
        records.push(record);
        Ok(id)
    }

    async fn all_for_scope(&self, scope: &Scope) -> Result<Vec<MemoryRecord>, MnemoError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.scope == scope)
            .cloned()
            .collect())
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<usize, MnemoError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.scope != scope);
        Ok(before - records.len())
    }

    async fn clear_character(&self, character_id: &str) -> Result<usize, MnemoError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.scope.character_id != character_id);
        Ok(before - records.len())
    }

    async fn list_for_scope(
        &self,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MnemoError> {
        let mut scoped = self.all_for_scope(scope).await?;
        // Reverse first so equal timestamps come out newest-inserted first.
        scoped.reverse();
        scoped.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        scoped.truncate(limit);
        Ok(scoped)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, MnemoError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.scope.user_id == user_id)
            .count())
    }
}
