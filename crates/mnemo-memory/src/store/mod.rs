// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped persistence of memory records.
//!
//! Records are immutable: the store exposes insert, scoped reads, and
//! scoped bulk deletes, but no update.

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;

use async_trait::async_trait;
use mnemo_core::{MnemoError, Scope};

use crate::types::MemoryRecord;

/// Default number of records returned by [`MemoryStore::list_for_scope`] callers.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Persistent store for memory records, partitioned by scope.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Embedding dimensionality every stored record must have.
    fn dimensions(&self) -> usize;

    /// Validate and durably write a record, returning its id.
    ///
    /// Fails with `MnemoError::Validation` and performs no write when the
    /// record is malformed.
    async fn insert(&self, record: MemoryRecord) -> Result<String, MnemoError>;

    /// Every record in exactly this scope, in insertion order.
    async fn all_for_scope(&self, scope: &Scope) -> Result<Vec<MemoryRecord>, MnemoError>;

    /// Delete every record in the scope. Returns 0 for an empty scope.
    async fn clear_scope(&self, scope: &Scope) -> Result<usize, MnemoError>;

    /// Delete every record of a character across all users.
    async fn clear_character(&self, character_id: &str) -> Result<usize, MnemoError>;

    /// Up to `limit` records in the scope, newest first.
    async fn list_for_scope(
        &self,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MnemoError>;

    /// Number of records belonging to a user across all characters.
    async fn count_for_user(&self, user_id: &str) -> Result<usize, MnemoError>;
}

/// Checks shared by every store implementation before a write.
pub fn validate_record(record: &MemoryRecord, dimensions: usize) -> Result<(), MnemoError> {
    if record.scope.character_id.is_empty() || record.scope.user_id.is_empty() {
        return Err(MnemoError::Validation(
            "scope identifiers must not be empty".to_string(),
        ));
    }
    if record.content.trim().is_empty() {
        return Err(MnemoError::Validation(
            "memory content must not be empty".to_string(),
        ));
    }
    if record.embedding.len() != dimensions {
        return Err(MnemoError::Validation(format!(
            "embedding has {} dimensions, store expects {dimensions}",
            record.embedding.len()
        )));
    }
    if record.embedding.iter().any(|v| !v.is_finite()) {
        return Err(MnemoError::Validation(
            "embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
