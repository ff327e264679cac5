// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the long-term memory system.

use chrono::{DateTime, Utc};
use mnemo_core::{MnemoError, Scope};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority of a memory on a 1-10 scale.
///
/// Used as a tie-break and optional pre-filter. The range is enforced at
/// construction so an out-of-range value can never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Importance(u8);

impl Importance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Low-priority information saved explicitly or by the system.
    pub const DEFAULT: Importance = Importance(5);

    /// Facts produced by the extractor.
    pub const EXTRACTED: Importance = Importance(7);

    /// Validates and wraps a raw importance value.
    pub fn new(value: u8) -> Result<Self, MnemoError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MnemoError::Validation(format!(
                "importance must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Importance {
    type Error = MnemoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value.0
    }
}

/// A single immutable memory fact belonging to one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// The (character, user) partition this record belongs to.
    pub scope: Scope,
    /// Short natural-language fact.
    pub content: String,
    /// Embedding of `content`, produced once at write time.
    pub embedding: Vec<f32>,
    pub importance: Importance,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Creates a record with a fresh UUID and the current timestamp.
    pub fn new(
        scope: Scope,
        content: impl Into<String>,
        embedding: Vec<f32>,
        importance: Importance,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scope,
            content: content.into(),
            embedding,
            importance,
            created_at: Utc::now(),
        }
    }
}

/// A record paired with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f32,
}

impl ScoredMemory {
    /// Drops the embedding, keeping only what callers may see.
    pub fn into_retrieved(self) -> RetrievedMemory {
        RetrievedMemory {
            id: self.record.id,
            content: self.record.content,
            importance: self.record.importance.get(),
            similarity: self.score,
            created_at: self.record.created_at,
        }
    }
}

/// Projection returned by retrieval. Embeddings never leave the subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMemory {
    pub id: String,
    pub content: String,
    pub importance: u8,
    pub similarity: f32,
    pub created_at: DateTime<Utc>,
}

/// Projection returned by scope listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub id: String,
    pub content: String,
    pub importance: u8,
    pub created_at: DateTime<Utc>,
}

impl From<MemoryRecord> for MemorySummary {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            importance: record.importance.get(),
            created_at: record.created_at,
        }
    }
}

/// Convert f32 vector to little-endian bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector.
///
/// Returns `None` when the blob length is not a multiple of four bytes.
pub fn blob_to_vec(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
