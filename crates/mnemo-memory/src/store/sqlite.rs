// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with embeddings stored as BLOBs.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mnemo_core::{MnemoError, Scope};
use mnemo_storage::{Database, map_tr_err};
use rusqlite::types::Type;
use tokio_rusqlite::Connection;
use tracing::debug;

use super::{MemoryStore, validate_record};
use crate::types::{Importance, MemoryRecord, blob_to_vec, vec_to_blob};

const SELECT_COLUMNS: &str =
    "SELECT id, character_id, user_id, content, embedding, importance, created_at FROM memories";

/// Persistent store for memories in SQLite.
///
/// Every statement runs on the database's single writer thread, so each
/// operation is atomic on its own.
pub struct SqliteMemoryStore {
    conn: Connection,
    dimensions: usize,
}

impl SqliteMemoryStore {
    /// Creates a store on an already-migrated database.
    pub fn new(db: &Database, dimensions: usize) -> Self {
        Self {
            conn: db.connection().clone(),
            dimensions,
        }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn insert(&self, record: MemoryRecord) -> Result<String, MnemoError> {
        validate_record(&record, self.dimensions)?;

        let id = record.id.clone();
        let blob = vec_to_blob(&record.embedding);
        let created_at = record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memories (id, character_id, user_id, content, embedding, importance, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        record.id,
                        record.scope.character_id,
                        record.scope.user_id,
                        record.content,
                        blob,
                        record.importance.get(),
                        created_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(memory_id = %id, "memory inserted");
        Ok(id)
    }

    async fn all_for_scope(&self, scope: &Scope) -> Result<Vec<MemoryRecord>, MnemoError> {
        let scope = scope.clone();
        self.conn
            .call(move |conn| -> Result<Vec<MemoryRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE character_id = ?1 AND user_id = ?2 ORDER BY rowid"
                ))?;
                let records = stmt
                    .query_map(
                        rusqlite::params![scope.character_id, scope.user_id],
                        row_to_record,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<usize, MnemoError> {
        let scope = scope.clone();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM memories WHERE character_id = ?1 AND user_id = ?2",
                    rusqlite::params![scope.character_id, scope.user_id],
                )
            })
            .await
            .map_err(map_tr_err)
    }

    async fn clear_character(&self, character_id: &str) -> Result<usize, MnemoError> {
        let character_id = character_id.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM memories WHERE character_id = ?1",
                    rusqlite::params![character_id],
                )
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_for_scope(
        &self,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MnemoError> {
        let scope = scope.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<Vec<MemoryRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE character_id = ?1 AND user_id = ?2 ORDER BY created_at DESC, rowid DESC LIMIT ?3"
                ))?;
                let records = stmt
                    .query_map(
                        rusqlite::params![scope.character_id, scope.user_id, limit],
                        row_to_record,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, MnemoError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM memories WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
            .map(|count| usize::try_from(count).unwrap_or(0))
    }
}

/// Convert a rusqlite Row to a MemoryRecord.
fn row_to_record(row: &rusqlite::Row) -> Result<MemoryRecord, rusqlite::Error> {
    let blob: Vec<u8> = row.get(4)?;
    let embedding = blob_to_vec(&blob).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Blob,
            format!("embedding blob of {} bytes is not a whole number of f32", blob.len()).into(),
        )
    })?;

    let importance: u8 = row.get(5)?;
    let importance = Importance::new(importance)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Integer, Box::new(e)))?;

    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(MemoryRecord {
        id: row.get(0)?,
        scope: Scope {
            character_id: row.get(1)?,
            user_id: row.get(2)?,
        },
        content: row.get(3)?,
        embedding,
        importance,
        created_at,
    })
}
