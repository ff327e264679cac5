// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, so every individual operation is atomic with respect to the others.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use mnemo_config::model::StorageConfig;
use mnemo_core::MnemoError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite (or inner rusqlite) error into `MnemoError::Storage`.
pub fn map_tr_err<E: std::fmt::Display>(e: E) -> MnemoError {
    MnemoError::Storage {
        source: e.to_string().into(),
    }
}

/// Handle to the SQLite database. Cloning shares the same writer thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file with WAL enabled and migrations applied.
    pub async fn open(path: &str) -> Result<Self, MnemoError> {
        Self::open_with(path, true).await
    }

    /// Open the database described by the storage configuration.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, MnemoError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    /// Open a private in-memory database with migrations applied.
    pub async fn open_in_memory() -> Result<Self, MnemoError> {
        let conn = Connection::open_in_memory().await.map_err(map_tr_err)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, MnemoError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MnemoError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).await.map_err(map_tr_err)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), MnemoError> {
        self.conn
            .call(move |conn| -> Result<(), MnemoError> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get::<_, String>(0)
                    })
                    .map_err(map_tr_err)?;
                    conn.pragma_update(None, "synchronous", "NORMAL")
                        .map_err(map_tr_err)?;
                }
                conn.busy_timeout(Duration::from_secs(5))
                    .map_err(map_tr_err)?;
                run_migrations(conn)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Returns the underlying connection (the single writer).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MnemoError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}
