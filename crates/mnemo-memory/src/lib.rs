// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term conversational memory for AI characters.
//!
//! Distills durable facts about a user from recent dialogue, stores them as
//! embedded records partitioned by (character, user) scope, and retrieves
//! the most relevant ones for the next turn.
//!
//! ## Architecture
//!
//! - **Embedder**: timeout-, cancel-, and dimension-checked wrapper over an embedding adapter
//! - **Similarity**: cosine similarity and threshold-filtered top-K ranking
//! - **MemoryStore**: scoped persistence (SQLite or in-process)
//! - **MemoryExtractor**: LLM-based fact distillation with tolerant JSON parsing
//! - **MemoryManager**: the retrieve / extract / clear surface used by the chat loop
//! - **Worker**: bounded background queue for fire-and-forget extraction

pub mod context;
pub mod embedder;
pub mod extractor;
pub mod manager;
mod scope_lock;
pub mod similarity;
pub mod store;
pub mod trigger;
pub mod types;
pub mod worker;

#[cfg(test)]
mod testing;

pub use context::format_memory_context;
pub use embedder::Embedder;
pub use extractor::{ExtractionSettings, MemoryExtractor, parse_extraction_response};
pub use manager::{ExtractionReport, ManagerSettings, MemoryManager};
pub use similarity::{CosineRanker, Ranker, cosine_similarity};
pub use store::{InMemoryStore, MemoryStore, SqliteMemoryStore};
pub use trigger::ExtractionPolicy;
pub use types::*;
pub use worker::{
    ExtractionHandle, ExtractionJob, ExtractionSink, LogSink, spawn_extraction_worker,
    spawn_extraction_worker_from_config,
};
