// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo memory subsystem.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Retrieval, extraction, and storage-policy settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Gemini API settings (embedding and generation).
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Memory subsystem configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Candidates scoring at or below this cosine similarity are discarded.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Default number of memories returned per retrieval.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Minimum number of turns before extraction calls the generative service.
    #[serde(default = "default_min_turns")]
    pub min_turns: usize,

    /// Most recent turns included in the extraction prompt.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum facts kept from a single extraction.
    #[serde(default = "default_max_facts")]
    pub max_facts: usize,

    /// Extract every N stored messages (0 disables the built-in trigger).
    #[serde(default = "default_extraction_interval")]
    pub extraction_interval: u64,

    /// Importance assigned to extractor-produced facts.
    #[serde(default = "default_extracted_importance")]
    pub extracted_importance: u8,

    /// Importance assigned to explicitly saved facts when none is given.
    #[serde(default = "default_importance")]
    pub default_importance: u8,

    /// Skip an extracted fact when an existing memory in the scope is more
    /// similar than this. Unset disables deduplication.
    #[serde(default)]
    pub dedup_threshold: Option<f64>,

    /// Output dimensionality of the deployed embedding model.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Entries in the exact-text embedding cache (0 disables the cache).
    #[serde(default = "default_embed_cache_capacity")]
    pub embed_cache_capacity: usize,

    /// Timeout applied to each embedding or generation call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pending jobs the background extraction worker accepts before rejecting.
    #[serde(default = "default_worker_queue_capacity")]
    pub worker_queue_capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            retrieval_limit: default_retrieval_limit(),
            min_turns: default_min_turns(),
            context_window: default_context_window(),
            max_facts: default_max_facts(),
            extraction_interval: default_extraction_interval(),
            extracted_importance: default_extracted_importance(),
            default_importance: default_importance(),
            dedup_threshold: None,
            embedding_dimensions: default_embedding_dimensions(),
            embed_cache_capacity: default_embed_cache_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            worker_queue_capacity: default_worker_queue_capacity(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.5
}

fn default_retrieval_limit() -> usize {
    5
}

fn default_min_turns() -> usize {
    4
}

fn default_context_window() -> usize {
    10
}

fn default_max_facts() -> usize {
    3
}

fn default_extraction_interval() -> u64 {
    10
}

fn default_extracted_importance() -> u8 {
    7
}

fn default_importance() -> u8 {
    5
}

fn default_embedding_dimensions() -> usize {
    768
}

fn default_embed_cache_capacity() -> usize {
    256
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_worker_queue_capacity() -> usize {
    64
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model used for `embedContent`.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model used for `generateContent` during extraction.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Sampling temperature for extraction.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap for extraction.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Retries on transient HTTP statuses (429, 500, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_max_retries() -> u32 {
    1
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemo").join("mnemo.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "mnemo.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
