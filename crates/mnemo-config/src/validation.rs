// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Range and consistency rules serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

/// Collects every violation instead of stopping at the first.
struct Checks {
    errors: Vec<ConfigError>,
}

impl Checks {
    fn require(&mut self, ok: bool, key: &str, message: impl FnOnce() -> String) {
        if !ok {
            self.errors.push(ConfigError::Validation {
                key: key.to_string(),
                message: message(),
            });
        }
    }

    fn at_least_one(&mut self, key: &str, value: usize) {
        self.require(value >= 1, key, || format!("{key} must be at least 1"));
    }

    fn non_empty(&mut self, key: &str, value: &str) {
        self.require(!value.trim().is_empty(), key, || {
            format!("{key} must not be empty")
        });
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// All violations are reported together, each tagged with its dotted key.
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut checks = Checks { errors: Vec::new() };
    let memory = &config.memory;

    checks.require(
        (-1.0..=1.0).contains(&memory.similarity_threshold),
        "memory.similarity_threshold",
        || {
            format!(
                "memory.similarity_threshold must be within [-1, 1], got {}",
                memory.similarity_threshold
            )
        },
    );

    if let Some(dedup) = memory.dedup_threshold {
        checks.require(
            dedup > memory.similarity_threshold && dedup <= 1.0,
            "memory.dedup_threshold",
            || format!("memory.dedup_threshold must be within (similarity_threshold, 1], got {dedup}"),
        );
    }

    checks.at_least_one("memory.retrieval_limit", memory.retrieval_limit);
    checks.at_least_one("memory.min_turns", memory.min_turns);
    checks.require(
        memory.context_window >= memory.min_turns,
        "memory.context_window",
        || {
            format!(
                "memory.context_window ({}) must not be smaller than memory.min_turns ({})",
                memory.context_window, memory.min_turns
            )
        },
    );
    checks.at_least_one("memory.max_facts", memory.max_facts);

    for (key, value) in [
        ("memory.extracted_importance", memory.extracted_importance),
        ("memory.default_importance", memory.default_importance),
    ] {
        checks.require((1..=10).contains(&value), key, || {
            format!("{key} must be within [1, 10], got {value}")
        });
    }

    checks.at_least_one("memory.embedding_dimensions", memory.embedding_dimensions);
    checks.require(
        memory.request_timeout_secs > 0,
        "memory.request_timeout_secs",
        || "memory.request_timeout_secs must be at least 1".to_string(),
    );
    checks.at_least_one("memory.worker_queue_capacity", memory.worker_queue_capacity);

    checks.non_empty("gemini.base_url", &config.gemini.base_url);
    checks.require(
        (0.0..=2.0).contains(&config.gemini.temperature),
        "gemini.temperature",
        || {
            format!(
                "gemini.temperature must be within [0, 2], got {}",
                config.gemini.temperature
            )
        },
    );
    checks.non_empty("storage.database_path", &config.storage.database_path);

    if checks.errors.is_empty() {
        Ok(())
    } else {
        Err(checks.errors)
    }
}
