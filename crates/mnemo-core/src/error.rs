// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo memory subsystem.

use thiserror::Error;

/// The primary error type used across all Mnemo adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid TOML, missing API key, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream embedding call failed, timed out, or returned a malformed vector.
    #[error("embedding service error: {message}")]
    EmbeddingService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upstream generative call failed or timed out.
    #[error("generation service error: {message}")]
    GenerationService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A memory record was rejected at insert.
    #[error("validation error: {0}")]
    Validation(String),

    /// Model output did not contain a usable JSON array.
    #[error("extraction parse error: {0}")]
    ExtractionParse(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    /// Shorthand for an embedding failure without an underlying source.
    pub fn embedding(message: impl Into<String>) -> Self {
        MnemoError::EmbeddingService {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a generation failure without an underlying source.
    pub fn generation(message: impl Into<String>) -> Self {
        MnemoError::GenerationService {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for failures of an external dependency (embedding or
    /// generation service, timeout, cancellation).
    ///
    /// Retrieval and extraction degrade to empty results on these instead of
    /// surfacing them to the chat loop.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            MnemoError::EmbeddingService { .. }
                | MnemoError::GenerationService { .. }
                | MnemoError::Timeout { .. }
                | MnemoError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_failures_are_classified() {
        assert!(MnemoError::embedding("down").is_service_failure());
        assert!(MnemoError::generation("down").is_service_failure());
        assert!(
            MnemoError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_service_failure()
        );
        assert!(MnemoError::Cancelled.is_service_failure());
    }

    #[test]
    fn hard_failures_are_not_service_failures() {
        assert!(!MnemoError::Validation("bad".into()).is_service_failure());
        assert!(!MnemoError::ExtractionParse("junk".into()).is_service_failure());
        assert!(
            !MnemoError::Storage {
                source: "disk full".into()
            }
            .is_service_failure()
        );
    }

    #[test]
    fn display_includes_message() {
        let err = MnemoError::embedding("vector too short");
        assert_eq!(err.to_string(), "embedding service error: vector too short");
    }
}
