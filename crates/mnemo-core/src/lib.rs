// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo conversational memory subsystem.
//!
//! Provides the error taxonomy, the scope/turn types shared by every crate,
//! and the adapter traits through which the embedding and generative
//! services are consumed.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MnemoError;
pub use types::{AdapterType, HealthStatus, Scope, Speaker, Turn};

pub use traits::{EmbeddingAdapter, GenerationAdapter, PluginAdapter};
