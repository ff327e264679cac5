// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without the Gemini API.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Table-driven embedding adapter with injectable failures
//! - [`MockGenerator`] - Generation adapter with pre-configured responses
//! - [`TestHarness`] - Memory manager over a temp SQLite database

pub mod harness;
pub mod mock_embedder;
pub mod mock_generator;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_embedder::MockEmbedder;
pub use mock_generator::MockGenerator;
