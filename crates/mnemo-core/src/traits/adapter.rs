// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by the embedding and generation backends.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::{AdapterType, HealthStatus};

/// Common surface of every model backend.
///
/// `mnemo check` reports `name`, `version` and `health_check` for each
/// configured backend.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short identifier such as `gemini-embedding`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Whether this backend embeds or generates.
    fn adapter_type(&self) -> AdapterType;

    /// Cheap readiness probe. Must not spend API quota.
    async fn health_check(&self) -> Result<HealthStatus, MnemoError>;

    /// Release connections before the process exits.
    async fn shutdown(&self) -> Result<(), MnemoError>;
}
