// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for text-generation service integrations.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationRequest, GenerationResponse};

/// Adapter for an external generative text service.
///
/// Treated as a black box: a prompt goes in, text comes out.
#[async_trait]
pub trait GenerationAdapter: PluginAdapter {
    /// Sends a single prompt and returns the generated text.
    async fn generate(&self, request: GenerationRequest)
    -> Result<GenerationResponse, MnemoError>;
}
