// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! When the chat loop should ask for extraction.

use mnemo_config::model::MemoryConfig;

/// Message-count based extraction trigger.
///
/// `every_n_messages == 0` disables extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    pub every_n_messages: u64,
}

impl ExtractionPolicy {
    pub fn new(every_n_messages: u64) -> Self {
        Self { every_n_messages }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.extraction_interval)
    }

    /// True when `message_count` stored messages land on an extraction boundary.
    pub fn should_extract(&self, message_count: u64) -> bool {
        self.every_n_messages > 0
            && message_count > 0
            && message_count % self.every_n_messages == 0
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}
