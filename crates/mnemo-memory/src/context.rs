// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering retrieved memories into a prompt section.

use crate::types::RetrievedMemory;

const MEMORY_HEADER: &str = "What you remember about this user:";

/// Format memories as a bullet list for the next generation prompt.
///
/// Returns `None` when there is nothing to inject.
pub fn format_memory_context(memories: &[RetrievedMemory]) -> Option<String> {
    if memories.is_empty() {
        return None;
    }
    let mut text = String::from(MEMORY_HEADER);
    for memory in memories {
        text.push_str("\n- ");
        text.push_str(&memory.content);
    }
    Some(text)
}
