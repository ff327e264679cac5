// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based fact extraction from conversations.
//!
//! Asks the generative service for a JSON array of short facts about the
//! user, then digs the first usable array out of whatever text comes back.
//! Every failure here is logged and turned into an empty result.

use std::sync::Arc;
use std::time::Duration;

use mnemo_config::model::{GeminiConfig, MemoryConfig};
use mnemo_core::types::GenerationRequest;
use mnemo_core::{GenerationAdapter, MnemoError, Speaker, Turn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Prompt for memory extraction.
const EXTRACTION_PROMPT: &str = r#"Analyze this conversation and extract 1-{max_facts} important facts or memories that {character} should remember about the user.

Focus on:
- Personal information (name, preferences, interests)
- Important events or stories
- Emotional moments
- Recurring topics

Return ONLY a JSON array of strings, nothing else.
Example: ["User likes pizza", "User works as a teacher"]

Conversation:
{conversation}

Important memories (JSON array only):"#;

/// Tunables for [`MemoryExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Fewer turns than this skips the service call entirely.
    pub min_turns: usize,
    /// Only the most recent `context_window` turns reach the prompt.
    pub context_window: usize,
    /// Upper bound on facts kept from one response.
    pub max_facts: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_turns: 4,
            context_window: 10,
            max_facts: 3,
            temperature: 0.3,
            max_output_tokens: 256,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ExtractionSettings {
    pub fn from_config(memory: &MemoryConfig, gemini: &GeminiConfig) -> Self {
        Self {
            min_turns: memory.min_turns,
            context_window: memory.context_window,
            max_facts: memory.max_facts,
            temperature: gemini.temperature,
            max_output_tokens: gemini.max_output_tokens,
            timeout: Duration::from_secs(memory.request_timeout_secs),
        }
    }
}

/// Distills durable facts about the user from recent conversation turns.
pub struct MemoryExtractor {
    generator: Arc<dyn GenerationAdapter>,
    settings: ExtractionSettings,
}

impl MemoryExtractor {
    pub fn new(generator: Arc<dyn GenerationAdapter>, settings: ExtractionSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn generator(&self) -> &Arc<dyn GenerationAdapter> {
        &self.generator
    }

    /// Extract facts from `turns`. Never fails: errors are logged and
    /// yield an empty sequence.
    pub async fn distill(&self, turns: &[Turn], character_label: &str) -> Vec<String> {
        self.distill_cancellable(turns, character_label, &CancellationToken::new())
            .await
    }

    /// [`MemoryExtractor::distill`] that gives up when `cancel` fires.
    pub async fn distill_cancellable(
        &self,
        turns: &[Turn],
        character_label: &str,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        match self.try_distill(turns, character_label, cancel).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "memory extraction failed");
                Vec::new()
            }
        }
    }

    /// Extract facts, surfacing generation and parse failures.
    ///
    /// Returns `Ok(vec![])` without calling the service when there are too
    /// few turns.
    pub async fn try_distill(
        &self,
        turns: &[Turn],
        character_label: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, MnemoError> {
        if turns.len() < self.settings.min_turns {
            debug!(
                turns = turns.len(),
                min_turns = self.settings.min_turns,
                "too few turns for extraction"
            );
            return Ok(Vec::new());
        }

        let window_start = turns.len().saturating_sub(self.settings.context_window);
        let prompt = build_extraction_prompt(
            &turns[window_start..],
            character_label,
            self.settings.max_facts,
        );

        let request = GenerationRequest {
            prompt,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        };

        let timeout = self.settings.timeout;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MnemoError::Cancelled),
            result = tokio::time::timeout(timeout, self.generator.generate(request)) => {
                result.map_err(|_| MnemoError::Timeout { duration: timeout })??
            }
        };

        let facts = parse_extraction_response(&response.text, self.settings.max_facts)
            .inspect_err(|_| debug!(raw = %response.text, "unparseable extraction response"))?;
        debug!(count = facts.len(), "facts distilled");
        Ok(facts)
    }
}

/// Build the extraction prompt from an already-windowed slice of turns.
pub fn build_extraction_prompt(turns: &[Turn], character_label: &str, max_facts: usize) -> String {
    let mut conversation = String::new();
    for turn in turns {
        let speaker = match turn.speaker {
            Speaker::User => "User",
            Speaker::Character => character_label,
        };
        conversation.push_str(speaker);
        conversation.push_str(": ");
        conversation.push_str(&turn.text);
        conversation.push('\n');
    }

    EXTRACTION_PROMPT
        .replace("{max_facts}", &max_facts.to_string())
        .replace("{character}", character_label)
        .replace("{conversation}", conversation.trim_end())
}

/// Parse the model response into at most `max_facts` fact strings.
///
/// Scans every `[` in order and takes the first span that parses as a JSON
/// array of strings, ignoring whatever text follows it. Blank entries are
/// dropped and the rest trimmed.
pub fn parse_extraction_response(
    response: &str,
    max_facts: usize,
) -> Result<Vec<String>, MnemoError> {
    for (start, _) in response.match_indices('[') {
        let mut values = serde_json::Deserializer::from_str(&response[start..]).into_iter::<Value>();
        let Some(Ok(Value::Array(items))) = values.next() else {
            continue;
        };
        if !items.iter().all(Value::is_string) {
            continue;
        }

        let facts = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|fact| !fact.is_empty())
            .take(max_facts)
            .map(str::to_string)
            .collect();
        return Ok(facts);
    }

    Err(MnemoError::ExtractionParse(
        "no JSON array of strings in model response".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGenerator;
    use tracing_test::traced_test;

    fn conversation(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("user message {i}"))
                } else {
                    Turn::character(format!("character reply {i}"))
                }
            })
            .collect()
    }

    fn extractor(generator: Arc<FakeGenerator>) -> MemoryExtractor {
        MemoryExtractor::new(generator, ExtractionSettings::default())
    }

    #[test]
    fn parse_embedded_array_with_junk() {
        let response = r#"blah blah ["User likes jazz", "User is a teacher"] trailing junk"#;
        let facts = parse_extraction_response(response, 3).unwrap();
        assert_eq!(facts, vec!["User likes jazz", "User is a teacher"]);
    }

    #[test]
    fn parse_markdown_code_block() {
        let response = "```json\n[\"User lives in Berlin\"]\n```";
        assert_eq!(
            parse_extraction_response(response, 3).unwrap(),
            vec!["User lives in Berlin"]
        );
    }

    #[test]
    fn parse_skips_invalid_bracket_spans() {
        let response = r#"[see note] and [1, 2] then ["User has a cat"] and ["ignored"]"#;
        assert_eq!(
            parse_extraction_response(response, 3).unwrap(),
            vec!["User has a cat"]
        );
    }

    #[test]
    fn parse_empty_array_is_ok() {
        assert!(parse_extraction_response("[]", 3).unwrap().is_empty());
    }

    #[test]
    fn parse_no_array_is_error() {
        let err = parse_extraction_response("This is not JSON at all.", 3).unwrap_err();
        assert!(matches!(err, MnemoError::ExtractionParse(_)));
    }

    #[test]
    fn parse_object_is_error() {
        assert!(parse_extraction_response(r#"{"facts": "none"}"#, 3).is_err());
    }

    #[test]
    fn parse_truncates_and_drops_blank() {
        let response = r#"["  a  ", "", "b", "c", "d"]"#;
        assert_eq!(parse_extraction_response(response, 3).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_handles_brackets_inside_strings() {
        let response = r#"Here: ["User said [laughs] a lot"]"#;
        assert_eq!(
            parse_extraction_response(response, 3).unwrap(),
            vec!["User said [laughs] a lot"]
        );
    }

    #[test]
    fn prompt_labels_speakers() {
        let turns = vec![Turn::user("My dog's name is Max."), Turn::character("What a great name!")];
        let prompt = build_extraction_prompt(&turns, "Luna", 3);
        assert!(prompt.contains("User: My dog's name is Max.\nLuna: What a great name!"));
        assert!(prompt.contains("that Luna should remember about the user"));
        assert!(prompt.contains("extract 1-3 important facts"));
        assert!(prompt.ends_with("Important memories (JSON array only):"));
    }

    #[tokio::test]
    async fn too_few_turns_skips_service() {
        let generator = Arc::new(FakeGenerator::with_responses(vec![r#"["x"]"#]));
        let facts = extractor(generator.clone()).distill(&conversation(3), "Luna").await;
        assert!(facts.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn window_keeps_most_recent_turns() {
        let generator = Arc::new(FakeGenerator::with_responses(vec![r#"["fact"]"#]));
        let facts = extractor(generator.clone()).distill(&conversation(14), "Luna").await;
        assert_eq!(facts, vec!["fact"]);

        let prompt = generator.last_prompt().await.unwrap();
        assert!(!prompt.contains("user message 2\n"));
        assert!(prompt.contains("user message 4"));
        assert!(prompt.contains("character reply 13"));
    }

    #[tokio::test]
    async fn service_failure_yields_empty() {
        let generator = Arc::new(FakeGenerator::failing());
        let facts = extractor(generator.clone()).distill(&conversation(4), "Luna").await;
        assert!(facts.is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn garbage_response_yields_empty_and_logs() {
        let generator = Arc::new(FakeGenerator::with_responses(vec!["I cannot help with that."]));
        assert!(extractor(generator).distill(&conversation(4), "Luna").await.is_empty());
        assert!(logs_contain("memory extraction failed"));
    }

    #[tokio::test]
    async fn try_distill_surfaces_parse_error() {
        let generator = Arc::new(FakeGenerator::with_responses(vec!["nope"]));
        let err = extractor(generator)
            .try_distill(&conversation(4), "Luna", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::ExtractionParse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_times_out() {
        let generator = Arc::new(
            FakeGenerator::with_responses(vec![r#"["late"]"#]).with_delay(Duration::from_secs(60)),
        );
        let settings = ExtractionSettings {
            timeout: Duration::from_secs(1),
            ..ExtractionSettings::default()
        };
        let err = MemoryExtractor::new(generator, settings)
            .try_distill(&conversation(4), "Luna", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Timeout { .. }));
    }

    #[tokio::test]
    async fn cancelled_before_call_returns_cancelled() {
        let generator = Arc::new(FakeGenerator::with_responses(vec![r#"["x"]"#]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = extractor(generator)
            .try_distill(&conversation(4), "Luna", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Cancelled));
    }
}
