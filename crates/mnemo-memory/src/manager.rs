// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The public face of the memory subsystem.
//!
//! `MemoryManager` wires the embedder, store, ranker, and extractor
//! together. Retrieval and extraction degrade to empty results when a
//! service dependency fails; only store misuse surfaces as an error.

use std::sync::Arc;

use mnemo_config::MnemoConfig;
use mnemo_config::model::MemoryConfig;
use mnemo_core::{EmbeddingAdapter, GenerationAdapter, MnemoError, Scope, Turn};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::embedder::Embedder;
use crate::extractor::{ExtractionSettings, MemoryExtractor};
use crate::scope_lock::ScopeLocks;
use crate::similarity::{CosineRanker, Ranker, find_most_similar};
use crate::store::{DEFAULT_LIST_LIMIT, MemoryStore};
use crate::types::{Importance, MemoryRecord, MemorySummary, RetrievedMemory, ScoredMemory};

/// Manager-level tunables.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Limit used when the caller has no preference.
    pub retrieval_limit: usize,
    pub extracted_importance: Importance,
    pub default_importance: Importance,
    /// Skip an extracted fact whose similarity to an existing scope record
    /// exceeds this value. `None` disables deduplication.
    pub dedup_threshold: Option<f32>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            retrieval_limit: 5,
            extracted_importance: Importance::EXTRACTED,
            default_importance: Importance::DEFAULT,
            dedup_threshold: None,
        }
    }
}

impl ManagerSettings {
    pub fn from_config(config: &MemoryConfig) -> Result<Self, MnemoError> {
        Ok(Self {
            retrieval_limit: config.retrieval_limit,
            extracted_importance: Importance::new(config.extracted_importance)?,
            default_importance: Importance::new(config.default_importance)?,
            dedup_threshold: config.dedup_threshold.map(|t| t as f32),
        })
    }
}

/// What happened to one extraction batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Facts returned by the extractor.
    pub distilled: usize,
    /// Facts written to the store.
    pub saved: usize,
    /// Facts skipped as near-duplicates of existing memories.
    pub duplicates: usize,
    /// Facts that failed to embed or store.
    pub failed: usize,
    /// The scope was cleared while the batch was in flight, so nothing was written.
    pub discarded: bool,
}

/// Coordinates extraction, embedding, storage, and ranked retrieval.
pub struct MemoryManager {
    store: Arc<dyn MemoryStore>,
    embedder: Embedder,
    extractor: MemoryExtractor,
    ranker: Box<dyn Ranker>,
    settings: ManagerSettings,
    locks: ScopeLocks,
}

impl MemoryManager {
    /// Creates a manager with the default cosine ranker and settings.
    pub fn new(store: Arc<dyn MemoryStore>, embedder: Embedder, extractor: MemoryExtractor) -> Self {
        Self {
            store,
            embedder,
            extractor,
            ranker: Box::new(CosineRanker::default()),
            settings: ManagerSettings::default(),
            locks: ScopeLocks::default(),
        }
    }

    /// Builds every component from configuration.
    ///
    /// Fails with `MnemoError::Config` when the store and the configured
    /// embedding dimensionality disagree.
    pub fn from_config(
        config: &MnemoConfig,
        store: Arc<dyn MemoryStore>,
        embedding: Arc<dyn EmbeddingAdapter>,
        generation: Arc<dyn GenerationAdapter>,
    ) -> Result<Self, MnemoError> {
        if store.dimensions() != config.memory.embedding_dimensions {
            return Err(MnemoError::Config(format!(
                "store expects {} dimensions but memory.embedding_dimensions is {}",
                store.dimensions(),
                config.memory.embedding_dimensions
            )));
        }

        let embedder = Embedder::from_config(embedding, &config.memory);
        let extractor = MemoryExtractor::new(
            generation,
            ExtractionSettings::from_config(&config.memory, &config.gemini),
        );
        Ok(Self::new(store, embedder, extractor)
            .with_ranker(CosineRanker::new(config.memory.similarity_threshold as f32))
            .with_settings(ManagerSettings::from_config(&config.memory)?))
    }

    pub fn with_ranker(mut self, ranker: impl Ranker + 'static) -> Self {
        self.ranker = Box::new(ranker);
        self
    }

    pub fn with_settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn extractor(&self) -> &MemoryExtractor {
        &self.extractor
    }

    /// Up to `limit` memories of `scope` relevant to `query`, best first.
    ///
    /// Any failure yields an empty sequence.
    pub async fn retrieve_relevant(
        &self,
        scope: &Scope,
        query: &str,
        limit: usize,
    ) -> Vec<RetrievedMemory> {
        self.retrieve_relevant_cancellable(scope, query, limit, &CancellationToken::new())
            .await
    }

    /// [`MemoryManager::retrieve_relevant`] that returns empty when `cancel` fires.
    pub async fn retrieve_relevant_cancellable(
        &self,
        scope: &Scope,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<RetrievedMemory> {
        match self.try_retrieve(scope, query, limit, cancel).await {
            Ok(memories) => memories,
            Err(e) if e.is_service_failure() => {
                warn!(scope = %scope, error = %e, "memory retrieval degraded to empty");
                Vec::new()
            }
            Err(e) => {
                error!(scope = %scope, error = %e, "memory retrieval failed");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        scope: &Scope,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedMemory>, MnemoError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_cancellable(query, cancel).await?;
        let candidates = self.store.all_for_scope(scope).await?;
        if cancel.is_cancelled() {
            return Err(MnemoError::Cancelled);
        }

        let candidate_count = candidates.len();
        let ranked = self.ranker.rank(&query_embedding, candidates, limit);
        debug!(
            scope = %scope,
            candidates = candidate_count,
            returned = ranked.len(),
            "memories ranked"
        );
        Ok(ranked.into_iter().map(ScoredMemory::into_retrieved).collect())
    }

    /// Distill facts from `turns` and store each one. Returns how many were saved.
    ///
    /// A fact whose embedding fails is skipped; the rest are still stored.
    pub async fn maybe_extract_and_store(
        &self,
        scope: &Scope,
        turns: &[Turn],
        character_label: &str,
    ) -> usize {
        self.maybe_extract_and_store_cancellable(
            scope,
            turns,
            character_label,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`MemoryManager::maybe_extract_and_store`] that saves nothing once
    /// `cancel` fires before the write phase.
    pub async fn maybe_extract_and_store_cancellable(
        &self,
        scope: &Scope,
        turns: &[Turn],
        character_label: &str,
        cancel: &CancellationToken,
    ) -> usize {
        match self
            .extract_and_store(scope, turns, character_label, cancel)
            .await
        {
            Ok(report) => report.saved,
            Err(e) => {
                warn!(scope = %scope, error = %e, "memory extraction produced nothing");
                0
            }
        }
    }

    /// Full extraction pipeline with a per-batch report.
    ///
    /// Errors cover failures that stop the whole batch: generation, parsing,
    /// cancellation, or reading the scope for deduplication.
    pub async fn extract_and_store(
        &self,
        scope: &Scope,
        turns: &[Turn],
        character_label: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractionReport, MnemoError> {
        let ticket = self.locks.ticket(scope);
        let mut report = ExtractionReport::default();

        let facts = self
            .extractor
            .try_distill(turns, character_label, cancel)
            .await?;
        report.distilled = facts.len();
        if facts.is_empty() {
            return Ok(report);
        }

        let mut embedded = Vec::with_capacity(facts.len());
        for fact in facts {
            match self.embedder.embed_cancellable(&fact, cancel).await {
                Ok(embedding) => embedded.push((fact, embedding)),
                Err(MnemoError::Cancelled) => return Err(MnemoError::Cancelled),
                Err(e) => {
                    warn!(scope = %scope, fact = %fact, error = %e, "skipping fact: embedding failed");
                    report.failed += 1;
                }
            }
        }
        if embedded.is_empty() {
            return Ok(report);
        }

        let guard = ticket.lock().await;
        if guard.cleared_since_ticket() {
            info!(scope = %scope, "scope cleared during extraction, discarding batch");
            report.discarded = true;
            return Ok(report);
        }

        let mut existing = match self.settings.dedup_threshold {
            Some(_) => self.store.all_for_scope(scope).await?,
            None => Vec::new(),
        };

        for (fact, embedding) in embedded {
            if let Some(threshold) = self.settings.dedup_threshold
                && let Some((idx, similarity)) = find_most_similar(&embedding, &existing)
                && similarity > threshold
            {
                debug!(
                    duplicate_of = %existing[idx].id,
                    similarity,
                    "skipping duplicate fact"
                );
                report.duplicates += 1;
                continue;
            }

            let record = MemoryRecord::new(
                scope.clone(),
                fact,
                embedding,
                self.settings.extracted_importance,
            );
            let kept = self.settings.dedup_threshold.is_some().then(|| record.clone());
            match self.store.insert(record).await {
                Ok(_) => {
                    report.saved += 1;
                    existing.extend(kept);
                }
                Err(e @ MnemoError::Validation(_)) => {
                    error!(scope = %scope, error = %e, "extracted fact rejected by store");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(scope = %scope, error = %e, "failed to store extracted fact");
                    report.failed += 1;
                }
            }
        }
        drop(guard);

        info!(
            scope = %scope,
            distilled = report.distilled,
            saved = report.saved,
            duplicates = report.duplicates,
            failed = report.failed,
            "memory extraction complete"
        );
        Ok(report)
    }

    /// Delete every memory in `scope`. Batches in flight for the scope are
    /// discarded rather than written after the clear.
    pub async fn clear_scope(&self, scope: &Scope) -> Result<usize, MnemoError> {
        let guard = self.locks.lock(scope).await;
        guard.bump();
        let deleted = self.store.clear_scope(scope).await?;
        info!(scope = %scope, deleted, "memory scope cleared");
        Ok(deleted)
    }

    /// Delete every memory of a character across all users.
    ///
    /// Waits for in-progress writes to the character's scopes, and batches
    /// still being distilled for them are discarded.
    pub async fn clear_character(&self, character_id: &str) -> Result<usize, MnemoError> {
        let guards = self.locks.lock_character(character_id).await;
        for guard in &guards {
            guard.bump();
        }
        let deleted = self.store.clear_character(character_id).await?;
        drop(guards);
        info!(character_id, deleted, "character memories cleared");
        Ok(deleted)
    }

    /// Embed and store a single fact supplied by the caller.
    ///
    /// Unlike extraction, embedding failures are returned.
    pub async fn remember(
        &self,
        scope: &Scope,
        content: &str,
        importance: Option<u8>,
    ) -> Result<String, MnemoError> {
        let importance = match importance {
            Some(value) => Importance::new(value)?,
            None => self.settings.default_importance,
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(MnemoError::Validation(
                "memory content must not be empty".to_string(),
            ));
        }

        let embedding = self.embedder.embed(content).await?;
        let _guard = self.locks.lock(scope).await;
        let id = self
            .store
            .insert(MemoryRecord::new(scope.clone(), content, embedding, importance))
            .await?;
        info!(scope = %scope, memory_id = %id, "memory saved");
        Ok(id)
    }

    /// Memories of `scope`, newest first. `None` means the default of 50.
    pub async fn list_memories(
        &self,
        scope: &Scope,
        limit: Option<usize>,
    ) -> Result<Vec<MemorySummary>, MnemoError> {
        let records = self
            .store
            .list_for_scope(scope, limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await?;
        Ok(records.into_iter().map(MemorySummary::from).collect())
    }

    /// Number of memories a user has across all characters.
    pub async fn count_for_user(&self, user_id: &str) -> Result<usize, MnemoError> {
        self.store.count_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::store::InMemoryStore;
    use crate::testing::{FakeEmbedder, FakeGenerator, SlowStore};

    const DIMS: usize = 2;

    /// Unit vector in 2D whose cosine against [1, 0] is `c`.
    fn at_cosine(c: f32) -> Vec<f32> {
        vec![c, (1.0 - c * c).sqrt()]
    }

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("user says {i}"))
                } else {
                    Turn::character(format!("luna says {i}"))
                }
            })
            .collect()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        embedder: Arc<FakeEmbedder>,
        generator: Arc<FakeGenerator>,
        manager: MemoryManager,
    }

    fn fixture(embedder: FakeEmbedder, generator: FakeGenerator) -> Fixture {
        let store = Arc::new(InMemoryStore::new(DIMS));
        let embedder = Arc::new(embedder);
        let generator = Arc::new(generator);
        let manager = MemoryManager::new(
            store.clone(),
            Embedder::new(embedder.clone(), DIMS, Duration::from_secs(30)),
            MemoryExtractor::new(generator.clone(), ExtractionSettings::default()),
        );
        Fixture {
            store,
            embedder,
            generator,
            manager,
        }
    }

    async fn seed(store: &InMemoryStore, scope: &Scope, content: &str, embedding: Vec<f32>) {
        store
            .insert(MemoryRecord::new(scope.clone(), content, embedding, Importance::EXTRACTED))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn retrieve_returns_top_matches_above_threshold() {
        let f = fixture(
            FakeEmbedder::new(DIMS).with_vector("query", vec![1.0, 0.0]),
            FakeGenerator::with_responses(vec![]),
        );
        let scope = Scope::new("luna", "alice");
        seed(&f.store, &scope, "high", at_cosine(0.9)).await;
        seed(&f.store, &scope, "mid", at_cosine(0.6)).await;
        seed(&f.store, &scope, "low", at_cosine(0.3)).await;

        let results = f.manager.retrieve_relevant(&scope, "query", 2).await;
        let contents: Vec<_> = results.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["high", "mid"]);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn retrieve_never_crosses_scopes() {
        let f = fixture(
            FakeEmbedder::new(DIMS).with_vector("query", vec![1.0, 0.0]),
            FakeGenerator::with_responses(vec![]),
        );
        seed(&f.store, &Scope::new("luna", "bob"), "bob's", vec![1.0, 0.0]).await;
        let results = f
            .manager
            .retrieve_relevant(&Scope::new("luna", "alice"), "query", 5)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn retrieve_degrades_on_embedding_failure() {
        let f = fixture(
            FakeEmbedder::new(DIMS).failing_on("query"),
            FakeGenerator::with_responses(vec![]),
        );
        let scope = Scope::new("luna", "alice");
        seed(&f.store, &scope, "fact", vec![1.0, 0.0]).await;
        assert!(f.manager.retrieve_relevant(&scope, "query", 5).await.is_empty());
    }

    #[tokio::test]
    async fn retrieve_with_cancelled_token_is_empty() {
        let f = fixture(
            FakeEmbedder::new(DIMS).with_vector("query", vec![1.0, 0.0]),
            FakeGenerator::with_responses(vec![]),
        );
        let scope = Scope::new("luna", "alice");
        seed(&f.store, &scope, "fact", vec![1.0, 0.0]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = f
            .manager
            .retrieve_relevant_cancellable(&scope, "query", 5, &cancel)
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn extraction_skips_fact_whose_embedding_fails() {
        let f = fixture(
            FakeEmbedder::new(DIMS).failing_on("User is a teacher"),
            FakeGenerator::with_responses(vec![
                r#"["User likes jazz", "User is a teacher", "User has a cat"]"#,
            ]),
        );
        let scope = Scope::new("luna", "alice");

        let saved = f.manager.maybe_extract_and_store(&scope, &turns(6), "Luna").await;
        assert_eq!(saved, 2);

        let stored = f.store.all_for_scope(&scope).await.unwrap();
        let contents: Vec<_> = stored.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["User likes jazz", "User has a cat"]);
        assert!(stored.iter().all(|r| r.importance == Importance::EXTRACTED));
    }

    #[tokio::test]
    async fn extraction_with_few_turns_makes_no_calls() {
        let f = fixture(
            FakeEmbedder::new(DIMS),
            FakeGenerator::with_responses(vec![r#"["x"]"#]),
        );
        let saved = f
            .manager
            .maybe_extract_and_store(&Scope::new("luna", "alice"), &turns(3), "Luna")
            .await;
        assert_eq!(saved, 0);
        assert_eq!(f.generator.calls(), 0);
        assert_eq!(f.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn extraction_generation_failure_saves_nothing() {
        let f = fixture(FakeEmbedder::new(DIMS), FakeGenerator::failing());
        let scope = Scope::new("luna", "alice");
        assert_eq!(f.manager.maybe_extract_and_store(&scope, &turns(4), "Luna").await, 0);
        assert!(f.store.is_empty().await);

        let report = f
            .manager
            .extract_and_store(&scope, &turns(4), "Luna", &CancellationToken::new())
            .await
            .unwrap();
        // Queue is exhausted now, so the fake answers "[]".
        assert_eq!(report.distilled, 0);
    }

    #[tokio::test]
    async fn dedup_guard_skips_near_duplicates() {
        let f = fixture(
            FakeEmbedder::new(DIMS)
                .with_vector("User likes jazz music", vec![1.0, 0.0])
                .with_vector("User has a cat", vec![0.0, 1.0]),
            FakeGenerator::with_responses(vec![r#"["User likes jazz music", "User has a cat"]"#]),
        );
        let manager = f.manager.with_settings(ManagerSettings {
            dedup_threshold: Some(0.95),
            ..ManagerSettings::default()
        });
        let scope = Scope::new("luna", "alice");
        seed(&f.store, &scope, "User likes jazz", vec![1.0, 0.0]).await;

        let report = manager
            .extract_and_store(&scope, &turns(4), "Luna", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.distilled, 2);
        assert_eq!(report.saved, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(f.store.len().await, 2);
    }

    #[tokio::test]
    async fn dedup_also_applies_within_a_batch() {
        let f = fixture(
            FakeEmbedder::new(DIMS)
                .with_vector("User likes jazz", vec![1.0, 0.0])
                .with_vector("User loves jazz", vec![1.0, 0.01]),
            FakeGenerator::with_responses(vec![r#"["User likes jazz", "User loves jazz"]"#]),
        );
        let manager = f.manager.with_settings(ManagerSettings {
            dedup_threshold: Some(0.95),
            ..ManagerSettings::default()
        });
        let saved = manager
            .maybe_extract_and_store(&Scope::new("luna", "alice"), &turns(4), "Luna")
            .await;
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn clear_scope_twice_returns_count_then_zero() {
        let f = fixture(FakeEmbedder::new(DIMS), FakeGenerator::with_responses(vec![]));
        let scope = Scope::new("luna", "alice");
        seed(&f.store, &scope, "a", vec![1.0, 0.0]).await;
        seed(&f.store, &scope, "b", vec![0.0, 1.0]).await;

        assert_eq!(f.manager.clear_scope(&scope).await.unwrap(), 2);
        assert_eq!(f.manager.clear_scope(&scope).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_is_discarded_when_scope_cleared_mid_flight() {
        let store = Arc::new(InMemoryStore::new(DIMS));
        let generator = Arc::new(
            FakeGenerator::with_responses(vec![r#"["User likes jazz"]"#])
                .with_delay(Duration::from_secs(10)),
        );
        let manager = Arc::new(MemoryManager::new(
            store.clone(),
            Embedder::new(Arc::new(FakeEmbedder::new(DIMS)), DIMS, Duration::from_secs(30)),
            MemoryExtractor::new(generator, ExtractionSettings::default()),
        ));
        let scope = Scope::new("luna", "alice");

        let task = {
            let manager = Arc::clone(&manager);
            let scope = scope.clone();
            tokio::spawn(async move {
                manager
                    .extract_and_store(&scope, &turns(4), "Luna", &CancellationToken::new())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.clear_scope(&scope).await.unwrap();

        let report = task.await.unwrap().unwrap();
        assert!(report.discarded);
        assert_eq!(report.saved, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clear_character_spans_users() {
        let f = fixture(FakeEmbedder::new(DIMS), FakeGenerator::with_responses(vec![]));
        seed(&f.store, &Scope::new("luna", "alice"), "a", vec![1.0, 0.0]).await;
        seed(&f.store, &Scope::new("luna", "bob"), "b", vec![1.0, 0.0]).await;
        seed(&f.store, &Scope::new("sol", "alice"), "c", vec![1.0, 0.0]).await;

        assert_eq!(f.manager.clear_character("luna").await.unwrap(), 2);
        assert_eq!(f.manager.count_for_user("alice").await.unwrap(), 1);
    }

    fn shared_manager(
        store: Arc<dyn MemoryStore>,
        generator: FakeGenerator,
    ) -> Arc<MemoryManager> {
        Arc::new(MemoryManager::new(
            store,
            Embedder::new(Arc::new(FakeEmbedder::new(DIMS)), DIMS, Duration::from_secs(30)),
            MemoryExtractor::new(Arc::new(generator), ExtractionSettings::default()),
        ))
    }

    fn spawn_extraction(
        manager: &Arc<MemoryManager>,
        scope: &Scope,
    ) -> tokio::task::JoinHandle<Result<ExtractionReport, MnemoError>> {
        let manager = Arc::clone(manager);
        let scope = scope.clone();
        tokio::spawn(async move {
            manager
                .extract_and_store(&scope, &turns(4), "Luna", &CancellationToken::new())
                .await
        })
    }

    #[tokio::test(start_paused = true)]
    async fn clear_character_waits_for_inserts_in_progress() {
        let store = Arc::new(SlowStore::new(DIMS, Duration::from_secs(5)));
        let manager = shared_manager(
            store.clone(),
            FakeGenerator::with_responses(vec![r#"["User likes jazz", "User has a cat"]"#]),
        );
        let scope = Scope::new("luna", "alice");

        let task = spawn_extraction(&manager, &scope);
        tokio::time::sleep(Duration::from_secs(1)).await;
        let deleted = manager.clear_character("luna").await.unwrap();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.saved, 2);
        assert_eq!(deleted, 2);
        assert!(store.inner().is_empty().await, "no memory outlives the character");
    }

    #[tokio::test(start_paused = true)]
    async fn batch_is_discarded_when_character_cleared_mid_flight() {
        let store = Arc::new(InMemoryStore::new(DIMS));
        let manager = shared_manager(
            store.clone(),
            FakeGenerator::with_responses(vec![r#"["User likes jazz"]"#])
                .with_delay(Duration::from_secs(10)),
        );
        let scope = Scope::new("luna", "alice");

        let task = spawn_extraction(&manager, &scope);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(manager.clear_character("luna").await.unwrap(), 0);

        let report = task.await.unwrap().unwrap();
        assert!(report.discarded);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn scope_registry_is_empty_when_idle() {
        let f = fixture(
            FakeEmbedder::new(DIMS),
            FakeGenerator::with_responses(vec![r#"["User likes jazz"]"#]),
        );
        let alice = Scope::new("luna", "alice");
        f.manager.maybe_extract_and_store(&alice, &turns(4), "Luna").await;
        f.manager.remember(&Scope::new("luna", "bob"), "fact", None).await.unwrap();
        f.manager.clear_scope(&alice).await.unwrap();
        f.manager.clear_character("luna").await.unwrap();
        assert_eq!(f.manager.locks.len(), 0);
    }

    #[tokio::test]
    async fn remember_uses_default_importance_and_lists_newest_first() {
        let f = fixture(FakeEmbedder::new(DIMS), FakeGenerator::with_responses(vec![]));
        let scope = Scope::new("luna", "alice");

        f.manager.remember(&scope, "first", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        f.manager.remember(&scope, "  second  ", Some(9)).await.unwrap();

        let listed = f.manager.list_memories(&scope, None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "second");
        assert_eq!(listed[0].importance, 9);
        assert_eq!(listed[1].importance, 5);
    }

    #[tokio::test]
    async fn remember_surfaces_embedding_failure() {
        let f = fixture(
            FakeEmbedder::new(DIMS).failing_on("secret"),
            FakeGenerator::with_responses(vec![]),
        );
        let err = f
            .manager
            .remember(&Scope::new("luna", "alice"), "secret", None)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::EmbeddingService { .. }));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn remember_rejects_bad_input_before_embedding() {
        let f = fixture(FakeEmbedder::new(DIMS), FakeGenerator::with_responses(vec![]));
        let scope = Scope::new("luna", "alice");
        assert!(matches!(
            f.manager.remember(&scope, "   ", None).await,
            Err(MnemoError::Validation(_))
        ));
        assert!(matches!(
            f.manager.remember(&scope, "fact", Some(11)).await,
            Err(MnemoError::Validation(_))
        ));
        assert_eq!(f.embedder.calls(), 0);
    }

    #[test]
    fn from_config_rejects_dimension_mismatch() {
        let config = MnemoConfig::default();
        let result = MemoryManager::from_config(
            &config,
            Arc::new(InMemoryStore::new(3)),
            Arc::new(FakeEmbedder::new(3)),
            Arc::new(FakeGenerator::with_responses(vec![])),
        );
        assert!(matches!(result, Err(MnemoError::Config(_))));
    }

    #[test]
    fn settings_follow_config() {
        let config = MemoryConfig {
            dedup_threshold: Some(0.97),
            extracted_importance: 8,
            ..MemoryConfig::default()
        };
        let settings = ManagerSettings::from_config(&config).unwrap();
        assert_eq!(settings.extracted_importance.get(), 8);
        assert_eq!(settings.default_importance, Importance::DEFAULT);
        assert!((settings.dedup_threshold.unwrap() - 0.97).abs() < 1e-6);
    }
}
