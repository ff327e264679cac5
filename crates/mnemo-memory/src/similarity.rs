// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cosine similarity and threshold-filtered top-K ranking.
//!
//! Candidate fetching lives in the store and ranking lives here, so a
//! nearest-neighbour index can replace the linear scan without touching
//! either side's contract.

use crate::types::{MemoryRecord, ScoredMemory};

/// Default similarity a candidate must exceed to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 instead of failing when either vector has zero norm, the
/// lengths differ, or the result is not finite. Accumulates in f64 so that
/// `cosine_similarity(a, b) == cosine_similarity(b, a)` holds exactly.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Orders candidate memories by relevance to a query vector.
pub trait Ranker: Send + Sync {
    /// Scores, filters, sorts descending, and truncates to `limit`.
    fn rank(&self, query: &[f32], candidates: Vec<MemoryRecord>, limit: usize)
    -> Vec<ScoredMemory>;
}

/// Linear-scan cosine ranker with a strict lower bound on similarity.
#[derive(Debug, Clone, Copy)]
pub struct CosineRanker {
    threshold: f32,
}

impl CosineRanker {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Default for CosineRanker {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl Ranker for CosineRanker {
    fn rank(
        &self,
        query: &[f32],
        candidates: Vec<MemoryRecord>,
        limit: usize,
    ) -> Vec<ScoredMemory> {
        let mut scored: Vec<ScoredMemory> = candidates
            .into_iter()
            .filter_map(|record| {
                let score = cosine_similarity(query, &record.embedding);
                (score > self.threshold).then_some(ScoredMemory { record, score })
            })
            .collect();

        // sort_by is stable: ties keep store iteration order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }
}

/// Find the candidate most similar to `query`.
///
/// Returns the index into `candidates` and its similarity, or `None` if
/// there are no candidates.
pub fn find_most_similar(query: &[f32], candidates: &[MemoryRecord]) -> Option<(usize, f32)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, record)| (i, cosine_similarity(query, &record.embedding)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Importance;
    use mnemo_core::Scope;
    use proptest::prelude::*;

    fn record(content: &str, embedding: Vec<f32>) -> MemoryRecord {
        MemoryRecord::new(
            Scope::new("c", "u"),
            content,
            embedding,
            Importance::EXTRACTED,
        )
    }

    /// Unit vector in 2D with the given cosine against [1, 0].
    fn at_cosine(c: f32) -> Vec<f32> {
        vec![c, (1.0 - c * c).sqrt()]
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn magnitude_does_not_matter() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![10.0, 20.0, 30.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_norm_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn mismatched_or_empty_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn nan_input_scores_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn rank_filters_before_truncating() {
        let candidates = vec![
            record("low", at_cosine(0.3)),
            record("high", at_cosine(0.9)),
            record("mid", at_cosine(0.6)),
        ];
        let ranked = CosineRanker::default().rank(&[1.0, 0.0], candidates, 5);
        let contents: Vec<_> = ranked.iter().map(|s| s.record.content.as_str()).collect();
        assert_eq!(contents, vec!["high", "mid"]);
    }

    #[test]
    fn rank_excludes_exact_threshold() {
        let candidates = vec![record("edge", vec![1.0, 1.0])];
        let ranker = CosineRanker::new(cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]));
        assert!(ranker.rank(&[1.0, 0.0], candidates, 5).is_empty());
    }

    #[test]
    fn rank_ties_keep_input_order() {
        let candidates = vec![
            record("first", vec![1.0, 0.0]),
            record("second", vec![2.0, 0.0]),
            record("third", vec![3.0, 0.0]),
        ];
        let ranked = CosineRanker::default().rank(&[1.0, 0.0], candidates, 2);
        let contents: Vec<_> = ranked.iter().map(|s| s.record.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn rank_with_zero_limit_is_empty() {
        let candidates = vec![record("x", vec![1.0, 0.0])];
        assert!(CosineRanker::default().rank(&[1.0, 0.0], candidates, 0).is_empty());
    }

    #[test]
    fn find_most_similar_returns_best_match() {
        let candidates = vec![
            record("a", vec![0.5, 0.5, 0.0]),
            record("b", vec![0.9, 0.1, 0.0]),
            record("c", vec![0.0, 1.0, 0.0]),
        ];
        let (idx, _) = find_most_similar(&[1.0, 0.0, 0.0], &candidates).unwrap();
        assert_eq!(candidates[idx].content, "b");
        assert!(find_most_similar(&[1.0], &[]).is_none());
    }

    fn nonzero_vec(len: usize) -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0_f32..100.0, len)
            .prop_filter("non-zero norm", |v| v.iter().map(|x| x * x).sum::<f32>() > 1e-3)
    }

    fn vec_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
        (1usize..32).prop_flat_map(|len| {
            (
                prop::collection::vec(-100.0_f32..100.0, len),
                prop::collection::vec(-100.0_f32..100.0, len),
            )
        })
    }

    proptest! {
        #[test]
        fn self_similarity_is_one(v in (1usize..32).prop_flat_map(nonzero_vec)) {
            let s = cosine_similarity(&v, &v);
            prop_assert!((s - 1.0).abs() < 1e-4, "got {}", s);
        }

        #[test]
        fn similarity_is_symmetric((a, b) in vec_pair()) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }

        #[test]
        fn similarity_is_bounded((a, b) in vec_pair()) {
            let s = cosine_similarity(&a, &b);
            prop_assert!((-1.0..=1.0).contains(&s));
        }

        #[test]
        fn rank_output_respects_threshold_limit_and_order(
            query in prop::collection::vec(-1.0_f32..1.0, 4),
            embeddings in prop::collection::vec(prop::collection::vec(-1.0_f32..1.0, 4), 0..20),
            limit in 0usize..8,
        ) {
            let candidates: Vec<_> = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, e)| record(&format!("m{i}"), e))
                .collect();
            let ranked = CosineRanker::default().rank(&query, candidates, limit);

            prop_assert!(ranked.len() <= limit);
            for s in &ranked {
                prop_assert!(s.score > DEFAULT_SIMILARITY_THRESHOLD);
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
