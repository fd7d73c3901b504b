// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # SimilarityMatcher — cosine search over the agent catalog
//!
//! Before a new spec is built, the workflow description is matched against
//! every published agent. A linear scan is fine at catalog scale; the first
//! candidate to reach the maximum score wins ties.

use tracing::info;

use crate::config::MatcherConfig;
use crate::domain::AgentSpecRecord;

/// Cosine similarity of two vectors. Mismatched lengths, empty inputs, and
/// zero-norm vectors all return 0.0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += (*x as f64).powi(2);
        norm_b += (*y as f64).powi(2);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

pub struct CatalogMatcher {
    config: MatcherConfig,
}

impl CatalogMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn match_threshold(&self) -> f32 {
        self.config.match_threshold
    }

    /// Scan the catalog for the best-scoring candidate. Returns it only if
    /// the score reaches the configured threshold; agents without an
    /// embedding are skipped.
    pub fn best_match<'a>(
        &self,
        query: &[f32],
        catalog: &'a [AgentSpecRecord],
    ) -> Option<(&'a AgentSpecRecord, f32)> {
        let mut best_score = 0.0f32;
        let mut best: Option<&AgentSpecRecord> = None;

        for candidate in catalog {
            if candidate.embedding.is_empty() {
                continue;
            }
            let score = cosine_similarity(query, &candidate.embedding);
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }
        }

        match best {
            Some(candidate) if best_score >= self.config.match_threshold => {
                info!(agent = %candidate.name, score = best_score, "catalog match found");
                Some((candidate, best_score))
            }
            _ => {
                info!(best_score, "no catalog match above threshold");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_embedding(name: &str, embedding: Vec<f32>) -> AgentSpecRecord {
        let mut spec = AgentSpecRecord::new(name, "test agent", None);
        spec.embedding = embedding;
        spec
    }

    #[test]
    fn similarity_of_a_vector_with_itself_is_one() {
        let v = vec![0.3, -0.5, 0.8, 0.1];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_is_within_minus_one_and_one() {
        let a = vec![1.0, 2.0, -3.0];
        let b = vec![-4.0, 0.5, 2.0];
        let score = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn degenerate_inputs_return_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0, 0.0, 2.0];
        let b = vec![-1.0, 0.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn best_match_requires_threshold() {
        let matcher = CatalogMatcher::new(MatcherConfig::default());
        let catalog = vec![spec_with_embedding("far", vec![0.0, 1.0])];
        // Orthogonal to the query: score 0, below the 0.85 threshold.
        assert!(matcher.best_match(&[1.0, 0.0], &catalog).is_none());
    }

    #[test]
    fn best_match_keeps_first_seen_on_ties() {
        let matcher = CatalogMatcher::new(MatcherConfig::default());
        let catalog = vec![
            spec_with_embedding("first", vec![1.0, 0.0]),
            spec_with_embedding("second", vec![1.0, 0.0]),
        ];
        let (candidate, score) = matcher.best_match(&[1.0, 0.0], &catalog).unwrap();
        assert_eq!(candidate.name, "first");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn candidates_without_embeddings_are_skipped() {
        let matcher = CatalogMatcher::new(MatcherConfig::default());
        let catalog = vec![
            spec_with_embedding("empty", Vec::new()),
            spec_with_embedding("close", vec![1.0, 0.1]),
        ];
        let (candidate, _) = matcher.best_match(&[1.0, 0.1], &catalog).unwrap();
        assert_eq!(candidate.name, "close");
    }
}
