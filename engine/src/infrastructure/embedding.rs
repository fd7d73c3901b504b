// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedding provider seam.
//!
//! The engine never calls a model service itself; it consumes vectors
//! through [`EmbeddingProvider`]. When no provider is configured or a call
//! fails, the deterministic fallback keeps the matching pipeline
//! exercisable. The fallback is NOT semantically meaningful: identical text
//! maps to identical vectors and nothing more.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::ProviderError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// HTTP embedding service client. Expects `POST {endpoint}` with
/// `{"input": text}` returning `{"embedding": [f32, ...]}`.
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl RemoteEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "input": text }))
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;
        if body.embedding.is_empty() {
            return Err(ProviderError::Malformed("empty embedding".to_string()));
        }
        Ok(body.embedding)
    }
}

/// Provider that always answers with the deterministic fallback. Used when
/// no embedding service is configured.
pub struct FallbackEmbeddingProvider {
    dimension: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(fallback_embedding(text, self.dimension))
    }
}

/// Deterministic pseudo-embedding: a linear-congruential sequence seeded
/// from a hash of the lowercased text, normalized to unit length.
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.to_lowercase().as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut state = u64::from_le_bytes(seed) & 0xFFFF_FFFF;

    let mut values: Vec<f32> = (0..dimension)
        .map(|_| {
            state = (state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)) & 0xFFFF_FFFF;
            ((state as f64 / u32::MAX as f64) * 2.0 - 1.0) as f32
        })
        .collect();

    let norm = values.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in &mut values {
            *value = (*value as f64 / norm) as f32;
        }
    }
    values
}

/// Embed through `provider`, degrading to the deterministic fallback on any
/// failure. Degradation is logged, never surfaced.
pub async fn embed_or_fallback(
    provider: &dyn EmbeddingProvider,
    text: &str,
    dimension: usize,
) -> Vec<f32> {
    match provider.embed(text).await {
        Ok(vector) if !vector.is_empty() => vector,
        Ok(_) => {
            warn!("embedding provider returned an empty vector, using fallback");
            fallback_embedding(text, dimension)
        }
        Err(err) => {
            warn!(%err, "embedding provider failed, using fallback");
            fallback_embedding(text, dimension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic_and_case_insensitive() {
        let a = fallback_embedding("Fence Variance Agent", 256);
        let b = fallback_embedding("fence variance agent", 256);
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[test]
    fn fallback_has_unit_norm() {
        let vector = fallback_embedding("some workflow description", 256);
        let norm: f64 = vector.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn different_text_gives_different_vectors() {
        let a = fallback_embedding("fence variance", 256);
        let b = fallback_embedding("commercial signage", 256);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn fallback_provider_matches_free_function() {
        let provider = FallbackEmbeddingProvider::new(64);
        let from_provider = provider.embed("same text").await.unwrap();
        assert_eq!(from_provider, fallback_embedding("same text", 64));
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Unavailable("no service".to_string()))
        }
    }

    #[tokio::test]
    async fn embed_or_fallback_substitutes_on_failure() {
        let vector = embed_or_fallback(&FailingProvider, "hello", 32).await;
        assert_eq!(vector, fallback_embedding("hello", 32));
    }
}
