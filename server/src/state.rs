// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service wiring. One instance of each engine service, built at startup
//! and shared by handle; no global mutable state.

use std::sync::Arc;
use std::time::Duration;

use vigil_engine::application::{CatalogMatcher, KnowledgeExtractor, PatternTracker, TrustLedger};
use vigil_engine::config::{BusConfig, MatcherConfig, PatternConfig, TrustConfig};
use vigil_engine::infrastructure::{
    EmbeddingProvider, EventBus, FallbackEmbeddingProvider, MemoryStore, RecordStore,
    RemoteEmbeddingProvider, StaticVisionAnalyzer,
};

/// Everything the route handlers need, constructed once.
pub struct AppState {
    pub bus: Arc<EventBus>,
    pub tracker: Arc<PatternTracker>,
    pub ledger: Arc<TrustLedger>,
    pub store: Arc<dyn RecordStore>,
    pub extractor: Arc<KnowledgeExtractor>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub matcher: Arc<CatalogMatcher>,
    pub embedding_dimension: usize,
    pub keepalive: Duration,
}

pub type SharedState = Arc<AppState>;

/// Startup options the binary resolves from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    pub pattern: PatternConfig,
    pub trust: TrustConfig,
    pub matcher: MatcherConfig,
    pub bus: BusConfig,
    /// Remote embedding service endpoint; the deterministic fallback is
    /// used when unset.
    pub embedding_url: Option<String>,
}

impl AppState {
    pub fn build(options: StateOptions) -> SharedState {
        let keepalive = options.bus.keepalive;
        let bus = Arc::new(EventBus::new(options.bus));
        let tracker = Arc::new(PatternTracker::new(bus.clone(), options.pattern));
        let ledger = Arc::new(TrustLedger::new(bus.clone(), options.trust));
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let extractor = Arc::new(KnowledgeExtractor::new(
            Arc::new(StaticVisionAnalyzer),
            bus.clone(),
        ));
        let embedding_dimension = options.matcher.fallback_dimension;
        let embeddings: Arc<dyn EmbeddingProvider> = match options.embedding_url {
            Some(url) => Arc::new(RemoteEmbeddingProvider::new(url)),
            None => Arc::new(FallbackEmbeddingProvider::new(embedding_dimension)),
        };
        let matcher = Arc::new(CatalogMatcher::new(options.matcher));

        Arc::new(Self {
            bus,
            tracker,
            ledger,
            store,
            extractor,
            embeddings,
            matcher,
            embedding_dimension,
            keepalive,
        })
    }
}
