// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod embedding;
pub mod event_bus;
pub mod store;
pub mod vision;

pub use embedding::{
    embed_or_fallback, fallback_embedding, EmbeddingProvider, FallbackEmbeddingProvider,
    RemoteEmbeddingProvider,
};
pub use event_bus::{EventBus, Subscription};
pub use store::{MemoryStore, RecordStore};
pub use vision::{fallback_regions, StaticVisionAnalyzer, VisionAnalyzer};
