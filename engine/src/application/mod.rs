// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod contribution;
pub mod knowledge;
pub mod matcher;
pub mod pattern_tracker;
pub mod spec_builder;
pub mod trust_ledger;

pub use knowledge::KnowledgeExtractor;
pub use matcher::{cosine_similarity, CatalogMatcher};
pub use pattern_tracker::{PatternSnapshot, PatternTracker};
pub use trust_ledger::{LedgerEntry, TrustLedger};

/// Scores and confidences are reported to 3 decimals everywhere.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
