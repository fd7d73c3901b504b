// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # VIGIL Engine
//!
//! Real-time coordination core for workflow observation: pattern detection
//! across operator sessions, trust lifecycle governance for automation
//! agents, contribution attribution for forked agents, and the per-subject
//! event fan-out bus the other components publish through.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - `domain`: value types, notification envelope, error taxonomy
//! - `application`: PatternTracker, TrustLedger, SimilarityMatcher,
//!   ContributionSplitter, KnowledgeExtractor, SpecBuilder
//! - `infrastructure`: EventBus, embedding/vision collaborator seams,
//!   record store

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::*;
pub use domain::*;
