// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Engine configuration.
//!
//! Every tunable the detection and trust subsystems use is a named field
//! here rather than a constant buried in the logic. Defaults are the
//! production values; override through the `with_*` builders or by
//! constructing the structs directly at startup.

use std::time::Duration;

/// Tunables for the pattern detection state machine.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Confidence at which a session is marked terminal and an
    /// optimization opportunity is emitted.
    pub confidence_threshold: f64,
    /// Weight of the session-repetition component of the confidence score.
    pub repetition_weight: f64,
    /// Weight of the cross-session sequence-similarity component.
    pub similarity_weight: f64,
    /// Weight of the stage-progress component.
    pub stage_weight: f64,
    /// Number of contributing sessions at which the repetition component
    /// saturates, and the gate for the confidence-scored stage.
    pub repetition_target: usize,
    /// Minimum Jaccard similarity between the first two recorded
    /// sequences of a category for a cross-session match.
    pub sequence_match_threshold: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
            repetition_weight: 0.5,
            similarity_weight: 0.4,
            stage_weight: 0.1,
            repetition_target: 3,
            sequence_match_threshold: 0.8,
        }
    }
}

impl PatternConfig {
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// Tunables for trust level transitions.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// Successful runs required before a supervised agent can be promoted.
    pub promotion_min_runs: u64,
    /// Failure rate that blocks promotion to autonomous.
    pub promotion_max_failure_rate: f64,
    /// Failure rate above which an autonomous agent degrades to stale.
    pub demotion_failure_rate: f64,
    /// Minimum total runs before the demotion rule applies.
    pub demotion_min_runs: u64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            promotion_min_runs: 10,
            promotion_max_failure_rate: 0.05,
            demotion_failure_rate: 0.10,
            demotion_min_runs: 5,
        }
    }
}

impl TrustConfig {
    pub fn with_promotion_min_runs(mut self, runs: u64) -> Self {
        self.promotion_min_runs = runs;
        self
    }
}

/// Tunables for catalog similarity matching.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum cosine similarity for a catalog candidate to count as a match.
    pub match_threshold: f32,
    /// Dimension of the deterministic fallback embedding.
    pub fallback_dimension: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.85,
            fallback_dimension: 256,
        }
    }
}

/// Tunables for the event fan-out bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Recent-message ring buffer entries kept per subject for reconnect
    /// replay. Not a durability guarantee.
    pub ring_capacity: usize,
    /// Bounded capacity of each subscriber channel. A full channel drops.
    pub subscriber_capacity: usize,
    /// Idle interval after which a liveness ping is sent to a listener.
    pub keepalive: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 20,
            subscriber_capacity: 200,
            keepalive: Duration::from_secs(25),
        }
    }
}
