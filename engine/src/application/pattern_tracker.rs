// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PatternTracker — per-session detection state machine
//!
//! Tracks interface-interaction sequences across operator sessions.
//! Each session climbs a ten-stage ladder as evidence accumulates: screens
//! visited, a commit-like event closing out a sequence, a second session of
//! the same workflow category, a cross-session sequence match, and so on.
//! Stages only ever advance.
//!
//! When the recomputed confidence for a session crosses the configured
//! threshold, the crossing session is atomically marked terminal and exactly
//! one optimization-opportunity notification is published for the whole
//! workflow category, regardless of how many sessions cross or how many
//! concurrent calls observe the crossing. Later sessions of an
//! already-nudged category keep advancing normally but stay silent.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use super::round3;
use crate::config::PatternConfig;
use crate::domain::{Notification, PatternStage, UiEvent, DEFAULT_PERMIT_TYPE};
use crate::infrastructure::EventBus;

#[derive(Debug, Default)]
struct SessionPattern {
    /// Distinct-consecutive screen names visited, in order.
    screens: Vec<String>,
    stage: PatternStage,
    confidence: f64,
}

#[derive(Debug, Default)]
struct CategoryGroup {
    /// One recorded sequence per session that reached sequence extraction.
    sequences: Vec<Vec<String>>,
    /// Distinct sessions that have contributed events to this category.
    sessions: HashSet<String>,
    /// Set once the category's opportunity notification has gone out.
    opportunity_emitted: bool,
}

/// Per-session view returned by [`PatternTracker::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct PatternSnapshot {
    pub session_id: String,
    pub stage: u8,
    pub stage_name: String,
    pub confidence: f64,
    pub screens: Vec<String>,
}

/// Owns one detection state machine per session plus cross-session grouping
/// by workflow category. The only writer of session pattern state.
pub struct PatternTracker {
    sessions: DashMap<String, SessionPattern>,
    categories: DashMap<String, CategoryGroup>,
    bus: Arc<EventBus>,
    config: PatternConfig,
}

impl PatternTracker {
    pub fn new(bus: Arc<EventBus>, config: PatternConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            categories: DashMap::new(),
            bus,
            config,
        }
    }

    /// Process one interaction event: record the screen visit, advance the
    /// session's stage, recompute confidence, and emit the opportunity
    /// notification if the threshold was crossed. Returns the updated
    /// confidence.
    pub fn process_event(&self, event: &UiEvent) -> f64 {
        let session_id = event.session_id.as_str();
        let permit_type = self.infer_permit_type(event);

        self.categories
            .entry(permit_type.clone())
            .or_default()
            .sessions
            .insert(session_id.to_string());

        let mut session = self.sessions.entry(session_id.to_string()).or_default();

        if !event.screen_name.is_empty()
            && session.screens.last().map(String::as_str) != Some(event.screen_name.as_str())
        {
            session.screens.push(event.screen_name.clone());
        }

        let next = self.advance_stage(&session, event, &permit_type);
        if next != session.stage {
            debug!(
                session_id,
                from = session.stage.name(),
                to = next.name(),
                "pattern stage advanced"
            );
        }
        session.stage = next;

        let confidence = self.compute_confidence(next, &permit_type);
        session.confidence = confidence;

        let mut opportunity = None;
        if confidence >= self.config.confidence_threshold
            && session.stage < PatternStage::OpportunityEmitted
        {
            // The opportunity belongs to the workflow, not the session:
            // check-and-set the category flag and flip the crossing session
            // to terminal while both entry locks are held, so neither a
            // concurrent call for this session nor a sibling session of the
            // same category can publish a second notification.
            if let Some(mut group) = self.categories.get_mut(&permit_type) {
                if !group.opportunity_emitted {
                    group.opportunity_emitted = true;
                    let sessions_count = group.sessions.len();
                    drop(group);
                    session.stage = PatternStage::OpportunityEmitted;
                    opportunity = Some(Notification::OptimizationOpportunity {
                        session_id: session_id.to_string(),
                        permit_type: permit_type.clone(),
                        confidence,
                        sessions_count,
                        screens: session.screens.clone(),
                        message: format!(
                            "I noticed you process {} {} times. Watch the replay and confirm.",
                            permit_type.replace('_', " "),
                            sessions_count
                        ),
                    });
                }
            }
        }
        drop(session);

        if let Some(message) = opportunity {
            info!(
                session_id,
                %permit_type,
                confidence,
                "confidence crossed threshold, emitting optimization opportunity"
            );
            self.bus.publish(session_id, message);
        }

        confidence
    }

    pub fn get_stage(&self, session_id: &str) -> PatternStage {
        self.sessions
            .get(session_id)
            .map(|session| session.stage)
            .unwrap_or_default()
    }

    pub fn get_confidence(&self, session_id: &str) -> f64 {
        self.sessions
            .get(session_id)
            .map(|session| session.confidence)
            .unwrap_or(0.0)
    }

    /// Distinct-consecutive screens recorded for a session.
    pub fn screen_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|session| session.screens.len())
            .unwrap_or(0)
    }

    /// Number of sessions with any tracked state.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn snapshot(&self) -> Vec<PatternSnapshot> {
        self.sessions
            .iter()
            .map(|entry| PatternSnapshot {
                session_id: entry.key().clone(),
                stage: entry.value().stage.ordinal(),
                stage_name: entry.value().stage.name().to_string(),
                confidence: entry.value().confidence,
                screens: entry.value().screens.clone(),
            })
            .collect()
    }

    /// One forward step at most per event, mirroring the evidence each
    /// stage requires.
    fn advance_stage(
        &self,
        session: &SessionPattern,
        event: &UiEvent,
        permit_type: &str,
    ) -> PatternStage {
        let n_screens = session.screens.len();
        let n_sessions = self.category_session_count(permit_type);

        match session.stage {
            PatternStage::Idle if n_screens >= 1 => PatternStage::FirstOccurrence,
            PatternStage::FirstOccurrence if n_screens >= 2 => PatternStage::Collecting,
            PatternStage::Collecting if event.event_type.is_commit() => {
                // The session's full sequence is recorded for its category
                // exactly once, at extraction.
                self.categories
                    .entry(permit_type.to_string())
                    .or_default()
                    .sequences
                    .push(session.screens.clone());
                PatternStage::SequenceExtracted
            }
            PatternStage::SequenceExtracted if n_sessions >= 2 => PatternStage::SecondOccurrence,
            PatternStage::SecondOccurrence
                if self.sequence_similarity(permit_type) >= self.config.sequence_match_threshold =>
            {
                PatternStage::CrossSessionMatch
            }
            PatternStage::CrossSessionMatch if event.screenshot_b64.is_some() => {
                PatternStage::KnowledgeSourcesIdentified
            }
            PatternStage::KnowledgeSourcesIdentified
                if n_sessions >= self.config.repetition_target =>
            {
                PatternStage::ConfidenceScored
            }
            PatternStage::ConfidenceScored
                if self.compute_confidence(PatternStage::ConfidenceScored, permit_type)
                    >= self.config.confidence_threshold =>
            {
                PatternStage::ThresholdReached
            }
            current => current,
        }
    }

    /// Weighted blend of session repetition, cross-session sequence
    /// similarity, and stage progress. Always within [0, 1].
    fn compute_confidence(&self, stage: PatternStage, permit_type: &str) -> f64 {
        let n_sessions = self.category_session_count(permit_type);
        let repetition =
            (n_sessions as f64 / self.config.repetition_target as f64).min(1.0);
        let similarity = self.sequence_similarity(permit_type);
        let stage_ratio =
            stage.ordinal() as f64 / PatternStage::OpportunityEmitted.ordinal() as f64;

        let score = repetition * self.config.repetition_weight
            + similarity * self.config.similarity_weight
            + stage_ratio * self.config.stage_weight;
        round3(score.clamp(0.0, 1.0))
    }

    /// Jaccard similarity over the screen-name sets of the first two
    /// recorded sequences for a category; 0 until two sequences exist.
    fn sequence_similarity(&self, permit_type: &str) -> f64 {
        let Some(group) = self.categories.get(permit_type) else {
            return 0.0;
        };
        if group.sequences.len() < 2 {
            return 0.0;
        }
        let a: HashSet<&str> = group.sequences[0].iter().map(String::as_str).collect();
        let b: HashSet<&str> = group.sequences[1].iter().map(String::as_str).collect();
        let intersection = a.intersection(&b).count();
        let union = a.union(&b).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    fn category_session_count(&self, permit_type: &str) -> usize {
        self.categories
            .get(permit_type)
            .map(|group| group.sessions.len())
            .unwrap_or(0)
    }

    /// Best-effort category classifier: an explicit hint wins, then simple
    /// keyword containment on the screen name, then the default category.
    fn infer_permit_type(&self, event: &UiEvent) -> String {
        if let Some(hint) = event.permit_type.as_deref() {
            if !hint.is_empty() {
                return hint.to_string();
            }
        }
        let screen = event.screen_name.to_uppercase();
        if screen.contains("ADU") || screen.contains("MIXED") {
            return "adu_mixed_zone".to_string();
        }
        if screen.contains("SIGN") || screen.contains("COMMERCIAL") {
            return "commercial_signage".to_string();
        }
        DEFAULT_PERMIT_TYPE.to_string()
    }
}
