// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Observation sessions and the detection stage ladder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::UiEvent;

/// Category assigned when the screen-name classifier has no stronger signal.
pub const DEFAULT_PERMIT_TYPE: &str = "fence_variance_r2";

/// Screenshots retained per session record.
pub const MAX_SCREENSHOTS: usize = 10;

/// Ordinal position of a session within the ten-step detection ladder.
/// Sessions only ever move forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternStage {
    #[default]
    Idle = 0,
    FirstOccurrence = 1,
    Collecting = 2,
    SequenceExtracted = 3,
    SecondOccurrence = 4,
    CrossSessionMatch = 5,
    KnowledgeSourcesIdentified = 6,
    ConfidenceScored = 7,
    ThresholdReached = 8,
    OpportunityEmitted = 9,
}

impl PatternStage {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternStage::Idle => "idle",
            PatternStage::FirstOccurrence => "first_occurrence",
            PatternStage::Collecting => "collecting",
            PatternStage::SequenceExtracted => "sequence_extracted",
            PatternStage::SecondOccurrence => "second_occurrence",
            PatternStage::CrossSessionMatch => "cross_session_match",
            PatternStage::KnowledgeSourcesIdentified => "knowledge_sources_identified",
            PatternStage::ConfidenceScored => "confidence_scored",
            PatternStage::ThresholdReached => "threshold_reached",
            PatternStage::OpportunityEmitted => "opportunity_emitted",
        }
    }
}

/// Durable-side record of one operator session: the raw event log plus the
/// confirmation flags the two-step review flow sets. The detection state
/// machine keeps its own working state; this record is what the store owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub permit_type: String,
    #[serde(default)]
    pub events: Vec<UiEvent>,
    /// Last [`MAX_SCREENSHOTS`] base64 screenshots, oldest first.
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub action_trace_confirmed: bool,
    #[serde(default)]
    pub knowledge_sources_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        permit_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            permit_type: permit_type.into(),
            events: Vec::new(),
            screenshots: Vec::new(),
            action_trace_confirmed: false,
            knowledge_sources_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append_event(&mut self, event: UiEvent) {
        self.events.push(event);
        self.updated_at = Utc::now();
    }

    pub fn append_screenshot(&mut self, b64: String) {
        self.screenshots.push(b64);
        if self.screenshots.len() > MAX_SCREENSHOTS {
            let excess = self.screenshots.len() - MAX_SCREENSHOTS;
            self.screenshots.drain(..excess);
        }
        self.updated_at = Utc::now();
    }
}

/// API-facing view of a session record, without the raw event payloads.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub user_id: String,
    pub permit_type: String,
    pub event_count: usize,
    pub action_trace_confirmed: bool,
    pub knowledge_sources_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            permit_type: record.permit_type.clone(),
            event_count: record.events.len(),
            action_trace_confirmed: record.action_trace_confirmed,
            knowledge_sources_confirmed: record.knowledge_sources_confirmed,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A single step in session replay playback.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame {
    pub frame_index: usize,
    pub event: UiEvent,
    /// CSS selector the replay UI highlights for this step.
    pub highlighted_element: String,
    /// Offset from session start, already scaled for half-speed playback.
    pub timestamp_ms: i64,
    pub screen_name: String,
    /// Human-readable description: "Opened Gis System", "Entered parcel id".
    pub action_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventKind;

    fn event(session: &str, screen: &str) -> UiEvent {
        UiEvent {
            session_id: session.to_string(),
            user_id: "tech".to_string(),
            timestamp: Utc::now(),
            event_type: EventKind::ScreenSwitch,
            screen_name: screen.to_string(),
            element_selector: String::new(),
            element_value: None,
            backend_call: None,
            screenshot_b64: None,
            permit_type: None,
        }
    }

    #[test]
    fn stage_ordering_is_forward() {
        assert!(PatternStage::Idle < PatternStage::Collecting);
        assert!(PatternStage::ThresholdReached < PatternStage::OpportunityEmitted);
        assert_eq!(PatternStage::OpportunityEmitted.ordinal(), 9);
    }

    #[test]
    fn screenshots_are_capped() {
        let mut record = SessionRecord::new("s1", "tech", DEFAULT_PERMIT_TYPE);
        for i in 0..15 {
            record.append_screenshot(format!("shot-{i}"));
        }
        assert_eq!(record.screenshots.len(), MAX_SCREENSHOTS);
        assert_eq!(record.screenshots[0], "shot-5");
        assert_eq!(record.screenshots[9], "shot-14");
    }

    #[test]
    fn summary_counts_events() {
        let mut record = SessionRecord::new("s1", "tech", DEFAULT_PERMIT_TYPE);
        record.append_event(event("s1", "INBOX"));
        record.append_event(event("s1", "GIS_SYSTEM"));
        let summary = SessionSummary::from(&record);
        assert_eq!(summary.event_count, 2);
        assert!(!summary.action_trace_confirmed);
    }
}
