// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Typed notifications fanned out to listeners through the event bus.
//!
//! Every message serializes as `{"type": TAG, "data": {...}}`, which is the
//! frame shape SSE clients consume.

use serde::{Deserialize, Serialize};

use super::agent::{AgentSpecRecord, KnowledgeSource, SourceRegion, TrustLevel};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// Greeting sent when a listener attaches to a session stream.
    Connected { session_id: String },
    /// Liveness message so intermediary proxies keep idle streams open.
    Ping,
    /// Detection progress after each processed event.
    PatternUpdate {
        session_id: String,
        confidence: f64,
        stage: u8,
    },
    /// A workflow crossed the confidence threshold. Emitted at most once
    /// per session.
    OptimizationOpportunity {
        session_id: String,
        permit_type: String,
        confidence: f64,
        sessions_count: usize,
        screens: Vec<String>,
        message: String,
    },
    /// Knowledge-source regions identified on a screen, or the batch of
    /// sources extracted from a whole session.
    SourceHighlight {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screen_name: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        regions: Vec<SourceRegion>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sources: Vec<KnowledgeSource>,
    },
    /// A new agent spec was synthesized from a confirmed session.
    SpecReady {
        session_id: String,
        spec: AgentSpecRecord,
    },
    /// An existing catalog agent covers this workflow.
    MarketMatch {
        session_id: String,
        agent: AgentSpecRecord,
        message: String,
    },
    /// Nothing in the catalog was close enough.
    MarketNoMatch { session_id: String, message: String },
    AgentStatusUpdate {
        status: String,
        agent_name: String,
        total_steps: usize,
    },
    AgentDemoStep {
        step_index: usize,
        total_steps: usize,
        action: serde_json::Value,
        field_id: String,
        value: String,
        screen_name: String,
    },
    AgentCompleted {
        agent_name: String,
        steps_completed: usize,
        success: bool,
    },
    TrustLevelChanged {
        agent_id: String,
        old_level: TrustLevel,
        new_level: TrustLevel,
        successful_runs: u64,
        failed_runs: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ExceptionFlagged { agent_id: String, error: String },
}

impl Notification {
    /// The wire tag, without serializing the whole message.
    pub fn tag(&self) -> &'static str {
        match self {
            Notification::Connected { .. } => "CONNECTED",
            Notification::Ping => "PING",
            Notification::PatternUpdate { .. } => "PATTERN_UPDATE",
            Notification::OptimizationOpportunity { .. } => "OPTIMIZATION_OPPORTUNITY",
            Notification::SourceHighlight { .. } => "SOURCE_HIGHLIGHT",
            Notification::SpecReady { .. } => "SPEC_READY",
            Notification::MarketMatch { .. } => "MARKET_MATCH",
            Notification::MarketNoMatch { .. } => "MARKET_NO_MATCH",
            Notification::AgentStatusUpdate { .. } => "AGENT_STATUS_UPDATE",
            Notification::AgentDemoStep { .. } => "AGENT_DEMO_STEP",
            Notification::AgentCompleted { .. } => "AGENT_COMPLETED",
            Notification::TrustLevelChanged { .. } => "TRUST_LEVEL_CHANGED",
            Notification::ExceptionFlagged { .. } => "EXCEPTION_FLAGGED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_type_and_data_envelope() {
        let message = Notification::PatternUpdate {
            session_id: "s1".to_string(),
            confidence: 0.42,
            stage: 3,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "PATTERN_UPDATE");
        assert_eq!(json["data"]["session_id"], "s1");
        assert_eq!(json["data"]["stage"], 3);
    }

    #[test]
    fn ping_has_no_data() {
        let json = serde_json::to_value(&Notification::Ping).unwrap();
        assert_eq!(json["type"], "PING");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn tag_matches_serialized_type() {
        let message = Notification::TrustLevelChanged {
            agent_id: "a1".to_string(),
            old_level: TrustLevel::Supervised,
            new_level: TrustLevel::Autonomous,
            successful_runs: 10,
            failed_runs: 0,
            reason: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], message.tag());
        assert_eq!(json["data"]["new_level"], "autonomous");
    }

    #[test]
    fn round_trips_through_json() {
        let message = Notification::OptimizationOpportunity {
            session_id: "s1".to_string(),
            permit_type: "fence_variance_r2".to_string(),
            confidence: 0.911,
            sessions_count: 3,
            screens: vec!["INBOX".to_string(), "GIS_SYSTEM".to_string()],
            message: "confirm".to_string(),
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tag(), "OPTIMIZATION_OPPORTUNITY");
    }
}
