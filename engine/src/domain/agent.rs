// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Automation agent specs, trust levels, and attribution types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Governance state controlling how much runtime autonomy an agent gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Supervised,
    Autonomous,
    Stale,
}

impl TrustLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::Supervised => "supervised",
            TrustLevel::Autonomous => "autonomous",
            TrustLevel::Stale => "stale",
        }
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        TrustLevel::Supervised
    }
}

/// Fractional attribution of authorship over an agent's action sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub user_id: String,
    /// 0.0–1.0, proportional to the contributor's share of the sequence.
    pub score: f64,
}

/// A labeled region the vision analyzer picked out of a screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRegion {
    pub element_selector: String,
    /// "gis_data" | "violation_history" | "policy_text" | "email_thread" | ...
    pub region_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub text_preview: String,
}

/// An evidentiary knowledge source consulted during a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub screen_name: String,
    pub element_selector: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_excerpt: Option<String>,
    pub source_type: String,
    #[serde(default)]
    pub confirmed: bool,
    /// User-specified alternative source, set during review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_url: Option<String>,
}

/// A published automation agent spec in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpecRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub trigger_pattern: serde_json::Value,
    #[serde(default)]
    pub action_sequence: Vec<serde_json::Value>,
    #[serde(default)]
    pub knowledge_sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    /// Description embedding for catalog matching. Not exposed over the API.
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
    pub trust_level: TrustLevel,
    #[serde(default)]
    pub successful_runs: u64,
    #[serde(default)]
    pub failed_runs: u64,
    /// Set when this spec is a fork of another.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentSpecRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permit_type: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            trigger_pattern: serde_json::Value::Null,
            action_sequence: Vec::new(),
            knowledge_sources: Vec::new(),
            contributions: Vec::new(),
            embedding: Vec::new(),
            trust_level: TrustLevel::Supervised,
            successful_runs: 0,
            failed_runs: 0,
            parent_id: None,
            permit_type,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_runs(&self) -> u64 {
        self.successful_runs + self.failed_runs
    }

    pub fn failure_rate(&self) -> f64 {
        let total = self.total_runs();
        if total == 0 {
            0.0
        } else {
            self.failed_runs as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_level_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TrustLevel::Supervised).unwrap(),
            "\"supervised\""
        );
        assert_eq!(
            serde_json::to_string(&TrustLevel::Autonomous).unwrap(),
            "\"autonomous\""
        );
    }

    #[test]
    fn new_spec_starts_supervised_with_no_runs() {
        let spec = AgentSpecRecord::new("Fence Agent", "Automates fences", None);
        assert_eq!(spec.trust_level, TrustLevel::Supervised);
        assert_eq!(spec.total_runs(), 0);
        assert_eq!(spec.failure_rate(), 0.0);
    }

    #[test]
    fn embedding_is_not_serialized() {
        let mut spec = AgentSpecRecord::new("A", "B", None);
        spec.embedding = vec![0.5; 8];
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("embedding").is_none());
    }
}
