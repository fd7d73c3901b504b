// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Raw interaction events streamed from the browser extension (or the
//! workflow simulator standing in for it).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of interface interaction an operator performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Navigate,
    Input,
    ScreenSwitch,
    Submit,
}

impl EventKind {
    /// Commit-like events close out a collected screen sequence.
    pub fn is_commit(self) -> bool {
        matches!(self, EventKind::Submit | EventKind::Click)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Navigate => "navigate",
            EventKind::Input => "input",
            EventKind::ScreenSwitch => "screen_switch",
            EventKind::Submit => "submit",
        }
    }
}

/// One observed interaction inside an operator session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiEvent {
    pub session_id: String,
    pub user_id: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub event_type: EventKind,
    /// e.g. "GIS_SYSTEM" | "CODE_ENFORCEMENT" | "POLICY_WIKI"
    pub screen_name: String,
    #[serde(default)]
    pub element_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_value: Option<String>,
    /// Captured XHR/fetch payload, when the extension saw one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_call: Option<serde_json::Value>,
    /// Base64 PNG handed to the vision analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_b64: Option<String>,
    /// Explicit workflow category; inferred from the screen name if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permit_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_round_trips_snake_case() {
        let json = serde_json::to_string(&EventKind::ScreenSwitch).unwrap();
        assert_eq!(json, "\"screen_switch\"");
        let back: EventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventKind::ScreenSwitch);
    }

    #[test]
    fn commit_kinds_are_submit_and_click() {
        assert!(EventKind::Submit.is_commit());
        assert!(EventKind::Click.is_commit());
        assert!(!EventKind::Input.is_commit());
        assert!(!EventKind::ScreenSwitch.is_commit());
    }

    #[test]
    fn ui_event_deserializes_with_optional_fields_absent() {
        let event: UiEvent = serde_json::from_str(
            r#"{
                "session_id": "s1",
                "user_id": "tech",
                "event_type": "navigate",
                "screen_name": "INBOX"
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, EventKind::Navigate);
        assert!(event.screenshot_b64.is_none());
        assert!(event.permit_type.is_none());
    }
}
