// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # SpecBuilder — agent spec synthesis from a confirmed session
//!
//! Turns a confirmed observation session into an automation agent spec:
//! a trigger pattern, a numbered action sequence, and the approved
//! knowledge sources. This is the typed result an AI synthesizer would
//! return; the engine itself only derives it heuristically from the event
//! log.

use serde_json::{json, Value};

use crate::domain::{AgentSpecRecord, Contribution, SessionRecord};

/// Build a spec record from a confirmed session trace. The publisher of
/// the workflow (the observed operator) starts with full attribution.
pub fn build_spec(record: &SessionRecord, approved_sources: &[Value]) -> AgentSpecRecord {
    let permit_type = record.permit_type.as_str();
    let readable = permit_type.replace('_', " ");

    let mut screens: Vec<String> = Vec::new();
    for event in &record.events {
        if !event.screen_name.is_empty() && !screens.contains(&event.screen_name) {
            screens.push(event.screen_name.clone());
        }
    }

    let action_sequence: Vec<Value> = record
        .events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            json!({
                "step": index + 1,
                "screen_name": event.screen_name,
                "element_selector": event.element_selector,
                "action_type": event.event_type.as_str(),
                "element_value": event.element_value.clone().unwrap_or_default(),
            })
        })
        .collect();

    let mut spec = AgentSpecRecord::new(
        format!("{} Agent", title_case(permit_type)),
        format!("Automates {readable} permit processing"),
        Some(permit_type.to_string()),
    );
    spec.trigger_pattern = json!({
        "permit_type": permit_type,
        "screens_involved": screens,
    });
    spec.action_sequence = action_sequence;
    spec.knowledge_sources = approved_sources.to_vec();
    spec.contributions = vec![Contribution {
        user_id: record.user_id.clone(),
        score: 1.0,
    }];
    spec
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
