// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cross-component detection flows: repeated workflows driving the tracker
//! to an opportunity, divergent workflows stalling it, and run outcomes
//! moving an agent through the trust lifecycle.

use std::sync::Arc;

use chrono::Utc;
use vigil_engine::application::{PatternTracker, TrustLedger};
use vigil_engine::config::{BusConfig, PatternConfig, TrustConfig};
use vigil_engine::domain::{EventKind, Notification, PatternStage, TrustLevel, UiEvent};
use vigil_engine::infrastructure::EventBus;

fn event(session: &str, kind: EventKind, screen: &str) -> UiEvent {
    UiEvent {
        session_id: session.to_string(),
        user_id: "demo_tech".to_string(),
        timestamp: Utc::now(),
        event_type: kind,
        screen_name: screen.to_string(),
        element_selector: String::new(),
        element_value: None,
        backend_call: None,
        screenshot_b64: None,
        permit_type: None,
    }
}

/// One fence-variance pass: four screens then a submit.
fn run_fence_session(tracker: &PatternTracker, session: &str) -> f64 {
    let screens = ["INBOX", "GIS_SYSTEM", "CODE_ENFORCEMENT", "POLICY_WIKI"];
    let mut confidence = 0.0;
    for screen in screens {
        confidence = tracker.process_event(&event(session, EventKind::ScreenSwitch, screen));
    }
    tracker.process_event(&event(session, EventKind::Submit, "POLICY_WIKI"))
        .max(confidence)
}

fn opportunity_count(bus: &EventBus, sessions: &[&str]) -> usize {
    sessions
        .iter()
        .map(|session| {
            bus.recent(session)
                .iter()
                .filter(|message| {
                    matches!(message, Notification::OptimizationOpportunity { .. })
                })
                .count()
        })
        .sum()
}

#[test]
fn three_identical_sessions_emit_exactly_one_opportunity() {
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let tracker = PatternTracker::new(bus.clone(), PatternConfig::default());

    run_fence_session(&tracker, "session-1");
    run_fence_session(&tracker, "session-2");
    let confidence = run_fence_session(&tracker, "session-3");

    assert!(
        confidence >= 0.75,
        "third session should cross the threshold, got {confidence}"
    );
    assert_eq!(
        opportunity_count(&bus, &["session-1", "session-2", "session-3"]),
        1,
        "exactly one opportunity across all sessions combined"
    );

    // The emitting session is terminal; replays cannot re-emit.
    let terminal: Vec<_> = ["session-1", "session-2", "session-3"]
        .iter()
        .filter(|session| tracker.get_stage(session) == PatternStage::OpportunityEmitted)
        .collect();
    assert_eq!(terminal.len(), 1);
}

#[test]
fn nudged_category_never_republishes() {
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let tracker = PatternTracker::new(bus.clone(), PatternConfig::default());

    run_fence_session(&tracker, "session-1");
    run_fence_session(&tracker, "session-2");
    run_fence_session(&tracker, "session-3");

    // Keep feeding sessions of the nudged category, including a brand-new
    // one; no second opportunity may appear.
    for _ in 0..10 {
        run_fence_session(&tracker, "session-3");
    }
    run_fence_session(&tracker, "session-4");
    assert_eq!(
        opportunity_count(
            &bus,
            &["session-1", "session-2", "session-3", "session-4"]
        ),
        1
    );
}

#[test]
fn disjoint_screen_sets_never_reach_cross_session_match() {
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let tracker = PatternTracker::new(bus.clone(), PatternConfig::default());

    // Two sessions of the same (default) category with disjoint screens.
    for screen in ["INBOX", "GIS_SYSTEM"] {
        tracker.process_event(&event("session-a", EventKind::ScreenSwitch, screen));
    }
    tracker.process_event(&event("session-a", EventKind::Submit, "GIS_SYSTEM"));

    for screen in ["POLICY_WIKI", "PERMIT_FORM"] {
        tracker.process_event(&event("session-b", EventKind::ScreenSwitch, screen));
    }
    tracker.process_event(&event("session-b", EventKind::Submit, "PERMIT_FORM"));

    // Jaccard similarity of the two recorded sequences is 0; repeated
    // events can never push either session past SECOND_OCCURRENCE.
    for _ in 0..10 {
        tracker.process_event(&event("session-a", EventKind::Navigate, "INBOX"));
        tracker.process_event(&event("session-b", EventKind::Navigate, "POLICY_WIKI"));
    }
    assert!(tracker.get_stage("session-a") < PatternStage::CrossSessionMatch);
    assert!(tracker.get_stage("session-b") < PatternStage::CrossSessionMatch);
    assert_eq!(opportunity_count(&bus, &["session-a", "session-b"]), 0);
}

#[test]
fn trust_lifecycle_promotes_then_demotes() {
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let ledger = TrustLedger::new(bus.clone(), TrustConfig::default());
    ledger.register("agent-1");

    // Nine clean runs: still supervised.
    for _ in 0..9 {
        assert_eq!(ledger.record_run("agent-1", true), TrustLevel::Supervised);
    }
    // Tenth success promotes.
    assert_eq!(ledger.record_run("agent-1", true), TrustLevel::Autonomous);

    // Two failures push the rate past 10% with well over 5 total runs.
    ledger.record_run("agent-1", false);
    let level = ledger.record_run("agent-1", false);
    assert_eq!(level, TrustLevel::Stale);

    let changes: Vec<(TrustLevel, TrustLevel)> = bus
        .recent("agent-1")
        .iter()
        .filter_map(|message| match message {
            Notification::TrustLevelChanged {
                old_level,
                new_level,
                ..
            } => Some((*old_level, *new_level)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (TrustLevel::Supervised, TrustLevel::Autonomous),
            (TrustLevel::Autonomous, TrustLevel::Stale),
        ]
    );
}

#[test]
fn pattern_updates_do_not_leak_between_categories() {
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let tracker = PatternTracker::new(bus.clone(), PatternConfig::default());

    // Three ADU sessions share a category via the screen-name classifier;
    // the fence category stays untouched by them.
    for session in ["adu-1", "adu-2", "adu-3"] {
        for screen in ["ADU_INTAKE", "ADU_ZONING"] {
            tracker.process_event(&event(session, EventKind::ScreenSwitch, screen));
        }
        tracker.process_event(&event(session, EventKind::Submit, "ADU_ZONING"));
    }

    let confidence = run_fence_session(&tracker, "fence-1");
    // One fence session only: repetition 1/3, no second sequence yet.
    assert!(confidence < 0.75);
    assert_eq!(opportunity_count(&bus, &["fence-1"]), 0);
}
