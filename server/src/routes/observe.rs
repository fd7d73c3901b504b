// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Event ingestion. The request only records the event; detection and
//! screenshot analysis run as a fire-and-forget task that can never fail
//! the ingest.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;
use vigil_engine::domain::{
    EventKind, Notification, SessionRecord, SessionSummary, UiEvent, DEFAULT_PERMIT_TYPE,
};

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn ingest_event(
    State(state): State<SharedState>,
    Json(event): Json<UiEvent>,
) -> Result<Json<Value>, ApiError> {
    let mut record = state
        .store
        .get_session(&event.session_id)
        .await?
        .unwrap_or_else(|| {
            SessionRecord::new(
                event.session_id.clone(),
                event.user_id.clone(),
                event
                    .permit_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PERMIT_TYPE.to_string()),
            )
        });

    if let Some(screenshot) = &event.screenshot_b64 {
        record.append_screenshot(screenshot.clone());
    }
    record.append_event(event.clone());
    state.store.put_session(record).await?;

    let task_state = state.clone();
    let task_event = event.clone();
    tokio::spawn(async move {
        if let Err(err) = process_event_task(task_state, task_event).await {
            error!(%err, "background event processing failed");
        }
    });

    Ok(Json(json!({
        "status": "received",
        "session_id": event.session_id,
        "event_type": event.event_type,
    })))
}

pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(sessions.iter().map(SessionSummary::from).collect()))
}

pub async fn get_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let record = state
        .store
        .get_session(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;
    Ok(Json(SessionSummary::from(&record)))
}

/// Detection plus optional screenshot analysis for one event.
async fn process_event_task(state: SharedState, event: UiEvent) -> anyhow::Result<()> {
    let confidence = state.tracker.process_event(&event);

    state.bus.publish(
        &event.session_id,
        Notification::PatternUpdate {
            session_id: event.session_id.clone(),
            confidence,
            stage: state.tracker.get_stage(&event.session_id).ordinal(),
        },
    );

    if event.event_type == EventKind::ScreenSwitch {
        if let Some(screenshot) = &event.screenshot_b64 {
            state
                .extractor
                .analyze_screenshot(&event.session_id, &event.screen_name, screenshot)
                .await;
        }
    }
    Ok(())
}
