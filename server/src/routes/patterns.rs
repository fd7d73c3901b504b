// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Detection status, polled by clients that are not on the SSE stream.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use vigil_engine::application::PatternSnapshot;

use crate::state::SharedState;

pub async fn pattern_status(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    let stage = state.tracker.get_stage(&session_id);
    Json(json!({
        "session_id": session_id,
        "stage": stage.ordinal(),
        "stage_name": stage.name(),
        "confidence": state.tracker.get_confidence(&session_id),
        "screen_count": state.tracker.screen_count(&session_id),
        "tracked_sessions": state.tracker.session_count(),
    }))
}

pub async fn list_patterns(State(state): State<SharedState>) -> Json<Vec<PatternSnapshot>> {
    Json(state.tracker.snapshot())
}
