// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agents;
pub mod observe;
pub mod patterns;
pub mod sessions;
pub mod sse;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/observe", post(observe::ingest_event))
        .route("/api/observe/sessions", get(observe::list_sessions))
        .route("/api/observe/sessions/{session_id}", get(observe::get_session))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/{session_id}/status", get(sessions::session_status))
        .route("/api/sessions/{session_id}/replay", get(sessions::replay_frames))
        .route(
            "/api/sessions/{session_id}/confirm-sequence",
            post(sessions::confirm_sequence),
        )
        .route(
            "/api/sessions/{session_id}/confirm-sources",
            post(sessions::confirm_sources),
        )
        .route("/api/patterns", get(patterns::list_patterns))
        .route("/api/patterns/{session_id}", get(patterns::pattern_status))
        .route("/api/agents", get(agents::list_agents).post(agents::publish_agent))
        .route("/api/agents/{agent_id}", get(agents::get_agent))
        .route("/api/agents/{agent_id}/fork", post(agents::fork_agent))
        .route("/api/agents/{agent_id}/run", post(agents::record_run))
        .route("/api/agents/{agent_id}/stale", post(agents::force_stale))
        .route("/api/agents/{agent_id}/demo", post(agents::demo_agent))
        .route("/api/sse/{session_id}", get(sse::stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "time": chrono::Utc::now() }))
}
