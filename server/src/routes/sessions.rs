// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session lifecycle: creation, status, replay frames, and the two-step
//! confirmation flow (action sequence, then knowledge sources). Each
//! confirmation triggers its follow-on pipeline in the background; pipeline
//! errors are logged, never surfaced to the confirming request.

use anyhow::Context;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;
use vigil_engine::application::spec_builder::build_spec;
use vigil_engine::domain::{
    EventKind, Notification, ReplayFrame, SessionRecord, SessionSummary, UiEvent,
    DEFAULT_PERMIT_TYPE,
};
use vigil_engine::infrastructure::embed_or_fallback;

use crate::error::ApiError;
use crate::state::SharedState;

fn default_user() -> String {
    "demo_user".to_string()
}

fn default_permit() -> String {
    DEFAULT_PERMIT_TYPE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default = "default_permit")]
    pub permit_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSequenceRequest {
    pub approved: bool,
    /// Step indices the reviewer wants removed.
    #[serde(default)]
    pub removed_indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSourcesRequest {
    /// Knowledge-source objects, possibly edited or replaced in review.
    #[serde(default)]
    pub approved_sources: Vec<Value>,
}

pub async fn create_session(
    State(state): State<SharedState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    let session_id = Uuid::new_v4().to_string();
    let record = SessionRecord::new(session_id.clone(), request.user_id, request.permit_type.clone());
    state.store.put_session(record).await?;
    Ok(Json(json!({
        "session_id": session_id,
        "permit_type": request.permit_type,
    })))
}

pub async fn session_status(
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

/// Ordered replay frames for a session, with playback offsets doubled for
/// half-speed review.
pub async fn replay_frames(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .store
        .get_session(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;

    let start = record.events.first().map(|event| event.timestamp);
    let frames: Vec<ReplayFrame> = record
        .events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let real_offset_ms = start
                .map(|start| (event.timestamp - start).num_milliseconds())
                .unwrap_or(0);
            ReplayFrame {
                frame_index: index,
                event: event.clone(),
                highlighted_element: event.element_selector.clone(),
                timestamp_ms: real_offset_ms * 2,
                screen_name: event.screen_name.clone(),
                action_label: action_label(event),
            }
        })
        .collect();

    Ok(Json(json!({
        "session_id": session_id,
        "total": frames.len(),
        "frames": frames,
    })))
}

/// Step 1 of the confirmation flow: the reviewer approves (or prunes) the
/// captured action sequence, which triggers knowledge-source extraction.
pub async fn confirm_sequence(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(request): Json<ConfirmSequenceRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut record = state
        .store
        .get_session(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;

    if request.approved {
        if !request.removed_indices.is_empty() {
            let events = std::mem::take(&mut record.events);
            record.events = events
                .into_iter()
                .enumerate()
                .filter(|(index, _)| !request.removed_indices.contains(index))
                .map(|(_, event)| event)
                .collect();
        }
        record.action_trace_confirmed = true;
        state.store.put_session(record).await?;

        let task_state = state.clone();
        let task_session = session_id.clone();
        tokio::spawn(async move {
            if let Err(err) = extract_sources_task(task_state, task_session).await {
                error!(%err, "knowledge extraction failed");
            }
        });
    }

    Ok(Json(json!({ "status": "confirmed", "session_id": session_id })))
}

/// Step 2 of the confirmation flow: the reviewer approves the knowledge
/// sources, which triggers catalog matching and, absent a match, spec
/// building.
pub async fn confirm_sources(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(request): Json<ConfirmSourcesRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut record = state
        .store
        .get_session(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;
    record.knowledge_sources_confirmed = true;
    state.store.put_session(record).await?;

    let task_state = state.clone();
    let task_session = session_id.clone();
    tokio::spawn(async move {
        if let Err(err) =
            match_and_build_task(task_state, task_session, request.approved_sources).await
        {
            error!(%err, "catalog match / spec build failed");
        }
    });

    Ok(Json(json!({ "status": "sources_confirmed", "session_id": session_id })))
}

fn action_label(event: &UiEvent) -> String {
    let value = event.element_value.as_deref().unwrap_or("");
    match event.event_type {
        EventKind::ScreenSwitch => format!("Opened {}", humanize_screen(&event.screen_name)),
        EventKind::Navigate => format!("Navigated to {}", event.screen_name),
        EventKind::Input if !value.is_empty() => {
            let field = event
                .element_selector
                .trim_start_matches("[data-field-id='")
                .trim_end_matches("']")
                .replace('_', " ");
            format!("Entered '{value}' in {field}")
        }
        EventKind::Click => format!("Clicked {}", event.element_selector),
        EventKind::Submit => "Submitted form".to_string(),
        other => format!("{} on {}", other.as_str(), event.screen_name),
    }
}

fn humanize_screen(screen_name: &str) -> String {
    screen_name
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn extract_sources_task(state: SharedState, session_id: String) -> anyhow::Result<()> {
    let record = state
        .store
        .get_session(&session_id)
        .await?
        .context("session disappeared before extraction")?;
    let sources = state.extractor.extract_from_session(&record).await;

    state.bus.publish(
        &session_id,
        Notification::SourceHighlight {
            session_id: session_id.clone(),
            screen_name: None,
            regions: Vec::new(),
            sources,
        },
    );
    Ok(())
}

/// Catalog match first; only when nothing is close enough does a new spec
/// get built and announced.
async fn match_and_build_task(
    state: SharedState,
    session_id: String,
    approved_sources: Vec<Value>,
) -> anyhow::Result<()> {
    let record = state
        .store
        .get_session(&session_id)
        .await?
        .context("session disappeared before spec build")?;

    let mut screens: Vec<String> = Vec::new();
    for event in &record.events {
        if !event.screen_name.is_empty() && !screens.contains(&event.screen_name) {
            screens.push(event.screen_name.clone());
        }
    }
    let description = format!(
        "Handles {} permit processing involving screens: {}",
        record.permit_type.replace('_', " "),
        screens.join(", ")
    );

    let query = embed_or_fallback(
        state.embeddings.as_ref(),
        &description,
        state.embedding_dimension,
    )
    .await;
    let catalog = state.store.list_agents().await?;

    if let Some((agent, _score)) = state.matcher.best_match(&query, &catalog) {
        state.bus.publish(
            &session_id,
            Notification::MarketMatch {
                session_id: session_id.clone(),
                agent: agent.clone(),
                message: format!("Similar agent found: {}", agent.name),
            },
        );
        return Ok(());
    }

    state.bus.publish(
        &session_id,
        Notification::MarketNoMatch {
            session_id: session_id.clone(),
            message: "No existing agent found — building new spec...".to_string(),
        },
    );

    let mut spec = build_spec(&record, &approved_sources);
    spec.embedding = embed_or_fallback(
        state.embeddings.as_ref(),
        &format!("{} {}", spec.name, spec.description),
        state.embedding_dimension,
    )
    .await;
    state.ledger.register(&spec.id);
    state.store.put_agent(spec.clone()).await?;

    state.bus.publish(
        &session_id,
        Notification::SpecReady {
            session_id: session_id.clone(),
            spec,
        },
    );
    Ok(())
}
