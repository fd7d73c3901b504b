// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent catalog: publish, fork with contribution splitting, run-outcome
//! recording through the trust ledger, forced staleness, and demo playback.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use vigil_engine::application::contribution::{delta_ratio, split};
use vigil_engine::domain::{AgentSpecRecord, Contribution, Notification};
use vigil_engine::infrastructure::embed_or_fallback;

use crate::error::ApiError;
use crate::state::SharedState;

fn default_user() -> String {
    "demo_user".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PublishAgentRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub trigger_pattern: Value,
    #[serde(default)]
    pub action_sequence: Vec<Value>,
    #[serde(default)]
    pub knowledge_sources: Vec<Value>,
    #[serde(default)]
    pub permit_type: Option<String>,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ForkAgentRequest {
    /// What changed: `{"action_sequence": [...], "notes": "..."}`.
    #[serde(default)]
    pub tuning_delta: Value,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StaleRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DemoQuery {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub trust_level: Option<String>,
    #[serde(default)]
    pub permit_type: Option<String>,
}

pub async fn list_agents(
    State(state): State<SharedState>,
    Query(filter): Query<ListQuery>,
) -> Result<Json<Vec<AgentSpecRecord>>, ApiError> {
    let mut agents = state.store.list_agents().await?;
    if let Some(trust_level) = &filter.trust_level {
        agents.retain(|agent| agent.trust_level.as_str() == trust_level);
    }
    if let Some(permit_type) = &filter.permit_type {
        agents.retain(|agent| agent.permit_type.as_deref() == Some(permit_type.as_str()));
    }
    Ok(Json(agents))
}

pub async fn get_agent(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
) -> Result<Json<AgentSpecRecord>, ApiError> {
    let agent = state
        .store
        .get_agent(&agent_id)
        .await?
        .ok_or_else(ApiError::agent_not_found)?;
    Ok(Json(agent))
}

/// Publish a new spec. The description embedding is computed in the
/// background so the publish itself stays fast.
pub async fn publish_agent(
    State(state): State<SharedState>,
    Json(request): Json<PublishAgentRequest>,
) -> Result<Json<AgentSpecRecord>, ApiError> {
    let mut spec = AgentSpecRecord::new(request.name, request.description, request.permit_type);
    spec.trigger_pattern = request.trigger_pattern;
    spec.action_sequence = request.action_sequence;
    spec.knowledge_sources = request.knowledge_sources;
    spec.contributions = vec![Contribution {
        user_id: request.user_id,
        score: 1.0,
    }];

    state.ledger.register(&spec.id);
    state.store.put_agent(spec.clone()).await?;

    let task_state = state.clone();
    let agent_id = spec.id.clone();
    let text = format!("{} {}", spec.name, spec.description);
    tokio::spawn(async move {
        if let Err(err) = store_embedding_task(task_state, agent_id, text).await {
            error!(%err, "embedding computation failed");
        }
    });

    Ok(Json(spec))
}

/// Fork an existing agent with tuning changes, splitting attribution
/// between the original contributors and the tuner.
pub async fn fork_agent(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Json(request): Json<ForkAgentRequest>,
) -> Result<Json<AgentSpecRecord>, ApiError> {
    let original = state
        .store
        .get_agent(&agent_id)
        .await?
        .ok_or_else(ApiError::agent_not_found)?;

    let tuned_sequence: Vec<Value> = request
        .tuning_delta
        .get("action_sequence")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_else(|| original.action_sequence.clone());

    let delta = delta_ratio(&original.action_sequence, &tuned_sequence);
    let contributions = split(&original.contributions, &request.user_id, delta);

    let mut fork = AgentSpecRecord::new(
        format!("{} (fork)", original.name),
        original.description.clone(),
        original.permit_type.clone(),
    );
    fork.parent_id = Some(original.id.clone());
    fork.trigger_pattern = original.trigger_pattern.clone();
    fork.action_sequence = tuned_sequence;
    fork.knowledge_sources = original.knowledge_sources.clone();
    fork.embedding = original.embedding.clone();
    fork.contributions = contributions;

    state.ledger.register(&fork.id);
    state.store.put_agent(fork.clone()).await?;
    Ok(Json(fork))
}

/// Record a completed run and apply trust transitions. A failed run also
/// flags an exception on the agent's notification channel.
pub async fn record_run(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Query(query): Query<RunQuery>,
) -> Result<Json<Value>, ApiError> {
    let level = state.ledger.record_run(&agent_id, query.success);

    if !query.success {
        state.bus.publish(
            &agent_id,
            Notification::ExceptionFlagged {
                agent_id: agent_id.clone(),
                error: query
                    .error
                    .unwrap_or_else(|| "agent run reported failure".to_string()),
            },
        );
    }

    // Mirror the ledger counters onto the stored record.
    if let Some(entry) = state.ledger.entry(&agent_id) {
        if let Some(mut record) = state.store.get_agent(&agent_id).await? {
            record.trust_level = entry.level;
            record.successful_runs = entry.successful_runs;
            record.failed_runs = entry.failed_runs;
            record.updated_at = chrono::Utc::now();
            state.store.put_agent(record).await?;
        }
    }

    Ok(Json(json!({
        "agent_id": agent_id,
        "trust_level": level,
    })))
}

/// Force an agent to STALE, e.g. when a referenced policy document changed.
pub async fn force_stale(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Json(request): Json<StaleRequest>,
) -> Result<Json<Value>, ApiError> {
    let reason = request.reason.unwrap_or_else(|| "manual".to_string());
    state.ledger.force_stale(&agent_id, &reason);

    if let Some(mut record) = state.store.get_agent(&agent_id).await? {
        record.trust_level = vigil_engine::domain::TrustLevel::Stale;
        record.updated_at = chrono::Utc::now();
        state.store.put_agent(record).await?;
    }

    Ok(Json(json!({ "agent_id": agent_id, "trust_level": "stale", "reason": reason })))
}

/// Play an agent's action sequence back over the session's notification
/// channel, one step at a time.
pub async fn demo_agent(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Query(query): Query<DemoQuery>,
) -> Result<Json<Value>, ApiError> {
    let spec = state
        .store
        .get_agent(&agent_id)
        .await?
        .ok_or_else(ApiError::agent_not_found)?;

    let session_id = query.session_id.clone();
    let task_state = state.clone();
    tokio::spawn(async move {
        run_agent_demo(task_state, spec, session_id).await;
    });

    Ok(Json(json!({
        "status": "demo_started",
        "agent_id": agent_id,
        "session_id": query.session_id,
    })))
}

async fn store_embedding_task(
    state: SharedState,
    agent_id: String,
    text: String,
) -> anyhow::Result<()> {
    let embedding =
        embed_or_fallback(state.embeddings.as_ref(), &text, state.embedding_dimension).await;
    if let Some(mut record) = state.store.get_agent(&agent_id).await? {
        record.embedding = embedding;
        record.updated_at = chrono::Utc::now();
        state.store.put_agent(record).await?;
    }
    Ok(())
}

async fn run_agent_demo(state: SharedState, spec: AgentSpecRecord, session_id: String) {
    let total_steps = spec.action_sequence.len();

    state.bus.publish(
        &session_id,
        Notification::AgentStatusUpdate {
            status: "running".to_string(),
            agent_name: spec.name.clone(),
            total_steps,
        },
    );

    for (step_index, action) in spec.action_sequence.iter().enumerate() {
        // Half-speed playback so the reviewer can follow along.
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

        let selector = action
            .get("element_selector")
            .and_then(Value::as_str)
            .unwrap_or_default();
        state.bus.publish(
            &session_id,
            Notification::AgentDemoStep {
                step_index,
                total_steps,
                action: action.clone(),
                field_id: extract_field_id(selector),
                value: action
                    .get("element_value")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                screen_name: action
                    .get("screen_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        );
    }

    state.bus.publish(
        &session_id,
        Notification::AgentCompleted {
            agent_name: spec.name,
            steps_completed: total_steps,
            success: true,
        },
    );
}

/// Pull the field id out of a selector like `[data-field-id='parcel_id']`.
fn extract_field_id(selector: &str) -> String {
    selector
        .split_once("data-field-id='")
        .and_then(|(_, rest)| rest.split_once('\''))
        .map(|(field, _)| field.to_string())
        .unwrap_or_else(|| selector.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_id_is_extracted_from_selector() {
        assert_eq!(
            extract_field_id("[data-field-id='parcel_id']"),
            "parcel_id"
        );
        assert_eq!(extract_field_id(".permit-form"), ".permit-form");
    }
}
