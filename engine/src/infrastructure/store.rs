// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Record store seam for sessions and agent specs.
//!
//! Durable storage is an external collaborator; the engine's in-memory
//! structures mirror it rather than replace it. [`MemoryStore`] is the
//! process-local implementation used by the server and in tests.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{AgentSpecRecord, SessionRecord};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>>;
    async fn put_session(&self, record: SessionRecord) -> Result<()>;
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>>;

    async fn get_agent(&self, id: &str) -> Result<Option<AgentSpecRecord>>;
    async fn put_agent(&self, record: AgentSpecRecord) -> Result<()>;
    async fn list_agents(&self) -> Result<Vec<AgentSpecRecord>>;
}

/// In-memory record store keyed by id.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<String, SessionRecord>,
    agents: DashMap<String, AgentSpecRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn put_session(&self, record: SessionRecord) -> Result<()> {
        self.sessions.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_agent(&self, id: &str) -> Result<Option<AgentSpecRecord>> {
        Ok(self.agents.get(id).map(|entry| entry.value().clone()))
    }

    async fn put_agent(&self, record: AgentSpecRecord) -> Result<()> {
        self.agents.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_agents(&self) -> Result<Vec<AgentSpecRecord>> {
        Ok(self
            .agents
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
