// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy at the engine's component boundaries.
//!
//! Detection and trust tracking are best-effort subsystems: collaborator
//! failures degrade to fallbacks instead of propagating, and only
//! caller-visible lookups surface [`EngineError`].

use thiserror::Error;

/// Caller-visible failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("store backend failure: {0}")]
    Store(String),
}

/// Collaborator (embedding / vision) failures. Never propagated to the
/// caller: the owning component substitutes its fallback and logs a warning.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned malformed output: {0}")]
    Malformed(String),
}
