// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # VIGIL Server
//!
//! Request/response plumbing around the engine: event ingestion, session
//! lifecycle and replay, pattern status, the agent catalog, and the SSE
//! notification stream. All engine services are constructed once at startup
//! and handed to the routes through [`state::AppState`].

pub mod error;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::{AppState, SharedState};
