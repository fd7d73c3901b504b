// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # TrustLedger — run-outcome counters and trust transitions
//!
//! Owns the per-agent run counters and trust level. Transition rules:
//!
//! - SUPERVISED promotes to AUTONOMOUS once successful runs reach the
//!   configured floor with the failure rate under the promotion cap.
//! - AUTONOMOUS degrades to STALE when the failure rate climbs past the
//!   demotion threshold with enough total runs to judge.
//! - STALE is a sink for automatic transitions; only an explicit
//!   [`TrustLedger::force_stale`] moves an agent there directly.
//!
//! Every stored-level change publishes a trust-change notification keyed by
//! the agent id.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::config::TrustConfig;
use crate::domain::{Notification, TrustLevel};
use crate::infrastructure::EventBus;

/// Counters and level for one agent.
#[derive(Debug, Clone, Default)]
pub struct LedgerEntry {
    pub level: TrustLevel,
    pub successful_runs: u64,
    pub failed_runs: u64,
}

impl LedgerEntry {
    pub fn total_runs(&self) -> u64 {
        self.successful_runs + self.failed_runs
    }

    pub fn failure_rate(&self) -> f64 {
        let total = self.total_runs();
        if total == 0 {
            0.0
        } else {
            self.failed_runs as f64 / total as f64
        }
    }
}

pub struct TrustLedger {
    agents: DashMap<String, LedgerEntry>,
    bus: Arc<EventBus>,
    config: TrustConfig,
}

impl TrustLedger {
    pub fn new(bus: Arc<EventBus>, config: TrustConfig) -> Self {
        Self {
            agents: DashMap::new(),
            bus,
            config,
        }
    }

    /// Start tracking an agent at the default level. Idempotent.
    pub fn register(&self, agent_id: &str) {
        self.agents.entry(agent_id.to_string()).or_default();
    }

    pub fn entry(&self, agent_id: &str) -> Option<LedgerEntry> {
        self.agents.get(agent_id).map(|entry| entry.value().clone())
    }

    /// Record a completed run and apply the transition rules. Unknown
    /// agents are a logged no-op returning the default level.
    pub fn record_run(&self, agent_id: &str, success: bool) -> TrustLevel {
        let Some(mut entry) = self.agents.get_mut(agent_id) else {
            warn!(agent_id, "run recorded for unknown agent, ignoring");
            return TrustLevel::default();
        };

        if success {
            entry.successful_runs += 1;
        } else {
            entry.failed_runs += 1;
        }

        let old_level = entry.level;
        let new_level = self.compute_level(&entry);
        if new_level == old_level {
            return old_level;
        }

        entry.level = new_level;
        let notification = Notification::TrustLevelChanged {
            agent_id: agent_id.to_string(),
            old_level,
            new_level,
            successful_runs: entry.successful_runs,
            failed_runs: entry.failed_runs,
            reason: None,
        };
        drop(entry);

        info!(
            agent_id,
            from = old_level.as_str(),
            to = new_level.as_str(),
            "agent trust level changed"
        );
        self.bus.publish(agent_id, notification);
        new_level
    }

    /// Move an agent to STALE directly, bypassing the counters (e.g. when a
    /// referenced policy document changed). Publishes a change notification
    /// even when the agent was already stale.
    pub fn force_stale(&self, agent_id: &str, reason: &str) {
        let mut entry = self.agents.entry(agent_id.to_string()).or_default();
        let old_level = entry.level;
        entry.level = TrustLevel::Stale;
        let notification = Notification::TrustLevelChanged {
            agent_id: agent_id.to_string(),
            old_level,
            new_level: TrustLevel::Stale,
            successful_runs: entry.successful_runs,
            failed_runs: entry.failed_runs,
            reason: Some(reason.to_string()),
        };
        drop(entry);

        warn!(agent_id, reason, "agent forced stale");
        self.bus.publish(agent_id, notification);
    }

    fn compute_level(&self, entry: &LedgerEntry) -> TrustLevel {
        let failure_rate = entry.failure_rate();
        match entry.level {
            TrustLevel::Supervised
                if entry.successful_runs >= self.config.promotion_min_runs
                    && failure_rate < self.config.promotion_max_failure_rate =>
            {
                TrustLevel::Autonomous
            }
            TrustLevel::Autonomous
                if failure_rate > self.config.demotion_failure_rate
                    && entry.total_runs() >= self.config.demotion_min_runs =>
            {
                TrustLevel::Stale
            }
            level => level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_bus() -> (TrustLedger, Arc<EventBus>) {
        let bus = Arc::new(EventBus::default());
        (TrustLedger::new(bus.clone(), TrustConfig::default()), bus)
    }

    fn trust_changes(bus: &EventBus, agent_id: &str) -> usize {
        bus.recent(agent_id)
            .iter()
            .filter(|message| matches!(message, Notification::TrustLevelChanged { .. }))
            .count()
    }

    #[test]
    fn tenth_success_promotes_to_autonomous() {
        let (ledger, bus) = ledger_with_bus();
        ledger.register("a1");

        for _ in 0..9 {
            assert_eq!(ledger.record_run("a1", true), TrustLevel::Supervised);
        }
        assert_eq!(trust_changes(&bus, "a1"), 0);

        assert_eq!(ledger.record_run("a1", true), TrustLevel::Autonomous);
        assert_eq!(trust_changes(&bus, "a1"), 1);
    }

    #[test]
    fn failure_rate_above_ten_percent_demotes_to_stale() {
        let (ledger, bus) = ledger_with_bus();
        ledger.register("a1");
        for _ in 0..10 {
            ledger.record_run("a1", true);
        }
        assert_eq!(ledger.entry("a1").unwrap().level, TrustLevel::Autonomous);

        // 1 failure in 11 runs is 9.1%, still autonomous.
        assert_eq!(ledger.record_run("a1", false), TrustLevel::Autonomous);
        // 2 failures in 12 runs is 16.7%, past the demotion threshold.
        assert_eq!(ledger.record_run("a1", false), TrustLevel::Stale);
        assert_eq!(trust_changes(&bus, "a1"), 2);
    }

    #[test]
    fn stale_is_a_sink_for_automatic_transitions() {
        let (ledger, _bus) = ledger_with_bus();
        ledger.register("a1");
        ledger.force_stale("a1", "policy document changed");

        for _ in 0..20 {
            assert_eq!(ledger.record_run("a1", true), TrustLevel::Stale);
        }
    }

    #[test]
    fn high_failure_rate_blocks_promotion() {
        let (ledger, _bus) = ledger_with_bus();
        ledger.register("a1");
        // 10 successes but 1 failure early: 1/11 = 9.1% >= 5% cap.
        ledger.record_run("a1", false);
        for _ in 0..10 {
            ledger.record_run("a1", true);
        }
        assert_eq!(ledger.entry("a1").unwrap().level, TrustLevel::Supervised);
    }

    #[test]
    fn unknown_agent_is_a_noop_returning_default() {
        let (ledger, bus) = ledger_with_bus();
        assert_eq!(ledger.record_run("ghost", true), TrustLevel::Supervised);
        assert!(ledger.entry("ghost").is_none());
        assert_eq!(trust_changes(&bus, "ghost"), 0);
    }

    #[test]
    fn force_stale_always_publishes_even_when_already_stale() {
        let (ledger, bus) = ledger_with_bus();
        ledger.register("a1");
        ledger.force_stale("a1", "manual");
        ledger.force_stale("a1", "manual again");
        assert_eq!(trust_changes(&bus, "a1"), 2);
        assert_eq!(ledger.entry("a1").unwrap().level, TrustLevel::Stale);
    }
}
