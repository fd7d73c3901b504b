// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # VIGIL workflow simulator
//!
//! Replays scripted permit workflows against a running server the way the
//! browser extension would, so the detection pipeline can be exercised
//! without a browser. Three sessions of the same workflow are enough to
//! drive a category past the confidence threshold.
//!
//! ```text
//! vigil simulate --workflow fence-variance-r2 --reps 3
//! vigil demo
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vigil_engine::domain::{EventKind, UiEvent};

/// VIGIL operator-workflow simulator
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "VIGIL_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay one workflow's event script, once per repetition
    Simulate {
        #[arg(long, value_enum, default_value = "fence-variance-r2")]
        workflow: Workflow,

        /// Number of sessions to run
        #[arg(long, default_value_t = 1)]
        reps: u32,

        /// Delay between events
        #[arg(long, default_value_t = 300)]
        delay_ms: u64,
    },
    /// Full demo: three fence-variance sessions, enough to trigger an
    /// optimization opportunity
    Demo,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Workflow {
    FenceVarianceR2,
    AduMixedZone,
    CommercialSignage,
}

impl Workflow {
    fn permit_type(self) -> &'static str {
        match self {
            Workflow::FenceVarianceR2 => "fence_variance_r2",
            Workflow::AduMixedZone => "adu_mixed_zone",
            Workflow::CommercialSignage => "commercial_signage",
        }
    }
}

struct Step {
    kind: EventKind,
    screen: &'static str,
    selector: &'static str,
    value: Option<&'static str>,
}

const fn step(
    kind: EventKind,
    screen: &'static str,
    selector: &'static str,
    value: Option<&'static str>,
) -> Step {
    Step {
        kind,
        screen,
        selector,
        value,
    }
}

fn script(workflow: Workflow) -> Vec<Step> {
    use EventKind::*;
    match workflow {
        Workflow::FenceVarianceR2 => vec![
            step(Navigate, "INBOX", ".permit-inbox", None),
            step(Click, "INBOX", ".permit-item", Some("P-2025-0847")),
            step(ScreenSwitch, "GIS_SYSTEM", ".gis-panel", None),
            step(Click, "GIS_SYSTEM", "[data-source-id='gis_data']", None),
            step(ScreenSwitch, "CODE_ENFORCEMENT", ".enforcement-log", None),
            step(
                Click,
                "CODE_ENFORCEMENT",
                "[data-source-id='violation_history']",
                None,
            ),
            step(ScreenSwitch, "POLICY_WIKI", ".policy-panel", None),
            step(Click, "POLICY_WIKI", "[data-source-id='policy_text']", None),
            step(ScreenSwitch, "PERMIT_FORM", ".permit-form", None),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='parcel_id']",
                Some("APN-0847-2284"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='zone_classification']",
                Some("R-2"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='setback_compliance']",
                Some("compliant"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='routing_decision']",
                Some("auto_approve"),
            ),
            step(Submit, "PERMIT_FORM", "button[type='submit']", None),
        ],
        Workflow::AduMixedZone => vec![
            step(Navigate, "INBOX", ".permit-inbox", None),
            step(Click, "INBOX", ".permit-item", Some("P-2025-1103")),
            step(ScreenSwitch, "GIS_SYSTEM", ".gis-panel", None),
            step(ScreenSwitch, "CODE_ENFORCEMENT", ".enforcement-log", None),
            step(ScreenSwitch, "POLICY_WIKI", ".policy-panel", None),
            step(ScreenSwitch, "PERMIT_FORM", ".permit-form", None),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='parcel_id']",
                Some("APN-1103-5567"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='zone_classification']",
                Some("R-2/C-1 Mixed"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='violation_history_flag']",
                Some("resolved"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='escalation_decision']",
                Some("manual_review"),
            ),
            step(Submit, "PERMIT_FORM", "button[type='submit']", None),
        ],
        Workflow::CommercialSignage => vec![
            step(Navigate, "INBOX", ".permit-inbox", None),
            step(Click, "INBOX", ".permit-item", Some("P-2025-2291")),
            step(ScreenSwitch, "GIS_SYSTEM", ".gis-panel", None),
            step(ScreenSwitch, "POLICY_WIKI", ".policy-panel", None),
            step(
                Click,
                "POLICY_WIKI",
                "[data-source-id='policy_text']",
                Some("Section 5.3 Signage Setbacks"),
            ),
            step(ScreenSwitch, "PERMIT_FORM", ".permit-form", None),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='parcel_id']",
                Some("APN-2291-0034"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='sign_type']",
                Some("freestanding"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='setback_distance']",
                Some("15"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='policy_section_applied']",
                Some("Section 5.3.2"),
            ),
            step(
                Input,
                "PERMIT_FORM",
                "[data-field-id='approval_status']",
                Some("approved_with_conditions"),
            ),
            step(Submit, "PERMIT_FORM", "button[type='submit']", None),
        ],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let client = reqwest::Client::new();
    match cli.command {
        Command::Simulate {
            workflow,
            reps,
            delay_ms,
        } => {
            for rep in 0..reps {
                if reps > 1 {
                    println!("\n[Repetition {}/{}]", rep + 1, reps);
                }
                simulate_session(&client, &cli.server, workflow, delay_ms).await?;
            }
        }
        Command::Demo => {
            println!("VIGIL demo simulation");
            println!("  Running 3 fence-variance sessions to trigger pattern detection...");
            for rep in 0..3 {
                println!("\n  [Session {}/3] Fence Variance R-2", rep + 1);
                simulate_session(&client, &cli.server, Workflow::FenceVarianceR2, 100).await?;
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            println!("\nDone. Watch /api/sse/{{session_id}} for OPTIMIZATION_OPPORTUNITY.");
        }
    }
    Ok(())
}

async fn simulate_session(
    client: &reqwest::Client,
    server: &str,
    workflow: Workflow,
    delay_ms: u64,
) -> Result<String> {
    let session_id = Uuid::new_v4().to_string();
    let permit_type = workflow.permit_type();
    println!("Session {}  permit: {permit_type}", &session_id[..8]);

    let start = Utc::now();
    let steps = script(workflow);
    for (index, step) in steps.iter().enumerate() {
        let event = UiEvent {
            session_id: session_id.clone(),
            user_id: "demo_tech".to_string(),
            timestamp: start + TimeDelta::seconds(index as i64 * 2),
            event_type: step.kind,
            screen_name: step.screen.to_string(),
            element_selector: step.selector.to_string(),
            element_value: step.value.map(str::to_string),
            backend_call: None,
            screenshot_b64: None,
            permit_type: Some(permit_type.to_string()),
        };

        let response = client
            .post(format!("{server}/api/observe"))
            .json(&event)
            .send()
            .await
            .context("event post failed")?;
        let marker = if response.status().is_success() { "ok" } else { "ERR" };
        println!(
            "  {marker:3} [{}] {:13} {}",
            response.status().as_u16(),
            step.kind.as_str(),
            step.screen
        );

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    // The tracker runs just behind the ingest; give it a beat, then report.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let status: serde_json::Value = client
        .get(format!("{server}/api/patterns/{session_id}"))
        .send()
        .await
        .context("pattern status fetch failed")?
        .json()
        .await
        .context("pattern status was not JSON")?;
    println!(
        "  -> stage {} ({}) confidence {}",
        status["stage"], status["stage_name"], status["confidence"]
    );

    Ok(session_id)
}
