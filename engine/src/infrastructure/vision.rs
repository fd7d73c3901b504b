// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Vision analyzer seam.
//!
//! Screenshot analysis is an external collaborator: the engine only
//! consumes the labeled regions such a service would return. When the
//! analyzer is unavailable or fails, a static per-screen fixture set keeps
//! the knowledge-source flow working.

use async_trait::async_trait;

use crate::domain::{ProviderError, SourceRegion};

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Identify knowledge-source regions in a base64 screenshot.
    async fn analyze(
        &self,
        screen_name: &str,
        image_b64: &str,
    ) -> Result<Vec<SourceRegion>, ProviderError>;
}

/// Analyzer that always answers with the static fixture regions.
pub struct StaticVisionAnalyzer;

#[async_trait]
impl VisionAnalyzer for StaticVisionAnalyzer {
    async fn analyze(
        &self,
        screen_name: &str,
        _image_b64: &str,
    ) -> Result<Vec<SourceRegion>, ProviderError> {
        Ok(fallback_regions(screen_name))
    }
}

/// Static highlight regions used when no analyzer is available or a call
/// fails. Screens without a fixture yield no regions.
pub fn fallback_regions(screen_name: &str) -> Vec<SourceRegion> {
    match screen_name {
        "GIS_SYSTEM" => vec![SourceRegion {
            element_selector: "[data-source-id='gis_data']".to_string(),
            region_type: "gis_data".to_string(),
            confidence: 0.91,
            text_preview: "Parcel APN-0847-2284, Zone R-2, Lot 8400 sq ft...".to_string(),
        }],
        "CODE_ENFORCEMENT" => vec![SourceRegion {
            element_selector: "[data-source-id='violation_history']".to_string(),
            region_type: "violation_history".to_string(),
            confidence: 0.85,
            text_preview: "No active violations on record. Case closed 2021...".to_string(),
        }],
        "POLICY_WIKI" => vec![SourceRegion {
            element_selector: "[data-source-id='policy_text']".to_string(),
            region_type: "policy_text".to_string(),
            confidence: 0.88,
            text_preview: "Section 4.7.2, fence variance: setback minimum 3ft...".to_string(),
        }],
        _ => Vec::new(),
    }
}
