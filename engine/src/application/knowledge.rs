// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # KnowledgeExtractor — screenshot analysis with caching
//!
//! Feeds screenshots to the vision analyzer to identify the unstructured
//! regions an operator consulted, caches results per session+screen, and
//! publishes highlight notifications. Analyzer failures degrade to the
//! static fixture regions; extraction never fails the request that
//! triggered it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::domain::{
    EventKind, KnowledgeSource, Notification, SessionRecord, SourceRegion,
};
use crate::infrastructure::{fallback_regions, EventBus, VisionAnalyzer};

/// How long a cached analysis stays fresh.
pub const ANALYSIS_CACHE_TTL: Duration = Duration::from_secs(1800);

struct CacheSlot {
    regions: Vec<SourceRegion>,
    stored_at: Instant,
}

pub struct KnowledgeExtractor {
    vision: Arc<dyn VisionAnalyzer>,
    bus: Arc<EventBus>,
    cache: DashMap<String, CacheSlot>,
    ttl: Duration,
}

impl KnowledgeExtractor {
    pub fn new(vision: Arc<dyn VisionAnalyzer>, bus: Arc<EventBus>) -> Self {
        Self {
            vision,
            bus,
            cache: DashMap::new(),
            ttl: ANALYSIS_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Analyze one screenshot, serving from cache when fresh. Publishes a
    /// SOURCE_HIGHLIGHT notification for the session on every (non-cached)
    /// analysis.
    pub async fn analyze_screenshot(
        &self,
        session_id: &str,
        screen_name: &str,
        image_b64: &str,
    ) -> Vec<SourceRegion> {
        let cache_key = format!("{session_id}:{screen_name}");
        if let Some(slot) = self.cache.get(&cache_key) {
            if slot.stored_at.elapsed() < self.ttl {
                debug!(%cache_key, "analysis cache hit");
                return slot.regions.clone();
            }
        }

        let regions = match self.vision.analyze(screen_name, image_b64).await {
            Ok(regions) => regions,
            Err(err) => {
                warn!(screen_name, %err, "vision analyzer failed, using fallback regions");
                fallback_regions(screen_name)
            }
        };

        self.cache.insert(
            cache_key,
            CacheSlot {
                regions: regions.clone(),
                stored_at: Instant::now(),
            },
        );

        self.bus.publish(
            session_id,
            Notification::SourceHighlight {
                session_id: session_id.to_string(),
                screen_name: Some(screen_name.to_string()),
                regions: regions.clone(),
                sources: Vec::new(),
            },
        );

        regions
    }

    /// Extract knowledge sources from every screen-switch event in a
    /// session that has a screenshot, deduplicated by screen name.
    pub async fn extract_from_session(&self, record: &SessionRecord) -> Vec<KnowledgeSource> {
        let mut sources = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut shot_index = 0usize;

        for event in &record.events {
            if event.event_type != EventKind::ScreenSwitch {
                continue;
            }
            let screen_name = event.screen_name.clone();
            let screenshot = event
                .screenshot_b64
                .clone()
                .or_else(|| record.screenshots.get(shot_index).cloned());
            if shot_index < record.screenshots.len() {
                shot_index += 1;
            }

            if screen_name.is_empty() || seen.contains(&screen_name) {
                continue;
            }
            let Some(screenshot) = screenshot else {
                continue;
            };
            seen.insert(screen_name.clone());

            let regions = self
                .analyze_screenshot(&record.id, &screen_name, &screenshot)
                .await;
            for region in regions {
                sources.push(KnowledgeSource {
                    screen_name: screen_name.clone(),
                    element_selector: region.element_selector,
                    confidence: region.confidence,
                    text_excerpt: Some(region.text_preview).filter(|text| !text.is_empty()),
                    source_type: region.region_type,
                    confirmed: false,
                    replacement_url: None,
                });
            }
        }
        sources
    }
}
