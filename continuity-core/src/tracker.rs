//! The consistency tracker: ingestion, warning management and reporting.
//!
//! ## Data flow
//!
//! ```text
//! record_scene_*(character, scene, data)
//!        │
//!        ▼
//!  ┌───────────────┐   append    ┌──────────────────────────────┐
//!  │ Snapshot<D>   │ ──────────► │ CharacterConsistencyRecord   │
//!  └───────────────┘             │  history ─► detector ─► drift│
//!                                │  drift ─► warnings           │
//!                                │  history ─► score            │
//!                                └──────────────────────────────┘
//! ```
//!
//! The tracker is a plain value owned by the caller. Mutating operations
//! take `&mut self`; a host that shares one tracker between threads wraps
//! it in its own lock.

use crate::config::TrackerConfig;
use crate::detect::Observation;
use crate::error::{ContinuityError, Result};
use crate::record::CharacterConsistencyRecord;
use crate::report::{CharacterReport, LibraryReport, TrackerStats};
use crate::snapshot::{
    Appearance, AppearanceSnapshot, Behavior, BehaviorSnapshot, Dialogue, DialogueSnapshot,
    Knowledge, KnowledgeSnapshot, Snapshot,
};
use crate::warning::{ConsistencyWarning, WarningId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Maximum recent variations to include in a continuity brief.
const MAX_CONTEXT_VARIATIONS: usize = 5;

/// Running totals across all characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerCounters {
    pub ingestion_calls: u64,
    pub variations_detected: u64,
    pub warnings_issued: u64,
}

/// Tracks consistency for every character in a production.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyTracker {
    pub(crate) config: TrackerConfig,
    pub(crate) records: HashMap<String, CharacterConsistencyRecord>,
    pub(crate) counters: TrackerCounters,
}

impl ConsistencyTracker {
    /// Create a tracker with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with a validated configuration.
    pub fn with_config(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Get the running totals.
    pub fn counters(&self) -> TrackerCounters {
        self.counters
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Record how a character looks in a scene.
    pub fn record_scene_appearance(
        &mut self,
        character_id: &str,
        character_name: &str,
        scene_id: &str,
        appearance: Appearance,
    ) -> Result<AppearanceSnapshot> {
        self.record_scene(character_id, character_name, scene_id, appearance)
    }

    /// Record how a character behaves in a scene.
    pub fn record_scene_behavior(
        &mut self,
        character_id: &str,
        character_name: &str,
        scene_id: &str,
        behavior: Behavior,
    ) -> Result<BehaviorSnapshot> {
        self.record_scene(character_id, character_name, scene_id, behavior)
    }

    /// Record how a character speaks in a scene.
    pub fn record_scene_dialogue(
        &mut self,
        character_id: &str,
        character_name: &str,
        scene_id: &str,
        dialogue: Dialogue,
    ) -> Result<DialogueSnapshot> {
        self.record_scene(character_id, character_name, scene_id, dialogue)
    }

    /// Record what a character knows in a scene.
    pub fn record_scene_knowledge(
        &mut self,
        character_id: &str,
        character_name: &str,
        scene_id: &str,
        knowledge: Knowledge,
    ) -> Result<KnowledgeSnapshot> {
        self.record_scene(character_id, character_name, scene_id, knowledge)
    }

    fn record_scene<D: Observation>(
        &mut self,
        character_id: &str,
        character_name: &str,
        scene_id: &str,
        data: D,
    ) -> Result<Snapshot<D>> {
        if character_id.trim().is_empty() {
            return Err(ContinuityError::EmptyIdentifier {
                field: "character_id",
            });
        }
        if scene_id.trim().is_empty() {
            return Err(ContinuityError::EmptyIdentifier { field: "scene_id" });
        }

        let record = self
            .records
            .entry(character_id.to_string())
            .or_insert_with(|| {
                info!(character_id, character_name, "tracking new character");
                CharacterConsistencyRecord::new(character_id, character_name)
            });

        let snapshot = Snapshot::new(scene_id, data);
        let observed = record.observe(snapshot.clone(), &self.config);

        self.counters.ingestion_calls += 1;
        self.counters.variations_detected += observed.variations as u64;
        self.counters.warnings_issued += observed.warnings as u64;

        debug!(
            character_id,
            scene_id,
            category = D::CATEGORY.name(),
            variations = observed.variations,
            overall_score = record.score().overall_score,
            "scene recorded"
        );
        if observed.warnings > 0 {
            warn!(
                character_id,
                scene_id,
                warnings = observed.warnings,
                "impossible knowledge detected"
            );
        }

        Ok(snapshot)
    }

    // =========================================================================
    // Warning Management
    // =========================================================================

    /// Get a warning by ID from any character.
    pub fn get_warning(&self, id: WarningId) -> Option<&ConsistencyWarning> {
        self.records.values().find_map(|r| r.warning(id))
    }

    fn warning_mut(&mut self, id: WarningId) -> Option<&mut ConsistencyWarning> {
        self.records.values_mut().find_map(|r| r.warning_mut(id))
    }

    /// Acknowledge a warning. Returns `false` if no warning has this ID.
    pub fn acknowledge(&mut self, id: WarningId) -> bool {
        if let Some(warning) = self.warning_mut(id) {
            warning.acknowledge();
            debug!(warning_id = %id, "warning acknowledged");
            true
        } else {
            false
        }
    }

    /// Resolve a warning. Returns `false` if no warning has this ID.
    ///
    /// Resolving twice is allowed and keeps the first `resolved_at`.
    pub fn resolve(&mut self, id: WarningId) -> bool {
        if let Some(warning) = self.warning_mut(id) {
            warning.resolve();
            debug!(warning_id = %id, "warning resolved");
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a character's record.
    pub fn get_record(&self, character_id: &str) -> Option<&CharacterConsistencyRecord> {
        self.records.get(character_id)
    }

    /// Find a character by display name (case-insensitive).
    pub fn find_character_by_name(&self, name: &str) -> Option<&CharacterConsistencyRecord> {
        let lower = name.to_lowercase();
        self.records
            .values()
            .find(|r| r.character_name.to_lowercase() == lower)
    }

    /// All tracked character IDs, sorted.
    pub fn character_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of tracked characters.
    pub fn character_count(&self) -> usize {
        self.records.len()
    }

    /// Unresolved warnings, most severe first, then oldest first, then by
    /// character id.
    pub fn get_active_warnings(
        &self,
        character_id: Option<&str>,
        severity: Option<&str>,
    ) -> Vec<&ConsistencyWarning> {
        let mut active: Vec<&ConsistencyWarning> = self
            .records
            .values()
            .filter(|r| character_id.map_or(true, |id| r.character_id == id))
            .flat_map(|r| r.warnings())
            .filter(|w| !w.is_resolved)
            .filter(|w| severity.map_or(true, |s| w.severity.eq_ignore_ascii_case(s)))
            .collect();

        active.sort_by(|a, b| {
            a.rank()
                .cmp(&b.rank())
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.character_id.cmp(&b.character_id))
        });
        active
    }

    /// Report on one character, or `None` if it is not tracked.
    pub fn get_character_report(
        &self,
        character_id: &str,
        include_variations: bool,
        include_warnings: bool,
    ) -> Option<CharacterReport> {
        self.records
            .get(character_id)
            .map(|r| CharacterReport::new(r, include_variations, include_warnings))
    }

    /// Report on every tracked character.
    pub fn get_library_report(&self) -> LibraryReport {
        LibraryReport::from_records(self.records.values())
    }

    /// Running totals plus the library report.
    pub fn get_stats(&self) -> TrackerStats {
        TrackerStats {
            characters_tracked: self.records.len(),
            ingestion_calls: self.counters.ingestion_calls,
            variations_detected: self.counters.variations_detected,
            warnings_issued: self.counters.warnings_issued,
            library: self.get_library_report(),
        }
    }

    // =========================================================================
    // Context Building
    // =========================================================================

    /// Build a markdown continuity brief for a character, for inclusion in
    /// a scene generation prompt. Empty for unknown characters.
    pub fn build_continuity_context(&self, character_id: &str) -> String {
        let Some(record) = self.records.get(character_id) else {
            return String::new();
        };

        let score = record.score();
        let mut context = format!("## Continuity Notes: {}\n\n", record.character_name);
        context.push_str(&format!(
            "Status: {} ({:.2})\n\n",
            score.status().name(),
            score.overall_score
        ));

        if let Some(latest) = record.latest_appearance() {
            let appearance = &latest.data;
            let mut lines = String::new();
            for (field, value) in appearance
                .physical_traits()
                .into_iter()
                .chain(appearance.clothing())
            {
                if !value.is_empty() {
                    lines.push_str(&format!("- {field}: {value}\n"));
                }
            }
            if !appearance.accessories.is_empty() {
                let items: Vec<&str> = appearance.accessories.iter().map(String::as_str).collect();
                lines.push_str(&format!("- accessories: {}\n", items.join(", ")));
            }
            if !lines.is_empty() {
                context.push_str(&format!(
                    "### Established Appearance (scene {})\n",
                    latest.scene_id
                ));
                context.push_str(&lines);
                context.push('\n');
            }
        }

        let open = record.unresolved_warnings();
        if !open.is_empty() {
            context.push_str("### Open Warnings\n");
            for warning in open {
                context.push_str(&format!(
                    "- [{}] {} (scene {}): {}\n",
                    warning.severity, warning.title, warning.scene_id, warning.suggestion
                ));
            }
            context.push('\n');
        }

        let variations = record.variations();
        if !variations.is_empty() {
            context.push_str("### Recent Variations\n");
            let skip = variations.len().saturating_sub(MAX_CONTEXT_VARIATIONS);
            for variation in &variations[skip..] {
                context.push_str(&format!(
                    "- {} {}: '{}' -> '{}' (scene {})\n",
                    variation.category.name(),
                    variation.field_name,
                    variation.previous_value,
                    variation.current_value,
                    variation.scene_id
                ));
            }
            context.push('\n');
        }

        context
    }
}
