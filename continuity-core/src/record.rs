//! The per-character aggregate owned by the tracker.

use crate::config::{SceneCountMode, TrackerConfig};
use crate::detect::{Observation, IMPOSSIBLE_KNOWLEDGE_FIELD};
use crate::error::Result;
use crate::score::ConsistencyScore;
use crate::snapshot::{
    AppearanceSnapshot, BehaviorSnapshot, DialogueSnapshot, KnowledgeSnapshot, Snapshot,
};
use crate::variation::{ConsistencyCategory, Variation};
use crate::warning::{ConsistencyWarning, WarningId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything tracked about one character.
///
/// Histories are kept in arrival order and never reordered or deduplicated.
/// Variations and warnings are append-only; the score is replaced on every
/// ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterConsistencyRecord {
    /// Caller-supplied character identifier.
    pub character_id: String,
    /// Display name given on first ingestion.
    pub character_name: String,
    pub(crate) appearance_history: Vec<AppearanceSnapshot>,
    pub(crate) behavior_history: Vec<BehaviorSnapshot>,
    pub(crate) dialogue_history: Vec<DialogueSnapshot>,
    pub(crate) knowledge_history: Vec<KnowledgeSnapshot>,
    /// All variations in detection order, across categories.
    variations: Vec<Variation>,
    /// All warnings ever raised.
    warnings: Vec<ConsistencyWarning>,
    score: ConsistencyScore,
    /// Distinct scene ids seen in any category, in first-seen order.
    observed_scenes: Vec<String>,
    pub first_scene: Option<String>,
    pub last_scene: Option<String>,
    pub scene_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What one ingestion added to a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observed {
    pub variations: usize,
    pub warnings: usize,
}

impl CharacterConsistencyRecord {
    /// Create an empty record with a perfect score.
    pub fn new(character_id: impl Into<String>, character_name: impl Into<String>) -> Self {
        let character_id = character_id.into();
        let now = Utc::now();
        Self {
            score: ConsistencyScore::new(&character_id),
            character_id,
            character_name: character_name.into(),
            appearance_history: Vec::new(),
            behavior_history: Vec::new(),
            dialogue_history: Vec::new(),
            knowledge_history: Vec::new(),
            variations: Vec::new(),
            warnings: Vec::new(),
            observed_scenes: Vec::new(),
            first_scene: None,
            last_scene: None,
            scene_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Append a snapshot, detect drift against its predecessor, raise
    /// warnings for knowledge contradictions and recompute the score.
    pub(crate) fn observe<D: Observation>(
        &mut self,
        snapshot: Snapshot<D>,
        config: &TrackerConfig,
    ) -> Observed {
        let scene_id = snapshot.scene_id.clone();
        D::history_mut(self).push(snapshot);
        self.note_scene(&scene_id, config.scene_count_mode);

        let variations = match D::history(self).split_last() {
            Some((current, earlier)) => D::detect_variations(earlier.last(), current),
            None => Vec::new(),
        };

        let warnings: Vec<ConsistencyWarning> = variations
            .iter()
            .filter(|v| {
                v.category == ConsistencyCategory::Knowledge
                    && v.field_name == IMPOSSIBLE_KNOWLEDGE_FIELD
            })
            .map(|v| {
                ConsistencyWarning::from_contradiction(&self.character_id, &self.character_name, v)
            })
            .collect();

        let observed = Observed {
            variations: variations.len(),
            warnings: warnings.len(),
        };
        self.variations.extend(variations);
        self.warnings.extend(warnings);
        self.score = ConsistencyScore::compute(self, config);
        observed
    }

    fn note_scene(&mut self, scene_id: &str, mode: SceneCountMode) {
        if self.first_scene.is_none() {
            self.first_scene = Some(scene_id.to_string());
        }
        self.last_scene = Some(scene_id.to_string());
        if !self.observed_scenes.iter().any(|s| s == scene_id) {
            self.observed_scenes.push(scene_id.to_string());
        }
        self.scene_count = match mode {
            SceneCountMode::AppearanceArrivals => self.appearance_history.len(),
            SceneCountMode::DistinctScenes => self.observed_scenes.len(),
        };
        self.updated_at = Utc::now();
    }

    // =========================================================================
    // Histories
    // =========================================================================

    pub fn appearance_history(&self) -> &[AppearanceSnapshot] {
        &self.appearance_history
    }

    pub fn behavior_history(&self) -> &[BehaviorSnapshot] {
        &self.behavior_history
    }

    pub fn dialogue_history(&self) -> &[DialogueSnapshot] {
        &self.dialogue_history
    }

    pub fn knowledge_history(&self) -> &[KnowledgeSnapshot] {
        &self.knowledge_history
    }

    /// Most recent appearance observation.
    pub fn latest_appearance(&self) -> Option<&AppearanceSnapshot> {
        self.appearance_history.last()
    }

    /// Distinct scene ids seen in any category, in first-seen order.
    pub fn observed_scenes(&self) -> &[String] {
        &self.observed_scenes
    }

    // =========================================================================
    // Variations and Warnings
    // =========================================================================

    /// All variations in detection order.
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Variations of one category.
    pub fn variations_in(&self, category: ConsistencyCategory) -> Vec<&Variation> {
        self.variations
            .iter()
            .filter(|v| v.category == category)
            .collect()
    }

    /// Variations observed in a given scene.
    pub fn variations_for_scene(&self, scene_id: &str) -> Vec<&Variation> {
        self.variations
            .iter()
            .filter(|v| v.scene_id == scene_id)
            .collect()
    }

    /// Number of contradiction variations.
    pub fn contradiction_count(&self) -> usize {
        self.variations
            .iter()
            .filter(|v| v.is_contradiction())
            .count()
    }

    /// All warnings, resolved ones included.
    pub fn warnings(&self) -> &[ConsistencyWarning] {
        &self.warnings
    }

    /// Warnings not yet resolved.
    pub fn unresolved_warnings(&self) -> Vec<&ConsistencyWarning> {
        self.warnings.iter().filter(|w| !w.is_resolved).collect()
    }

    /// Get a warning by ID.
    pub fn warning(&self, id: WarningId) -> Option<&ConsistencyWarning> {
        self.warnings.iter().find(|w| w.warning_id == id)
    }

    /// Get a mutable warning by ID.
    pub fn warning_mut(&mut self, id: WarningId) -> Option<&mut ConsistencyWarning> {
        self.warnings.iter_mut().find(|w| w.warning_id == id)
    }

    /// The live score.
    pub fn score(&self) -> &ConsistencyScore {
        &self.score
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Convert to a generic JSON tree.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild from a generic JSON tree.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to pretty JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
