//! Per-character and library-wide reports.

use crate::record::CharacterConsistencyRecord;
use crate::score::{ConsistencyScore, ConsistencyStatus};
use crate::variation::Variation;
use crate::warning::ConsistencyWarning;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The seven computed category scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub appearance: f64,
    pub clothing: f64,
    pub accessories: f64,
    pub behavior: f64,
    pub personality: f64,
    pub dialogue: f64,
    pub knowledge: f64,
}

impl From<&ConsistencyScore> for CategoryScores {
    fn from(score: &ConsistencyScore) -> Self {
        Self {
            appearance: score.appearance_score,
            clothing: score.clothing_score,
            accessories: score.accessories_score,
            behavior: score.behavior_score,
            personality: score.personality_score,
            dialogue: score.dialogue_score,
            knowledge: score.knowledge_score,
        }
    }
}

/// Consistency report for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterReport {
    pub character_id: String,
    pub character_name: String,
    pub overall_score: f64,
    pub status: ConsistencyStatus,
    pub scene_count: usize,
    pub variation_count: usize,
    pub warning_count: usize,
    pub unresolved_warning_count: usize,
    pub first_scene: Option<String>,
    pub last_scene: Option<String>,
    pub category_scores: CategoryScores,
    /// Every variation, when requested.
    pub variations: Option<Vec<Variation>>,
    /// Unresolved warnings, when requested.
    pub warnings: Option<Vec<ConsistencyWarning>>,
}

impl CharacterReport {
    /// Build a report from a record.
    pub fn new(
        record: &CharacterConsistencyRecord,
        include_variations: bool,
        include_warnings: bool,
    ) -> Self {
        let score = record.score();
        let unresolved = record.unresolved_warnings();

        Self {
            character_id: record.character_id.clone(),
            character_name: record.character_name.clone(),
            overall_score: score.overall_score,
            status: score.status(),
            scene_count: record.scene_count,
            variation_count: record.variations().len(),
            warning_count: record.warnings().len(),
            unresolved_warning_count: unresolved.len(),
            first_scene: record.first_scene.clone(),
            last_scene: record.last_scene.clone(),
            category_scores: CategoryScores::from(score),
            variations: include_variations.then(|| record.variations().to_vec()),
            warnings: include_warnings.then(|| unresolved.into_iter().cloned().collect()),
        }
    }
}

/// Health tier of the whole character library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryHealth {
    Excellent,
    Good,
    NeedsAttention,
    Problematic,
    Critical,
    /// No characters are tracked yet.
    NoData,
}

impl LibraryHealth {
    /// Map a mean overall score to a tier.
    pub fn from_average(average: f64) -> Self {
        if average >= 0.95 {
            LibraryHealth::Excellent
        } else if average >= 0.85 {
            LibraryHealth::Good
        } else if average >= 0.70 {
            LibraryHealth::NeedsAttention
        } else if average >= 0.50 {
            LibraryHealth::Problematic
        } else {
            LibraryHealth::Critical
        }
    }
}

/// One line of the library report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub character_id: String,
    pub character_name: String,
    pub overall_score: f64,
    pub status: ConsistencyStatus,
    pub scene_count: usize,
    pub unresolved_warnings: usize,
}

/// Library-wide consistency report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryReport {
    pub character_count: usize,
    /// Mean overall score, `None` when nothing is tracked.
    pub average_score: Option<f64>,
    pub overall_health: LibraryHealth,
    pub unresolved_warnings: usize,
    /// Worst-scoring characters first.
    pub characters: Vec<CharacterSummary>,
}

impl LibraryReport {
    /// Placeholder report for an empty library.
    pub fn no_data() -> Self {
        Self {
            character_count: 0,
            average_score: None,
            overall_health: LibraryHealth::NoData,
            unresolved_warnings: 0,
            characters: Vec::new(),
        }
    }

    /// Summarize a set of records.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a CharacterConsistencyRecord>,
    ) -> Self {
        let mut characters: Vec<CharacterSummary> = records
            .into_iter()
            .map(|record| CharacterSummary {
                character_id: record.character_id.clone(),
                character_name: record.character_name.clone(),
                overall_score: record.score().overall_score,
                status: record.score().status(),
                scene_count: record.scene_count,
                unresolved_warnings: record.unresolved_warnings().len(),
            })
            .collect();

        if characters.is_empty() {
            return Self::no_data();
        }

        characters.sort_by(|a, b| {
            a.overall_score
                .partial_cmp(&b.overall_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.character_id.cmp(&b.character_id))
        });

        let average =
            characters.iter().map(|c| c.overall_score).sum::<f64>() / characters.len() as f64;

        Self {
            character_count: characters.len(),
            average_score: Some(average),
            overall_health: LibraryHealth::from_average(average),
            unresolved_warnings: characters.iter().map(|c| c.unresolved_warnings).sum(),
            characters,
        }
    }
}

/// Aggregate counters for a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub characters_tracked: usize,
    pub ingestion_calls: u64,
    pub variations_detected: u64,
    pub warnings_issued: u64,
    pub library: LibraryReport,
}
