//! Consistency scoring.
//!
//! Scores are recomputed from the full snapshot history on every ingestion.
//! Each category score lies in `[0.0, 1.0]` and is exactly `1.0` while a
//! category has fewer than two snapshots.

use crate::config::TrackerConfig;
use crate::record::CharacterConsistencyRecord;
use crate::snapshot::{Appearance, Behavior, Dialogue, Knowledge, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Overall score at or above which a character is consistent.
const CONSISTENT_THRESHOLD: f64 = 0.95;

/// Overall score at or above which drift is minor.
const MINOR_VARIATION_THRESHOLD: f64 = 0.80;

/// Overall score at or above which drift is significant.
const SIGNIFICANT_VARIATION_THRESHOLD: f64 = 0.60;

/// Lower bound of the band that is still labelled a contradiction.
const CONTRADICTION_THRESHOLD: f64 = 0.40;

/// Status derived from a character's overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    Consistent,
    MinorVariation,
    SignificantVariation,
    Contradiction,
}

impl ConsistencyStatus {
    /// Map an overall score to a status.
    ///
    /// Known ambiguity: `[0.40, 0.60)` and `[0.0, 0.40)` both map to
    /// `Contradiction`, so there is no distinct "severe" status. Kept for
    /// compatibility with existing reports.
    #[allow(clippy::if_same_then_else)]
    pub fn from_score(score: f64) -> Self {
        if score >= CONSISTENT_THRESHOLD {
            ConsistencyStatus::Consistent
        } else if score >= MINOR_VARIATION_THRESHOLD {
            ConsistencyStatus::MinorVariation
        } else if score >= SIGNIFICANT_VARIATION_THRESHOLD {
            ConsistencyStatus::SignificantVariation
        } else if score >= CONTRADICTION_THRESHOLD {
            ConsistencyStatus::Contradiction
        } else {
            ConsistencyStatus::Contradiction
        }
    }

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            ConsistencyStatus::Consistent => "Consistent",
            ConsistencyStatus::MinorVariation => "Minor Variation",
            ConsistencyStatus::SignificantVariation => "Significant Variation",
            ConsistencyStatus::Contradiction => "Contradiction",
        }
    }
}

/// Weights of the seven scored categories in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryWeights {
    pub appearance: f64,
    pub clothing: f64,
    pub accessories: f64,
    pub behavior: f64,
    pub personality: f64,
    pub dialogue: f64,
    pub knowledge: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            appearance: 1.0,
            clothing: 0.8,
            accessories: 0.8,
            behavior: 1.0,
            personality: 1.0,
            dialogue: 0.9,
            knowledge: 0.9,
        }
    }
}

impl CategoryWeights {
    /// Weights in scoring order.
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.appearance,
            self.clothing,
            self.accessories,
            self.behavior,
            self.personality,
            self.dialogue,
            self.knowledge,
        ]
    }

    /// Weighted mean of seven scores given in scoring order.
    ///
    /// Returns `1.0` when the weights sum to zero.
    pub fn weighted_mean(&self, scores: [f64; 7]) -> f64 {
        let weights = self.as_array();
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            return 1.0;
        }
        let weighted: f64 = scores.iter().zip(weights).map(|(s, w)| s * w).sum();
        weighted / total
    }
}

/// Per-character aggregate of category scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsistencyScore {
    pub character_id: String,
    pub appearance_score: f64,
    pub clothing_score: f64,
    pub accessories_score: f64,
    pub behavior_score: f64,
    pub personality_score: f64,
    pub dialogue_score: f64,
    pub knowledge_score: f64,
    /// Part of the model but not computed by any detector.
    pub relationships_score: f64,
    /// Part of the model but not computed by any detector.
    pub abilities_score: f64,
    pub overall_score: f64,
    pub total_scenes: usize,
    pub total_variations: usize,
    pub contradictions: usize,
    pub warnings_issued: usize,
    pub last_updated: DateTime<Utc>,
}

impl ConsistencyScore {
    /// A perfect score for a character with no history.
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            appearance_score: 1.0,
            clothing_score: 1.0,
            accessories_score: 1.0,
            behavior_score: 1.0,
            personality_score: 1.0,
            dialogue_score: 1.0,
            knowledge_score: 1.0,
            relationships_score: 1.0,
            abilities_score: 1.0,
            overall_score: 1.0,
            total_scenes: 0,
            total_variations: 0,
            contradictions: 0,
            warnings_issued: 0,
            last_updated: Utc::now(),
        }
    }

    /// Recompute every score from a record's full history.
    pub fn compute(record: &CharacterConsistencyRecord, config: &TrackerConfig) -> Self {
        let appearance = record.appearance_history();
        let behavior = record.behavior_history();

        let mut score = Self::new(&record.character_id);
        score.appearance_score = scalar_score(appearance, Appearance::physical_traits);
        score.clothing_score = scalar_score(appearance, Appearance::clothing);
        score.accessories_score = set_score(appearance, |a: &Appearance| &a.accessories);
        score.behavior_score = scalar_score(behavior, Behavior::conduct);
        score.personality_score = set_score(behavior, |b: &Behavior| &b.displayed_traits);
        score.dialogue_score = scalar_score(record.dialogue_history(), Dialogue::voice);
        score.knowledge_score = knowledge_score(record.knowledge_history(), config);
        score.overall_score = config.weights.weighted_mean(score.category_scores());

        score.total_scenes = record.scene_count;
        score.total_variations = record.variations().len();
        score.contradictions = record.contradiction_count();
        score.warnings_issued = record.warnings().len();
        score
    }

    /// The seven computed category scores in scoring order.
    pub fn category_scores(&self) -> [f64; 7] {
        [
            self.appearance_score,
            self.clothing_score,
            self.accessories_score,
            self.behavior_score,
            self.personality_score,
            self.dialogue_score,
            self.knowledge_score,
        ]
    }

    /// Status derived from the overall score.
    pub fn status(&self) -> ConsistencyStatus {
        ConsistencyStatus::from_score(self.overall_score)
    }
}

/// Share of equal values among comparable scalar fields across consecutive
/// snapshots. A field is comparable when both sides are non-empty.
pub fn scalar_score<D, F, const N: usize>(history: &[Snapshot<D>], fields: F) -> f64
where
    F: Fn(&D) -> [(&'static str, &str); N],
{
    if history.len() < 2 {
        return 1.0;
    }

    let mut comparisons = 0usize;
    let mut consistent = 0usize;
    for pair in history.windows(2) {
        let before = fields(&pair[0].data);
        let after = fields(&pair[1].data);
        for ((_, old), (_, new)) in before.iter().zip(after.iter()) {
            if old.is_empty() || new.is_empty() {
                continue;
            }
            comparisons += 1;
            if old == new {
                consistent += 1;
            }
        }
    }

    if comparisons == 0 {
        1.0
    } else {
        consistent as f64 / comparisons as f64
    }
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`, `1.0` for two empty sets.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Mean Jaccard similarity of a set field across consecutive snapshots,
/// skipping pairs whose earlier set is empty.
pub fn set_score<D, F>(history: &[Snapshot<D>], field: F) -> f64
where
    F: Fn(&D) -> &BTreeSet<String>,
{
    if history.len() < 2 {
        return 1.0;
    }

    let similarities: Vec<f64> = history
        .windows(2)
        .filter(|pair| !field(&pair[0].data).is_empty())
        .map(|pair| jaccard(field(&pair[0].data), field(&pair[1].data)))
        .collect();

    if similarities.is_empty() {
        1.0
    } else {
        similarities.iter().sum::<f64>() / similarities.len() as f64
    }
}

/// Knowledge score: `1.0` minus penalties for impossible knowledge and for
/// forgetting too many facts at once, floored at zero.
pub fn knowledge_score(history: &[Snapshot<Knowledge>], config: &TrackerConfig) -> f64 {
    if history.len() < 2 {
        return 1.0;
    }

    let mut penalty = 0.0;
    for pair in history.windows(2) {
        let (previous, current) = (&pair[0].data, &pair[1].data);

        if !current.impossible_knowledge.is_empty() {
            penalty +=
                current.impossible_knowledge.len() as f64 * config.impossible_knowledge_penalty;
        }

        let forgotten = current.forgotten_since(previous).len() as f64;
        if forgotten > previous.known_facts.len() as f64 * config.forgotten_facts_ratio {
            penalty += config.forgotten_facts_penalty;
        }
    }

    (1.0 - penalty).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tags;
    use proptest::prelude::*;

    fn knowledge(scene: &str, facts: &[&str], impossible: &[&str]) -> Snapshot<Knowledge> {
        Snapshot::new(
            scene,
            Knowledge {
                known_facts: tags(facts.iter().copied()),
                impossible_knowledge: tags(impossible.iter().copied()),
                ..Default::default()
            },
        )
    }

    fn accessories(scene: &str, items: &[&str]) -> Snapshot<Appearance> {
        Snapshot::new(
            scene,
            Appearance {
                accessories: tags(items.iter().copied()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(
            ConsistencyStatus::from_score(1.0),
            ConsistencyStatus::Consistent
        );
        assert_eq!(
            ConsistencyStatus::from_score(0.95),
            ConsistencyStatus::Consistent
        );
        assert_eq!(
            ConsistencyStatus::from_score(0.9),
            ConsistencyStatus::MinorVariation
        );
        assert_eq!(
            ConsistencyStatus::from_score(0.7),
            ConsistencyStatus::SignificantVariation
        );
    }

    #[test]
    fn test_lowest_bands_collapse_to_contradiction() {
        // No distinct status exists below 0.60.
        assert_eq!(
            ConsistencyStatus::from_score(0.5),
            ConsistencyStatus::Contradiction
        );
        assert_eq!(
            ConsistencyStatus::from_score(0.1),
            ConsistencyStatus::Contradiction
        );
        assert_eq!(
            ConsistencyStatus::from_score(0.5),
            ConsistencyStatus::from_score(0.0)
        );
    }

    #[test]
    fn test_scalar_score_single_snapshot() {
        let history = vec![accessories("s1", &["scarf"])];
        assert_eq!(scalar_score(&history, Appearance::physical_traits), 1.0);
        assert_eq!(set_score(&history, |a: &Appearance| &a.accessories), 1.0);
    }

    #[test]
    fn test_scalar_score_counts_only_known_values() {
        let mut s1 = Appearance::default();
        s1.hair_color = "black".to_string();
        s1.eye_color = "green".to_string();
        let mut s2 = Appearance::default();
        s2.hair_color = "blonde".to_string();
        s2.eye_color = "green".to_string();
        s2.height = "tall".to_string();

        let history = vec![Snapshot::new("s1", s1), Snapshot::new("s2", s2)];
        // hair_color differs, eye_color matches, height has no earlier value
        assert_eq!(scalar_score(&history, Appearance::physical_traits), 0.5);
        // no clothing values at all
        assert_eq!(scalar_score(&history, Appearance::clothing), 1.0);
    }

    #[test]
    fn test_conduct_voice_and_clothing_drift() {
        let calm = Behavior {
            mood: "calm".to_string(),
            posture: "upright".to_string(),
            ..Default::default()
        };
        let angry = Behavior {
            mood: "angry".to_string(),
            ..calm.clone()
        };
        let history = vec![Snapshot::new("s1", calm), Snapshot::new("s2", angry)];
        assert_eq!(scalar_score(&history, Behavior::conduct), 0.5);

        let dry = Dialogue {
            tone: "dry".to_string(),
            ..Default::default()
        };
        let warm = Dialogue {
            tone: "warm".to_string(),
            ..Default::default()
        };
        let history = vec![Snapshot::new("s1", dry), Snapshot::new("s2", warm)];
        assert_eq!(scalar_score(&history, Dialogue::voice), 0.0);

        let boots = Appearance {
            footwear: "boots".to_string(),
            ..Default::default()
        };
        let sandals = Appearance {
            footwear: "sandals".to_string(),
            ..Default::default()
        };
        let history = vec![Snapshot::new("s1", boots), Snapshot::new("s2", sandals)];
        assert_eq!(scalar_score(&history, Appearance::clothing), 0.0);
        assert_eq!(scalar_score(&history, Appearance::physical_traits), 1.0);
    }

    #[test]
    fn test_jaccard_example() {
        let a = tags(["scarf"]);
        let b = tags(["scarf", "hat"]);
        assert_eq!(jaccard(&a, &b), 0.5);
        assert_eq!(jaccard(&b, &a), 0.5);
    }

    #[test]
    fn test_set_score_skips_empty_previous() {
        let history = vec![
            accessories("s1", &[]),
            accessories("s2", &["scarf"]),
            accessories("s3", &["scarf", "hat"]),
        ];
        assert_eq!(set_score(&history, |a: &Appearance| &a.accessories), 0.5);
    }

    #[test]
    fn test_knowledge_penalties() {
        let config = TrackerConfig::default();

        let history = vec![
            knowledge("s1", &["a", "b", "c", "d"], &[]),
            knowledge("s2", &["a", "b", "c", "d"], &["the ending", "the twist"]),
        ];
        assert!((knowledge_score(&history, &config) - 0.6).abs() < 1e-9);

        // 2 of 4 facts forgotten is more than 30%
        let history = vec![
            knowledge("s1", &["a", "b", "c", "d"], &[]),
            knowledge("s2", &["a", "b"], &[]),
        ];
        assert!((knowledge_score(&history, &config) - 0.9).abs() < 1e-9);

        // 1 of 4 is not
        let history = vec![
            knowledge("s1", &["a", "b", "c", "d"], &[]),
            knowledge("s2", &["a", "b", "c"], &[]),
        ];
        assert_eq!(knowledge_score(&history, &config), 1.0);
    }

    #[test]
    fn test_knowledge_score_floors_at_zero() {
        let config = TrackerConfig::default();
        let history = vec![
            knowledge("s1", &[], &[]),
            knowledge("s2", &[], &["a", "b", "c", "d", "e", "f"]),
        ];
        assert_eq!(knowledge_score(&history, &config), 0.0);
    }

    #[test]
    fn test_weighted_mean_zero_weights() {
        let weights = CategoryWeights {
            appearance: 0.0,
            clothing: 0.0,
            accessories: 0.0,
            behavior: 0.0,
            personality: 0.0,
            dialogue: 0.0,
            knowledge: 0.0,
        };
        assert_eq!(weights.weighted_mean([0.0; 7]), 1.0);
    }

    #[test]
    fn test_appearance_drop_is_weighted() {
        let weights = CategoryWeights::default();
        let mut scores = [1.0; 7];
        scores[0] = 0.0;
        let drop = 1.0 - weights.weighted_mean(scores);
        assert!((drop - 1.0 / 6.4).abs() < 1e-9);
    }

    fn tag_set() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-e]", 0..5)
    }

    proptest! {
        #[test]
        fn prop_jaccard_symmetric_and_bounded(a in tag_set(), b in tag_set()) {
            let ab = jaccard(&a, &b);
            prop_assert_eq!(ab, jaccard(&b, &a));
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn prop_uniform_scores_normalize(s in 0.0f64..=1.0) {
            let overall = CategoryWeights::default().weighted_mean([s; 7]);
            prop_assert!((overall - s).abs() < 1e-9);
        }
    }
}
