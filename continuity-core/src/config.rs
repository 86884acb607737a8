//! Tracker configuration.

use crate::error::{ContinuityError, Result};
use crate::score::CategoryWeights;
use serde::{Deserialize, Serialize};

/// What a record's `scene_count` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneCountMode {
    /// Number of appearance snapshots. Behavior, dialogue and knowledge
    /// observations do not count.
    #[default]
    AppearanceArrivals,
    /// Number of distinct scene ids observed in any category.
    DistinctScenes,
}

/// Configuration for a [`ConsistencyTracker`](crate::ConsistencyTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Weights of the category scores in the overall score.
    pub weights: CategoryWeights,

    /// Knowledge penalty per impossible item in a snapshot.
    pub impossible_knowledge_penalty: f64,

    /// Share of previously known facts that may be forgotten between two
    /// snapshots before a penalty applies.
    pub forgotten_facts_ratio: f64,

    /// Knowledge penalty when too many facts are forgotten at once.
    pub forgotten_facts_penalty: f64,

    /// Meaning of `scene_count` on each record.
    pub scene_count_mode: SceneCountMode,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            impossible_knowledge_penalty: 0.2,
            forgotten_facts_ratio: 0.3,
            forgotten_facts_penalty: 0.1,
            scene_count_mode: SceneCountMode::default(),
        }
    }
}

impl TrackerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category weights.
    pub fn with_weights(mut self, weights: CategoryWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the penalty per impossible knowledge item.
    pub fn with_impossible_knowledge_penalty(mut self, penalty: f64) -> Self {
        self.impossible_knowledge_penalty = penalty;
        self
    }

    /// Set the forgotten-facts ratio and the penalty applied past it.
    pub fn with_forgotten_facts(mut self, ratio: f64, penalty: f64) -> Self {
        self.forgotten_facts_ratio = ratio;
        self.forgotten_facts_penalty = penalty;
        self
    }

    /// Set what `scene_count` counts.
    pub fn with_scene_count_mode(mut self, mode: SceneCountMode) -> Self {
        self.scene_count_mode = mode;
        self
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if let Some(weight) = self
            .weights
            .as_array()
            .into_iter()
            .find(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ContinuityError::InvalidConfig(format!(
                "category weight {weight} must be a non-negative number"
            )));
        }

        for (name, value) in [
            (
                "impossible_knowledge_penalty",
                self.impossible_knowledge_penalty,
            ),
            ("forgotten_facts_penalty", self.forgotten_facts_penalty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ContinuityError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.forgotten_facts_ratio) {
            return Err(ContinuityError::InvalidConfig(format!(
                "forgotten_facts_ratio must be within [0, 1], got {}",
                self.forgotten_facts_ratio
            )));
        }

        Ok(())
    }
}
