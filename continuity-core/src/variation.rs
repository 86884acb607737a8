//! Detected drift between two observations of the same character.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value keywords that mark a change as major.
const MAJOR_KEYWORDS: &[&str] = &["height", "build", "body"];

/// Value keywords that mark a change as moderate.
const MODERATE_KEYWORDS: &[&str] = &["color", "style", "length"];

/// Value keywords that make a change story-breaking.
const BREAKING_KEYWORDS: &[&str] = &["scar", "injury", "missing_limb", "blind", "dead"];

/// Value keywords that make a change significant to the story.
const SIGNIFICANT_KEYWORDS: &[&str] = &["hair_color", "eye_color", "age"];

/// Attribute categories tracked for every character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyCategory {
    /// Physical features: hair, eyes, height, build.
    Appearance,
    /// Garments worn in a scene.
    Clothing,
    /// Carried or worn accessories.
    Accessories,
    /// Mood, posture, movement.
    Behavior,
    /// Displayed personality traits.
    Personality,
    /// Speech style and vocabulary.
    Dialogue,
    /// Dynamics with other characters.
    Relationships,
    /// What the character knows.
    Knowledge,
    /// Skills and powers.
    Abilities,
}

impl ConsistencyCategory {
    /// Get the lowercase tag for this category.
    pub fn name(&self) -> &'static str {
        match self {
            ConsistencyCategory::Appearance => "appearance",
            ConsistencyCategory::Clothing => "clothing",
            ConsistencyCategory::Accessories => "accessories",
            ConsistencyCategory::Behavior => "behavior",
            ConsistencyCategory::Personality => "personality",
            ConsistencyCategory::Dialogue => "dialogue",
            ConsistencyCategory::Relationships => "relationships",
            ConsistencyCategory::Knowledge => "knowledge",
            ConsistencyCategory::Abilities => "abilities",
        }
    }
}

/// The kind of drift a variation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationType {
    None,
    /// A scalar value changed.
    Change,
    /// A set gained an item.
    Addition,
    /// A set lost an item.
    Removal,
    /// The character holds knowledge it cannot have yet.
    Contradiction,
}

/// How serious a variation is on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl VariationSeverity {
    /// Get the lowercase label, also used as warning severity text.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariationSeverity::Minor => "minor",
            VariationSeverity::Moderate => "moderate",
            VariationSeverity::Major => "major",
            VariationSeverity::Critical => "critical",
        }
    }

    /// Classify a scalar change by keywords found in either value.
    ///
    /// This looks at the values, not the field name, so it only fires when
    /// the caller's values happen to carry the words.
    pub fn classify(previous: &str, current: &str) -> Self {
        if mentions_any(previous, current, MAJOR_KEYWORDS) {
            VariationSeverity::Major
        } else if mentions_any(previous, current, MODERATE_KEYWORDS) {
            VariationSeverity::Moderate
        } else {
            VariationSeverity::Minor
        }
    }
}

/// How much a variation affects the story if left unexplained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryImpact {
    None,
    Minor,
    Significant,
    Breaking,
}

impl StoryImpact {
    /// Classify a scalar change by keywords found in either value.
    pub fn classify(previous: &str, current: &str) -> Self {
        if mentions_any(previous, current, BREAKING_KEYWORDS) {
            StoryImpact::Breaking
        } else if mentions_any(previous, current, SIGNIFICANT_KEYWORDS) {
            StoryImpact::Significant
        } else {
            StoryImpact::None
        }
    }
}

fn mentions_any(previous: &str, current: &str, keywords: &[&str]) -> bool {
    let previous = previous.to_lowercase();
    let current = current.to_lowercase();
    keywords
        .iter()
        .any(|k| previous.contains(k) || current.contains(k))
}

/// A single detected drift between two consecutive snapshots.
///
/// Carries copies of the values and scene ids involved so it stays valid
/// after the snapshot history is truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variation {
    /// Category the drift belongs to.
    pub category: ConsistencyCategory,
    /// What kind of drift this is.
    pub variation_type: VariationType,
    /// The field or set that drifted.
    pub field_name: String,
    /// Value in the earlier snapshot (empty for additions).
    pub previous_value: String,
    /// Value in the newer snapshot (empty for removals).
    pub current_value: String,
    /// Scene where the drift was observed.
    pub scene_id: String,
    /// Scene of the snapshot compared against, if there was one.
    pub previous_scene_id: Option<String>,
    /// Severity of the drift.
    pub severity: VariationSeverity,
    /// Effect on the story.
    pub impact_on_story: StoryImpact,
    /// Advice for the writer.
    pub suggestion: String,
    /// When the drift was detected.
    pub detected_at: DateTime<Utc>,
}

impl Variation {
    /// Create a new minor variation with no story impact.
    pub fn new(
        category: ConsistencyCategory,
        variation_type: VariationType,
        field_name: impl Into<String>,
        previous_value: impl Into<String>,
        current_value: impl Into<String>,
        scene_id: impl Into<String>,
    ) -> Self {
        Self {
            category,
            variation_type,
            field_name: field_name.into(),
            previous_value: previous_value.into(),
            current_value: current_value.into(),
            scene_id: scene_id.into(),
            previous_scene_id: None,
            severity: VariationSeverity::Minor,
            impact_on_story: StoryImpact::None,
            suggestion: String::new(),
            detected_at: Utc::now(),
        }
    }

    /// Set the scene this variation was compared against.
    pub fn with_previous_scene(mut self, scene_id: impl Into<String>) -> Self {
        self.previous_scene_id = Some(scene_id.into());
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: VariationSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the story impact.
    pub fn with_impact(mut self, impact: StoryImpact) -> Self {
        self.impact_on_story = impact;
        self
    }

    /// Set the suggestion text.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Check if this variation is a knowledge contradiction.
    pub fn is_contradiction(&self) -> bool {
        self.variation_type == VariationType::Contradiction
    }
}
