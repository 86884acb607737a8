//! Per-scene observations of a character, one record type per category.
//!
//! Every category struct uses `#[serde(default, deny_unknown_fields)]`: a
//! missing field reads as empty, a misspelled one is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Build a tag set from anything iterable.
///
/// ```
/// use continuity_core::snapshot::tags;
/// let accessories = tags(["scarf", "hat"]);
/// assert!(accessories.contains("hat"));
/// ```
pub fn tags<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// An immutable, timestamped observation of one category in one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot<D> {
    /// Scene the observation came from.
    pub scene_id: String,
    /// When the observation was recorded.
    pub timestamp: DateTime<Utc>,
    /// The observed fields.
    pub data: D,
}

impl<D> Snapshot<D> {
    /// Create a snapshot stamped with the current time.
    pub fn new(scene_id: impl Into<String>, data: D) -> Self {
        Self {
            scene_id: scene_id.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

pub type AppearanceSnapshot = Snapshot<Appearance>;
pub type BehaviorSnapshot = Snapshot<Behavior>;
pub type DialogueSnapshot = Snapshot<Dialogue>;
pub type KnowledgeSnapshot = Snapshot<Knowledge>;

/// Physical look and outfit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Appearance {
    pub age_description: String,
    pub height: String,
    pub build: String,
    pub hair_color: String,
    pub eye_color: String,
    pub skin_tone: String,
    pub grooming_level: String,
    pub hair_style: String,
    pub distinguishing_features: BTreeSet<String>,
    pub clothing_colors: BTreeSet<String>,
    pub accessories: BTreeSet<String>,
    pub jewelry: BTreeSet<String>,
    pub tech_devices: BTreeSet<String>,
    pub clothing_top: String,
    pub clothing_bottom: String,
    pub footwear: String,
    pub outerwear: String,
}

impl Appearance {
    /// Body features compared for drift and scored as `appearance`.
    pub fn physical_traits(&self) -> [(&'static str, &str); 4] {
        [
            ("hair_color", &self.hair_color),
            ("eye_color", &self.eye_color),
            ("height", &self.height),
            ("build", &self.build),
        ]
    }

    /// Garments scored as `clothing`.
    pub fn clothing(&self) -> [(&'static str, &str); 3] {
        [
            ("clothing_top", &self.clothing_top),
            ("clothing_bottom", &self.clothing_bottom),
            ("footwear", &self.footwear),
        ]
    }
}

/// Demeanour and conduct in a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Behavior {
    pub mood: String,
    pub emotional_state: String,
    pub posture: String,
    pub movement_style: String,
    pub interaction_style: String,
    pub displayed_traits: BTreeSet<String>,
    pub behavior_notes: BTreeSet<String>,
    pub actions: BTreeSet<String>,
    pub mannerisms: BTreeSet<String>,
    pub speech_patterns: BTreeSet<String>,
    pub gestures: BTreeSet<String>,
    /// Other character id to a description of the relation.
    pub relationship_dynamics: BTreeMap<String, String>,
}

impl Behavior {
    /// Fields scored as `behavior`.
    pub fn conduct(&self) -> [(&'static str, &str); 3] {
        [
            ("mood", &self.mood),
            ("posture", &self.posture),
            ("movement_style", &self.movement_style),
        ]
    }
}

/// How the character speaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dialogue {
    pub vocabulary_level: String,
    pub sentence_structure: String,
    pub speech_tempo: String,
    pub formality_level: String,
    pub tone: String,
    pub volume: String,
    pub specialized_terms: BTreeSet<String>,
    pub catchphrases: BTreeSet<String>,
    pub accents: BTreeSet<String>,
    pub topics_discussed: BTreeSet<String>,
    pub secrets_revealed: BTreeSet<String>,
    pub lies_told: BTreeSet<String>,
    pub referenced_characters: BTreeSet<String>,
}

impl Dialogue {
    /// Fields scored as `dialogue`.
    pub fn voice(&self) -> [(&'static str, &str); 3] {
        [
            ("vocabulary_level", &self.vocabulary_level),
            ("sentence_structure", &self.sentence_structure),
            ("tone", &self.tone),
        ]
    }
}

/// What the character knows at this point of the story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Knowledge {
    pub known_facts: BTreeSet<String>,
    pub known_people: BTreeSet<String>,
    pub known_locations: BTreeSet<String>,
    pub known_skills: BTreeSet<String>,
    /// Things the character cannot know yet in story order.
    pub impossible_knowledge: BTreeSet<String>,
    pub new_information: BTreeSet<String>,
    pub revelations: BTreeSet<String>,
    pub forgotten_information: BTreeSet<String>,
}

impl Knowledge {
    /// Facts known in `previous` that this snapshot no longer lists.
    pub fn forgotten_since<'a>(&'a self, previous: &'a Knowledge) -> Vec<&'a str> {
        previous
            .known_facts
            .difference(&self.known_facts)
            .map(String::as_str)
            .collect()
    }
}
