//! Variation detectors, one per snapshot category.
//!
//! A detector only ever compares the newest snapshot with the one right
//! before it. Nothing older is consulted.

use crate::record::CharacterConsistencyRecord;
use crate::snapshot::{Appearance, Behavior, Dialogue, Knowledge, Snapshot};
use crate::variation::{
    ConsistencyCategory, StoryImpact, Variation, VariationSeverity, VariationType,
};

/// Field name that marks a knowledge contradiction.
pub const IMPOSSIBLE_KNOWLEDGE_FIELD: &str = "impossible_knowledge";

/// A category of per-scene observation the tracker can ingest.
pub trait Observation: Clone + Sized {
    /// Category used when logging and in variations on the main field.
    const CATEGORY: ConsistencyCategory;

    /// Compare the newest snapshot with its predecessor.
    ///
    /// `previous` is `None` for the first snapshot of a category.
    fn detect_variations(previous: Option<&Snapshot<Self>>, current: &Snapshot<Self>)
        -> Vec<Variation>;

    /// This category's history inside a record.
    fn history(record: &CharacterConsistencyRecord) -> &[Snapshot<Self>];

    /// Mutable access to this category's history.
    fn history_mut(record: &mut CharacterConsistencyRecord) -> &mut Vec<Snapshot<Self>>;
}

/// Start a variation between two snapshots.
fn between<D>(
    category: ConsistencyCategory,
    variation_type: VariationType,
    field_name: &str,
    previous_value: &str,
    current_value: &str,
    previous: &Snapshot<D>,
    current: &Snapshot<D>,
) -> Variation {
    Variation::new(
        category,
        variation_type,
        field_name,
        previous_value,
        current_value,
        &current.scene_id,
    )
    .with_previous_scene(&previous.scene_id)
}

/// Empty values mean "unknown", never a change.
fn is_scalar_change(before: &str, after: &str) -> bool {
    !before.is_empty() && !after.is_empty() && before != after
}

impl Observation for Appearance {
    const CATEGORY: ConsistencyCategory = ConsistencyCategory::Appearance;

    fn detect_variations(
        previous: Option<&Snapshot<Self>>,
        current: &Snapshot<Self>,
    ) -> Vec<Variation> {
        let Some(previous) = previous else {
            return Vec::new();
        };
        let mut variations = Vec::new();

        let before = previous.data.physical_traits();
        let after = current.data.physical_traits();
        for ((field, old), (_, new)) in before.into_iter().zip(after) {
            if is_scalar_change(old, new) {
                variations.push(
                    between(
                        ConsistencyCategory::Appearance,
                        VariationType::Change,
                        field,
                        old,
                        new,
                        previous,
                        current,
                    )
                    .with_severity(VariationSeverity::classify(old, new))
                    .with_impact(StoryImpact::classify(old, new))
                    .with_suggestion(format!(
                        "Confirm that {field} changing from '{old}' to '{new}' is intended, \
                         or restore '{old}'"
                    )),
                );
            }
        }

        let old_items = &previous.data.accessories;
        let new_items = &current.data.accessories;
        for item in old_items.difference(new_items) {
            variations.push(
                between(
                    ConsistencyCategory::Accessories,
                    VariationType::Removal,
                    "accessories",
                    item,
                    "",
                    previous,
                    current,
                )
                .with_suggestion(format!(
                    "Show or mention what happened to '{item}' if its absence matters"
                )),
            );
        }
        for item in new_items.difference(old_items) {
            variations.push(
                between(
                    ConsistencyCategory::Accessories,
                    VariationType::Addition,
                    "accessories",
                    "",
                    item,
                    previous,
                    current,
                )
                .with_suggestion(format!("Introduce '{item}' on screen or in narration")),
            );
        }

        variations
    }

    fn history(record: &CharacterConsistencyRecord) -> &[Snapshot<Self>] {
        &record.appearance_history
    }

    fn history_mut(record: &mut CharacterConsistencyRecord) -> &mut Vec<Snapshot<Self>> {
        &mut record.appearance_history
    }
}

impl Observation for Behavior {
    const CATEGORY: ConsistencyCategory = ConsistencyCategory::Behavior;

    fn detect_variations(
        previous: Option<&Snapshot<Self>>,
        current: &Snapshot<Self>,
    ) -> Vec<Variation> {
        let Some(previous) = previous else {
            return Vec::new();
        };
        let mut variations = Vec::new();

        let (old, new) = (&previous.data.mood, &current.data.mood);
        if is_scalar_change(old, new) {
            variations.push(
                between(
                    ConsistencyCategory::Behavior,
                    VariationType::Change,
                    "mood",
                    old,
                    new,
                    previous,
                    current,
                )
                .with_impact(StoryImpact::Minor)
                .with_suggestion(format!(
                    "Bridge the mood shift from '{old}' to '{new}' with a motivating beat"
                )),
            );
        }

        // Traits that disappear are not reported, only new ones.
        for new_trait in current
            .data
            .displayed_traits
            .difference(&previous.data.displayed_traits)
        {
            variations.push(
                between(
                    ConsistencyCategory::Personality,
                    VariationType::Addition,
                    "displayed_traits",
                    "",
                    new_trait,
                    previous,
                    current,
                )
                .with_severity(VariationSeverity::Moderate)
                .with_impact(StoryImpact::Significant)
                .with_suggestion(format!(
                    "Set up '{new_trait}' earlier or give it a trigger in this scene"
                )),
            );
        }

        variations
    }

    fn history(record: &CharacterConsistencyRecord) -> &[Snapshot<Self>] {
        &record.behavior_history
    }

    fn history_mut(record: &mut CharacterConsistencyRecord) -> &mut Vec<Snapshot<Self>> {
        &mut record.behavior_history
    }
}

impl Observation for Dialogue {
    const CATEGORY: ConsistencyCategory = ConsistencyCategory::Dialogue;

    fn detect_variations(
        previous: Option<&Snapshot<Self>>,
        current: &Snapshot<Self>,
    ) -> Vec<Variation> {
        let Some(previous) = previous else {
            return Vec::new();
        };
        let mut variations = Vec::new();

        let (old, new) = (
            &previous.data.vocabulary_level,
            &current.data.vocabulary_level,
        );
        if is_scalar_change(old, new) {
            variations.push(
                between(
                    ConsistencyCategory::Dialogue,
                    VariationType::Change,
                    "vocabulary_level",
                    old,
                    new,
                    previous,
                    current,
                )
                .with_severity(VariationSeverity::Moderate)
                .with_impact(StoryImpact::Significant)
                .with_suggestion(format!(
                    "Keep the vocabulary at '{old}' or justify the shift to '{new}'"
                )),
            );
        }

        // New catchphrases are not reported, only dropped ones.
        for phrase in previous
            .data
            .catchphrases
            .difference(&current.data.catchphrases)
        {
            variations.push(
                between(
                    ConsistencyCategory::Dialogue,
                    VariationType::Removal,
                    "catchphrases",
                    phrase,
                    "",
                    previous,
                    current,
                )
                .with_suggestion(format!(
                    "Consider bringing back '{phrase}' to keep the voice recognisable"
                )),
            );
        }

        variations
    }

    fn history(record: &CharacterConsistencyRecord) -> &[Snapshot<Self>] {
        &record.dialogue_history
    }

    fn history_mut(record: &mut CharacterConsistencyRecord) -> &mut Vec<Snapshot<Self>> {
        &mut record.dialogue_history
    }
}

impl Observation for Knowledge {
    const CATEGORY: ConsistencyCategory = ConsistencyCategory::Knowledge;

    /// Impossible knowledge is flagged on every snapshot, the first one
    /// included, since it needs no predecessor. Forgotten facts need one.
    fn detect_variations(
        previous: Option<&Snapshot<Self>>,
        current: &Snapshot<Self>,
    ) -> Vec<Variation> {
        let mut variations = Vec::new();

        for item in &current.data.impossible_knowledge {
            let mut variation = Variation::new(
                ConsistencyCategory::Knowledge,
                VariationType::Contradiction,
                IMPOSSIBLE_KNOWLEDGE_FIELD,
                "",
                item,
                &current.scene_id,
            )
            .with_severity(VariationSeverity::Critical)
            .with_impact(StoryImpact::Breaking)
            .with_suggestion(format!(
                "Remove '{item}' from this scene or move its reveal earlier in the story"
            ));
            if let Some(previous) = previous {
                variation = variation.with_previous_scene(&previous.scene_id);
            }
            variations.push(variation);
        }

        if let Some(previous) = previous {
            for fact in current.data.forgotten_since(&previous.data) {
                variations.push(
                    between(
                        ConsistencyCategory::Knowledge,
                        VariationType::Removal,
                        "known_facts",
                        fact,
                        "",
                        previous,
                        current,
                    )
                    .with_severity(VariationSeverity::Moderate)
                    .with_impact(StoryImpact::Significant)
                    .with_suggestion(format!(
                        "Keep '{fact}' known or show the character forgetting it"
                    )),
                );
            }
        }

        variations
    }

    fn history(record: &CharacterConsistencyRecord) -> &[Snapshot<Self>] {
        &record.knowledge_history
    }

    fn history_mut(record: &mut CharacterConsistencyRecord) -> &mut Vec<Snapshot<Self>> {
        &mut record.knowledge_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tags;

    fn appearance(scene: &str, hair: &str, accessories: &[&str]) -> Snapshot<Appearance> {
        Snapshot::new(
            scene,
            Appearance {
                hair_color: hair.to_string(),
                accessories: tags(accessories.iter().copied()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_first_snapshot_has_no_drift() {
        let first = appearance("s1", "black", &["scarf"]);
        assert!(Appearance::detect_variations(None, &first).is_empty());
    }

    #[test]
    fn test_hair_color_change() {
        let s1 = appearance("s1", "black", &[]);
        let s2 = appearance("s2", "blonde", &[]);

        let variations = Appearance::detect_variations(Some(&s1), &s2);
        assert_eq!(variations.len(), 1);

        let v = &variations[0];
        assert_eq!(v.category, ConsistencyCategory::Appearance);
        assert_eq!(v.variation_type, VariationType::Change);
        assert_eq!(v.field_name, "hair_color");
        assert_eq!(v.previous_value, "black");
        assert_eq!(v.current_value, "blonde");
        assert_eq!(v.scene_id, "s2");
        assert_eq!(v.previous_scene_id.as_deref(), Some("s1"));
        assert_eq!(v.severity, VariationSeverity::Minor);
        assert_eq!(v.impact_on_story, StoryImpact::None);
    }

    #[test]
    fn test_empty_value_is_not_a_change() {
        let s1 = appearance("s1", "black", &[]);
        let s2 = appearance("s2", "", &[]);
        assert!(Appearance::detect_variations(Some(&s1), &s2).is_empty());
        assert!(Appearance::detect_variations(Some(&s2), &s1).is_empty());
    }

    #[test]
    fn test_accessory_set_difference() {
        let s1 = appearance("s1", "", &["scarf", "watch"]);
        let s2 = appearance("s2", "", &["scarf", "hat"]);

        let variations = Appearance::detect_variations(Some(&s1), &s2);
        assert_eq!(variations.len(), 2);

        let removal = &variations[0];
        assert_eq!(removal.variation_type, VariationType::Removal);
        assert_eq!(removal.category, ConsistencyCategory::Accessories);
        assert_eq!(removal.previous_value, "watch");

        let addition = &variations[1];
        assert_eq!(addition.variation_type, VariationType::Addition);
        assert_eq!(addition.current_value, "hat");
        assert_eq!(addition.severity, VariationSeverity::Minor);
        assert_eq!(addition.impact_on_story, StoryImpact::None);
    }

    #[test]
    fn test_behavior_reports_only_new_traits() {
        let s1 = Snapshot::new(
            "s1",
            Behavior {
                mood: "calm".to_string(),
                displayed_traits: tags(["loyal", "patient"]),
                ..Default::default()
            },
        );
        let s2 = Snapshot::new(
            "s2",
            Behavior {
                mood: "furious".to_string(),
                displayed_traits: tags(["loyal", "reckless"]),
                ..Default::default()
            },
        );

        let variations = Behavior::detect_variations(Some(&s1), &s2);
        assert_eq!(variations.len(), 2);

        assert_eq!(variations[0].field_name, "mood");
        assert_eq!(variations[0].severity, VariationSeverity::Minor);
        assert_eq!(variations[0].impact_on_story, StoryImpact::Minor);

        assert_eq!(variations[1].variation_type, VariationType::Addition);
        assert_eq!(variations[1].current_value, "reckless");
        assert_eq!(variations[1].severity, VariationSeverity::Moderate);
        assert_eq!(variations[1].impact_on_story, StoryImpact::Significant);
    }

    #[test]
    fn test_dialogue_reports_only_lost_catchphrases() {
        let s1 = Snapshot::new(
            "s1",
            Dialogue {
                vocabulary_level: "street".to_string(),
                catchphrases: tags(["no dice"]),
                ..Default::default()
            },
        );
        let s2 = Snapshot::new(
            "s2",
            Dialogue {
                vocabulary_level: "academic".to_string(),
                catchphrases: tags(["indubitably"]),
                ..Default::default()
            },
        );

        let variations = Dialogue::detect_variations(Some(&s1), &s2);
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].field_name, "vocabulary_level");
        assert_eq!(variations[0].severity, VariationSeverity::Moderate);
        assert_eq!(variations[1].variation_type, VariationType::Removal);
        assert_eq!(variations[1].previous_value, "no dice");
    }

    #[test]
    fn test_impossible_knowledge_on_first_snapshot() {
        let s1 = Snapshot::new(
            "s1",
            Knowledge {
                impossible_knowledge: tags(["the ending"]),
                ..Default::default()
            },
        );

        let variations = Knowledge::detect_variations(None, &s1);
        assert_eq!(variations.len(), 1);
        assert!(variations[0].is_contradiction());
        assert_eq!(variations[0].field_name, IMPOSSIBLE_KNOWLEDGE_FIELD);
        assert_eq!(variations[0].severity, VariationSeverity::Critical);
        assert_eq!(variations[0].impact_on_story, StoryImpact::Breaking);
        assert_eq!(variations[0].previous_scene_id, None);
    }

    #[test]
    fn test_forgotten_facts() {
        let s1 = Snapshot::new(
            "s1",
            Knowledge {
                known_facts: tags(["vault code", "safehouse"]),
                ..Default::default()
            },
        );
        let s2 = Snapshot::new(
            "s2",
            Knowledge {
                known_facts: tags(["safehouse"]),
                ..Default::default()
            },
        );

        let variations = Knowledge::detect_variations(Some(&s1), &s2);
        assert_eq!(variations.len(), 1);
        assert_eq!(variations[0].variation_type, VariationType::Removal);
        assert_eq!(variations[0].field_name, "known_facts");
        assert_eq!(variations[0].previous_value, "vault code");
    }
}
