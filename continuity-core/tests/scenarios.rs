//! Scenario tests for the continuity engine.
//!
//! These tests drive a tracker through scripted scenes and verify variations,
//! scores, warnings and reports end to end.
//! Run with: `cargo test -p continuity-core --test scenarios`

use continuity_core::snapshot::tags;
use continuity_core::testing::{accessories, facts, hair, impossible, SceneScript};
use continuity_core::{
    Appearance, Behavior, ConsistencyCategory, ConsistencyStatus, ConsistencyTracker, Dialogue,
    LibraryHealth, StoryImpact, VariationSeverity, VariationType, WarningState,
};

// =============================================================================
// SCENARIO 1: Hair color drift
// =============================================================================

#[test]
fn test_hair_color_drift_scenario() {
    let mut tracker = ConsistencyTracker::new();

    tracker
        .record_scene_appearance("c1", "Ilsa", "s1", hair("black"))
        .expect("first scene");
    let before = tracker.get_record("c1").unwrap().score().clone();
    assert_eq!(before.appearance_score, 1.0);
    assert_eq!(before.overall_score, 1.0);

    tracker
        .record_scene_appearance("c1", "Ilsa", "s2", hair("blonde"))
        .expect("second scene");
    let record = tracker.get_record("c1").unwrap();

    assert_eq!(record.variations().len(), 1, "exactly one variation");
    let variation = &record.variations()[0];
    assert_eq!(variation.category, ConsistencyCategory::Appearance);
    assert_eq!(variation.variation_type, VariationType::Change);
    assert_eq!(variation.field_name, "hair_color");

    let after = record.score();
    assert_eq!(after.appearance_score, 0.0);
    let drop = before.overall_score - after.overall_score;
    assert!(
        (drop - 1.0 / 6.4).abs() < 1e-9,
        "overall should drop by the appearance weight share, dropped {drop}"
    );
    assert_eq!(after.status(), ConsistencyStatus::MinorVariation);
}

// =============================================================================
// SCENARIO 2: Impossible knowledge
// =============================================================================

#[test]
fn test_impossible_knowledge_scenario() {
    let mut tracker = ConsistencyTracker::new();

    tracker
        .record_scene_knowledge("c2", "Mara", "s1", impossible(&["the ending"]))
        .expect("knowledge scene");

    let record = tracker.get_record("c2").unwrap();
    let variation = &record.variations()[0];
    assert_eq!(variation.variation_type, VariationType::Contradiction);
    assert_eq!(variation.severity, VariationSeverity::Critical);
    assert_eq!(variation.impact_on_story, StoryImpact::Breaking);

    let active = tracker.get_active_warnings(Some("c2"), None);
    assert_eq!(active.len(), 1);
    let warning = active[0];
    assert_eq!(warning.severity, "critical");
    assert!(warning.title.to_lowercase().contains("critical"));
    assert!(!warning.is_resolved);
    assert_eq!(warning.state(), WarningState::Open);

    let library = tracker.get_library_report();
    assert_eq!(library.unresolved_warnings, 1);
    // A lone knowledge snapshot still scores 1.0, so health reflects scores
    // only and the open warning is reported separately.
    assert_eq!(library.average_score, Some(1.0));
    assert_eq!(library.overall_health, LibraryHealth::Excellent);
}

#[test]
fn test_repeated_impossible_knowledge_degrades_library() {
    let tracker = SceneScript::new("c2", "Mara")
        .knowledge("s1", facts(&["the map"]))
        .knowledge("s2", {
            let mut k = impossible(&["the ending", "the traitor"]);
            k.known_facts = tags(["the map"]);
            k
        })
        .finish()
        .expect("script");

    let record = tracker.get_record("c2").unwrap();
    assert!((record.score().knowledge_score - 0.6).abs() < 1e-9);

    let library = tracker.get_library_report();
    assert_eq!(library.character_count, 1);
    assert_eq!(library.overall_health, LibraryHealth::Good);
    assert_eq!(library.unresolved_warnings, 2);
}

// =============================================================================
// SCENARIO 3: Category scores stay perfect with a single snapshot
// =============================================================================

#[test]
fn test_single_snapshot_categories_score_one() {
    let tracker = SceneScript::new("c3", "Oskar")
        .appearance("s1", hair("red"))
        .behavior(
            "s1",
            Behavior {
                mood: "sullen".to_string(),
                displayed_traits: tags(["stubborn"]),
                ..Default::default()
            },
        )
        .dialogue(
            "s1",
            Dialogue {
                vocabulary_level: "plain".to_string(),
                ..Default::default()
            },
        )
        .knowledge("s1", facts(&["the password"]))
        .finish()
        .expect("script");

    let score = tracker.get_record("c3").unwrap().score();
    assert_eq!(score.category_scores(), [1.0; 7]);
    assert_eq!(score.overall_score, 1.0);
    assert_eq!(score.relationships_score, 1.0);
    assert_eq!(score.abilities_score, 1.0);
}

// =============================================================================
// SCENARIO 3b: Clothing, behavior and dialogue drift
// =============================================================================

#[test]
fn test_clothing_behavior_and_dialogue_drift() {
    let calm = Behavior {
        mood: "calm".to_string(),
        posture: "upright".to_string(),
        ..Default::default()
    };
    let angry = Behavior {
        mood: "angry".to_string(),
        ..calm.clone()
    };
    let boots = Appearance {
        footwear: "boots".to_string(),
        ..Default::default()
    };
    let sandals = Appearance {
        footwear: "sandals".to_string(),
        ..Default::default()
    };
    let dry = Dialogue {
        tone: "dry".to_string(),
        ..Default::default()
    };
    let warm = Dialogue {
        tone: "warm".to_string(),
        ..Default::default()
    };

    let tracker = SceneScript::new("c7", "Rook")
        .behavior("s1", calm)
        .behavior("s2", angry)
        .appearance("s1", boots)
        .appearance("s2", sandals)
        .dialogue("s1", dry)
        .dialogue("s2", warm)
        .finish()
        .expect("script");

    let score = tracker.get_record("c7").unwrap().score();
    assert_eq!(score.behavior_score, 0.5);
    assert_eq!(score.dialogue_score, 0.0);
    assert_eq!(score.clothing_score, 0.0);
    assert_eq!(score.appearance_score, 1.0);
    assert_eq!(score.personality_score, 1.0);

    // clothing and dialogue at zero, behavior at half weight
    let expected = (1.0 + 0.0 + 0.8 + 0.5 + 1.0 + 0.0 + 0.9) / 6.4;
    assert!((score.overall_score - expected).abs() < 1e-9);
}

// =============================================================================
// SCENARIO 4: Accessories and traits use Jaccard similarity
// =============================================================================

#[test]
fn test_accessory_jaccard_scoring() {
    let tracker = SceneScript::new("c4", "Vera")
        .appearance("s1", accessories(&["scarf"]))
        .appearance("s2", accessories(&["scarf", "hat"]))
        .finish()
        .expect("script");

    let record = tracker.get_record("c4").unwrap();
    assert_eq!(record.score().accessories_score, 0.5);

    let additions = record.variations_in(ConsistencyCategory::Accessories);
    assert_eq!(additions.len(), 1);
    assert_eq!(additions[0].variation_type, VariationType::Addition);
    assert_eq!(additions[0].current_value, "hat");
}

#[test]
fn test_lost_traits_are_not_reported() {
    let tracker = SceneScript::new("c5", "Teo")
        .behavior(
            "s1",
            Behavior {
                displayed_traits: tags(["kind", "patient"]),
                ..Default::default()
            },
        )
        .behavior(
            "s2",
            Behavior {
                displayed_traits: tags(["kind"]),
                ..Default::default()
            },
        )
        .finish()
        .expect("script");

    let record = tracker.get_record("c5").unwrap();
    assert!(record.variations().is_empty());
    // The lost trait still lowers the personality score
    assert_eq!(record.score().personality_score, 0.5);
}

// =============================================================================
// SCENARIO 5: Warning lifecycle across characters
// =============================================================================

#[test]
fn test_warning_lifecycle_across_characters() {
    let mut tracker = SceneScript::new("c1", "Ilsa")
        .knowledge("s1", impossible(&["the heist"]))
        .then_character("c2", "Mara")
        .knowledge("s4", impossible(&["the ending"]))
        .finish()
        .expect("script");

    assert_eq!(tracker.get_active_warnings(None, None).len(), 2);
    let first = tracker.get_active_warnings(Some("c1"), None)[0].warning_id;
    let second = tracker.get_active_warnings(Some("c2"), None)[0].warning_id;

    assert!(tracker.acknowledge(first));
    assert_eq!(
        tracker.get_warning(first).unwrap().state(),
        WarningState::Acknowledged
    );

    assert!(tracker.resolve(second));
    let resolved_at = tracker.get_warning(second).unwrap().resolved_at;
    assert!(tracker.resolve(second));
    assert_eq!(tracker.get_warning(second).unwrap().resolved_at, resolved_at);
    assert_eq!(tracker.get_active_warnings(None, None).len(), 1);

    let report = tracker.get_character_report("c2", false, true).unwrap();
    assert_eq!(report.warning_count, 1);
    assert_eq!(report.unresolved_warning_count, 0);
    assert_eq!(report.warnings, Some(Vec::new()));
}

// =============================================================================
// SCENARIO 6: Scene bookkeeping
// =============================================================================

#[test]
fn test_scene_count_tracks_appearance_only() {
    let tracker = SceneScript::new("c6", "Juno")
        .appearance("s1", Appearance::default())
        .dialogue("s2", Dialogue::default())
        .knowledge("s3", facts(&[]))
        .finish()
        .expect("script");

    let record = tracker.get_record("c6").unwrap();
    assert_eq!(record.scene_count, 1);
    assert_eq!(record.first_scene.as_deref(), Some("s1"));
    assert_eq!(record.last_scene.as_deref(), Some("s3"));
    assert_eq!(record.observed_scenes().len(), 3);
}
