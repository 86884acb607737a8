//! Testing utilities for the continuity engine.
//!
//! This module provides:
//! - `SceneScript` for driving one character through scripted scenes
//! - Small fixture constructors for common observations

use crate::error::{ContinuityError, Result};
use crate::snapshot::{tags, Appearance, Behavior, Dialogue, Knowledge};
use crate::tracker::ConsistencyTracker;

/// A scripted sequence of scenes for one character.
///
/// Ingestion errors are held until [`SceneScript::finish`].
pub struct SceneScript {
    tracker: ConsistencyTracker,
    character_id: String,
    character_name: String,
    error: Option<ContinuityError>,
}

impl SceneScript {
    /// Script scenes for a character on a fresh tracker.
    pub fn new(character_id: impl Into<String>, character_name: impl Into<String>) -> Self {
        Self::on(ConsistencyTracker::new(), character_id, character_name)
    }

    /// Script scenes for a character on an existing tracker.
    pub fn on(
        tracker: ConsistencyTracker,
        character_id: impl Into<String>,
        character_name: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            character_id: character_id.into(),
            character_name: character_name.into(),
            error: None,
        }
    }

    fn step(
        mut self,
        ingest: impl FnOnce(&mut ConsistencyTracker, &str, &str) -> Result<()>,
    ) -> Self {
        if self.error.is_none() {
            if let Err(e) = ingest(&mut self.tracker, &self.character_id, &self.character_name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Add an appearance observation.
    pub fn appearance(self, scene_id: &str, appearance: Appearance) -> Self {
        self.step(|t, id, name| {
            t.record_scene_appearance(id, name, scene_id, appearance)
                .map(drop)
        })
    }

    /// Add a behavior observation.
    pub fn behavior(self, scene_id: &str, behavior: Behavior) -> Self {
        self.step(|t, id, name| t.record_scene_behavior(id, name, scene_id, behavior).map(drop))
    }

    /// Add a dialogue observation.
    pub fn dialogue(self, scene_id: &str, dialogue: Dialogue) -> Self {
        self.step(|t, id, name| t.record_scene_dialogue(id, name, scene_id, dialogue).map(drop))
    }

    /// Add a knowledge observation.
    pub fn knowledge(self, scene_id: &str, knowledge: Knowledge) -> Self {
        self.step(|t, id, name| {
            t.record_scene_knowledge(id, name, scene_id, knowledge)
                .map(drop)
        })
    }

    /// Switch to scripting another character on the same tracker.
    pub fn then_character(
        self,
        character_id: impl Into<String>,
        character_name: impl Into<String>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            character_name: character_name.into(),
            ..self
        }
    }

    /// Return the tracker, or the first ingestion error.
    pub fn finish(self) -> Result<ConsistencyTracker> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.tracker),
        }
    }
}

/// An appearance with only a hair color.
pub fn hair(color: &str) -> Appearance {
    Appearance {
        hair_color: color.to_string(),
        ..Default::default()
    }
}

/// An appearance carrying the given accessories.
pub fn accessories(items: &[&str]) -> Appearance {
    Appearance {
        accessories: tags(items.iter().copied()),
        ..Default::default()
    }
}

/// Knowledge of the given facts.
pub fn facts(known: &[&str]) -> Knowledge {
    Knowledge {
        known_facts: tags(known.iter().copied()),
        ..Default::default()
    }
}

/// Knowledge the character cannot have yet.
pub fn impossible(items: &[&str]) -> Knowledge {
    Knowledge {
        impossible_knowledge: tags(items.iter().copied()),
        ..Default::default()
    }
}
