//! Actionable warnings raised from severe variations.
//!
//! A warning starts open, may be acknowledged, and ends resolved. There is
//! no way back from resolved and warnings are never deleted.

use crate::variation::{ConsistencyCategory, Variation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarningId(Uuid);

impl WarningId {
    /// Create a new unique warning ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WarningId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WarningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WarningId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Where a warning is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningState {
    Open,
    Acknowledged,
    Resolved,
}

/// Sort rank of a warning severity. Lower sorts first; unknown text sorts last.
pub fn severity_rank(severity: &str) -> u8 {
    const RANKS: [(&str, u8); 4] = [("critical", 0), ("error", 1), ("warning", 2), ("info", 3)];
    RANKS
        .iter()
        .find(|(name, _)| severity.eq_ignore_ascii_case(name))
        .map(|(_, rank)| *rank)
        .unwrap_or(u8::MAX)
}

/// An actionable alert about a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsistencyWarning {
    pub warning_id: WarningId,
    pub character_id: String,
    pub category: ConsistencyCategory,
    /// Free text, mirrors the triggering variation's severity.
    pub severity: String,
    pub title: String,
    pub description: String,
    /// Scene where the problem shows up.
    pub scene_id: String,
    /// Other scenes involved, oldest first.
    pub related_scenes: Vec<String>,
    pub suggestion: String,
    pub acknowledged: bool,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ConsistencyWarning {
    /// Raise a warning for a knowledge contradiction.
    pub fn from_contradiction(
        character_id: impl Into<String>,
        character_name: &str,
        variation: &Variation,
    ) -> Self {
        let severity = variation.severity.as_str();
        let mut related_scenes: Vec<String> = variation.previous_scene_id.iter().cloned().collect();
        related_scenes.push(variation.scene_id.clone());

        Self {
            warning_id: WarningId::new(),
            character_id: character_id.into(),
            category: variation.category,
            severity: severity.to_string(),
            title: format!("{}: impossible knowledge", severity.to_uppercase()),
            description: format!(
                "{character_name} knows '{}' in scene {} before the story has revealed it",
                variation.current_value, variation.scene_id
            ),
            scene_id: variation.scene_id.clone(),
            related_scenes,
            suggestion: variation.suggestion.clone(),
            acknowledged: false,
            is_resolved: false,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark as seen. Does nothing else.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    /// Mark as resolved. The first call stamps `resolved_at`; later calls
    /// leave it alone.
    pub fn resolve(&mut self) {
        if !self.is_resolved {
            self.is_resolved = true;
            self.resolved_at = Some(Utc::now());
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WarningState {
        if self.is_resolved {
            WarningState::Resolved
        } else if self.acknowledged {
            WarningState::Acknowledged
        } else {
            WarningState::Open
        }
    }

    /// Sort rank of this warning's severity.
    pub fn rank(&self) -> u8 {
        severity_rank(&self.severity)
    }
}
