//! Serialization contract for saving and reloading a tracker.
//!
//! The engine does no I/O. A host stores the JSON text or `Value` tree
//! wherever it likes and hands it back to [`SavedLibrary::from_json`] or
//! [`SavedLibrary::from_value`] to resume.

use crate::config::TrackerConfig;
use crate::error::{ContinuityError, Result};
use crate::record::CharacterConsistencyRecord;
use crate::tracker::{ConsistencyTracker, TrackerCounters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// A saved tracker: configuration, counters and every record's full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedLibrary {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: DateTime<Utc>,

    /// Configuration the tracker was running with.
    pub config: TrackerConfig,

    /// Running totals.
    pub counters: TrackerCounters,

    /// Records sorted by character id.
    pub records: Vec<CharacterConsistencyRecord>,
}

/// Just enough of a save to check its version before a full parse.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

fn check_version(found: u32) -> Result<()> {
    if found != SAVE_VERSION {
        return Err(ContinuityError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

impl SavedLibrary {
    /// Serialize to pretty JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON text, rejecting other format versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        check_version(probe.version)?;
        Ok(serde_json::from_str(json)?)
    }

    /// Convert to a generic JSON tree.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild from a generic JSON tree, rejecting other format versions.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let probe = VersionProbe::deserialize(&value)?;
        check_version(probe.version)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl ConsistencyTracker {
    /// Capture the full tracker state.
    pub fn save(&self) -> SavedLibrary {
        let mut records: Vec<CharacterConsistencyRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.character_id.cmp(&b.character_id));

        SavedLibrary {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            config: self.config.clone(),
            counters: self.counters,
            records,
        }
    }

    /// Rebuild a tracker from a save.
    ///
    /// Fails on a save holding two records for one character, or a record
    /// whose score belongs to another character.
    pub fn restore(saved: SavedLibrary) -> Result<Self> {
        check_version(saved.version)?;
        saved.config.validate()?;

        let mut records = HashMap::with_capacity(saved.records.len());
        for record in saved.records {
            if record.score().character_id != record.character_id {
                return Err(ContinuityError::InvalidSave(format!(
                    "record `{}` carries a score for `{}`",
                    record.character_id,
                    record.score().character_id
                )));
            }
            match records.entry(record.character_id.clone()) {
                Entry::Occupied(entry) => {
                    return Err(ContinuityError::InvalidSave(format!(
                        "duplicate record for character `{}`",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }

        Ok(Self {
            config: saved.config,
            records,
            counters: saved.counters,
        })
    }
}
