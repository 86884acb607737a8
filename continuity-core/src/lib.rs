//! Character continuity engine for multi-scene narrative production.
//!
//! This crate provides:
//! - Per-scene snapshots of a character's appearance, behavior, dialogue and knowledge
//! - Drift detection between consecutive snapshots of the same category
//! - Weighted consistency scores with a derived status
//! - Warnings for impossible knowledge, with an acknowledge/resolve lifecycle
//! - Per-character and library-wide reports
//! - A lossless serialization contract for saving and reloading a tracker
//!
//! # Quick Start
//!
//! ```
//! use continuity_core::{Appearance, ConsistencyTracker};
//!
//! # fn main() -> continuity_core::Result<()> {
//! let mut tracker = ConsistencyTracker::new();
//!
//! let black = Appearance { hair_color: "black".into(), ..Default::default() };
//! let blonde = Appearance { hair_color: "blonde".into(), ..Default::default() };
//! tracker.record_scene_appearance("c1", "Ilsa", "s1", black)?;
//! tracker.record_scene_appearance("c1", "Ilsa", "s2", blonde)?;
//!
//! let report = tracker.get_character_report("c1", true, true).unwrap();
//! assert_eq!(report.variation_count, 1);
//!
//! let json = tracker.save().to_json()?;
//! # let _ = json;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod persist;
pub mod record;
pub mod report;
pub mod score;
pub mod snapshot;
pub mod testing;
pub mod tracker;
pub mod variation;
pub mod warning;

// Primary public API
pub use config::{SceneCountMode, TrackerConfig};
pub use detect::Observation;
pub use error::{ContinuityError, Result};
pub use persist::SavedLibrary;
pub use record::CharacterConsistencyRecord;
pub use report::{CharacterReport, LibraryHealth, LibraryReport, TrackerStats};
pub use score::{CategoryWeights, ConsistencyScore, ConsistencyStatus};
pub use snapshot::{Appearance, Behavior, Dialogue, Knowledge, Snapshot};
pub use tracker::{ConsistencyTracker, TrackerCounters};
pub use variation::{ConsistencyCategory, StoryImpact, Variation, VariationSeverity, VariationType};
pub use warning::{ConsistencyWarning, WarningId, WarningState};
