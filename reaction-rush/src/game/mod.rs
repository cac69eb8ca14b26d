//! Game Logic Module
//!
//! Round lifecycle and scoring. Deterministic given a seed and timed inputs.
//!
//! ## Module Structure
//!
//! - `catalog`: Icons and post templates
//! - `queue`: No-repeat post selection
//! - `choices`: Six-icon choice builder
//! - `timer`: Round countdown and time bands
//! - `scoring`: Pick/timeout to score delta
//! - `state`: Run and round state
//! - `input`: Host inputs
//! - `events`: Events for presentation and replay
//! - `engine`: The run state machine

pub mod catalog;
pub mod queue;
pub mod choices;
pub mod timer;
pub mod scoring;
pub mod state;
pub mod input;
pub mod events;
pub mod engine;

// Re-export key types
pub use catalog::{Catalog, CatalogError, Icon, PostTemplate, Tier};
pub use choices::CHOICE_COUNT;
pub use engine::{Game, StepResult};
pub use events::{GameEvent, GameEventData};
pub use input::PlayerInput;
pub use scoring::{Category, Outcome, ScoreDelta, ScoringConfig};
pub use state::{OutcomeCounts, Phase, RunState, RunSummary, WinRank};
pub use timer::{TimeBands, TimerReading, Urgency};
