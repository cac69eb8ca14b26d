//! Game Events
//!
//! Events emitted by the state machine. The presentation layer renders them;
//! transcripts and tests inspect them.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::game::catalog::{Icon, PostTemplate};
use crate::game::scoring::ScoreDelta;
use crate::game::state::{Phase, RunSummary};
use crate::game::timer::TimerReading;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A fresh run began
    RunStarted {
        /// Score after reset (always 0)
        score: i32,
        /// Multiplier after reset (always 1)
        multiplier: i32,
    },

    /// State machine phase changed
    PhaseChanged {
        /// Previous phase
        old_phase: Phase,
        /// New phase
        new_phase: Phase,
    },

    /// A new post is on screen
    RoundStarted {
        /// Post to react to
        template: PostTemplate,
        /// Offered icons in display order
        choices: Vec<Icon>,
        /// Countdown length
        duration_ms: Millis,
    },

    /// Countdown display refresh
    TimerUpdated {
        /// Display snapshot
        reading: TimerReading,
    },

    /// Countdown entered the critical zone (once per round)
    TimerCritical,

    /// Whole-run clock advanced a second
    ClockTick {
        /// Seconds since the run started
        elapsed_secs: u64,
    },

    /// Round scored
    RoundResolved {
        /// Picked icon, `None` on timeout
        picked: Option<String>,
        /// Points breakdown
        delta: ScoreDelta,
        /// Score after the round
        score: i32,
        /// Streak after the round
        streak: u32,
        /// Multiplier for the next round
        multiplier: i32,
    },

    /// Run finished
    RunEnded {
        /// Final statistics
        summary: RunSummary,
    },
}

/// A game event stamped with host time and round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Host time of the input that produced the event
    pub at_ms: Millis,

    /// Round the event belongs to (0 before the first post)
    pub round: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(at_ms: Millis, round: u32, data: GameEventData) -> Self {
        Self { at_ms, round, data }
    }

    /// Create run started event.
    pub fn run_started(at_ms: Millis, multiplier: i32) -> Self {
        Self::new(at_ms, 0, GameEventData::RunStarted { score: 0, multiplier })
    }

    /// Create phase change event.
    pub fn phase_changed(at_ms: Millis, round: u32, old_phase: Phase, new_phase: Phase) -> Self {
        Self::new(at_ms, round, GameEventData::PhaseChanged { old_phase, new_phase })
    }

    /// Create round started event.
    pub fn round_started(
        at_ms: Millis,
        round: u32,
        template: PostTemplate,
        choices: Vec<Icon>,
        duration_ms: Millis,
    ) -> Self {
        Self::new(at_ms, round, GameEventData::RoundStarted { template, choices, duration_ms })
    }

    /// Create timer update event.
    pub fn timer_updated(at_ms: Millis, round: u32, reading: TimerReading) -> Self {
        Self::new(at_ms, round, GameEventData::TimerUpdated { reading })
    }

    /// Create round resolved event.
    pub fn round_resolved(
        at_ms: Millis,
        round: u32,
        picked: Option<String>,
        delta: ScoreDelta,
        score: i32,
        streak: u32,
    ) -> Self {
        Self::new(at_ms, round, GameEventData::RoundResolved {
            picked,
            delta,
            score,
            streak,
            multiplier: delta.new_multiplier,
        })
    }

    /// Create run ended event.
    pub fn run_ended(at_ms: Millis, round: u32, summary: RunSummary) -> Self {
        Self::new(at_ms, round, GameEventData::RunEnded { summary })
    }

    /// Score delta carried by a `RoundResolved` event.
    pub fn delta(&self) -> Option<&ScoreDelta> {
        match &self.data {
            GameEventData::RoundResolved { delta, .. } => Some(delta),
            _ => None,
        }
    }
}
