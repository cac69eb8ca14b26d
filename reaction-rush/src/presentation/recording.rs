//! In-memory bridge that records every call.

use crate::game::catalog::{Icon, PostTemplate};
use crate::game::scoring::Category;
use crate::game::state::{Phase, RunSummary};
use crate::game::timer::{TimerReading, Urgency};

use super::PresentationBridge;

/// A recorded bridge call.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeCall {
    /// `render_post`
    RenderPost {
        /// Handle handed back to the session
        handle: u32,
        /// Post text
        text: String,
    },
    /// `render_choices`, icon ids in display order
    RenderChoices(Vec<String>),
    /// `update_timer_display`
    TimerDisplay {
        /// Fraction remaining
        fraction: f64,
        /// Seconds remaining
        seconds: f64,
        /// Display urgency
        urgency: Urgency,
    },
    /// `update_scoreboard`
    Scoreboard {
        /// Score
        score: i32,
        /// Streak
        streak: u32,
        /// Next-round multiplier
        multiplier: i32,
    },
    /// `show_outcome_feedback`
    OutcomeFeedback {
        /// Category
        category: Category,
        /// Points
        total_points: i32,
        /// Speed bonus applied
        time_bonus_applied: bool,
        /// Multiplier applied
        multiplier: i32,
    },
    /// `show_run_summary`
    Summary(RunSummary),
    /// `mark_post`
    MarkPost {
        /// Post handle
        handle: u32,
        /// Category
        category: Category,
    },
    /// `update_run_clock`
    RunClock(u64),
    /// `timer_critical`
    TimerCritical,
    /// `phase_changed`
    Phase {
        /// Previous phase
        old: Phase,
        /// New phase
        new: Phase,
    },
}

/// Bridge that keeps a log of calls. Handles are sequential post numbers.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Vec<BridgeCall>,
    next_handle: u32,
}

impl RecordingBridge {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far.
    pub fn calls(&self) -> &[BridgeCall] {
        &self.calls
    }

    /// Forget recorded calls (handles keep counting).
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Take the recorded calls.
    pub fn take_calls(&mut self) -> Vec<BridgeCall> {
        std::mem::take(&mut self.calls)
    }

    /// Last summary shown, if any.
    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.calls.iter().rev().find_map(|call| match call {
            BridgeCall::Summary(summary) => Some(summary),
            _ => None,
        })
    }

    /// Every outcome shown, in order.
    pub fn outcomes(&self) -> Vec<Category> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BridgeCall::OutcomeFeedback { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }
}

impl PresentationBridge for RecordingBridge {
    type Handle = u32;

    fn render_post(&mut self, template: &PostTemplate) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.calls.push(BridgeCall::RenderPost { handle, text: template.text.clone() });
        handle
    }

    fn render_choices(&mut self, choices: &[Icon]) {
        self.calls.push(BridgeCall::RenderChoices(choices.iter().map(|i| i.id.clone()).collect()));
    }

    fn update_timer_display(&mut self, reading: &TimerReading) {
        self.calls.push(BridgeCall::TimerDisplay {
            fraction: reading.fraction_remaining,
            seconds: reading.seconds_remaining,
            urgency: reading.urgency,
        });
    }

    fn update_scoreboard(&mut self, score: i32, streak: u32, multiplier: i32) {
        self.calls.push(BridgeCall::Scoreboard { score, streak, multiplier });
    }

    fn show_outcome_feedback(
        &mut self,
        category: Category,
        total_points: i32,
        time_bonus_applied: bool,
        multiplier: i32,
    ) {
        self.calls.push(BridgeCall::OutcomeFeedback {
            category,
            total_points,
            time_bonus_applied,
            multiplier,
        });
    }

    fn show_run_summary(&mut self, summary: &RunSummary) {
        self.calls.push(BridgeCall::Summary(summary.clone()));
    }

    fn mark_post(&mut self, handle: &u32, category: Category) {
        self.calls.push(BridgeCall::MarkPost { handle: *handle, category });
    }

    fn update_run_clock(&mut self, elapsed_secs: u64) {
        self.calls.push(BridgeCall::RunClock(elapsed_secs));
    }

    fn timer_critical(&mut self) {
        self.calls.push(BridgeCall::TimerCritical);
    }

    fn phase_changed(&mut self, old: Phase, new: Phase) {
        self.calls.push(BridgeCall::Phase { old, new });
    }
}
