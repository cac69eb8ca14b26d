//! Presentation Bridge
//!
//! The core never draws anything. A UI layer implements
//! [`PresentationBridge`]; [`Session`] drives a [`Game`] and forwards its
//! events to the bridge in order.

pub mod recording;
pub mod log;

use crate::core::clock::Millis;
use crate::game::catalog::{Icon, PostTemplate};
use crate::game::engine::{Game, StepResult};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::PlayerInput;
use crate::game::scoring::Category;
use crate::game::state::{Phase, RunSummary};
use crate::game::timer::TimerReading;

pub use recording::{BridgeCall, RecordingBridge};
pub use log::LogBridge;

/// UI surface the game talks to.
pub trait PresentationBridge {
    /// Opaque handle for a rendered post, used to mark it after scoring.
    type Handle;

    /// Show a post. The returned handle stays associated with the round.
    fn render_post(&mut self, template: &PostTemplate) -> Self::Handle;

    /// Show the selectable icons in display order.
    fn render_choices(&mut self, choices: &[Icon]);

    /// Refresh the countdown (100ms cadence).
    fn update_timer_display(&mut self, reading: &TimerReading);

    /// Refresh score, streak and next-round multiplier.
    fn update_scoreboard(&mut self, score: i32, streak: u32, multiplier: i32);

    /// Flash the outcome of a round.
    fn show_outcome_feedback(
        &mut self,
        category: Category,
        total_points: i32,
        time_bonus_applied: bool,
        multiplier: i32,
    );

    /// Show the end screen.
    fn show_run_summary(&mut self, summary: &RunSummary);

    /// Mark a rendered post with how it was answered.
    fn mark_post(&mut self, _handle: &Self::Handle, _category: Category) {}

    /// Refresh the whole-run clock.
    fn update_run_clock(&mut self, _elapsed_secs: u64) {}

    /// Countdown just entered its critical zone.
    fn timer_critical(&mut self) {}

    /// Phase changed (menu, playing, end screens).
    fn phase_changed(&mut self, _old: Phase, _new: Phase) {}
}

/// A game wired to a bridge.
pub struct Session<B: PresentationBridge> {
    game: Game,
    bridge: B,
    handle: Option<B::Handle>,
}

impl<B: PresentationBridge> Session<B> {
    /// Wrap an idle game.
    pub fn new(game: Game, bridge: B) -> Self {
        Self { game, bridge, handle: None }
    }

    /// The underlying game.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The bridge.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Mutable bridge access.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Handle of the post currently on screen.
    pub fn current_handle(&self) -> Option<&B::Handle> {
        self.handle.as_ref()
    }

    /// Split back into game and bridge.
    pub fn into_parts(self) -> (Game, B) {
        (self.game, self.bridge)
    }

    /// Start or replay.
    pub fn start(&mut self, now: Millis) -> StepResult {
        self.apply(&PlayerInput::Start, now)
    }

    /// Return to the menu.
    pub fn back_to_menu(&mut self, now: Millis) -> StepResult {
        self.apply(&PlayerInput::BackToMenu, now)
    }

    /// Choice callback from the UI (click).
    pub fn submit_choice(&mut self, icon_id: &str, now: Millis) -> StepResult {
        let result = self.game.submit_choice(icon_id, now);
        self.dispatch(&result.events);
        result
    }

    /// Choice callback from the UI (keyboard slot).
    pub fn submit_slot(&mut self, index: usize, now: Millis) -> StepResult {
        self.apply(&PlayerInput::Slot { index }, now)
    }

    /// Periodic host poll.
    pub fn tick(&mut self, now: Millis) -> StepResult {
        self.apply(&PlayerInput::Tick, now)
    }

    /// Apply any input and render what it produced.
    pub fn apply(&mut self, input: &PlayerInput, now: Millis) -> StepResult {
        let result = self.game.apply(input, now);
        self.dispatch(&result.events);
        result
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            self.forward(event);
        }
    }

    fn forward(&mut self, event: &GameEvent) {
        match &event.data {
            GameEventData::RunStarted { score, multiplier } => {
                self.bridge.update_scoreboard(*score, 0, *multiplier);
            }
            GameEventData::PhaseChanged { old_phase, new_phase } => {
                if *new_phase == Phase::Idle {
                    self.handle = None;
                }
                self.bridge.phase_changed(*old_phase, *new_phase);
            }
            GameEventData::RoundStarted { template, choices, .. } => {
                self.handle = Some(self.bridge.render_post(template));
                self.bridge.render_choices(choices);
            }
            GameEventData::TimerUpdated { reading } => {
                self.bridge.update_timer_display(reading);
            }
            GameEventData::TimerCritical => {
                self.bridge.timer_critical();
            }
            GameEventData::ClockTick { elapsed_secs } => {
                self.bridge.update_run_clock(*elapsed_secs);
            }
            GameEventData::RoundResolved { delta, score, streak, multiplier, .. } => {
                if let Some(handle) = &self.handle {
                    self.bridge.mark_post(handle, delta.category);
                }
                self.bridge.show_outcome_feedback(
                    delta.category,
                    delta.total_points,
                    delta.time_bonus_applied(),
                    delta.multiplier,
                );
                self.bridge.update_scoreboard(*score, *streak, *multiplier);
            }
            GameEventData::RunEnded { summary } => {
                self.handle = None;
                self.bridge.show_run_summary(summary);
            }
        }
    }
}
