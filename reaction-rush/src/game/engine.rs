//! Run State Machine
//!
//! Idle -> Playing -> Won | Lost, and back. Every operation takes the host
//! time explicitly and returns the events it produced; nothing here reads a
//! clock or sleeps.
//!
//! A round can be resolved by a pick or by its countdown expiring. Whichever
//! lands first wins; the other becomes a no-op because the round is already
//! marked resolved and its timer cancelled.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, GameConfig};
use crate::core::clock::Millis;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::catalog::Catalog;
use crate::game::choices;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::PlayerInput;
use crate::game::scoring::{self, Outcome};
use crate::game::state::{PendingAdvance, Phase, RoundState, RunState};
use crate::game::timer::{TimerPoll, TimerReading, RUN_CLOCK_TICK_MS};

/// Result of one state machine step.
#[derive(Debug, Default)]
pub struct StepResult {
    /// Events generated by this step
    pub events: Vec<GameEvent>,
    /// Whether the run ended during this step
    pub run_ended: bool,
}

impl StepResult {
    /// Nothing happened.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One play session: catalog, rules, randomness and the current run.
///
/// The RNG is seeded once per session and carries across replays, so a
/// session is fully determined by its seed and its input sequence.
#[derive(Clone, Debug)]
pub struct Game {
    catalog: Arc<Catalog>,
    config: GameConfig,
    rng_seed: u64,
    rng: DeterministicRng,
    run: RunState,
}

impl Game {
    /// Create an idle session.
    pub fn new(catalog: Arc<Catalog>, config: GameConfig, rng_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            run: RunState::default(),
        })
    }

    /// Current run state.
    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.run.phase
    }

    /// Live round, if any.
    pub fn current_round(&self) -> Option<&RoundState> {
        self.run.round.as_ref()
    }

    /// Rules in force.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Icon and post catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Seed the session RNG was created with.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Hash of the run state and RNG position.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.run.rounds_seen, self.rng_seed, |h| {
            self.run.hash_into(h);
            let [s0, s1] = self.rng.state();
            h.update_u64(s0);
            h.update_u64(s1);
        })
    }

    /// Apply a host input at `now`.
    pub fn apply(&mut self, input: &PlayerInput, now: Millis) -> StepResult {
        match input {
            PlayerInput::Start => self.start(now),
            PlayerInput::BackToMenu => self.back_to_menu(now),
            PlayerInput::Choose { icon_id } => self.submit_choice(icon_id, now),
            PlayerInput::Slot { index } => self.submit_slot(*index, now),
            PlayerInput::Tick => self.tick(now),
        }
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Begin a fresh run. Accepted from Idle, Won and Lost.
    pub fn start(&mut self, now: Millis) -> StepResult {
        let mut result = StepResult::default();

        if !self.run.phase.can_start() {
            trace!("start ignored while playing");
            return result;
        }

        let old_phase = self.run.phase;
        self.run.cancel_scheduled();
        self.run = RunState::start(now);

        info!("Run started at {}ms", now);
        let multiplier = self.run.current_multiplier(&self.config.scoring);
        result.events.push(GameEvent::run_started(now, multiplier));
        result.events.push(GameEvent::phase_changed(now, 0, old_phase, Phase::Playing));

        self.begin_round(now, &mut result);
        result
    }

    /// Abandon the current run (or leave an end screen) and go idle.
    pub fn back_to_menu(&mut self, now: Millis) -> StepResult {
        let mut result = StepResult::default();

        if self.run.phase == Phase::Idle {
            return result;
        }

        let old_phase = self.run.phase;
        let round = self.run.rounds_seen;
        self.run.cancel_scheduled();
        self.run.phase = Phase::Idle;

        debug!("Back to menu from {:?}", old_phase);
        result.events.push(GameEvent::phase_changed(now, round, old_phase, Phase::Idle));
        result
    }

    /// Pick an icon by id.
    ///
    /// Ignored unless a run is active and the current round is unresolved.
    /// Ids outside the template's tiers score as Wrong.
    pub fn submit_choice(&mut self, icon_id: &str, now: Millis) -> StepResult {
        let mut result = StepResult::default();

        let Some(round) = self.run.round.as_ref().filter(|_| self.run.is_active()) else {
            trace!("pick {} ignored: no live round", icon_id);
            return result;
        };
        if round.resolved {
            trace!("pick {} ignored: round {} already resolved", icon_id, round.number);
            return result;
        }

        let reaction_ms = now.saturating_sub(round.started_at);
        let outcome = Outcome::PickedIcon { icon_id: icon_id.to_string(), reaction_ms };
        self.resolve_round(outcome, now, &mut result);
        result
    }

    /// Pick the icon at a 0-based display slot.
    pub fn submit_slot(&mut self, index: usize, now: Millis) -> StepResult {
        let icon_id = self
            .run
            .round
            .as_ref()
            .and_then(|round| round.choice_id(index))
            .map(str::to_string);

        match icon_id {
            Some(id) => self.submit_choice(&id, now),
            None => {
                trace!("slot {} ignored: nothing there", index);
                StepResult::default()
            }
        }
    }

    /// Periodic poll: run clock, countdown, pending advance.
    pub fn tick(&mut self, now: Millis) -> StepResult {
        let mut result = StepResult::default();

        if !self.run.is_active() {
            return result;
        }

        self.update_run_clock(now, &mut result);

        let round = self.run.rounds_seen;
        match self.run.timer.poll(now) {
            TimerPoll::Idle => {}
            TimerPoll::Running { reading, entered_critical } => {
                result.events.push(GameEvent::timer_updated(now, round, reading));
                if entered_critical {
                    result.events.push(GameEvent::new(now, round, GameEventData::TimerCritical));
                }
            }
            TimerPoll::Expired => {
                self.resolve_round(Outcome::Timeout, now, &mut result);
            }
        }

        if let Some(pending) = self.run.pending_advance {
            if self.run.is_active() && now >= pending.due_at {
                self.run.pending_advance = None;
                self.begin_round(now, &mut result);
            }
        }

        result
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn update_run_clock(&mut self, now: Millis, result: &mut StepResult) {
        let elapsed_secs = now.saturating_sub(self.run.started_at) / RUN_CLOCK_TICK_MS;
        if elapsed_secs > self.run.clock_secs_reported {
            self.run.clock_secs_reported = elapsed_secs;
            result.events.push(GameEvent::new(
                now,
                self.run.rounds_seen,
                GameEventData::ClockTick { elapsed_secs },
            ));
        }
    }

    fn begin_round(&mut self, now: Millis, result: &mut StepResult) {
        let Some(template_index) = self
            .run
            .message_queue
            .next_post(self.catalog.template_count(), &mut self.rng)
        else {
            warn!("Catalog has no post templates; cannot begin a round");
            return;
        };

        let template = self.catalog.templates()[template_index].clone();
        let choices = choices::build_choices(&template, &self.catalog, &mut self.rng);
        let duration_ms = self.config.rules.time_bands.limit_for(self.run.score);

        self.run.rounds_seen += 1;
        let number = self.run.rounds_seen;

        debug!("Round {}: template {} for {}ms", number, template_index, duration_ms);

        self.run.round = Some(RoundState {
            number,
            template_index,
            template: template.clone(),
            choices: choices.clone(),
            started_at: now,
            resolved: false,
        });
        self.run.timer.start(now, duration_ms);

        result.events.push(GameEvent::round_started(now, number, template, choices, duration_ms));
        result.events.push(GameEvent::timer_updated(now, number, TimerReading::full(duration_ms)));
    }

    fn resolve_round(&mut self, outcome: Outcome, now: Millis, result: &mut StepResult) {
        let Some(round) = self.run.round.as_mut() else {
            return;
        };
        if !round.try_resolve() {
            return;
        }
        self.run.timer.cancel();

        let number = round.number;
        let delta = scoring::resolve(&self.config.scoring, &round.template, self.run.streak, &outcome);
        self.run.apply(&delta);

        let picked = match outcome {
            Outcome::PickedIcon { icon_id, .. } => Some(icon_id),
            Outcome::Timeout => None,
        };
        let was_pick = picked.is_some();

        debug!(
            "Round {} resolved {:?}: {:+} -> score {}, streak {}",
            number, delta.category, delta.total_points, self.run.score, self.run.streak
        );

        result.events.push(GameEvent::round_resolved(
            now,
            number,
            picked,
            delta,
            self.run.score,
            self.run.streak,
        ));

        let rules = &self.config.rules;
        if was_pick && self.run.score >= rules.target_score {
            self.end_run(Phase::Won, now, result);
        } else if self.run.score <= rules.lose_floor {
            self.end_run(Phase::Lost, now, result);
        } else {
            let delay = if was_pick {
                rules.pick_advance_delay_ms
            } else {
                rules.timeout_advance_delay_ms
            };
            self.run.pending_advance = Some(PendingAdvance { due_at: now + delay });
        }
    }

    fn end_run(&mut self, phase: Phase, now: Millis, result: &mut StepResult) {
        let old_phase = self.run.phase;
        let round = self.run.rounds_seen;

        self.run.cancel_scheduled();
        self.run.phase = phase;
        self.run.ended_at = Some(now);

        let summary = self.run.summary(now);
        info!(
            "Run {:?} with score {} after {} rounds (best streak {})",
            phase, summary.score, summary.rounds_seen, summary.best_streak
        );

        result.events.push(GameEvent::phase_changed(now, round, old_phase, phase));
        result.events.push(GameEvent::run_ended(now, round, summary));
        result.run_ended = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{Icon, PostTemplate, Tier};
    use crate::game::scoring::Category;

    fn catalog() -> Arc<Catalog> {
        let icons = ["wolf", "shock", "fire1", "crying", "brain", "basket", "butter", "sock"]
            .iter()
            .map(|id| Icon::new(*id, *id, format!("icon-{id}.png")))
            .collect();
        let template = PostTemplate::new("I feel like howling at the moon")
            .with_tier(Tier::Perfect, ["wolf"])
            .with_tier(Tier::Correct, ["shock"])
            .with_tier(Tier::Neutral, ["fire1"])
            .with_tier(Tier::Wrong, ["crying", "brain"])
            .with_tier(Tier::Horrible, ["basket", "butter"]);
        Arc::new(Catalog::new(icons, vec![template]).unwrap())
    }

    fn game() -> Game {
        Game::new(catalog(), GameConfig::default(), 42).unwrap()
    }

    fn deltas(result: &StepResult) -> Vec<Category> {
        result.events.iter().filter_map(|e| e.delta()).map(|d| d.category).collect()
    }

    #[test]
    fn test_start_emits_first_round() {
        let mut game = game();
        let result = game.start(0);

        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.run().rounds_seen, 1);
        assert!(result.events.iter().any(|e| matches!(
            &e.data,
            GameEventData::RoundStarted { duration_ms: 10_000, choices, .. } if choices.len() == 6
        )));
        assert!(game.run().timer.is_active());
    }

    #[test]
    fn test_start_ignored_while_playing() {
        let mut game = game();
        game.start(0);
        let hash = game.compute_hash();
        assert!(game.start(50).is_empty());
        assert_eq!(game.compute_hash(), hash);
    }

    #[test]
    fn test_perfect_pick_scores_and_schedules_advance() {
        let mut game = game();
        game.start(0);

        let result = game.submit_choice("wolf", 400);
        assert_eq!(deltas(&result), vec![Category::Perfect]);
        assert_eq!(game.run().score, 7);
        assert_eq!(game.run().streak, 1);
        assert!(!game.run().timer.is_active());
        assert_eq!(game.run().pending_advance, Some(PendingAdvance { due_at: 1_000 }));

        // Too early for the next post
        assert!(game.tick(900).events.iter().all(|e| e.delta().is_none()));
        assert_eq!(game.run().rounds_seen, 1);

        game.tick(1_000);
        assert_eq!(game.run().rounds_seen, 2);
        assert!(game.run().timer.is_active());
    }

    #[test]
    fn test_second_pick_is_ignored() {
        let mut game = game();
        game.start(0);
        game.submit_choice("shock", 100);
        assert!(game.submit_choice("wolf", 200).is_empty());
        assert_eq!(game.run().score, 4);
    }

    #[test]
    fn test_timeout_then_pick_scores_once() {
        let mut game = game();
        game.start(0);

        let expired = game.tick(10_000);
        assert_eq!(deltas(&expired), vec![Category::Timeout]);
        assert_eq!(game.run().score, -2);
        assert_eq!(game.run().pending_advance, Some(PendingAdvance { due_at: 10_800 }));

        assert!(game.submit_choice("wolf", 10_050).is_empty());
        assert_eq!(game.run().counts.total(), 1);
    }

    #[test]
    fn test_timeout_penalty_picks_next_band_from_new_score() {
        let mut game = game();
        game.start(0);
        game.run.score = 40;
        game.run.streak = 3;

        let expired = game.tick(10_000);
        assert_eq!(deltas(&expired), vec![Category::Timeout]);
        assert_eq!(game.run().score, 38);
        assert_eq!(game.run().streak, 0);

        let next = game.tick(10_800);
        assert!(next.events.iter().any(|e| matches!(
            e.data,
            GameEventData::RoundStarted { duration_ms: 8_000, .. }
        )));
        assert_eq!(game.run().timer.duration_ms(), Some(8_000));
    }

    #[test]
    fn test_score_just_below_target_keeps_playing() {
        let mut game = game();
        game.start(0);
        game.run.score = 97;

        // Slow correct pick: no bonus, no multiplier
        let result = game.submit_choice("shock", 2_500);
        let delta = result.events.iter().find_map(|e| e.delta()).unwrap();
        assert_eq!(delta.total_points, 2);
        assert!(!result.run_ended);
        assert_eq!(game.run().score, 99);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.run().pending_advance, Some(PendingAdvance { due_at: 3_100 }));
    }

    #[test]
    fn test_run_started_reports_configured_base_multiplier() {
        let mut config = GameConfig::default();
        config.scoring.streak_low = 0;
        let mut game = Game::new(catalog(), config, 3).unwrap();

        let result = game.start(0);
        assert!(matches!(
            result.events[0].data,
            GameEventData::RunStarted { score: 0, multiplier: 2 }
        ));

        let result = self::game().start(0);
        assert!(matches!(
            result.events[0].data,
            GameEventData::RunStarted { score: 0, multiplier: 1 }
        ));
    }

    #[test]
    fn test_pick_then_expiry_scores_once() {
        let mut game = game();
        game.start(0);
        game.submit_choice("brain", 9_999);
        let later = game.tick(10_000);
        assert!(deltas(&later).is_empty());
        assert_eq!(game.run().counts.total(), 1);
    }

    #[test]
    fn test_slot_maps_to_choice() {
        let mut game = game();
        game.start(0);
        let id = game.current_round().unwrap().choices[2].id.clone();

        let result = game.submit_slot(2, 300);
        assert!(matches!(
            &result.events[0].data,
            GameEventData::RoundResolved { picked: Some(p), .. } if *p == id
        ));
        assert!(game.submit_slot(9, 400).is_empty());
    }

    #[test]
    fn test_win_ends_run() {
        let mut config = GameConfig::default();
        config.rules.target_score = 5;
        let mut game = Game::new(catalog(), config, 1).unwrap();
        game.start(0);

        let result = game.submit_choice("wolf", 100);
        assert!(result.run_ended);
        assert_eq!(game.phase(), Phase::Won);
        assert!(game.current_round().is_none());
        assert!(game.run().pending_advance.is_none());
        assert!(game.tick(20_000).is_empty());
    }

    #[test]
    fn test_loss_ends_run() {
        let mut config = GameConfig::default();
        config.rules.lose_floor = -5;
        let mut game = Game::new(catalog(), config, 1).unwrap();
        game.start(0);

        game.submit_choice("basket", 100);
        assert_eq!(game.phase(), Phase::Lost);
        let summary = game.run().summary(100);
        assert!(!summary.won);
        assert_eq!(summary.counts.horrible, 1);
    }

    #[test]
    fn test_back_to_menu_cancels_everything() {
        let mut game = game();
        game.start(0);
        let result = game.back_to_menu(500);

        assert_eq!(game.phase(), Phase::Idle);
        assert!(matches!(
            result.events[0].data,
            GameEventData::PhaseChanged { old_phase: Phase::Playing, new_phase: Phase::Idle }
        ));
        assert!(game.tick(60_000).is_empty());
        assert!(game.submit_choice("wolf", 60_100).is_empty());
    }

    #[test]
    fn test_replay_after_loss_resets() {
        let mut config = GameConfig::default();
        config.rules.lose_floor = -5;
        let mut game = Game::new(catalog(), config, 1).unwrap();
        game.start(0);
        game.submit_choice("basket", 100);

        game.start(5_000);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.run().score, 0);
        assert_eq!(game.run().rounds_seen, 1);
        assert_eq!(game.run().counts.total(), 0);
    }

    #[test]
    fn test_clock_ticks_once_per_second() {
        let mut game = game();
        game.start(0);

        let clock_ticks = |r: &StepResult| {
            r.events.iter().filter(|e| matches!(e.data, GameEventData::ClockTick { .. })).count()
        };
        assert_eq!(clock_ticks(&game.tick(500)), 0);
        assert_eq!(clock_ticks(&game.tick(1_000)), 1);
        assert_eq!(clock_ticks(&game.tick(1_100)), 0);
        assert_eq!(clock_ticks(&game.tick(2_000)), 1);
    }

    #[test]
    fn test_timer_critical_once() {
        let mut game = game();
        game.start(0);

        let critical = |r: &StepResult| {
            r.events.iter().filter(|e| e.data == GameEventData::TimerCritical).count()
        };
        assert_eq!(critical(&game.tick(7_000)), 0);
        assert_eq!(critical(&game.tick(8_000)), 1);
        assert_eq!(critical(&game.tick(8_100)), 0);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = game();
        let mut b = game();
        for game in [&mut a, &mut b] {
            game.start(0);
            game.submit_slot(0, 700);
            game.tick(1_300);
            game.tick(20_000);
        }
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GameConfig::default();
        config.rules.lose_floor = 200;
        assert!(Game::new(catalog(), config, 0).is_err());
    }
}
