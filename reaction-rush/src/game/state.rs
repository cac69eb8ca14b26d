//! Run and Round State
//!
//! `RunState` is one play session's mutable state; it exclusively owns the
//! live `RoundState`, the round timer and any pending advance.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::core::hash::StateHasher;
use crate::game::catalog::{Icon, PostTemplate};
use crate::game::queue::MessageQueue;
use crate::game::scoring::{Category, ScoreDelta};
use crate::game::timer::RoundTimer;

// =============================================================================
// PHASE
// =============================================================================

/// State machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// On the menu
    #[default]
    Idle = 0,
    /// A run is in progress
    Playing = 1,
    /// Reached the target score
    Won = 2,
    /// Fell to the loss floor
    Lost = 3,
}

impl Phase {
    /// `start()` is accepted from these phases.
    pub fn can_start(self) -> bool {
        !matches!(self, Phase::Playing)
    }
}

// =============================================================================
// ROUND
// =============================================================================

/// The live round. Replaced each time a new post appears.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundState {
    /// 1-based round number within the run
    pub number: u32,
    /// Index of the template in the catalog
    pub template_index: usize,
    /// Active post
    pub template: PostTemplate,
    /// Offered icons, distinct ids
    pub choices: Vec<Icon>,
    /// When the post appeared
    pub started_at: Millis,
    /// Set by whichever of pick/timeout lands first
    pub resolved: bool,
}

impl RoundState {
    /// Mark resolved. Returns false if something already resolved it.
    pub fn try_resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }

    /// Icon id at a displayed slot.
    pub fn choice_id(&self, slot: usize) -> Option<&str> {
        self.choices.get(slot).map(|icon| icon.id.as_str())
    }
}

// =============================================================================
// COUNTS / SUMMARY
// =============================================================================

/// Resolutions per category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Perfect picks
    pub perfect: u32,
    /// Correct picks
    pub correct: u32,
    /// Neutral picks
    pub neutral: u32,
    /// Wrong picks (including unmatched icons)
    pub wrong: u32,
    /// Horrible picks
    pub horrible: u32,
    /// Timeouts
    pub timeout: u32,
}

impl OutcomeCounts {
    /// Count one resolution.
    pub fn record(&mut self, category: Category) {
        *self.slot_mut(category) += 1;
    }

    /// Count for a category.
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Perfect => self.perfect,
            Category::Correct => self.correct,
            Category::Neutral => self.neutral,
            Category::Wrong => self.wrong,
            Category::Horrible => self.horrible,
            Category::Timeout => self.timeout,
        }
    }

    /// Total resolutions.
    pub fn total(&self) -> u32 {
        self.perfect + self.correct + self.neutral + self.wrong + self.horrible + self.timeout
    }

    fn slot_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Perfect => &mut self.perfect,
            Category::Correct => &mut self.correct,
            Category::Neutral => &mut self.neutral,
            Category::Wrong => &mut self.wrong,
            Category::Horrible => &mut self.horrible,
            Category::Timeout => &mut self.timeout,
        }
    }
}

/// Title shown on the win screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinRank {
    /// Reached the target
    Winner,
    /// Best streak 10+
    Superstar,
    /// Best streak 15+
    Legendary,
}

impl WinRank {
    /// Rank earned by a best streak.
    pub fn from_best_streak(best_streak: u32) -> Self {
        match best_streak {
            15.. => WinRank::Legendary,
            10..=14 => WinRank::Superstar,
            _ => WinRank::Winner,
        }
    }

    /// Headline.
    pub fn title(self) -> &'static str {
        match self {
            WinRank::Winner => "WINNER!",
            WinRank::Superstar => "SUPERSTAR!",
            WinRank::Legendary => "LEGENDARY!",
        }
    }

    /// Sub-headline.
    pub fn message(self) -> &'static str {
        match self {
            WinRank::Winner => "You reached the target score!",
            WinRank::Superstar => "Amazing icon matching skills!",
            WinRank::Legendary => "You are an icon master!",
        }
    }
}

/// Frozen end-of-run statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Won or lost
    pub won: bool,
    /// Final score
    pub score: i32,
    /// Posts shown
    pub rounds_seen: u32,
    /// Longest streak
    pub best_streak: u32,
    /// Resolutions per category
    pub counts: OutcomeCounts,
    /// Wall time of the run
    pub duration_ms: Millis,
    /// Win title (wins only)
    pub rank: Option<WinRank>,
}

// =============================================================================
// RUN
// =============================================================================

/// Scheduled start of the next round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    /// Host time at which the next post appears
    pub due_at: Millis,
}

/// State of one play session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Current phase
    pub phase: Phase,
    /// Score (may go negative)
    pub score: i32,
    /// Consecutive positive picks
    pub streak: u32,
    /// Longest streak this run
    pub best_streak: u32,
    /// Resolutions per category
    pub counts: OutcomeCounts,
    /// Posts shown this run
    pub rounds_seen: u32,
    /// Draw-without-replacement buffer
    pub message_queue: MessageQueue,
    /// When the run started
    pub started_at: Millis,
    /// When the run ended (won/lost)
    pub ended_at: Option<Millis>,
    /// Whole seconds of run clock already reported
    pub clock_secs_reported: u64,
    /// Live round, if any
    pub round: Option<RoundState>,
    /// Countdown for the live round
    pub timer: RoundTimer,
    /// Next round scheduled after a resolution
    pub pending_advance: Option<PendingAdvance>,
}

impl RunState {
    /// Fresh state for a run starting at `now`.
    pub fn start(now: Millis) -> Self {
        Self {
            phase: Phase::Playing,
            started_at: now,
            ..Self::default()
        }
    }

    /// True only while playing.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Multiplier the next positive pick will get.
    pub fn current_multiplier(&self, scoring: &crate::game::scoring::ScoringConfig) -> i32 {
        scoring.multiplier_for_streak(self.streak)
    }

    /// Fold a scored round into the run.
    pub fn apply(&mut self, delta: &ScoreDelta) {
        self.score += delta.total_points;
        self.streak = delta.new_streak;
        self.best_streak = self.best_streak.max(self.streak);
        self.counts.record(delta.category);
    }

    /// Drop the live round, stop its timer and any pending advance.
    pub fn cancel_scheduled(&mut self) {
        self.timer.cancel();
        self.pending_advance = None;
        self.round = None;
    }

    /// Elapsed run time at `now` (frozen once the run ends).
    pub fn duration_ms(&self, now: Millis) -> Millis {
        self.ended_at.unwrap_or(now).saturating_sub(self.started_at)
    }

    /// Snapshot for the end screen.
    pub fn summary(&self, now: Millis) -> RunSummary {
        let won = self.phase == Phase::Won;
        RunSummary {
            won,
            score: self.score,
            rounds_seen: self.rounds_seen,
            best_streak: self.best_streak,
            counts: self.counts,
            duration_ms: self.duration_ms(now),
            rank: won.then(|| WinRank::from_best_streak(self.best_streak)),
        }
    }

    /// Feed this state into a hasher in canonical order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.phase as u8);
        hasher.update_i32(self.score);
        hasher.update_u32(self.streak);
        hasher.update_u32(self.best_streak);
        for count in [
            self.counts.perfect,
            self.counts.correct,
            self.counts.neutral,
            self.counts.wrong,
            self.counts.horrible,
            self.counts.timeout,
        ] {
            hasher.update_u32(count);
        }
        hasher.update_u32(self.rounds_seen);
        hasher.update_u64(self.started_at);
        hasher.update_u64(self.ended_at.unwrap_or(u64::MAX));

        hasher.update_u32(self.message_queue.remaining() as u32);
        for idx in self.message_queue.pending() {
            hasher.update_u32(idx as u32);
        }

        match &self.round {
            Some(round) => {
                hasher.update_bool(true);
                hasher.update_u32(round.number);
                hasher.update_u32(round.template_index as u32);
                hasher.update_u64(round.started_at);
                hasher.update_bool(round.resolved);
                for icon in &round.choices {
                    hasher.update_str(&icon.id);
                }
            }
            None => hasher.update_bool(false),
        }

        hasher.update_u64(self.timer.duration_ms().unwrap_or(0));
        hasher.update_u64(self.pending_advance.map(|p| p.due_at).unwrap_or(u64::MAX));
    }
}
