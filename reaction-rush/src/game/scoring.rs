//! Scoring Engine
//!
//! Turns a pick (or a timeout) into a point delta and the streak update.
//! Pure: reads the active template and the current streak, returns a
//! [`ScoreDelta`] that the state machine applies.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::game::catalog::{PostTemplate, Tier};

/// Point table and bonus rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points for a Perfect icon
    pub perfect_points: i32,
    /// Points for a Correct icon
    pub correct_points: i32,
    /// Points for a Neutral icon
    pub neutral_points: i32,
    /// Points for a Wrong icon
    pub wrong_points: i32,
    /// Points for a Horrible icon
    pub horrible_points: i32,
    /// Points when the round times out
    pub timeout_penalty: i32,
    /// Bonus for reacting under `fast_under_ms`
    pub fast_bonus: i32,
    /// Fast bonus cut-off
    pub fast_under_ms: Millis,
    /// Bonus for reacting under `quick_under_ms`
    pub quick_bonus: i32,
    /// Quick bonus cut-off
    pub quick_under_ms: Millis,
    /// Streak needed for the first multiplier step
    pub streak_low: u32,
    /// Multiplier at `streak_low`
    pub streak_low_multiplier: i32,
    /// Streak needed for the second multiplier step
    pub streak_high: u32,
    /// Multiplier at `streak_high`
    pub streak_high_multiplier: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            perfect_points: 5,
            correct_points: 2,
            neutral_points: 0,
            wrong_points: -3,
            horrible_points: -6,
            timeout_penalty: -2,
            fast_bonus: 2,
            fast_under_ms: 1_000,
            quick_bonus: 1,
            quick_under_ms: 2_000,
            streak_low: 5,
            streak_low_multiplier: 2,
            streak_high: 10,
            streak_high_multiplier: 3,
        }
    }
}

impl ScoringConfig {
    /// Base points for a tier.
    pub fn points(&self, tier: Tier) -> i32 {
        match tier {
            Tier::Perfect => self.perfect_points,
            Tier::Correct => self.correct_points,
            Tier::Neutral => self.neutral_points,
            Tier::Wrong => self.wrong_points,
            Tier::Horrible => self.horrible_points,
        }
    }

    /// Multiplier earned by a streak.
    pub fn multiplier_for_streak(&self, streak: u32) -> i32 {
        if streak >= self.streak_high {
            self.streak_high_multiplier
        } else if streak >= self.streak_low {
            self.streak_low_multiplier
        } else {
            1
        }
    }

    /// Reaction-speed bonus.
    pub fn time_bonus(&self, reaction_ms: Millis) -> i32 {
        if reaction_ms < self.fast_under_ms {
            self.fast_bonus
        } else if reaction_ms < self.quick_under_ms {
            self.quick_bonus
        } else {
            0
        }
    }
}

/// What a round resolved as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Picked a Perfect icon
    Perfect,
    /// Picked a Correct icon
    Correct,
    /// Picked a Neutral icon
    Neutral,
    /// Picked a Wrong icon (or one matching no tier)
    Wrong,
    /// Picked a Horrible icon
    Horrible,
    /// Countdown expired
    Timeout,
}

impl From<Tier> for Category {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Perfect => Category::Perfect,
            Tier::Correct => Category::Correct,
            Tier::Neutral => Category::Neutral,
            Tier::Wrong => Category::Wrong,
            Tier::Horrible => Category::Horrible,
        }
    }
}

impl Category {
    /// Short feedback headline.
    pub fn feedback_label(self) -> &'static str {
        match self {
            Category::Perfect => "Perfect!",
            Category::Correct => "Nice!",
            Category::Neutral => "Not quite",
            Category::Wrong => "Bad",
            Category::Horrible => "Terrible",
            Category::Timeout => "Time's Up!",
        }
    }

    /// Perfect and Correct are shown as positive feedback.
    pub fn is_positive(self) -> bool {
        matches!(self, Category::Perfect | Category::Correct)
    }
}

/// How a round ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Player picked an icon after `reaction_ms`
    PickedIcon {
        /// Chosen icon id
        icon_id: String,
        /// Time since the round started
        reaction_ms: Millis,
    },
    /// Countdown expired
    Timeout,
}

/// Result of scoring one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    /// Classification
    pub category: Category,
    /// Tier points (or timeout penalty)
    pub base_points: i32,
    /// Speed bonus actually applied (0 unless base > 0)
    pub time_bonus: i32,
    /// Multiplier actually applied (1 unless base > 0)
    pub multiplier: i32,
    /// Points added to the score
    pub total_points: i32,
    /// Streak after this round
    pub new_streak: u32,
    /// Multiplier the next round will use
    pub new_multiplier: i32,
}

impl ScoreDelta {
    /// Was a speed bonus applied?
    pub fn time_bonus_applied(&self) -> bool {
        self.time_bonus > 0
    }
}

/// Score an outcome against the active template.
///
/// `streak` is the streak before this round; it picks the multiplier.
/// An icon matching no tier scores as Wrong.
pub fn resolve(
    config: &ScoringConfig,
    template: &PostTemplate,
    streak: u32,
    outcome: &Outcome,
) -> ScoreDelta {
    let (category, base_points, reaction_ms) = match outcome {
        Outcome::PickedIcon { icon_id, reaction_ms } => {
            let tier = template.classify(icon_id).unwrap_or(Tier::Wrong);
            (Category::from(tier), config.points(tier), Some(*reaction_ms))
        }
        Outcome::Timeout => (Category::Timeout, config.timeout_penalty, None),
    };

    let (time_bonus, multiplier, total_points, new_streak) = match reaction_ms {
        Some(reaction_ms) if base_points > 0 => {
            let bonus = config.time_bonus(reaction_ms);
            let multiplier = config.multiplier_for_streak(streak);
            (bonus, multiplier, (base_points + bonus) * multiplier, streak + 1)
        }
        _ => (0, 1, base_points, 0),
    };

    ScoreDelta {
        category,
        base_points,
        time_bonus,
        multiplier,
        total_points,
        new_streak,
        new_multiplier: config.multiplier_for_streak(new_streak),
    }
}
