//! Headless bridge that narrates the game through `tracing`.

use tracing::{debug, info};

use crate::core::clock::format_run_time;
use crate::game::catalog::{Icon, PostTemplate};
use crate::game::scoring::Category;
use crate::game::state::{Phase, RunSummary};
use crate::game::timer::TimerReading;

use super::PresentationBridge;

/// Logs posts, outcomes and summaries. Handles are post numbers.
#[derive(Debug, Default)]
pub struct LogBridge {
    posts: u32,
}

impl LogBridge {
    /// Create a bridge.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationBridge for LogBridge {
    type Handle = u32;

    fn render_post(&mut self, template: &PostTemplate) -> u32 {
        self.posts += 1;
        info!("Post #{}: \"{}\"", self.posts, template.text);
        self.posts
    }

    fn render_choices(&mut self, choices: &[Icon]) {
        let labels: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, icon)| format!("[{}] {}", i + 1, icon.display_name))
            .collect();
        info!("  {}", labels.join("  "));
    }

    fn update_timer_display(&mut self, _reading: &TimerReading) {}

    fn update_scoreboard(&mut self, score: i32, streak: u32, multiplier: i32) {
        debug!("Score {} | streak {} | x{}", score, streak, multiplier);
    }

    fn show_outcome_feedback(
        &mut self,
        category: Category,
        total_points: i32,
        time_bonus_applied: bool,
        multiplier: i32,
    ) {
        let bonus = if time_bonus_applied { " (speed bonus)" } else { "" };
        let mult = if multiplier > 1 { format!(" x{multiplier}") } else { String::new() };
        info!("  {} {:+}{}{}", category.feedback_label(), total_points, bonus, mult);
    }

    fn show_run_summary(&mut self, summary: &RunSummary) {
        match summary.rank {
            Some(rank) => info!("{} {}", rank.title(), rank.message()),
            None => info!("GAME OVER"),
        }
        info!(
            "Final score {} in {} posts, best streak {}, time {}",
            summary.score,
            summary.rounds_seen,
            summary.best_streak,
            format_run_time(summary.duration_ms)
        );
        let c = &summary.counts;
        info!(
            "Perfect {} | Correct {} | Neutral {} | Wrong {} | Horrible {} | Timeout {}",
            c.perfect, c.correct, c.neutral, c.wrong, c.horrible, c.timeout
        );
    }

    fn timer_critical(&mut self) {
        debug!("  hurry!");
    }

    fn phase_changed(&mut self, old: Phase, new: Phase) {
        debug!("Phase {:?} -> {:?}", old, new);
    }
}
