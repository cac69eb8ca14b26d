//! Round Timer
//!
//! Cancellable countdown bound to one round. The host polls it on a 100ms
//! cadence; the countdown itself is deadline based, so a late poll never
//! stretches a round.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;

/// Display cadence of the round countdown.
pub const TIMER_TICK_MS: Millis = 100;

/// Display cadence of the whole-run clock.
pub const RUN_CLOCK_TICK_MS: Millis = 1000;

/// Percent remaining at or below which the countdown shows a warning.
const WARNING_PERCENT: f64 = 40.0;

/// Percent remaining at or below which the countdown is critical.
const CRITICAL_PERCENT: f64 = 20.0;

// =============================================================================
// TIME BANDS
// =============================================================================

/// One step of the difficulty ramp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBand {
    /// Applies while score is strictly below this value
    pub below_score: i32,
    /// Round duration for this band
    pub limit_ms: Millis,
}

/// Score-driven round duration step function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBands {
    /// Bands in ascending `below_score` order
    pub bands: Vec<TimeBand>,
    /// Duration once score passes every band
    pub top_limit_ms: Millis,
}

impl Default for TimeBands {
    fn default() -> Self {
        Self {
            bands: vec![
                TimeBand { below_score: 26, limit_ms: 10_000 },
                TimeBand { below_score: 51, limit_ms: 8_000 },
                TimeBand { below_score: 76, limit_ms: 6_000 },
            ],
            top_limit_ms: 5_000,
        }
    }
}

impl TimeBands {
    /// Round duration for the given score.
    pub fn limit_for(&self, score: i32) -> Millis {
        self.bands
            .iter()
            .find(|band| score < band.below_score)
            .map(|band| band.limit_ms)
            .unwrap_or(self.top_limit_ms)
    }
}

// =============================================================================
// TIMER
// =============================================================================

/// How close the countdown is to expiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    /// More than 40% remaining
    Calm,
    /// 40% or less remaining
    Warning,
    /// 20% or less remaining
    Critical,
}

impl Urgency {
    fn from_percent(percent: f64) -> Self {
        if percent <= CRITICAL_PERCENT {
            Urgency::Critical
        } else if percent <= WARNING_PERCENT {
            Urgency::Warning
        } else {
            Urgency::Calm
        }
    }
}

/// Snapshot for the countdown display.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimerReading {
    /// 1.0 at start, 0.0 at expiry
    pub fraction_remaining: f64,
    /// Seconds left, for a `4.2s` style label
    pub seconds_remaining: f64,
    /// Display urgency
    pub urgency: Urgency,
}

impl TimerReading {
    /// Reading for a countdown that has just started.
    pub fn full(duration_ms: Millis) -> Self {
        Self {
            fraction_remaining: 1.0,
            seconds_remaining: duration_ms as f64 / 1000.0,
            urgency: Urgency::Calm,
        }
    }
}

/// Result of polling the timer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerPoll {
    /// No countdown running
    Idle,
    /// Countdown in progress
    Running {
        /// Display snapshot
        reading: TimerReading,
        /// True on the first poll that lands in the critical zone
        entered_critical: bool,
    },
    /// Countdown reached zero on this poll. Reported once.
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum TimerState {
    Idle,
    Running {
        started_at: Millis,
        duration_ms: Millis,
        critical_reported: bool,
    },
}

/// Countdown for the active round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    state: TimerState,
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self { state: TimerState::Idle }
    }
}

impl RoundTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown, replacing any running one.
    pub fn start(&mut self, now: Millis, duration_ms: Millis) {
        self.cancel();
        self.state = TimerState::Running {
            started_at: now,
            duration_ms,
            critical_reported: false,
        };
    }

    /// Stop the countdown. No-op when idle or already expired.
    pub fn cancel(&mut self) {
        self.state = TimerState::Idle;
    }

    /// Is a countdown running?
    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Duration of the running countdown.
    pub fn duration_ms(&self) -> Option<Millis> {
        match self.state {
            TimerState::Running { duration_ms, .. } => Some(duration_ms),
            TimerState::Idle => None,
        }
    }

    /// Milliseconds left at `now`.
    pub fn remaining_ms(&self, now: Millis) -> Option<Millis> {
        match self.state {
            TimerState::Running { started_at, duration_ms, .. } => {
                Some(duration_ms.saturating_sub(now.saturating_sub(started_at)))
            }
            TimerState::Idle => None,
        }
    }

    /// Advance the countdown to `now`.
    ///
    /// On expiry the timer goes idle and `Expired` is returned exactly once.
    pub fn poll(&mut self, now: Millis) -> TimerPoll {
        let TimerState::Running { started_at, duration_ms, critical_reported } = self.state else {
            return TimerPoll::Idle;
        };

        let remaining = duration_ms.saturating_sub(now.saturating_sub(started_at));
        if remaining == 0 {
            self.state = TimerState::Idle;
            return TimerPoll::Expired;
        }

        let fraction = remaining as f64 / duration_ms as f64;
        let urgency = Urgency::from_percent(remaining as f64 * 100.0 / duration_ms as f64);
        let entered_critical = urgency == Urgency::Critical && !critical_reported;

        self.state = TimerState::Running {
            started_at,
            duration_ms,
            critical_reported: critical_reported || entered_critical,
        };

        TimerPoll::Running {
            reading: TimerReading {
                fraction_remaining: fraction,
                seconds_remaining: remaining as f64 / 1000.0,
                urgency,
            },
            entered_critical,
        }
    }
}
