//! Runtime configuration.
//!
//! `GameConfig::default()` reproduces the stock rules. Deployments can
//! override individual values with `REACTION_RUSH_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::core::clock::Millis;
use crate::core::hash::{StateHash, StateHasher};
use crate::game::scoring::ScoringConfig;
use crate::game::timer::TimeBands;

/// Win/loss thresholds and pacing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Score at or above which the run is won
    pub target_score: i32,
    /// Score at or below which the run is lost
    pub lose_floor: i32,
    /// Pause before the next post after a pick
    pub pick_advance_delay_ms: Millis,
    /// Pause before the next post after a timeout
    pub timeout_advance_delay_ms: Millis,
    /// Score-driven round duration
    pub time_bands: TimeBands,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            target_score: 100,
            lose_floor: -50,
            pick_advance_delay_ms: 600,
            timeout_advance_delay_ms: 800,
            time_bands: TimeBands::default(),
        }
    }
}

/// Complete rule set for a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Point table and bonuses
    pub scoring: ScoringConfig,
    /// Thresholds and pacing
    pub rules: RuleConfig,
}

/// Invalid configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The loss floor must sit below the win target.
    #[error("lose floor {lose_floor} must be below target score {target_score}")]
    FloorAboveTarget {
        /// Configured floor
        lose_floor: i32,
        /// Configured target
        target_score: i32,
    },

    /// Multipliers must be positive.
    #[error("streak multipliers must be at least 1")]
    NonPositiveMultiplier,

    /// Bands must ascend.
    #[error("time bands must be in ascending score order")]
    BandsOutOfOrder,
}

impl GameConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Recognised: `REACTION_RUSH_TARGET_SCORE`, `REACTION_RUSH_LOSE_FLOOR`,
    /// `REACTION_RUSH_TIMEOUT_PENALTY`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(target) = env_parse("REACTION_RUSH_TARGET_SCORE") {
            config.rules.target_score = target;
        }
        if let Some(floor) = env_parse("REACTION_RUSH_LOSE_FLOOR") {
            config.rules.lose_floor = floor;
        }
        if let Some(penalty) = env_parse("REACTION_RUSH_TIMEOUT_PENALTY") {
            config.scoring.timeout_penalty = penalty;
        }

        config
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.lose_floor >= self.rules.target_score {
            return Err(ConfigError::FloorAboveTarget {
                lose_floor: self.rules.lose_floor,
                target_score: self.rules.target_score,
            });
        }

        if self.scoring.streak_low_multiplier < 1 || self.scoring.streak_high_multiplier < 1 {
            return Err(ConfigError::NonPositiveMultiplier);
        }

        let bands = &self.rules.time_bands.bands;
        if bands.windows(2).any(|w| w[0].below_score >= w[1].below_score) {
            return Err(ConfigError::BandsOutOfOrder);
        }

        Ok(())
    }

    /// Fingerprint stored in transcripts so replays run under the same rules.
    pub fn fingerprint(&self) -> StateHash {
        let mut h = StateHasher::for_config();

        let s = &self.scoring;
        for v in [
            s.perfect_points,
            s.correct_points,
            s.neutral_points,
            s.wrong_points,
            s.horrible_points,
            s.timeout_penalty,
            s.fast_bonus,
            s.quick_bonus,
            s.streak_low_multiplier,
            s.streak_high_multiplier,
        ] {
            h.update_i32(v);
        }
        h.update_u64(s.fast_under_ms);
        h.update_u64(s.quick_under_ms);
        h.update_u32(s.streak_low);
        h.update_u32(s.streak_high);

        let r = &self.rules;
        h.update_i32(r.target_score);
        h.update_i32(r.lose_floor);
        h.update_u64(r.pick_advance_delay_ms);
        h.update_u64(r.timeout_advance_delay_ms);
        h.update_u32(r.time_bands.bands.len() as u32);
        for band in &r.time_bands.bands {
            h.update_i32(band.below_score);
            h.update_u64(band.limit_ms);
        }
        h.update_u64(r.time_bands.top_limit_ms);

        h.finalize()
    }
}

/// Process-level launch options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Fixed session seed (`REACTION_RUSH_SEED`); random when unset
    pub seed: Option<u64>,
    /// Catalog JSON to load (`REACTION_RUSH_CATALOG`); built-in when unset
    pub catalog_path: Option<PathBuf>,
}

impl LaunchOptions {
    /// Read launch options from the environment.
    pub fn from_env() -> Self {
        Self {
            seed: env_parse("REACTION_RUSH_SEED"),
            catalog_path: std::env::var_os("REACTION_RUSH_CATALOG").map(PathBuf::from),
        }
    }
}

/// Read and parse an environment variable, warning on garbage.
pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::timer::TimeBand;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.rules.target_score, 100);
        assert_eq!(config.rules.lose_floor, -50);
        assert_eq!(config.rules.pick_advance_delay_ms, 600);
        assert_eq!(config.rules.timeout_advance_delay_ms, 800);
        assert_eq!(config.scoring.timeout_penalty, -2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_floor_above_target_rejected() {
        let mut config = GameConfig::default();
        config.rules.lose_floor = 100;
        assert_eq!(
            config.validate(),
            Err(ConfigError::FloorAboveTarget { lose_floor: 100, target_score: 100 })
        );
    }

    #[test]
    fn test_zero_multiplier_rejected() {
        let mut config = GameConfig::default();
        config.scoring.streak_high_multiplier = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveMultiplier));
    }

    #[test]
    fn test_unsorted_bands_rejected() {
        let mut config = GameConfig::default();
        config.rules.time_bands.bands = vec![
            TimeBand { below_score: 50, limit_ms: 8_000 },
            TimeBand { below_score: 20, limit_ms: 10_000 },
        ];
        assert_eq!(config.validate(), Err(ConfigError::BandsOutOfOrder));
    }

    #[test]
    fn test_fingerprint_tracks_rules() {
        let base = GameConfig::default();
        let mut changed = GameConfig::default();
        changed.rules.target_score = 120;

        assert_eq!(base.fingerprint(), GameConfig::default().fingerprint());
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("REACTION_RUSH_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<i32>("REACTION_RUSH_TEST_GARBAGE"), None);

        std::env::set_var("REACTION_RUSH_TEST_NUMBER", " -12 ");
        assert_eq!(env_parse::<i32>("REACTION_RUSH_TEST_NUMBER"), Some(-12));

        assert_eq!(env_parse::<i32>("REACTION_RUSH_TEST_UNSET_KEY"), None);
    }
}
