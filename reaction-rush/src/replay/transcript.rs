//! Run Transcript Recording
//!
//! Records everything needed to replay a session: the seed, the rules
//! fingerprint and every timed input. Ticks that produced no events are
//! dropped since they cannot change state.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::{ConfigError, GameConfig};
use crate::core::clock::Millis;
use crate::core::hash::StateHash;
use crate::game::engine::{Game, StepResult};
use crate::game::events::GameEventData;
use crate::game::input::PlayerInput;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Complete session transcript.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Session metadata.
    pub metadata: RunMetadata,

    /// Inputs in application order.
    pub inputs: Vec<RecordedInput>,

    /// State hash after every scored round.
    pub checkpoints: Vec<StateCheckpoint>,

    /// Final outcome, set by [`RunTranscript::finalize`].
    pub result: Option<RunResult>,
}

/// Session metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Session identifier (UUID bytes).
    pub run_id: [u8; 16],

    /// Seed of the session RNG.
    pub rng_seed: u64,

    /// Wall-clock time the recording began.
    pub recorded_at: DateTime<Utc>,

    /// Rules fingerprint.
    pub config_hash: StateHash,
}

impl RunMetadata {
    /// Metadata for a session starting now.
    pub fn new(run_id: [u8; 16], rng_seed: u64, config: &GameConfig) -> Self {
        Self {
            run_id,
            rng_seed,
            recorded_at: Utc::now(),
            config_hash: config.fingerprint(),
        }
    }
}

/// One input with its host time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedInput {
    /// Host time the input was applied at.
    pub at_ms: Millis,
    /// The input.
    pub input: PlayerInput,
}

/// State hash after a given input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Index into `inputs` of the input that produced this state.
    pub input_index: u32,
    /// Hash after applying it.
    pub state_hash: StateHash,
}

/// Final outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether the last run was won.
    pub won: bool,
    /// Final score.
    pub score: i32,
    /// Posts shown in the last run.
    pub rounds_seen: u32,
    /// Hash of the final state.
    pub final_state_hash: StateHash,
}

/// Transcript errors.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Binary encoding failed.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Binary or JSON decoding failed.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// Written by an incompatible version.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Transcript version.
        got: u8,
    },

    /// Recorded under different rules.
    #[error("transcript was recorded under different rules")]
    ConfigMismatch,

    /// Rules are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input times go backwards.
    #[error("input {index} at {at_ms}ms precedes the previous input")]
    OutOfOrder {
        /// Offending input.
        index: usize,
        /// Its time.
        at_ms: Millis,
    },
}

impl RunTranscript {
    /// Create an empty transcript.
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            metadata,
            inputs: Vec::new(),
            checkpoints: Vec::new(),
            result: None,
        }
    }

    /// Record an applied input and what it produced.
    ///
    /// Event-free ticks are skipped. A checkpoint is taken whenever a round
    /// was scored.
    pub fn record_step(&mut self, input: &PlayerInput, at_ms: Millis, step: &StepResult, game: &Game) {
        if input.is_tick() && step.is_empty() {
            return;
        }

        self.inputs.push(RecordedInput { at_ms, input: input.clone() });

        let scored = step
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::RoundResolved { .. }));
        if scored {
            self.checkpoints.push(StateCheckpoint {
                input_index: (self.inputs.len() - 1) as u32,
                state_hash: game.compute_hash(),
            });
        }
    }

    /// Seal the transcript with the game's final state.
    pub fn finalize(&mut self, game: &Game) {
        let run = game.run();
        self.result = Some(RunResult {
            won: run.phase == crate::game::state::Phase::Won,
            score: run.score,
            rounds_seen: run.rounds_seen,
            final_state_hash: game.compute_hash(),
        });
    }

    /// Has `finalize` been called?
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        bincode::serialize(self).map_err(|e| TranscriptError::Encode(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self =
            bincode::deserialize(data).map_err(|e| TranscriptError::Decode(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    /// Pretty JSON export.
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        serde_json::to_string_pretty(self).map_err(|e| TranscriptError::Encode(e.to_string()))
    }

    /// JSON import.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let transcript: Self =
            serde_json::from_str(json).map_err(|e| TranscriptError::Decode(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    /// Reject transcripts from other versions.
    pub fn check_version(&self) -> Result<(), TranscriptError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: self.version,
            });
        }
        Ok(())
    }

    /// Time of the last recorded input.
    pub fn duration_ms(&self) -> Millis {
        self.inputs.last().map(|r| r.at_ms).unwrap_or(0)
    }
}
