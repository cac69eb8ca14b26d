//! Verification API
//!
//! Verify a session by deterministic replay of its transcript.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GameConfig;
use crate::core::hash::StateHash;
use crate::game::catalog::Catalog;
use crate::game::engine::Game;
use crate::replay::transcript::{RunTranscript, TranscriptError};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash from replay.
    pub computed_final_hash: StateHash,

    /// Checkpoints compared.
    pub checkpoints_checked: usize,

    /// First failure, if any.
    pub error: Option<VerificationError>,
}

/// Replay diverged from the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Transcript was never finalized.
    #[error("transcript is incomplete")]
    IncompleteTranscript,

    /// Intermediate hash mismatch.
    #[error("checkpoint mismatch after input {input_index}")]
    CheckpointMismatch {
        /// Input after which the hashes differ.
        input_index: u32,
        /// Recorded hash.
        expected: StateHash,
        /// Replayed hash.
        computed: StateHash,
    },

    /// Final hash mismatch.
    #[error("final state hash mismatch")]
    FinalStateMismatch {
        /// Recorded hash.
        expected: StateHash,
        /// Replayed hash.
        computed: StateHash,
    },
}

/// Re-drive a fresh game through the recorded inputs.
///
/// Fails if the transcript was recorded under different rules or its input
/// times go backwards.
pub fn replay_run(
    catalog: Arc<Catalog>,
    config: GameConfig,
    transcript: &RunTranscript,
) -> Result<Game, TranscriptError> {
    replay_with(catalog, config, transcript, |_, _| {})
}

/// Replay and compare every checkpoint plus the final hash.
pub fn verify_transcript(
    catalog: Arc<Catalog>,
    config: GameConfig,
    transcript: &RunTranscript,
) -> Result<VerificationResult, TranscriptError> {
    let mut checkpoints = transcript.checkpoints.iter().peekable();
    let mut checked = 0;
    let mut error = None;

    let game = replay_with(catalog, config, transcript, |index, game| {
        while let Some(cp) = checkpoints.next_if(|cp| cp.input_index as usize == index) {
            checked += 1;
            let computed = game.compute_hash();
            if error.is_none() && computed != cp.state_hash {
                warn!("Checkpoint mismatch after input {}", index);
                error = Some(VerificationError::CheckpointMismatch {
                    input_index: cp.input_index,
                    expected: cp.state_hash,
                    computed,
                });
            }
        }
    })?;

    let computed_final_hash = game.compute_hash();

    if error.is_none() {
        error = match &transcript.result {
            None => Some(VerificationError::IncompleteTranscript),
            Some(result) if result.final_state_hash != computed_final_hash => {
                Some(VerificationError::FinalStateMismatch {
                    expected: result.final_state_hash,
                    computed: computed_final_hash,
                })
            }
            Some(_) => None,
        };
    }

    debug!("Verified {} checkpoints, valid: {}", checked, error.is_none());

    Ok(VerificationResult {
        valid: error.is_none(),
        computed_final_hash,
        checkpoints_checked: checked,
        error,
    })
}

fn replay_with<F>(
    catalog: Arc<Catalog>,
    config: GameConfig,
    transcript: &RunTranscript,
    mut after_input: F,
) -> Result<Game, TranscriptError>
where
    F: FnMut(usize, &Game),
{
    transcript.check_version()?;
    if config.fingerprint() != transcript.metadata.config_hash {
        return Err(TranscriptError::ConfigMismatch);
    }

    let mut game = Game::new(catalog, config, transcript.metadata.rng_seed)?;
    let mut last_at = 0;

    for (index, recorded) in transcript.inputs.iter().enumerate() {
        if recorded.at_ms < last_at {
            return Err(TranscriptError::OutOfOrder { index, at_ms: recorded.at_ms });
        }
        last_at = recorded.at_ms;

        game.apply(&recorded.input, recorded.at_ms);
        after_input(index, &game);
    }

    Ok(game)
}
