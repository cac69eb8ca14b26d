//! Replay and Verification
//!
//! A session is determined by its seed and timed inputs, so a transcript
//! of those is enough to reproduce it exactly.
//!
//! - `transcript`: recording, bincode/JSON encoding
//! - `verify`: replay and hash comparison

pub mod transcript;
pub mod verify;

// Re-export key types
pub use transcript::{
    RunTranscript, RunMetadata, RunResult,
    RecordedInput, StateCheckpoint, TranscriptError, TRANSCRIPT_VERSION,
};
pub use verify::{replay_run, verify_transcript, VerificationResult, VerificationError};
