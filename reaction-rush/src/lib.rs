//! # Reaction Rush
//!
//! Round lifecycle and scoring engine for a timed reaction game: a post
//! appears, six icons are offered, the player picks the one that best fits
//! before the countdown runs out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       REACTION RUSH                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG, seed derivation        │
//! │  ├── hash.rs     - State hashing for replay verification     │
//! │  └── clock.rs    - Host time type and m:ss formatting        │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── catalog.rs  - Icons and post templates                  │
//! │  ├── queue.rs    - No-repeat post selection                  │
//! │  ├── choices.rs  - Six-icon choice builder                   │
//! │  ├── timer.rs    - Round countdown, time bands               │
//! │  ├── scoring.rs  - Pick/timeout to score delta               │
//! │  ├── state.rs    - Run and round state                       │
//! │  └── engine.rs   - Idle/Playing/Won/Lost state machine       │
//! │                                                              │
//! │  presentation/   - Bridge trait, Session, recording bridge   │
//! │  replay/         - Transcripts and verification by replay    │
//! │  host/           - Tokio driver (non-deterministic)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules never read a clock or touch the OS:
//! - Every input carries the host time it happened at
//! - Countdowns are deadlines polled by `tick(now)`
//! - All randomness comes from the seeded Xorshift128+
//! - BTreeMap everywhere iteration order matters
//!
//! Given the same seed and the same timed inputs, a session produces the
//! same events and the same final state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;
pub mod presentation;
pub mod replay;
pub mod host;

// Re-export commonly used types
pub use crate::core::rng::{DeterministicRng, derive_run_seed};
pub use crate::core::clock::Millis;
pub use config::{GameConfig, RuleConfig, ConfigError, LaunchOptions};
pub use game::{Catalog, Game, GameEvent, Phase, PlayerInput, RunSummary, StepResult};
pub use presentation::{PresentationBridge, Session};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fresh random session identifier.
pub fn new_run_id() -> [u8; 16] {
    uuid::Uuid::new_v4().into_bytes()
}
