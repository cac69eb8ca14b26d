//! Core deterministic primitives.
//!
//! Seeded randomness, state hashing and host time. Everything in `game/`
//! builds on these so that a run is reproducible from its seed and inputs.

pub mod rng;
pub mod hash;
pub mod clock;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{StateHash, compute_state_hash};
pub use clock::{Millis, format_run_time};
