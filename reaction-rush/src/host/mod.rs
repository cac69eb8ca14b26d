//! Host Integration
//!
//! Async plumbing around the deterministic core: clock, tick cadence and
//! the command channel. Non-deterministic by nature; everything it does is
//! recorded so the run can be replayed.

pub mod driver;

pub use driver::{Driver, DriverConfig, DriverError, DriverHandle, DriverOutcome, PlayerCommand};
