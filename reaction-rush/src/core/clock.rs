//! Host time representation.
//!
//! The core never reads a system clock. Every input is stamped by the host
//! with monotonic milliseconds since an arbitrary origin.

/// Monotonic host time in milliseconds.
pub type Millis = u64;

/// Format a duration as `m:ss` for the run clock and summaries.
pub fn format_run_time(ms: Millis) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
