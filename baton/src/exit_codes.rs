//! Stable exit codes for the `baton` CLI.
//!
//! When the simulation itself runs and exits non-zero, the harness mirrors
//! the simulation's exit code instead of using these.

/// Turn completed and the new state was committed.
pub const OK: i32 = 0;
/// Harness failure: bad config, unreadable or unwritable state slot, spawn
/// failure, timeout, or a simulation killed by a signal.
pub const FAILURE: i32 = 1;
