//! State handoff harness for turn-based external simulations.
//!
//! This crate implements a run-one-turn execution model: each invocation reads
//! the persisted state, runs the external simulation program once, and commits
//! whatever the simulation printed on stdout as the state for the next turn.
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (run classification).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (state slot, configuration, process
//!   execution). Isolated to enable scripting in tests.
//!
//! The orchestration module ([`turn`]) coordinates core logic with I/O to
//! implement the single CLI command.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
