//! I/O helpers for the harness.

pub mod config;
pub mod invoker;
pub mod process;
pub mod state_store;
