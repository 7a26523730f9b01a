//! Orchestration for a single turn of the simulation.
//!
//! A turn snapshots the stored state, classifies it, runs the matching
//! simulation variant, and commits the produced output. Consecutive harness
//! invocations compose into one continuous simulation timeline because each
//! turn starts from exactly the bytes the previous one committed.

use std::ffi::OsString;
use std::fmt;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::classify::{RunKind, classify};
use crate::io::invoker::Invoker;
use crate::io::state_store::StateStore;

/// Policy knobs for a turn, derived from `HarnessConfig`.
#[derive(Debug, Clone, Default)]
pub struct TurnPolicy {
    /// Commit the simulation's output even when it exits with failure.
    pub keep_failed_output: bool,
}

/// Result of a turn whose simulation run succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Whether this turn bootstrapped a fresh state or continued a prior one.
    pub kind: RunKind,
    /// Size in bytes of the committed state.
    pub state_len: usize,
}

/// Error for a simulation that ran to completion but exited with failure.
///
/// Carried inside the `anyhow` chain so the CLI can recover it with
/// `downcast_ref` and mirror the simulation's exit code.
#[derive(Debug)]
pub struct SimulationFailedError {
    pub status: ExitStatus,
    pub kind: RunKind,
    /// Whether the failed run's output was committed anyway
    /// (`keep_failed_output`).
    pub output_committed: bool,
}

impl fmt::Display for SimulationFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulation failed on a {} turn ({})",
            self.kind, self.status
        )?;
        if self.output_committed {
            write!(f, "; its output was committed as the new state")?;
        }
        Ok(())
    }
}

impl std::error::Error for SimulationFailedError {}

/// Execute one turn against `store` with the given invoker.
///
/// `args` are forwarded verbatim to the simulation. On simulation failure the
/// previous state is preserved unless `policy.keep_failed_output` is set;
/// either way the turn returns [`SimulationFailedError`].
#[instrument(skip_all, fields(state_path = %store.path().display()))]
pub fn run_turn<I: Invoker>(
    store: &StateStore,
    invoker: &I,
    args: &[OsString],
    policy: &TurnPolicy,
) -> Result<TurnOutcome> {
    let snapshot = store.read_current().context("snapshot current state")?;
    let kind = classify(&snapshot);
    debug!(%kind, snapshot_len = snapshot.len(), "turn classified");

    let invocation = match kind {
        RunKind::Fresh => invoker.run_fresh(args).context("bootstrap simulation")?,
        RunKind::Continuing => invoker
            .run_continuing(&snapshot, args)
            .context("advance simulation")?,
    };

    if !invocation.status.success() {
        let output_committed = policy.keep_failed_output;
        if output_committed {
            store
                .commit(&invocation.state)
                .context("commit failed run's output")?;
        }
        warn!(
            %kind,
            exit_code = ?invocation.status.code(),
            output_committed,
            "simulation failed"
        );
        return Err(SimulationFailedError {
            status: invocation.status,
            kind,
            output_committed,
        }
        .into());
    }

    store.commit(&invocation.state).context("commit new state")?;
    info!(%kind, state_len = invocation.state.len(), "turn committed");
    Ok(TurnOutcome {
        kind,
        state_len: invocation.state.len(),
    })
}
