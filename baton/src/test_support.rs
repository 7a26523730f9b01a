//! Test-only helpers for scripting simulation runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;

use anyhow::{Result, anyhow};

use crate::core::classify::RunKind;
use crate::io::config::{BootstrapConfig, HarnessConfig, SimulationConfig};
use crate::io::invoker::{CommandInvoker, Invocation, Invoker};
use crate::io::state_store::StateStore;

/// Build an `ExitStatus` from an exit code (raw `wait(2)` encoding).
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Wrap an inline shell script as a command vector; forwarded harness
/// arguments land in the script's `$@`.
pub fn sh_command(script: &str) -> Vec<String> {
    ["sh", "-c", script, "sim"].map(String::from).to_vec()
}

/// Build a forwarded-argument vector from string literals.
pub fn args(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

/// One scripted simulation run.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub exit_code: i32,
    pub state: Vec<u8>,
}

impl ScriptedRun {
    /// Successful run producing `state` on stdout.
    pub fn ok(state: &[u8]) -> Self {
        Self {
            exit_code: 0,
            state: state.to_vec(),
        }
    }

    /// Failing run that still produced `state` on stdout before exiting.
    pub fn failing(exit_code: i32, state: &[u8]) -> Self {
        Self {
            exit_code,
            state: state.to_vec(),
        }
    }
}

/// Call observed by a [`ScriptedInvoker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: RunKind,
    /// State supplied on the continuing path (`None` when fresh).
    pub prior_state: Option<Vec<u8>>,
    pub args: Vec<OsString>,
}

/// Invoker that replays a queue of scripted runs and records every call.
pub struct ScriptedInvoker {
    runs: RefCell<VecDeque<ScriptedRun>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Error unless every scripted run was consumed.
    pub fn assert_drained(&self) -> Result<()> {
        let remaining = self.runs.borrow().len();
        if remaining > 0 {
            return Err(anyhow!("{remaining} scripted runs left in queue"));
        }
        Ok(())
    }

    fn next_run(&self, call: RecordedCall) -> Result<Invocation> {
        self.calls.borrow_mut().push(call);
        let run = self
            .runs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted run left"))?;
        Ok(Invocation {
            status: exit_status(run.exit_code),
            state: run.state,
        })
    }
}

impl Invoker for ScriptedInvoker {
    fn run_fresh(&self, args: &[OsString]) -> Result<Invocation> {
        self.next_run(RecordedCall {
            kind: RunKind::Fresh,
            prior_state: None,
            args: args.to_vec(),
        })
    }

    fn run_continuing(&self, prior_state: &[u8], args: &[OsString]) -> Result<Invocation> {
        self.next_run(RecordedCall {
            kind: RunKind::Continuing,
            prior_state: Some(prior_state.to_vec()),
            args: args.to_vec(),
        })
    }
}

/// Temporary working directory with a state slot and shell-scripted
/// simulations.
pub struct TestWorkdir {
    temp: tempfile::TempDir,
}

impl TestWorkdir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Store over the default `sim.state` slot.
    pub fn store(&self) -> StateStore {
        StateStore::new(self.temp.path().join("sim.state"))
    }

    /// Config whose bootstrap and simulation are inline `sh` scripts.
    pub fn config(&self, bootstrap_script: &str, simulation_script: &str) -> HarnessConfig {
        HarnessConfig {
            bootstrap: BootstrapConfig {
                command: sh_command(bootstrap_script),
            },
            simulation: SimulationConfig {
                command: sh_command(simulation_script),
            },
            ..HarnessConfig::default()
        }
    }

    /// Invoker for the given inline `sh` scripts, rooted at this directory.
    pub fn invoker(&self, bootstrap_script: &str, simulation_script: &str) -> CommandInvoker {
        CommandInvoker::new(self.path(), &self.config(bootstrap_script, simulation_script))
    }
}
