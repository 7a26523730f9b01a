//! Invoker abstraction for simulation runs.
//!
//! The [`Invoker`] trait decouples turn orchestration from how the external
//! simulation is launched (currently configured command lines). Tests use
//! scripted invokers that return predetermined results without spawning
//! processes.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use crate::io::config::HarnessConfig;
use crate::io::process::run_command;

/// Captured result of one simulation run.
#[derive(Debug)]
pub struct Invocation {
    /// How the simulation exited. Judging it is the caller's business.
    pub status: ExitStatus,
    /// Everything the simulation wrote to stdout, which becomes the next
    /// state when the run is judged successful.
    pub state: Vec<u8>,
}

/// Abstraction over launching the external simulation.
pub trait Invoker {
    /// Run the bootstrap entry point with nothing piped to stdin.
    fn run_fresh(&self, args: &[OsString]) -> Result<Invocation>;

    /// Run the pre-built simulation with `prior_state` piped to stdin.
    fn run_continuing(&self, prior_state: &[u8], args: &[OsString]) -> Result<Invocation>;
}

/// Invoker that spawns the command lines configured in `baton.toml`.
pub struct CommandInvoker {
    workdir: PathBuf,
    bootstrap: Vec<String>,
    simulation: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandInvoker {
    pub fn new(workdir: impl Into<PathBuf>, config: &HarnessConfig) -> Self {
        Self {
            workdir: workdir.into(),
            bootstrap: config.bootstrap.command.clone(),
            simulation: config.simulation.command.clone(),
            timeout: config.turn_timeout_secs.map(Duration::from_secs),
        }
    }

    // Caller args go after the configured words, untouched and in order.
    fn command(&self, parts: &[String], args: &[OsString]) -> Command {
        let mut cmd = Command::new(&parts[0]);
        cmd.args(&parts[1..]).args(args).current_dir(&self.workdir);
        cmd
    }

    fn run(&self, parts: &[String], stdin: Option<&[u8]>, args: &[OsString]) -> Result<Invocation> {
        let output = run_command(self.command(parts, args), stdin, self.timeout)
            .with_context(|| format!("run {}", parts[0]))?;
        if output.timed_out {
            return Err(anyhow!(
                "{} timed out after {}s",
                parts[0],
                self.timeout.unwrap_or_default().as_secs()
            ));
        }
        Ok(Invocation {
            status: output.status,
            state: output.stdout,
        })
    }
}

impl Invoker for CommandInvoker {
    #[instrument(skip_all, fields(args = args.len()))]
    fn run_fresh(&self, args: &[OsString]) -> Result<Invocation> {
        info!(command = %self.bootstrap.join(" "), "bootstrapping simulation");
        self.run(&self.bootstrap, None, args)
    }

    #[instrument(skip_all, fields(prior_len = prior_state.len(), args = args.len()))]
    fn run_continuing(&self, prior_state: &[u8], args: &[OsString]) -> Result<Invocation> {
        debug!(command = %self.simulation.join(" "), "advancing simulation");
        self.run(&self.simulation, Some(prior_state), args)
    }
}
