//! State handoff harness for turn-based external simulations.
//!
//! Each invocation runs exactly one turn: the persisted state goes to the
//! simulation on stdin, the caller's arguments pass through as its argv, and
//! whatever it prints on stdout becomes the state for the next turn.

use std::env;
use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;

use baton::exit_codes;
use baton::io::config::{CONFIG_FILE_NAME, load_config};
use baton::io::invoker::CommandInvoker;
use baton::io::state_store::StateStore;
use baton::logging;
use baton::turn::{SimulationFailedError, TurnPolicy, run_turn};

#[derive(Parser)]
#[command(
    name = "baton",
    version,
    about = "Persist a turn-based simulation's state between runs"
)]
struct Cli {
    /// Arguments forwarded verbatim to the simulation program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    sim_args: Vec<OsString>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let workdir = env::current_dir().context("resolve working directory")?;
    let config = load_config(&workdir.join(CONFIG_FILE_NAME))?;
    let store = StateStore::new(workdir.join(&config.state_path));
    let invoker = CommandInvoker::new(&workdir, &config);
    let policy = TurnPolicy {
        keep_failed_output: config.keep_failed_output,
    };
    run_turn(&store, &invoker, &cli.sim_args, &policy)?;
    Ok(())
}

/// Mirror the simulation's own exit code when it ran and failed; everything
/// else is a harness failure.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<SimulationFailedError>()
        .and_then(|failed| failed.status.code())
        .unwrap_or(exit_codes::FAILURE)
}
