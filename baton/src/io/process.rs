//! Helpers for running the simulation as a child process.
//!
//! stdout is the next state: it is drained concurrently while the child runs
//! and captured whole, never truncated. stderr is deliberately not piped; the
//! simulation's diagnostics belong on the caller's terminal.

use std::io::{ErrorKind, Read, Write};
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process result.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub timed_out: bool,
}

/// Run a command to completion, feeding `stdin` if given and capturing all of
/// stdout. Without `stdin` the child sees end-of-file immediately.
///
/// With a `timeout` the child is killed once the budget elapses and the
/// result carries `timed_out`; without one the harness waits indefinitely.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_command(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stdout_handle = thread::spawn(move || read_stream(stdout));

    // Feed input on its own thread while the reader drains stdout, so neither
    // pipe can fill up and deadlock the child.
    let stdin_handle = match stdin {
        Some(input) => {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(thread::spawn(move || write_input(&mut pipe, &input)))
        }
        None => None,
    };

    let mut timed_out = false;
    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
        None => child.wait().context("wait for command")?,
    };

    let stdout = join_reader(stdout_handle).context("join stdout")?;
    if let Some(handle) = stdin_handle {
        join_writer(handle).context("join stdin")?;
    }

    debug!(exit_code = ?status.code(), stdout_len = stdout.len(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        timed_out,
    })
}

// Dropping the pipe at the end closes the child's stdin.
fn write_input(pipe: &mut ChildStdin, input: &[u8]) -> Result<()> {
    match pipe.write_all(input) {
        // A child may exit without consuming its whole input; its exit status
        // is the verdict, not the broken pipe.
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        result => result.context("write stdin"),
    }
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}

fn join_reader(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn join_writer(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("input writer thread panicked")),
    }
}
