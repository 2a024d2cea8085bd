// src/exec/process.rs

//! Child process spawning for the compiler command.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{ChiselError, Result};
use crate::exec::CompileOutcome;

/// Run `cmd` through the platform shell with inherited stdio and wait for it.
///
/// Compiler diagnostics go straight to the user's terminal. There is no
/// cancellation: once started, the process is always awaited to completion.
pub async fn run_shell(cmd: &str) -> Result<CompileOutcome> {
    info!(cmd = %cmd, "starting compiler");

    let mut command = shell_command(cmd);
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = command.spawn().map_err(|source| ChiselError::Spawn {
        cmd: cmd.to_string(),
        source,
    })?;

    let status = child.wait().await?;
    let outcome = outcome_from_status(status);
    debug!(cmd = %cmd, ?outcome, "compiler process exited");
    Ok(outcome)
}

fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

fn outcome_from_status(status: ExitStatus) -> CompileOutcome {
    match status.code() {
        Some(code) => CompileOutcome::Exited(code),
        None => CompileOutcome::Signalled(signal_of(&status)),
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}
