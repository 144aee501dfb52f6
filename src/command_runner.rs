use core::fmt;
use std::{fmt::Debug, process::Stdio};

use stacked_errors::{Result, StackableErr};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{self, Child},
    task::{self, JoinHandle},
};
use tracing::warn;

use crate::{acquire_dir_path, Command, CommandResult};

// note that most things should use `_locationless`, especially if they are
// expected to be able to error under normal `Command` running circumstances,
// the string info should be enough

/// Used as the engine of the stdout and stderr draining tasks. An `expect` is
/// used in here because it runs as a separate task.
async fn drain<R: AsyncRead + Unpin>(mut std_read: R) -> Vec<u8> {
    let mut record = Vec::new();
    std_read
        .read_to_end(&mut record)
        .await
        .expect("`mint_capture::Command` stdout or stderr draining failed on read");
    record
}

/// A spawned [Command](crate::Command) that has not terminated yet.
///
/// The child's stdout and stderr are being drained to completion by
/// background tasks; there is no surface for observing them incrementally.
/// Use [CommandRunner::wait_with_output] to wait for termination and get the
/// [CommandResult](crate::CommandResult).
///
/// If the `tracing` crate is used and a subscriber is active, warnings from
/// bad `Drop`s can be issued
#[must_use]
pub struct CommandRunner {
    // this information is kept around for failures
    /// The command this runner was started with
    command: Option<Command>,
    child_process: Option<Child>,
    stdout_drain: Option<JoinHandle<Vec<u8>>>,
    stderr_drain: Option<JoinHandle<Vec<u8>>>,
}

impl Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("command", &self.command)
            .field("child_process", &self.child_process)
            .finish()
    }
}

impl Drop for CommandRunner {
    fn drop(&mut self) {
        // we could call `try_wait` and see if the process has actually exited or not,
        // but the user should have called one of the consuming functions

        // we purposely parenthesize in this way to avoid calling `panicking` in the
        // normal case
        if self.child_process.is_some() && (!std::thread::panicking()) {
            warn!(
                "A `CommandRunner` was dropped without being properly finished, the command was: \
                 {}",
                self.command
                    .as_ref()
                    .map(|c| c.get_unified_command())
                    .unwrap_or_default()
            )
        }
    }
}

pub(crate) async fn command_runner(this: Command) -> Result<CommandRunner> {
    let mut cmd = process::Command::new(&this.program);
    if this.env_clear {
        // must happen before the `envs` call
        cmd.env_clear();
    }
    if let Some(ref cwd) = this.cwd {
        let cwd = acquire_dir_path(cwd)
            .await
            .stack_err_with_locationless(|| {
                format!("{this:?}.run() -> failed to acquire current working directory")
            })?;
        cmd.current_dir(cwd);
    }
    cmd.args(&this.args)
        .envs(this.envs.iter().map(|x| (&x.0, &x.1)))
        .kill_on_drop(!this.forget_on_drop);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .stack_err_with_locationless(|| {
            format!("{this:?}.run() -> failed to spawn child process")
        })?;
    // the pipes always exist because we always set them above
    let stdout = child.stdout.take().unwrap();
    let stderr = child.stderr.take().unwrap();
    let stdout_drain = task::spawn(drain(stdout));
    let stderr_drain = task::spawn(drain(stderr));
    Ok(CommandRunner {
        command: Some(this),
        child_process: Some(child),
        stdout_drain: Some(stdout_drain),
        stderr_drain: Some(stderr_drain),
    })
}

impl CommandRunner {
    /// Returns the `pid` of the child process. Returns `None` if the command
    /// has finished or the internal `id` call returned `None`.
    pub fn pid(&self) -> Option<u32> {
        if let Some(child_process) = self.child_process.as_ref() {
            if let Some(pid) = child_process.id() {
                return Some(pid)
            }
        }
        None
    }

    /// Waits for the child process to terminate and both standard streams to
    /// be drained to their ends, then assembles the [CommandResult] (or
    /// stalls forever if the OS command does, there is deliberately no
    /// timeout or cancellation path).
    ///
    /// Note: if this function succeeds, it only means that the OS calls all
    /// succeeded, it does not mean that the command itself had a successful
    /// return status, use `assert_success` or check the `status` on the
    /// `CommandResult`.
    pub async fn wait_with_output(mut self) -> Result<CommandResult> {
        let status = self
            .child_process
            .take()
            .stack_err_locationless("CommandRunner::wait_with_output -> already finished")?
            .wait()
            .await
            .stack_err_with_locationless(|| {
                format!("{self:?}.wait_with_output() -> failed when waiting on child process")
            })?;
        // the drains see stream ends once the child has exited
        let stdout = self
            .stdout_drain
            .take()
            .unwrap()
            .await
            .stack_err_with_locationless(|| {
                format!("{self:?}.wait_with_output() -> stdout drain task panicked")
            })?;
        let stderr = self
            .stderr_drain
            .take()
            .unwrap()
            .await
            .stack_err_with_locationless(|| {
                format!("{self:?}.wait_with_output() -> stderr drain task panicked")
            })?;
        Ok(CommandResult {
            command: self.command.take().unwrap(),
            status,
            stdout,
            stderr,
        })
    }
}
