use core::fmt;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    fmt::{Debug, Display},
    path::{Path, PathBuf},
    process::ExitStatus,
    str::Utf8Error,
};

use serde::{Deserialize, Serialize};
use stacked_errors::{bail_locationless, DisplayStr, Result, StackableErr};

use crate::{command_runner, CommandRunner};

/// An OS command, `tokio::process::Command` wrapped with a builder that keeps
/// the program and every argument as a discrete `OsString`. Nothing here ever
/// passes through a shell, so an argument with spaces or metacharacters
/// reaches the child process as exactly one argument.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Command {
    /// The program to run
    pub program: OsString,
    /// All the arguments that will be passed to the program
    pub args: Vec<OsString>,
    /// If set, the environment variable map is cleared (before the `envs` are
    /// applied)
    pub env_clear: bool,
    /// Environment variable mappings
    pub envs: Vec<(OsString, OsString)>,
    /// Working directory for the process. `acquire_dir_path` is used on this
    /// when the `Command` is run.
    pub cwd: Option<PathBuf>,
    /// If `false`, then killing the child on drop is enabled. NOTE: this
    /// should not be relied upon in normal program operation, a
    /// `CommandRunner` should be properly finished so that the child process
    /// is cleaned up properly.
    pub forget_on_drop: bool,
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "Command {{program: {:?},",
            DisplayStr(&self.get_unified_command()),
        ))?;
        if self.env_clear {
            f.write_fmt(format_args!(" env_clear: true,"))?;
        }
        if !self.envs.is_empty() {
            f.write_fmt(format_args!(" envs: {:?},", self.envs))?;
        }
        if let Some(cwd) = &self.cwd {
            f.write_fmt(format_args!(" cwd: {cwd:?},"))?;
        }
        if self.forget_on_drop {
            f.write_fmt(format_args!(" forget_on_drop: true,"))?;
        }
        f.write_fmt(format_args!("}}"))
    }
}

impl Command {
    /// Creates a new `Command` for launching the `program`. This has no
    /// preprocessing of the input like [Command::new] does.
    ///
    /// The default configuration is to inherit the current process's
    /// environment and working directory.
    pub fn new_os_str(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().into(),
            ..Default::default()
        }
    }

    /// Creates a `Command` that only sets the `program` and `args` and leaves
    /// other things as their default values. `program_with_args` is separated
    /// by whitespace, the first part becomes the program, and the others are
    /// inserted as args.
    ///
    /// In case an argument has spaces, it should be added through
    /// [Command::arg] as an unbroken `&str`.
    pub fn new(program_with_args: impl AsRef<str>) -> Self {
        let mut program = String::new();
        let mut args: Vec<OsString> = vec![];
        for (i, part) in program_with_args.as_ref().split_whitespace().enumerate() {
            if i == 0 {
                part.clone_into(&mut program)
            } else {
                args.push(part.into());
            }
        }
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    /// Adds an argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().into());
        self
    }

    /// Adds arguments to be passed to the program
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().into()));
        self
    }

    /// Sets `self.cwd`
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_owned());
        self
    }

    /// Set if environment variables should be cleared
    pub fn env_clear(mut self, env_clear: bool) -> Self {
        self.env_clear = env_clear;
        self
    }

    /// Adds an environment variable
    pub fn env(mut self, env_key: impl AsRef<OsStr>, env_val: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((env_key.as_ref().into(), env_val.as_ref().into()));
        self
    }

    /// Adds environment variables
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.envs.extend(
            envs.into_iter()
                .map(|(k, v)| (k.as_ref().into(), v.as_ref().into())),
        );
        self
    }

    /// Sets `forget_on_drop`
    pub fn forget_on_drop(mut self, forget_on_drop: bool) -> Self {
        self.forget_on_drop = forget_on_drop;
        self
    }

    /// Gets the program and args interspersed with spaces
    pub(crate) fn get_unified_command(&self) -> String {
        let mut command = self.program.to_string_lossy().into_owned();
        if !self.args.is_empty() {
            command += " ";
            for (i, arg) in self.args.iter().enumerate() {
                command += arg.to_string_lossy().as_ref();
                if i != (self.args.len() - 1) {
                    command += " ";
                }
            }
        }
        command
    }

    /// Spawns the child process with null stdin and piped stdout and stderr,
    /// returning a [CommandRunner] that is draining both streams.
    pub async fn run(self) -> Result<CommandRunner> {
        command_runner(self).await
    }

    /// Calls [Command::run] and waits for the child to terminate, returning
    /// the [CommandResult]
    pub async fn run_to_completion(self) -> Result<CommandResult> {
        self.run()
            .await
            .stack_err_locationless("Command::run_to_completion")?
            .wait_with_output()
            .await
    }
}

/// The result of a [Command](crate::Command), assembled only after the child
/// process has fully terminated and both standard streams have been drained.
#[must_use]
#[derive(Clone)]
pub struct CommandResult {
    // the command information is kept around for failures
    pub command: Command,
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Debug for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "CommandResult {{\ncommand: {:?},\nstatus: {:?},\n",
            self.command, self.status
        ))?;
        // move the commas out of the way of the stdout and stderr
        let stdout = self.stdout_as_utf8_lossy();
        if !stdout.is_empty() {
            f.write_fmt(format_args!("stdout: {}\n,", stdout))?;
        }
        let stderr = self.stderr_as_utf8_lossy();
        if !stderr.is_empty() {
            f.write_fmt(format_args!("stderr: {}\n,", stderr))?;
        }
        f.write_fmt(format_args!("}}"))
    }
}

impl Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:#?}", self))
    }
}

impl CommandResult {
    /// Returns if the command completed with a successful return status
    pub fn successful(&self) -> bool {
        self.status.success()
    }

    /// Returns the integer exit status if the child exited normally, `None`
    /// if it was terminated by a signal
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Returns a formatted error with relevant information if the command was
    /// not successful
    pub fn assert_success(&self) -> Result<()> {
        if self.status.success() {
            Ok(())
        } else {
            bail_locationless!("{self:#?}.assert_success() -> unsuccessful")
        }
    }

    /// Returns `str::from_utf8(&self.stdout)`
    pub fn stdout_as_utf8(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(&self.stdout)
    }

    /// Returns `str::from_utf8(&self.stderr)`
    pub fn stderr_as_utf8(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(&self.stderr)
    }

    /// Returns `String::from_utf8_lossy(&self.stdout)`
    pub fn stdout_as_utf8_lossy(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Returns `String::from_utf8_lossy(&self.stderr)`
    pub fn stderr_as_utf8_lossy(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.stderr)
    }
}
