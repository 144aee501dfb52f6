use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use stacked_errors::{Result, StackableErr};
use tracing::info;

use crate::{Command, FileOptions};

/// The fixed line printed to the error console before the captured stderr
/// when the invoked command exits unsuccessfully
pub const FAILURE_DIAGNOSTIC: &str =
    "containerized client invocation failed, captured stderr follows";

/// How the outer process exit status should relate to the inner invocation
/// outcome.
///
/// The lenient policy reports failures on the error console only and always
/// exits 0, so callers that want to detect failure must read the console (or
/// use [ExitPolicy::Strict]). This mirrors a common scripting contract where
/// a demonstration run is informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitPolicy {
    /// The process exits 0 regardless of the invocation outcome
    #[default]
    Lenient,
    /// An invocation failure is propagated as a nonzero process exit status
    Strict,
}

impl ExitPolicy {
    /// Maps an invocation outcome to the process exit status under this
    /// policy
    pub fn status_for(&self, outcome: &CaptureOutcome) -> u8 {
        match (self, outcome) {
            (ExitPolicy::Strict, CaptureOutcome::Failure { .. }) => 1,
            _ => 0,
        }
    }
}

/// The classified result of one invocation. Exactly one of these is produced
/// per [OneshotCapture::run], and only after the child process has fully
/// terminated.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The command exited successfully; its full stdout was persisted to the
    /// output file and echoed to the console
    Success { stdout: String },
    /// The command exited unsuccessfully (or was killed by a signal); its
    /// stderr was reported on the error console and the output file was left
    /// untouched
    Failure { stderr: String },
}

impl CaptureOutcome {
    pub fn successful(&self) -> bool {
        matches!(self, CaptureOutcome::Success { .. })
    }
}

/// A single-shot invocation of an external command with output capture and
/// persistence.
///
/// Runs the command to completion, then classifies: a successful exit status
/// overwrites `output_path` wholesale with the captured stdout (creating the
/// file if absent) and echoes the same stdout to the console; an unsuccessful
/// exit status prints [FAILURE_DIAGNOSTIC] and the captured stderr to the
/// error console and does not create or modify `output_path`. Both branches
/// return normally, an `Err` from [OneshotCapture::run] means infrastructure
/// failed (the command could not be spawned, the output file could not be
/// written, or the captured stdout was not valid UTF-8), not that the command
/// itself exited unsuccessfully.
#[must_use]
#[derive(Debug, Clone)]
pub struct OneshotCapture {
    pub command: Command,
    pub output_path: PathBuf,
}

impl OneshotCapture {
    pub fn new(command: Command, output_path: impl AsRef<Path>) -> Self {
        Self {
            command,
            output_path: output_path.as_ref().to_owned(),
        }
    }

    pub async fn run(self) -> Result<CaptureOutcome> {
        let comres = self
            .command
            .run_to_completion()
            .await
            .stack_err("OneshotCapture::run")?;
        if comres.successful() {
            let stdout = comres
                .stdout_as_utf8()
                .stack_err_with(|| {
                    format!(
                        "OneshotCapture::run -> captured stdout of {:?} is not valid UTF-8",
                        comres.command
                    )
                })?
                .to_owned();
            FileOptions::write_str(&self.output_path, &stdout)
                .await
                .stack_err_with(|| {
                    format!(
                        "OneshotCapture::run -> could not persist stdout to {:?}",
                        self.output_path
                    )
                })?;
            info!(
                "wrote {} bytes to {}",
                stdout.len(),
                self.output_path.display()
            );
            print!("{stdout}");
            Ok(CaptureOutcome::Success { stdout })
        } else {
            // the stderr is diagnostic text, a lossy decode must not be able to fail
            let stderr = comres.stderr_as_utf8_lossy().into_owned();
            eprintln!("{}", FAILURE_DIAGNOSTIC.red());
            eprint!("{stderr}");
            Ok(CaptureOutcome::Failure { stderr })
        }
    }
}
