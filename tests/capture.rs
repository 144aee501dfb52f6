use mint_capture::{CaptureOutcome, Command, ExitPolicy, FileOptions, OneshotCapture};
use stacked_errors::{ensure, ensure_eq, Result, StackableErr};
use tempfile::TempDir;

fn sh(script: &str) -> Command {
    Command::new("sh -c").arg(script)
}

fn output_path(tmp: &TempDir) -> std::path::PathBuf {
    tmp.path().join("output.txt")
}

#[tokio::test]
async fn success_persists_and_returns_stdout() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let outcome = OneshotCapture::new(sh("printf ok"), &path).run().await.stack()?;
    ensure_eq!(outcome, CaptureOutcome::Success {
        stdout: "ok".to_owned()
    });
    ensure_eq!(FileOptions::read_to_string(&path).await.stack()?, "ok");
    Ok(())
}

#[tokio::test]
async fn failure_reports_stderr_and_creates_no_file() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let outcome = OneshotCapture::new(sh("printf boom 1>&2; exit 1"), &path)
        .run()
        .await
        .stack()?;
    // no error is raised to the caller, the failure is data
    ensure_eq!(outcome, CaptureOutcome::Failure {
        stderr: "boom".to_owned()
    });
    ensure!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn empty_stdout_still_produces_an_empty_file() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let outcome = OneshotCapture::new(sh("true"), &path).run().await.stack()?;
    ensure_eq!(outcome, CaptureOutcome::Success {
        stdout: String::new()
    });
    ensure!(path.exists());
    ensure_eq!(FileOptions::read_to_string(&path).await.stack()?, "");
    Ok(())
}

#[tokio::test]
async fn repeated_success_overwrites_wholesale() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let first = OneshotCapture::new(sh("printf 'first run, longer text'"), &path)
        .run()
        .await
        .stack()?;
    ensure!(first.successful());
    let second = OneshotCapture::new(sh("printf second"), &path)
        .run()
        .await
        .stack()?;
    ensure!(second.successful());
    // full overwrite, not append, and no remnant of the longer first write
    ensure_eq!(FileOptions::read_to_string(&path).await.stack()?, "second");
    Ok(())
}

#[tokio::test]
async fn failure_leaves_previous_content_untouched() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let kept = OneshotCapture::new(sh("printf kept"), &path).run().await.stack()?;
    ensure!(kept.successful());
    let outcome = OneshotCapture::new(sh("exit 1"), &path).run().await.stack()?;
    ensure!(!outcome.successful());
    ensure_eq!(FileOptions::read_to_string(&path).await.stack()?, "kept");
    Ok(())
}

#[tokio::test]
async fn multiline_stdout_is_persisted_exactly() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let outcome = OneshotCapture::new(sh("printf 'a\\nb\\n'"), &path)
        .run()
        .await
        .stack()?;
    ensure_eq!(outcome, CaptureOutcome::Success {
        stdout: "a\nb\n".to_owned()
    });
    ensure_eq!(FileOptions::read_to_string(&path).await.stack()?, "a\nb\n");
    Ok(())
}

#[tokio::test]
async fn killed_by_signal_is_a_failure() -> Result<()> {
    let tmp = TempDir::new().stack()?;
    let path = output_path(&tmp);
    let outcome = OneshotCapture::new(sh("kill -9 $$"), &path).run().await.stack()?;
    ensure!(!outcome.successful());
    ensure!(!path.exists());
    Ok(())
}

#[test]
fn exit_policy_mapping() {
    let success = CaptureOutcome::Success {
        stdout: String::new(),
    };
    let failure = CaptureOutcome::Failure {
        stderr: String::new(),
    };
    assert_eq!(ExitPolicy::Lenient.status_for(&success), 0);
    assert_eq!(ExitPolicy::Lenient.status_for(&failure), 0);
    assert_eq!(ExitPolicy::Strict.status_for(&success), 0);
    assert_eq!(ExitPolicy::Strict.status_for(&failure), 1);
}
