use mint_capture::{acquire_dir_path, Command};
use stacked_errors::{ensure, ensure_eq, Result, StackableErr};

// the invocation layer never goes through a shell, an argument with spaces
// must reach the child as exactly one argument
#[tokio::test]
async fn args_are_discrete() -> Result<()> {
    let comres = Command::new("printf %s")
        .arg("a b")
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(comres.stdout_as_utf8().stack()?, "a b");
    Ok(())
}

#[tokio::test]
async fn whitespace_splitting_in_new() -> Result<()> {
    // `new` splits only its own input, later `arg`s are untouched
    let comres = Command::new("printf %s%s")
        .arg("a")
        .arg("b")
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(comres.stdout_as_utf8().stack()?, "ab");
    Ok(())
}

#[tokio::test]
async fn stdout_and_stderr_are_separated() -> Result<()> {
    let comres = Command::new("sh -c")
        .arg("printf out; printf err 1>&2")
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(comres.stdout_as_utf8().stack()?, "out");
    ensure_eq!(comres.stderr_as_utf8().stack()?, "err");
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_not_an_error() -> Result<()> {
    // there is no error at the command running stage, only `assert_success`
    // and the status report it
    let comres = Command::new("sh -c")
        .arg("exit 3")
        .run_to_completion()
        .await
        .stack()?;
    ensure!(!comres.successful());
    ensure_eq!(comres.exit_code(), Some(3));
    ensure!(comres.assert_success().is_err());
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_an_error() -> Result<()> {
    let res = Command::new("nonexistent_program_for_spawn_failure")
        .run_to_completion()
        .await;
    ensure!(res.is_err());
    Ok(())
}

#[tokio::test]
async fn envs_are_applied() -> Result<()> {
    let comres = Command::new("sh -c")
        .arg("printf %s \"$MARKER\"")
        .env("MARKER", "xyz")
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(comres.stdout_as_utf8().stack()?, "xyz");
    Ok(())
}

#[tokio::test]
async fn env_clear_removes_inherited_vars() -> Result<()> {
    // `HOME` is inherited normally, after a clear only the explicit `ONLY`
    // mapping remains
    let comres = Command::new("/bin/sh -c")
        .arg("printf %s \"${ONLY}${HOME:+home}\"")
        .env_clear(true)
        .env("ONLY", "x")
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(comres.stdout_as_utf8().stack()?, "x");
    Ok(())
}

#[tokio::test]
async fn cwd_is_applied() -> Result<()> {
    let tmp = tempfile::TempDir::new().stack()?;
    let canon = acquire_dir_path(tmp.path()).await.stack()?;
    let comres = Command::new("pwd")
        .cwd(tmp.path())
        .run_to_completion()
        .await
        .stack()?;
    comres.assert_success().stack()?;
    ensure_eq!(
        comres.stdout_as_utf8().stack()?.trim_end(),
        canon.to_str().stack()?
    );
    Ok(())
}

#[tokio::test]
async fn missing_cwd_is_an_error() -> Result<()> {
    let res = Command::new("pwd")
        .cwd("./nonexistent_directory_for_cwd_failure")
        .run_to_completion()
        .await;
    ensure!(res.is_err());
    Ok(())
}
