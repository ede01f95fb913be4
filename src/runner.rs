//! Executes a single job and turns what happened into a [`JobOutcome`].
//!
//! The runner knows nothing about other jobs, admission or the display. It is
//! safe to call from many worker threads at once on different jobs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::job::{BuildUnit, Job, JobOutcome};

/// Runs `job` once and reports its terminal outcome.
///
/// A panic inside the unit is caught and reported as a failure of that job.
pub fn run(job: &Job) -> JobOutcome {
    debug!(job = %job.name, "executing build unit");
    match panic::catch_unwind(AssertUnwindSafe(|| job.unit.build())) {
        Ok(Ok(())) => JobOutcome::Succeeded,
        Ok(Err(detail)) => JobOutcome::Failed(detail),
        Err(payload) => JobOutcome::Failed(format!(
            "{} panicked: {}",
            job.name,
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}

/// A build carried out by one shell invocation.
///
/// Standard output and standard error share a single pipe so the captured
/// log keeps the interleaving the build produced.
#[derive(Debug, Clone)]
pub struct ShellBuild {
    pub shell: PathBuf,
    pub script: String,
    pub cwd: PathBuf,
}

impl ShellBuild {
    pub fn new(shell: impl Into<PathBuf>, script: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            script: script.into(),
            cwd: cwd.into(),
        }
    }
}

impl BuildUnit for ShellBuild {
    fn build(&self) -> Result<(), String> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(format!("exec 2>&1\n{}", self.script))
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| format!("failed to start {}: {err}", self.shell.display()))?;

        if output.status.success() {
            return Ok(());
        }

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        // Only populated if the script closed its own redirection.
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        if log.trim().is_empty() {
            log = format!("build exited with {} and produced no output", output.status);
        }
        Err(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &TempDir) -> ShellBuild {
        ShellBuild::new("/bin/sh", script, cwd.path())
    }

    #[test]
    fn successful_unit_succeeds() {
        let job = Job::from_fn("ok", || Ok(()));
        assert_eq!(run(&job), JobOutcome::Succeeded);
    }

    #[test]
    fn failing_unit_keeps_detail_verbatim() {
        let job = Job::from_fn("bad", || Err("error: undefined reference\n".to_string()));
        assert_eq!(
            run(&job),
            JobOutcome::Failed("error: undefined reference\n".into())
        );
    }

    #[test]
    fn panicking_unit_becomes_failure() {
        let job = Job::from_fn("explodes", || panic!("toolchain missing"));
        match run(&job) {
            JobOutcome::Failed(detail) => {
                assert_eq!(detail, "explodes panicked: toolchain missing");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn shell_build_success() {
        let tmp = TempDir::new().unwrap();
        let job = Job::new("touch", sh("echo building; touch built.marker", &tmp));
        assert_eq!(run(&job), JobOutcome::Succeeded);
        assert!(tmp.path().join("built.marker").exists());
    }

    #[test]
    fn shell_build_merges_streams_in_order() {
        let tmp = TempDir::new().unwrap();
        let unit = sh("echo configuring; echo 'fatal: no compiler' >&2; echo done; exit 3", &tmp);
        assert_eq!(
            unit.build(),
            Err("configuring\nfatal: no compiler\ndone\n".to_string())
        );
    }

    #[test]
    fn shell_build_silent_failure_reports_status() {
        let tmp = TempDir::new().unwrap();
        let err = sh("exit 7", &tmp).build().unwrap_err();
        assert!(err.contains("produced no output"), "{err}");
        assert!(err.contains('7'), "{err}");
    }

    #[test]
    fn shell_build_missing_shell() {
        let tmp = TempDir::new().unwrap();
        let unit = ShellBuild::new("/definitely/not/a/shell", "true", tmp.path());
        let err = unit.build().unwrap_err();
        assert!(err.starts_with("failed to start /definitely/not/a/shell:"), "{err}");
    }
}
