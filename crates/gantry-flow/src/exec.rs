//! Subprocess execution helpers for task actions

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::flow::Context;

/// Ceiling applied to every external command invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Options for [`exec_with`].
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    dir: Option<PathBuf>,
    capture_stdout: bool,
    capture_stderr: bool,
    stdin: Option<String>,
    timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the command in `dir` instead of the current directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Capture stdout instead of inheriting it.
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Capture stderr instead of inheriting it.
    pub fn capture_stderr(mut self) -> Self {
        self.capture_stderr = true;
        self
    }

    /// Feed `input` to the command's stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Override the default invocation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of a command invocation. Captured streams are empty unless the
/// corresponding capture option was set.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    fn failure() -> Self {
        Self::default()
    }
}

/// Run a command line with inherited output, reporting a task-local error on
/// failure. Returns whether the command succeeded.
pub async fn exec(ctx: &Context, command: &str) -> bool {
    let output = exec_with(ctx, command, ExecOptions::new()).await;
    if !output.success {
        ctx.error(format!("command failed: {command}"));
    }
    output.success
}

/// Like [`exec`], but runs the command in `dir`.
pub async fn exec_in(ctx: &Context, command: &str, dir: impl Into<PathBuf>) -> bool {
    let output = exec_with(ctx, command, ExecOptions::new().dir(dir)).await;
    if !output.success {
        ctx.error(format!("command failed: {command}"));
    }
    output.success
}

/// Run a command line through `sh -c` with the given options.
///
/// Never marks the task failed; callers decide how to interpret the outcome.
pub async fn exec_with(ctx: &Context, command: &str, options: ExecOptions) -> ExecOutput {
    ctx.log(format!("exec: {command}"));

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).kill_on_drop(true);
    if let Some(dir) = &options.dir {
        cmd.current_dir(dir);
    }
    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    }
    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    }
    if options.stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(task = %ctx.name(), "failed to spawn '{command}': {err}");
            return ExecOutput::failure();
        }
    };

    if let Some(input) = &options.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(input.as_bytes()).await {
                tracing::warn!(task = %ctx.name(), "failed to write stdin: {err}");
            }
        }
    }

    let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Ok(Err(err)) => {
            tracing::warn!(task = %ctx.name(), "failed to wait for '{command}': {err}");
            ExecOutput::failure()
        }
        Err(_) => {
            tracing::warn!(
                task = %ctx.name(),
                "command timed out after {:.0}s: {command}",
                timeout.as_secs_f64()
            );
            ExecOutput::failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::flow::{Flow, RunOptions};
    use crate::reporter::CollectingReporter;
    use crate::task::Task;

    /// Runs `body` inside a single-task flow and returns whether the task
    /// succeeded.
    fn run_action<F, Fut>(body: F) -> bool
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut flow = Flow::new();
        flow.define(Task::new("probe", "Test probe.").action(body))
            .unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let summary = runtime
            .block_on(flow.execute(
                &["probe".to_string()],
                RunOptions::default(),
                Arc::new(CollectingReporter::default()),
            ))
            .unwrap();
        summary.success()
    }

    #[test]
    fn test_exec_success() {
        assert!(run_action(|ctx| async move {
            assert!(exec(&ctx, "true").await);
        }));
    }

    #[test]
    fn test_exec_failure_marks_task() {
        assert!(!run_action(|ctx| async move {
            assert!(!exec(&ctx, "exit 3").await);
        }));
    }

    #[test]
    fn test_exec_with_captures_output() {
        assert!(run_action(|ctx| async move {
            let output = exec_with(
                &ctx,
                "echo out; echo err >&2",
                ExecOptions::new().capture_stdout().capture_stderr(),
            )
            .await;
            assert!(output.success);
            assert_eq!(output.stdout.trim(), "out");
            assert_eq!(output.stderr.trim(), "err");
        }));
    }

    #[test]
    fn test_exec_with_feeds_stdin() {
        assert!(run_action(|ctx| async move {
            let output = exec_with(
                &ctx,
                "cat",
                ExecOptions::new().capture_stdout().stdin("ping"),
            )
            .await;
            assert!(output.success);
            assert_eq!(output.stdout, "ping");
        }));
    }

    #[test]
    fn test_exec_with_does_not_mark_failure() {
        assert!(run_action(|ctx| async move {
            let output = exec_with(&ctx, "exit 1", ExecOptions::new()).await;
            assert!(!output.success);
            assert!(!ctx.failed());
        }));
    }

    #[test]
    fn test_exec_in_runs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let command = format!("touch {}", marker.display());
        let dir_path = dir.path().to_path_buf();
        assert!(run_action(move |ctx| {
            let command = command.clone();
            let dir_path = dir_path.clone();
            async move {
                assert!(exec_in(&ctx, &command, dir_path).await);
            }
        }));
        assert!(marker.exists());
    }

    #[test]
    fn test_timeout_fails_command() {
        assert!(run_action(|ctx| async move {
            let output = exec_with(
                &ctx,
                "sleep 5",
                ExecOptions::new().timeout(Duration::from_millis(50)),
            )
            .await;
            assert!(!output.success);
        }));
    }
}
