//! Escalation of lint failures to review annotations

use gantry_flow::{exec, exec_with, Context, ExecOptions};

use crate::config::Config;

/// Whether the process is running under continuous integration, from the
/// `CI` environment variable.
///
/// Read once at the call site and passed into [`exec_with_review`], keeping
/// the escalation logic itself independent of the process environment.
pub fn automated() -> bool {
    std::env::var("CI").map(|v| v == "true").unwrap_or(false)
}

/// Run `command`, escalating a failure to reviewdog in automated mode.
///
/// Outside automated mode, or when escalation is disabled, the command runs
/// with inherited output and its own result is the overall result. In
/// automated mode the command runs with stderr captured; on failure the
/// reviewdog command is fed that stderr on stdin and its result becomes the
/// overall result, so findings surface as review annotations instead of raw
/// log output.
pub async fn exec_with_review(
    ctx: &Context,
    conf: &Config,
    reviewdog_run: &str,
    format_args: &str,
    command: &str,
    automated: bool,
) -> bool {
    if conf.disable_reviewdog || !automated {
        return exec(ctx, command).await;
    }

    let primary = exec_with(ctx, command, ExecOptions::new().capture_stderr()).await;
    if primary.success {
        return true;
    }

    let report = format!("{reviewdog_run} {format_args} -fail-level=warning -reporter=github-check");
    let escalated = exec_with(ctx, &report, ExecOptions::new().stdin(primary.stderr)).await;
    if !escalated.success {
        ctx.error(format!("failed to report lint output: {command}"));
    }
    escalated.success
}
