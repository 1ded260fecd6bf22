//! Command-line entry point for flow binaries

use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::exit_codes;
use crate::flow::{Flow, RunOptions};
use crate::reporter::TracingReporter;

/// Command-line arguments understood by [`main`].
#[derive(Debug, Parser)]
#[command(about = "Runs build pipeline tasks", long_about = None)]
pub struct Cli {
    /// Tasks to run; defaults to the flow's default task
    pub tasks: Vec<String>,

    /// Verbose output (-v=false to disable)
    #[arg(
        short,
        long,
        action = ArgAction::Set,
        default_value_t = true,
        default_missing_value = "true",
        num_args = 0..=1,
        require_equals = true
    )]
    pub verbose: bool,

    /// Command for tasks that execute a command in every workspace member
    #[arg(long)]
    pub cmd: Option<String>,

    /// List available tasks and exit
    #[arg(long)]
    pub list: bool,
}

/// Parse the process arguments and run `flow`, returning the process exit
/// code.
pub fn main(flow: Flow) -> ExitCode {
    run(flow, Cli::parse())
}

/// Run `flow` with already-parsed arguments.
pub fn run(flow: Flow, cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    if cli.list {
        for (name, usage) in flow.list() {
            println!("{name:<18} {usage}");
        }
        return ExitCode::from(exit_codes::SUCCESS);
    }

    let tasks: Vec<String> = if cli.tasks.is_empty() {
        match flow.default_task() {
            Some(handle) => vec![handle.name().to_string()],
            None => {
                eprintln!("no task specified and no default task is set");
                return ExitCode::from(exit_codes::USAGE_ERROR);
            }
        }
    } else {
        cli.tasks
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::from(exit_codes::TASK_FAILED);
        }
    };

    let options = RunOptions {
        command: cli.cmd,
        ..RunOptions::default()
    };
    match runtime.block_on(flow.execute(&tasks, options, Arc::new(TracingReporter))) {
        Ok(summary) if summary.success() => ExitCode::from(exit_codes::SUCCESS),
        Ok(_) => ExitCode::from(exit_codes::TASK_FAILED),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(exit_codes::USAGE_ERROR)
        }
    }
}

/// Console tracing with a verbosity-dependent default filter; `RUST_LOG`
/// still wins when set.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_defaults_to_true() {
        let cli = Cli::parse_from(["xtask"]);
        assert!(cli.verbose);
        assert!(cli.tasks.is_empty());
        assert!(cli.cmd.is_none());
    }

    #[test]
    fn test_verbose_can_be_disabled() {
        let cli = Cli::parse_from(["xtask", "-v=false", "check"]);
        assert!(!cli.verbose);
        assert_eq!(cli.tasks, vec!["check"]);
    }

    #[test]
    fn test_cmd_flag() {
        let cli = Cli::parse_from(["xtask", "runall", "--cmd", "cargo update"]);
        assert_eq!(cli.cmd.as_deref(), Some("cargo update"));
        assert_eq!(cli.tasks, vec!["runall"]);
    }

    #[test]
    fn test_multiple_tasks() {
        let cli = Cli::parse_from(["xtask", "lint", "test"]);
        assert_eq!(cli.tasks, vec!["lint", "test"]);
    }
}
