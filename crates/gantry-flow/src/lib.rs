//! Gantry Flow - task graph definition and execution
//!
//! This crate provides the generic engine under Gantry: named tasks with
//! dependency lists and a parallel-safety flag, an executor that runs a
//! requested task and its transitive dependencies exactly once each, a
//! subprocess helper for task actions, and a CLI boot layer.

pub mod boot;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod flow;
pub mod reporter;
pub mod task;

pub use error::FlowError;
pub use exec::{exec, exec_in, exec_with, ExecOptions, ExecOutput};
pub use flow::{Context, Flow, RunOptions, RunSummary, TaskOutcome, TaskStatus};
pub use reporter::{CollectingReporter, FlowEvent, Reporter, TracingReporter};
pub use task::{Task, TaskHandle};
