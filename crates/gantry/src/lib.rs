//! Gantry - standard check pipeline for Rust repositories
//!
//! Call [`define_tasks`] from a repository's `xtask` binary to define the
//! standard format / generate / lint / test tasks, their category
//! aggregates, and the `check` aggregate on a [`Flow`](gantry_flow::Flow),
//! then hand control to `gantry_flow::boot`:
//!
//! ```no_run
//! use std::process::ExitCode;
//!
//! use gantry::{Registry, TaskOption};
//! use gantry_flow::{boot, Flow, FlowError};
//!
//! fn main() -> Result<ExitCode, FlowError> {
//!     let mut flow = Flow::new();
//!     let mut registry = Registry::new();
//!     gantry::define_tasks(&mut flow, &mut registry, Vec::<TaskOption>::new())?;
//!     Ok(boot::main(flow))
//! }
//! ```

mod probes;
mod tools;
mod versions;
mod workspace;

pub mod config;
pub mod registry;
pub mod review;
pub mod tasks;

pub use config::{Config, TaskOption, Tool};
pub use registry::{Category, Registry};
pub use review::{automated, exec_with_review};
pub use tasks::define_tasks;
