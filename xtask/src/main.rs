//! Build pipeline entry point for this repository

use std::process::ExitCode;

use gantry::{Registry, TaskOption};
use gantry_flow::{boot, Flow};

fn main() -> anyhow::Result<ExitCode> {
    let mut flow = Flow::new();
    let mut registry = Registry::new();
    gantry::define_tasks(&mut flow, &mut registry, Vec::<TaskOption>::new())?;
    Ok(boot::main(flow))
}
