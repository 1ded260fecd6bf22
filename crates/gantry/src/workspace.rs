//! Workspace member enumeration

use std::path::PathBuf;

use gantry_flow::{exec_with, Context, ExecOptions};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    manifest_path: PathBuf,
}

/// Directories of every workspace member, from `cargo metadata`. Reports a
/// task-local error and returns an empty list when enumeration fails.
pub(crate) async fn member_dirs(ctx: &Context) -> Vec<PathBuf> {
    let output = exec_with(
        ctx,
        "cargo metadata --no-deps --format-version 1",
        ExecOptions::new().capture_stdout(),
    )
    .await;
    if !output.success {
        ctx.error("failed to enumerate workspace members");
        return Vec::new();
    }
    match parse_member_dirs(&output.stdout) {
        Some(dirs) => dirs,
        None => {
            ctx.error("failed to parse cargo metadata output");
            Vec::new()
        }
    }
}

fn parse_member_dirs(json: &str) -> Option<Vec<PathBuf>> {
    let metadata: Metadata = serde_json::from_str(json).ok()?;
    Some(
        metadata
            .packages
            .iter()
            .filter_map(|p| p.manifest_path.parent().map(PathBuf::from))
            .collect(),
    )
}
