//! Filesystem probes gating task applicability
//!
//! Probe failures (unreadable paths, broken canonicalization) degrade to
//! "absent" so orchestration never aborts on a predicate.

use std::path::{Path, PathBuf};

/// Whether `path` exists and is readable.
pub(crate) fn file_exists(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path).is_ok()
}

/// Whether any of `names` exists directly under `dir`.
pub(crate) fn any_exists(dir: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| file_exists(dir.join(name)))
}

/// Walk up from `start` to the repository root, marked by `.git` or a
/// workspace `Cargo.lock`. Returns the root and the path of `start`
/// relative to it (`.` when they coincide).
pub(crate) fn repo_root_and_target(start: &Path) -> Option<(PathBuf, PathBuf)> {
    let dir = start.canonicalize().ok()?;
    let mut base = dir.clone();
    loop {
        if any_exists(&base, &[".git", "Cargo.lock"]) {
            let target = dir.strip_prefix(&base).ok()?;
            let target = if target.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                target.to_path_buf()
            };
            return Some((base, target));
        }
        match base.parent() {
            Some(parent) => base = parent.to_path_buf(),
            None => return None,
        }
    }
}
