//! Standard task definitions and aggregate assembly

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gantry_flow::{exec, exec_in, Flow, FlowError, Task};

use crate::config::{Config, TaskOption, Tool};
use crate::probes;
use crate::registry::{Category, Registry};
use crate::review;
use crate::tools;
use crate::workspace;

/// Define the standard tasks for a Rust repository into `flow`.
///
/// Walks the fixed candidate set, skipping tasks named in the exclusion set
/// or whose applicability probe fails, and registers the rest into
/// `registry` by category. Tasks the caller registered before this call are
/// kept and end up ahead of the standard set in their category aggregate.
/// Finally the `format`, `generate`, `lint` and `test` aggregates are
/// assembled from the registry, along with `check` (the default task),
/// which depends on exactly `lint` and `test`.
pub fn define_tasks(
    flow: &mut Flow,
    registry: &mut Registry,
    options: impl IntoIterator<Item = TaskOption>,
) -> Result<(), FlowError> {
    define_tasks_at(flow, registry, options, Path::new("."))
}

pub(crate) fn define_tasks_at(
    flow: &mut Flow,
    registry: &mut Registry,
    options: impl IntoIterator<Item = TaskOption>,
    base: &Path,
) -> Result<(), FlowError> {
    let conf = Arc::new(Config::resolve(options));
    let setup = Setup::detect(Arc::clone(&conf), base);

    for candidate in CANDIDATES {
        if conf.excluded(candidate.name) {
            continue;
        }
        if !(candidate.applicable)(&setup) {
            continue;
        }
        let handle = flow.define((candidate.build)(&setup))?;
        registry.register(candidate.category, handle);
        registry.register_downloads((candidate.downloads)(&setup));
    }

    flow.define(download_task(&setup, registry))?;

    flow.define(
        Task::new("format", "Formats code in various languages.")
            .depends(registry.enumerate(Category::Format).to_vec()),
    )?;
    let lint = flow.define(
        Task::new("lint", "Lints code in various languages.")
            .depends(registry.enumerate(Category::Lint).to_vec()),
    )?;
    flow.define(
        Task::new("generate", "Generates code.")
            .depends(registry.enumerate(Category::Generate).to_vec()),
    )?;
    let test = flow.define(
        Task::new("test", "Runs tests.").depends(registry.enumerate(Category::Test).to_vec()),
    )?;
    let check = flow.define(Task::new("check", "Runs all checks.").depends([lint, test]))?;
    flow.set_default(check);

    Ok(())
}

/// Frozen inputs shared by every candidate in one orchestration call.
///
/// Computed once before the candidate loop so every task closure sees the
/// same target set.
struct Setup {
    conf: Arc<Config>,
    base: PathBuf,
    /// Manifests the Rust format/lint tasks operate on.
    manifests: Arc<Vec<String>>,
    has_root_manifest: bool,
    /// Repository root and the path back down to `base`, for tools that
    /// must run from the root.
    root_target: Option<(PathBuf, PathBuf)>,
}

impl Setup {
    fn detect(conf: Arc<Config>, base: &Path) -> Self {
        let mut manifests = Vec::new();
        let has_root_manifest = probes::file_exists(base.join("Cargo.toml"));
        if has_root_manifest {
            manifests.push("Cargo.toml".to_string());
        }
        // Repos commonly keep their pipeline binary in a standalone xtask
        // workspace; when one is present it gets checked too.
        if probes::file_exists(base.join("xtask").join("Cargo.toml")) {
            manifests.push("xtask/Cargo.toml".to_string());
        }
        Self {
            conf,
            base: base.to_path_buf(),
            manifests: Arc::new(manifests),
            has_root_manifest,
            root_target: probes::repo_root_and_target(base),
        }
    }
}

/// A candidate task: when it applies and how to build it.
struct Candidate {
    name: &'static str,
    category: Category,
    applicable: fn(&Setup) -> bool,
    downloads: fn(&Setup) -> Vec<String>,
    build: fn(&Setup) -> Task,
}

const CANDIDATES: &[Candidate] = &[
    Candidate {
        name: "format-rust",
        category: Category::Format,
        applicable: always,
        downloads: no_downloads,
        build: format_rust,
    },
    Candidate {
        name: "lint-rust",
        category: Category::Lint,
        applicable: always,
        downloads: downloads_reviewdog,
        build: lint_rust,
    },
    Candidate {
        name: "format-markdown",
        category: Category::Format,
        applicable: always,
        downloads: downloads_prettier,
        build: format_markdown,
    },
    Candidate {
        name: "lint-markdown",
        category: Category::Lint,
        applicable: always,
        downloads: downloads_prettier,
        build: lint_markdown,
    },
    Candidate {
        name: "format-shell",
        category: Category::Format,
        applicable: always,
        downloads: downloads_prettier,
        build: format_shell,
    },
    Candidate {
        name: "lint-shell",
        category: Category::Lint,
        applicable: always,
        downloads: downloads_prettier,
        build: lint_shell,
    },
    Candidate {
        name: "format-yaml",
        category: Category::Format,
        applicable: always,
        downloads: downloads_prettier,
        build: format_yaml,
    },
    Candidate {
        name: "lint-yaml",
        category: Category::Lint,
        applicable: always,
        downloads: downloads_yaml,
        build: lint_yaml,
    },
    Candidate {
        name: "test-rust",
        category: Category::Test,
        applicable: always,
        downloads: no_downloads,
        build: test_rust,
    },
    Candidate {
        name: "runall",
        category: Category::Generate,
        applicable: always,
        downloads: no_downloads,
        build: runall,
    },
    Candidate {
        name: "lint-actions",
        category: Category::Lint,
        applicable: has_workflows,
        downloads: downloads_actions,
        build: lint_actions,
    },
];

fn always(_setup: &Setup) -> bool {
    true
}

fn has_workflows(setup: &Setup) -> bool {
    probes::file_exists(setup.base.join(".github"))
}

fn no_downloads(_setup: &Setup) -> Vec<String> {
    Vec::new()
}

fn downloads_reviewdog(setup: &Setup) -> Vec<String> {
    vec![tools::download(&setup.conf, Tool::Reviewdog)]
}

fn downloads_prettier(setup: &Setup) -> Vec<String> {
    vec![tools::download(&setup.conf, Tool::Prettier)]
}

fn downloads_yaml(setup: &Setup) -> Vec<String> {
    vec![
        tools::download(&setup.conf, Tool::Prettier),
        tools::download(&setup.conf, Tool::Yamllint),
    ]
}

fn downloads_actions(setup: &Setup) -> Vec<String> {
    vec![
        tools::download(&setup.conf, Tool::Zizmor),
        tools::download(&setup.conf, Tool::Actionlint),
        tools::download(&setup.conf, Tool::Shellcheck),
    ]
}

fn format_rust(setup: &Setup) -> Task {
    let manifests = Arc::clone(&setup.manifests);
    Task::new("format-rust", "Formats Rust code.")
        .parallel(true)
        .action(move |ctx| {
            let manifests = Arc::clone(&manifests);
            async move {
                for manifest in manifests.iter() {
                    exec(&ctx, &format!("cargo fmt --all --manifest-path {manifest}")).await;
                }
            }
        })
}

fn lint_rust(setup: &Setup) -> Task {
    let conf = Arc::clone(&setup.conf);
    let manifests = Arc::clone(&setup.manifests);
    let has_root_manifest = setup.has_root_manifest;
    Task::new("lint-rust", "Lints Rust code.")
        .parallel(true)
        .action(move |ctx| {
            let conf = Arc::clone(&conf);
            let manifests = Arc::clone(&manifests);
            async move {
                let automated = review::automated();
                let reviewdog_run = tools::runner(&conf, Tool::Reviewdog);
                for manifest in manifests.iter() {
                    let mut command = format!(
                        "cargo clippy --workspace --all-targets --manifest-path {manifest}"
                    );
                    if !conf.feature_tags.is_empty() {
                        command.push_str(" --features ");
                        command.push_str(&conf.feature_tags.join(","));
                    }
                    review::exec_with_review(
                        &ctx,
                        &conf,
                        &reviewdog_run,
                        "-f=clippy -name=clippy",
                        &command,
                        automated,
                    )
                    .await;
                }
                if has_root_manifest {
                    exec(&ctx, "cargo fmt --all -- --check").await;
                }
            }
        })
}

fn format_markdown(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    Task::new("format-markdown", "Formats Markdown code.")
        .parallel(true)
        .action(move |ctx| {
            let command =
                format!("{prettier} --no-error-on-unmatched-pattern --write '**/*.md'");
            async move {
                exec(&ctx, &command).await;
            }
        })
}

fn lint_markdown(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    Task::new("lint-markdown", "Lints Markdown code.")
        .parallel(true)
        .action(move |ctx| {
            let command =
                format!("{prettier} --no-error-on-unmatched-pattern --check '**/*.md'");
            async move {
                exec(&ctx, &command).await;
            }
        })
}

const SHELL_PATTERNS: &str =
    "'**/*.sh' '**/*.bash' '**/Dockerfile' '**/*.dockerfile' '**/.*ignore' '**/.env*'";

fn format_shell(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    Task::new(
        "format-shell",
        "Formats shell-like code, including Dockerfile, ignore, dotenv.",
    )
    .parallel(true)
    .action(move |ctx| {
        let command =
            format!("{prettier} --no-error-on-unmatched-pattern --write {SHELL_PATTERNS}");
        async move {
            exec(&ctx, &command).await;
        }
    })
}

fn lint_shell(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    Task::new(
        "lint-shell",
        "Lints shell-like code, including Dockerfile, ignore, dotenv.",
    )
    .parallel(true)
    .action(move |ctx| {
        let command =
            format!("{prettier} --no-error-on-unmatched-pattern --check {SHELL_PATTERNS}");
        async move {
            exec(&ctx, &command).await;
        }
    })
}

fn format_yaml(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    Task::new("format-yaml", "Formats YAML code.")
        .parallel(true)
        .action(move |ctx| {
            let command = format!(
                "{prettier} --no-error-on-unmatched-pattern --write '**/*.yaml' '**/*.yml'"
            );
            async move {
                exec(&ctx, &command).await;
            }
        })
}

fn lint_yaml(setup: &Setup) -> Task {
    let prettier = tools::runner(&setup.conf, Tool::Prettier);
    let yamllint = tools::runner(&setup.conf, Tool::Yamllint);
    let root_target = setup.root_target.clone();
    Task::new("lint-yaml", "Lints YAML code.")
        .parallel(true)
        .action(move |ctx| {
            let prettier = prettier.clone();
            let yamllint = yamllint.clone();
            let root_target = root_target.clone();
            async move {
                exec(
                    &ctx,
                    &format!(
                        "{prettier} --no-error-on-unmatched-pattern --check '**/*.yaml' '**/*.yml'"
                    ),
                )
                .await;
                match root_target {
                    Some((root, target)) => {
                        exec_in(&ctx, &format!("{yamllint} {}", target.display()), root).await;
                    }
                    None => {
                        exec(&ctx, &format!("{yamllint} .")).await;
                    }
                }
            }
        })
}

fn test_rust(setup: &Setup) -> Task {
    let conf = Arc::clone(&setup.conf);
    Task::new("test-rust", "Runs Rust tests with coverage.").action(move |ctx| {
        let conf = Arc::clone(&conf);
        async move {
            if let Err(err) = ensure_artifacts_dir(&conf) {
                ctx.error(format!("failed to create artifacts directory: {err}"));
                return;
            }
            let coverage = conf.artifacts_path.join("coverage.txt");
            let runner = tools::runner_all(
                &conf,
                &[Tool::CargoLlvmCov, Tool::CargoNextest],
                "cargo llvm-cov nextest",
            );
            let mut command = format!("{} --lcov --output-path {}", runner, coverage.display());
            if let Some(level) = &conf.test_status_level {
                command.push_str(&format!(" --status-level={level}"));
            }
            exec(&ctx, &command).await;
        }
    })
}

/// Recursive and idempotent; the coverage report is written inside.
fn ensure_artifacts_dir(conf: &Config) -> std::io::Result<()> {
    std::fs::create_dir_all(&conf.artifacts_path)
}

fn runall(_setup: &Setup) -> Task {
    Task::new("runall", "Runs a command in each workspace member directory.").action(|ctx| {
        async move {
            let Some(command) = ctx.command().map(str::to_string) else {
                ctx.error("missing --cmd flag required for runall");
                return;
            };
            for dir in workspace::member_dirs(&ctx).await {
                exec_in(&ctx, &command, dir).await;
            }
        }
    })
}

fn lint_actions(setup: &Setup) -> Task {
    let zizmor = tools::runner(&setup.conf, Tool::Zizmor);
    let actionlint = tools::runner(&setup.conf, Tool::Actionlint);
    let shellcheck = tools::runner(&setup.conf, Tool::Shellcheck);
    Task::new("lint-actions", "Lints GitHub Actions workflows.")
        .parallel(true)
        .action(move |ctx| {
            let zizmor = zizmor.clone();
            let actionlint = actionlint.clone();
            let shellcheck = shellcheck.clone();
            async move {
                exec(&ctx, &format!("{zizmor} .github/workflows")).await;
                exec(&ctx, &format!("{actionlint} -shellcheck=\"{shellcheck}\"")).await;
            }
        })
}

fn download_task(setup: &Setup, registry: &Registry) -> Task {
    let conf = Arc::clone(&setup.conf);
    let commands: Arc<Vec<String>> = Arc::new(registry.downloads().to_vec());
    let test_runner = tools::runner_all(
        &setup.conf,
        &[Tool::CargoLlvmCov, Tool::CargoNextest],
        "cargo llvm-cov nextest --help",
    );
    Task::new("download", "Downloads build dependencies.").action(move |ctx| {
        let conf = Arc::clone(&conf);
        let commands = Arc::clone(&commands);
        let test_runner = test_runner.clone();
        async move {
            for dir in workspace::member_dirs(&ctx).await {
                exec_in(&ctx, "cargo fetch", dir).await;
            }
            // Lints usually run on Linux only, so that is the default
            // platform for tool downloads.
            if conf.download_all_platforms || std::env::consts::OS == "linux" {
                for command in commands.iter() {
                    exec(&ctx, command).await;
                }
            }
            // The test toolchain is needed on every platform.
            if !conf.excluded("test-rust") {
                exec(&ctx, &test_runner).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use gantry_flow::TaskHandle;

    use super::*;

    fn names(handles: &[TaskHandle]) -> Vec<&str> {
        handles.iter().map(|h| h.name()).collect()
    }

    fn define_in(base: &Path, options: Vec<TaskOption>) -> (Flow, Registry) {
        let mut flow = Flow::new();
        let mut registry = Registry::new();
        define_tasks_at(&mut flow, &mut registry, options, base).unwrap();
        (flow, registry)
    }

    fn rust_repo_with_workflows() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir(dir.path().join(".github")).unwrap();
        dir
    }

    #[test]
    fn test_default_candidate_set() {
        let dir = rust_repo_with_workflows();
        let (flow, registry) = define_in(dir.path(), vec![]);

        assert_eq!(
            names(registry.enumerate(Category::Format)),
            vec!["format-rust", "format-markdown", "format-shell", "format-yaml"]
        );
        assert_eq!(
            names(registry.enumerate(Category::Lint)),
            vec![
                "lint-rust",
                "lint-markdown",
                "lint-shell",
                "lint-yaml",
                "lint-actions"
            ]
        );
        assert_eq!(names(registry.enumerate(Category::Generate)), vec!["runall"]);
        assert_eq!(names(registry.enumerate(Category::Test)), vec!["test-rust"]);
        assert!(flow.lookup("download").is_some());
    }

    #[test]
    fn test_excluded_task_is_never_defined() {
        let dir = rust_repo_with_workflows();
        let (flow, registry) = define_in(
            dir.path(),
            vec![TaskOption::ExcludeTasks(vec![
                "format-yaml".to_string(),
                "lint-yaml".to_string(),
            ])],
        );

        assert!(flow.lookup("format-yaml").is_none());
        assert!(flow.lookup("lint-yaml").is_none());
        assert_eq!(
            names(registry.enumerate(Category::Format)),
            vec!["format-rust", "format-markdown", "format-shell"]
        );
        // Excluding the only yamllint user must not leave a download
        // requirement for it behind.
        assert!(!registry
            .downloads()
            .iter()
            .any(|command| command.contains("yamllint")));
    }

    #[test]
    fn test_exclusion_and_predicate_matrix() {
        let trio = ["format-rust", "lint-rust", "format-yaml"];
        for mask in 0u8..8 {
            let excluded: Vec<String> = trio
                .iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| name.to_string())
                .collect();

            let dir = rust_repo_with_workflows();
            let (flow, _) = define_in(
                dir.path(),
                vec![TaskOption::ExcludeTasks(excluded.clone())],
            );
            for name in trio {
                let expect_present = !excluded.iter().any(|e| e == name);
                assert_eq!(
                    flow.lookup(name).is_some(),
                    expect_present,
                    "mask {mask}, task {name}"
                );
            }
        }
    }

    #[test]
    fn test_workflow_probe_gates_lint_actions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        let (flow, _) = define_in(dir.path(), vec![]);
        assert!(flow.lookup("lint-actions").is_none());

        let with = rust_repo_with_workflows();
        let (flow, _) = define_in(with.path(), vec![]);
        assert!(flow.lookup("lint-actions").is_some());
    }

    #[test]
    fn test_check_depends_on_lint_and_test_only() {
        let dir = rust_repo_with_workflows();
        let (flow, _) = define_in(dir.path(), vec![]);

        let check = flow.lookup("check").unwrap();
        assert_eq!(names(flow.dependencies(&check)), vec!["lint", "test"]);
        assert_eq!(flow.default_task().map(|h| h.name()), Some("check"));
    }

    #[test]
    fn test_aggregates_match_registry_enumeration() {
        let dir = rust_repo_with_workflows();
        let (flow, registry) = define_in(dir.path(), vec![]);

        for (aggregate, category) in [
            ("format", Category::Format),
            ("generate", Category::Generate),
            ("lint", Category::Lint),
            ("test", Category::Test),
        ] {
            let handle = flow.lookup(aggregate).unwrap();
            assert_eq!(
                names(flow.dependencies(&handle)),
                names(registry.enumerate(category)),
                "aggregate {aggregate}"
            );
        }
    }

    #[test]
    fn test_empty_category_yields_empty_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        let (flow, _) = define_in(
            dir.path(),
            vec![TaskOption::ExcludeTasks(vec!["test-rust".to_string()])],
        );

        let test = flow.lookup("test").unwrap();
        assert!(flow.dependencies(&test).is_empty());
    }

    #[test]
    fn test_caller_registered_task_precedes_standard_set() {
        let dir = rust_repo_with_workflows();
        let mut flow = Flow::new();
        let mut registry = Registry::new();
        let custom = flow
            .define(Task::new("lint-docs", "Lints documentation."))
            .unwrap();
        registry.register(Category::Lint, custom);
        define_tasks_at(&mut flow, &mut registry, vec![], dir.path()).unwrap();

        let lint = flow.lookup("lint").unwrap();
        let deps = names(flow.dependencies(&lint));
        assert_eq!(deps.first(), Some(&"lint-docs"));
        assert!(deps.contains(&"lint-rust"));
    }

    #[test]
    fn test_repeated_orchestration_calls_are_independent() {
        let dir = rust_repo_with_workflows();
        for _ in 0..2 {
            let (flow, registry) = define_in(dir.path(), vec![]);
            assert_eq!(registry.enumerate(Category::Test).len(), 1);
            assert!(flow.lookup("check").is_some());
        }
    }

    #[test]
    fn test_xtask_manifest_joins_lint_targets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir(dir.path().join("xtask")).unwrap();
        fs::write(dir.path().join("xtask").join("Cargo.toml"), "[package]").unwrap();

        let conf = Arc::new(Config::resolve([]));
        let setup = Setup::detect(conf, dir.path());
        assert_eq!(
            setup.manifests.as_slice(),
            &["Cargo.toml".to_string(), "xtask/Cargo.toml".to_string()]
        );
    }

    #[test]
    fn test_artifacts_dir_created_at_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build").join("out");
        let conf = Config::resolve([TaskOption::ArtifactsPath(out.clone())]);

        ensure_artifacts_dir(&conf).unwrap();
        assert!(out.is_dir());
        assert_eq!(conf.artifacts_path.join("coverage.txt"), out.join("coverage.txt"));

        // Idempotent when the directory already exists.
        ensure_artifacts_dir(&conf).unwrap();
    }
}
