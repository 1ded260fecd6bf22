//! Configuration resolution for the standard task set

use std::collections::HashMap;
use std::path::PathBuf;

use crate::versions;

/// External tools whose versions are pinned by the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Actionlint,
    CargoLlvmCov,
    CargoNextest,
    Prettier,
    Reviewdog,
    Shellcheck,
    Yamllint,
    Zizmor,
}

impl Tool {
    pub(crate) const ALL: [Tool; 8] = [
        Tool::Actionlint,
        Tool::CargoLlvmCov,
        Tool::CargoNextest,
        Tool::Prettier,
        Tool::Reviewdog,
        Tool::Shellcheck,
        Tool::Yamllint,
        Tool::Zizmor,
    ];

    /// Version used when no override is configured.
    pub fn default_version(self) -> &'static str {
        match self {
            Tool::Actionlint => versions::ACTIONLINT,
            Tool::CargoLlvmCov => versions::CARGO_LLVM_COV,
            Tool::CargoNextest => versions::CARGO_NEXTEST,
            Tool::Prettier => versions::PRETTIER,
            Tool::Reviewdog => versions::REVIEWDOG,
            Tool::Shellcheck => versions::SHELLCHECK,
            Tool::Yamllint => versions::YAMLLINT,
            Tool::Zizmor => versions::ZIZMOR,
        }
    }
}

/// Resolved configuration for [`define_tasks`](crate::define_tasks).
///
/// Built once per orchestration call by folding the caller's options over
/// the defaults, then treated as read-only for the rest of the run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for temporary build artifacts such as coverage reports.
    pub artifacts_path: PathBuf,
    /// Names of tasks that must not be defined at all.
    pub exclude_tasks: Vec<String>,
    /// Extra feature tags passed to Rust lint tasks.
    pub feature_tags: Vec<String>,
    /// Disables reviewdog escalation of lint output.
    pub disable_reviewdog: bool,
    /// Status level reported by the test runner.
    pub test_status_level: Option<String>,
    /// Download tools for every platform, not only the primary one.
    pub download_all_platforms: bool,
    versions: HashMap<Tool, String>,
}

impl Config {
    fn base() -> Self {
        Self {
            artifacts_path: PathBuf::from("out"),
            exclude_tasks: Vec::new(),
            feature_tags: Vec::new(),
            disable_reviewdog: false,
            test_status_level: None,
            download_all_platforms: false,
            versions: HashMap::new(),
        }
    }

    /// Apply `options` in order over the defaults, then pin every tool
    /// version that is still unset to its compiled-in default.
    pub fn resolve(options: impl IntoIterator<Item = TaskOption>) -> Self {
        let mut conf = Self::base();
        for option in options {
            option.apply(&mut conf);
        }
        for tool in Tool::ALL {
            conf.versions
                .entry(tool)
                .or_insert_with(|| tool.default_version().to_string());
        }
        conf
    }

    /// Pinned version for `tool`.
    pub fn version(&self, tool: Tool) -> &str {
        self.versions
            .get(&tool)
            .map(String::as_str)
            .unwrap_or_else(|| tool.default_version())
    }

    /// Whether `task` is in the exclusion set.
    pub fn excluded(&self, task: &str) -> bool {
        self.exclude_tasks.iter().any(|t| t == task)
    }
}

/// A single configuration effect for [`define_tasks`](crate::define_tasks).
///
/// Options apply in the order given: scalar effects overwrite earlier ones,
/// list effects append.
#[derive(Debug, Clone)]
pub enum TaskOption {
    /// Path to write temporary build artifacts to. Defaults to `out`.
    ArtifactsPath(PathBuf),
    /// Exclude tasks normally defined by default, for example to redefine
    /// one with a different implementation.
    ExcludeTasks(Vec<String>),
    /// Feature tags to pass to Rust lint tasks, so feature-gated code is
    /// linted too.
    FeatureTags(Vec<String>),
    /// Disable the use of reviewdog to report lint output as review
    /// annotations.
    DisableReviewdog,
    /// Status level reported by the test runner.
    TestStatusLevel(String),
    /// Download tools for all platforms in the download task, instead of
    /// only on the primary lint platform.
    DownloadAllPlatforms,
    /// Pin an external tool to a version other than the compiled-in default.
    ToolVersion(Tool, String),
}

impl TaskOption {
    fn apply(self, conf: &mut Config) {
        match self {
            TaskOption::ArtifactsPath(path) => conf.artifacts_path = path,
            TaskOption::ExcludeTasks(tasks) => conf.exclude_tasks.extend(tasks),
            TaskOption::FeatureTags(tags) => conf.feature_tags.extend(tags),
            TaskOption::DisableReviewdog => conf.disable_reviewdog = true,
            TaskOption::TestStatusLevel(level) => conf.test_status_level = Some(level),
            TaskOption::DownloadAllPlatforms => conf.download_all_platforms = true,
            TaskOption::ToolVersion(tool, version) => {
                conf.versions.insert(tool, version);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let conf = Config::resolve([]);
        assert_eq!(conf.artifacts_path, PathBuf::from("out"));
        assert!(conf.exclude_tasks.is_empty());
        assert!(conf.feature_tags.is_empty());
        assert!(!conf.disable_reviewdog);
        assert!(conf.test_status_level.is_none());
        assert!(!conf.download_all_platforms);
    }

    #[test]
    fn test_every_tool_defaults_to_compiled_in_version() {
        let conf = Config::resolve([]);
        for tool in Tool::ALL {
            assert_eq!(conf.version(tool), tool.default_version());
        }
    }

    #[test]
    fn test_version_override_only_affects_named_tool() {
        let conf = Config::resolve([TaskOption::ToolVersion(
            Tool::Prettier,
            "4.0.0".to_string(),
        )]);
        assert_eq!(conf.version(Tool::Prettier), "4.0.0");
        for tool in Tool::ALL {
            if tool != Tool::Prettier {
                assert_eq!(conf.version(tool), tool.default_version());
            }
        }
    }

    #[test]
    fn test_list_options_append() {
        let conf = Config::resolve([
            TaskOption::ExcludeTasks(vec!["format-yaml".to_string()]),
            TaskOption::FeatureTags(vec!["foo".to_string()]),
            TaskOption::ExcludeTasks(vec!["lint-yaml".to_string()]),
            TaskOption::FeatureTags(vec!["bar".to_string()]),
        ]);
        assert_eq!(conf.exclude_tasks, vec!["format-yaml", "lint-yaml"]);
        assert_eq!(conf.feature_tags, vec!["foo", "bar"]);
        assert!(conf.excluded("format-yaml"));
        assert!(!conf.excluded("format-rust"));
    }

    #[test]
    fn test_later_scalar_options_override() {
        let conf = Config::resolve([
            TaskOption::ArtifactsPath(PathBuf::from("first")),
            TaskOption::ArtifactsPath(PathBuf::from("second")),
            TaskOption::TestStatusLevel("fail".to_string()),
            TaskOption::TestStatusLevel("all".to_string()),
        ]);
        assert_eq!(conf.artifacts_path, PathBuf::from("second"));
        assert_eq!(conf.test_status_level.as_deref(), Some("all"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let options = || {
            [
                TaskOption::ArtifactsPath(PathBuf::from("build/out")),
                TaskOption::ExcludeTasks(vec!["runall".to_string()]),
                TaskOption::DisableReviewdog,
                TaskOption::ToolVersion(Tool::Yamllint, "1.36.0".to_string()),
            ]
        };
        let a = Config::resolve(options());
        let b = Config::resolve(options());
        assert_eq!(a.artifacts_path, b.artifacts_path);
        assert_eq!(a.exclude_tasks, b.exclude_tasks);
        assert_eq!(a.disable_reviewdog, b.disable_reviewdog);
        for tool in Tool::ALL {
            assert_eq!(a.version(tool), b.version(tool));
        }
    }
}
