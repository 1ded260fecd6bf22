//! Version-pinned external tool invocations
//!
//! Non-cargo tools run through `mise exec tool@version`, which fetches the
//! pinned version on first use, so a task never depends on what happens to
//! be installed on the machine.

use crate::config::{Config, Tool};

/// `mise` tool specifier, including the backend prefix where one is needed.
fn mise_spec(tool: Tool) -> &'static str {
    match tool {
        Tool::Actionlint => "actionlint",
        Tool::CargoLlvmCov => "cargo:cargo-llvm-cov",
        Tool::CargoNextest => "cargo:cargo-nextest",
        Tool::Prettier => "npm:prettier",
        Tool::Reviewdog => "reviewdog",
        Tool::Shellcheck => "shellcheck",
        Tool::Yamllint => "pipx:yamllint",
        Tool::Zizmor => "zizmor",
    }
}

/// Binary invoked once the tool is on the path.
fn bin(tool: Tool) -> &'static str {
    match tool {
        Tool::Actionlint => "actionlint",
        Tool::CargoLlvmCov => "cargo llvm-cov",
        Tool::CargoNextest => "cargo nextest",
        Tool::Prettier => "prettier",
        Tool::Reviewdog => "reviewdog",
        Tool::Shellcheck => "shellcheck",
        Tool::Yamllint => "yamllint",
        Tool::Zizmor => "zizmor",
    }
}

/// Command prefix that runs `tool` at its pinned version.
pub(crate) fn runner(conf: &Config, tool: Tool) -> String {
    format!(
        "mise exec {}@{} -- {}",
        mise_spec(tool),
        conf.version(tool),
        bin(tool)
    )
}

/// Command prefix that activates several pinned tools before running `bin`,
/// for invocations that need more than one on the path at once.
pub(crate) fn runner_all(conf: &Config, tools: &[Tool], bin: &str) -> String {
    let specs: Vec<String> = tools
        .iter()
        .map(|&tool| format!("{}@{}", mise_spec(tool), conf.version(tool)))
        .collect();
    format!("mise exec {} -- {}", specs.join(" "), bin)
}

/// Command that pre-fetches `tool` at its pinned version.
pub(crate) fn download(conf: &Config, tool: Tool) -> String {
    format!("mise install {}@{}", mise_spec(tool), conf.version(tool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskOption;

    #[test]
    fn test_runner_uses_pinned_version() {
        let conf = Config::resolve([TaskOption::ToolVersion(
            Tool::Prettier,
            "9.9.9".to_string(),
        )]);
        assert_eq!(
            runner(&conf, Tool::Prettier),
            "mise exec npm:prettier@9.9.9 -- prettier"
        );
    }

    #[test]
    fn test_runner_all_lists_every_tool() {
        let conf = Config::resolve([]);
        let command = runner_all(
            &conf,
            &[Tool::CargoLlvmCov, Tool::CargoNextest],
            "cargo llvm-cov nextest",
        );
        assert!(command.starts_with("mise exec cargo:cargo-llvm-cov@"));
        assert!(command.contains("cargo:cargo-nextest@"));
        assert!(command.ends_with("-- cargo llvm-cov nextest"));
    }

    #[test]
    fn test_download_command() {
        let conf = Config::resolve([]);
        assert_eq!(
            download(&conf, Tool::Yamllint),
            format!("mise install pipx:yamllint@{}", conf.version(Tool::Yamllint))
        );
    }
}
