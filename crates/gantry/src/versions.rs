//! Compiled-in default versions for external tools

// renovate: datasource=github-releases depName=rhysd/actionlint
pub(crate) const ACTIONLINT: &str = "1.7.7";
// renovate: datasource=crate depName=cargo-llvm-cov
pub(crate) const CARGO_LLVM_COV: &str = "0.6.16";
// renovate: datasource=crate depName=cargo-nextest
pub(crate) const CARGO_NEXTEST: &str = "0.9.100";
// renovate: datasource=npm depName=prettier
pub(crate) const PRETTIER: &str = "3.6.2";
// renovate: datasource=github-releases depName=reviewdog/reviewdog
pub(crate) const REVIEWDOG: &str = "0.21.0";
// renovate: datasource=github-releases depName=koalaman/shellcheck
pub(crate) const SHELLCHECK: &str = "0.11.0";
// renovate: datasource=pypi depName=yamllint
pub(crate) const YAMLLINT: &str = "1.35.1";
// renovate: datasource=pypi depName=zizmor
pub(crate) const ZIZMOR: &str = "1.14.2";
