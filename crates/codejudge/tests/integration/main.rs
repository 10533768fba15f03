//! Integration tests for codejudge
//!
//! Most tests use the shell-backed languages in `tests/fixtures/shell.toml`
//! and need nothing beyond a POSIX `/bin/sh`. Tests that drive real
//! toolchains (python3, g++) are behind the `integration-tests` feature:
//!    cargo test -p codejudge --features integration-tests

use std::path::{Path, PathBuf};

use codejudge::{Config, ExecutionRequest, ExecutionResult, Runner};
use tempfile::TempDir;

mod compilation;
mod config_loading;
mod execution;
mod time_limits;
#[cfg(feature = "integration-tests")]
mod toolchains;
mod workspace_lifecycle;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Path to a fixture file
pub(crate) fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_PATH).join(name)
}

/// Helper to get fixture source content
#[cfg_attr(not(feature = "integration-tests"), allow(dead_code))]
pub(crate) fn fixture_source(name: &str) -> String {
    let path = fixture_path("sources").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

/// Shell-backed test configuration
pub(crate) fn shell_config() -> Config {
    Config::from_file(fixture_path("shell.toml")).expect("shell fixture config should load")
}

/// A runner over a private scratch root that can be checked for leftovers
pub(crate) struct Harness {
    scratch: TempDir,
    runner: Runner,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(shell_config())
    }

    pub(crate) fn with_config(mut config: Config) -> Self {
        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        config.scratch_root = Some(scratch.path().join("scratch"));
        let runner = Runner::new(&config);
        Self { scratch, runner }
    }

    pub(crate) fn runner(&self) -> &Runner {
        &self.runner
    }

    pub(crate) fn scratch_root(&self) -> PathBuf {
        self.runner.scratch_root()
    }

    /// A directory outside the scratch root for tests to probe from
    pub(crate) fn probe_dir(&self) -> PathBuf {
        let dir = self.scratch.path().join("probe");
        std::fs::create_dir_all(&dir).expect("Failed to create probe dir");
        dir
    }

    pub(crate) async fn run(&self, code: &str, language: &str, input: &str) -> ExecutionResult {
        self.runner
            .execute(&ExecutionRequest::new(code, language).with_input(input))
            .await
    }

    /// No workspace directory is left under the scratch root
    pub(crate) fn assert_no_leftovers(&self) {
        let root = self.scratch_root();
        if !root.exists() {
            return;
        }
        let leftovers: Vec<_> = std::fs::read_dir(&root)
            .expect("Failed to read scratch root")
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "leaked workspaces: {leftovers:?}");
    }
}
