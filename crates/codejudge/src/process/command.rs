//! Command builder for spawned processes

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::ResourceLimits;

/// Everything needed to start one process
///
/// The environment is exactly what is set here; nothing is inherited from the
/// engine's own environment.
#[derive(Debug, Clone, Default)]
pub struct ProcessCommand {
    argv: Vec<String>,
    working_dir: PathBuf,
    env: HashMap<String, String>,
    stdin: Vec<u8>,
    timeout: Option<Duration>,
    max_output: Option<usize>,
}

impl ProcessCommand {
    /// Create a new command builder from a program and its arguments
    pub fn new(argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables
    pub fn envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Bytes written to the process's stdin before it is closed
    pub fn stdin_bytes(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = data.into();
        self
    }

    /// Kill the process group once this much wall time has passed
    pub fn deadline(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cap each captured stream at this many bytes
    pub fn output_limit(mut self, bytes: usize) -> Self {
        self.max_output = Some(bytes);
        self
    }

    /// Apply the deadline and output cap from resource limits
    pub fn limits(mut self, limits: &ResourceLimits) -> Self {
        self.timeout = limits.deadline();
        self.max_output = limits.max_output_bytes();
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn stdin(&self) -> &[u8] {
        &self.stdin
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_output(&self) -> Option<usize> {
        self.max_output
    }
}
