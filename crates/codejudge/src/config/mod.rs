use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::language::{
    CompileConfig, DEFAULT_SANDBOX_PATH, FileExtension, Language, RunConfig,
};
use crate::types::ResourceLimits;

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../codejudge.example.toml");

/// Prefix for environment variable overrides (e.g. `CODEJUDGE__BACKEND=judge0`)
pub const ENV_PREFIX: &str = "CODEJUDGE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which engine executes submissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Compile and run on this host
    #[default]
    Local,

    /// Forward submissions to a Judge0 API
    Judge0,
}

/// Connection settings for a remote Judge0 instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judge0Config {
    /// Base URL, e.g. "https://judge0-ce.p.rapidapi.com"
    pub url: String,

    /// Value for the `X-RapidAPI-Key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Value for the `X-RapidAPI-Host` header
    #[serde(default)]
    pub host: Option<String>,

    /// CPU time limit in seconds sent with each submission
    #[serde(default = "default_judge0_cpu_time_limit")]
    pub cpu_time_limit: f64,

    /// Memory limit in kilobytes sent with each submission
    #[serde(default = "default_judge0_memory_limit")]
    pub memory_limit: u64,
}

/// Config for codejudge
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which per-submission workspaces are created.
    ///
    /// Defaults to `codejudge` inside the system temp directory.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,

    /// Execution backend
    #[serde(default)]
    pub backend: BackendKind,

    /// Remote judge settings, required when `backend = "judge0"`
    #[serde(default)]
    pub judge0: Option<Judge0Config>,

    /// Base limits for the compile step
    #[serde(default = "default_compile_limits")]
    pub compile_limits: ResourceLimits,

    /// Base limits for the execute step
    #[serde(default)]
    pub default_limits: ResourceLimits,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            scratch_root: None,
            backend: BackendKind::Local,
            judge0: None,
            compile_limits: default_compile_limits(),
            default_limits: ResourceLimits::default(),
            languages: HashMap::new(),
        }
    }

    /// Get the scratch root directory
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("codejudge"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_compile_limits() -> ResourceLimits {
    ResourceLimits {
        wall_time_limit: Some(10.0),
        max_output: Some(ResourceLimits::MB),
    }
}

fn default_judge0_cpu_time_limit() -> f64 {
    5.0
}

fn default_judge0_memory_limit() -> u64 {
    128_000
}
