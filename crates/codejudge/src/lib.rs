//! A library for judging untrusted code submissions.
//!
//! codejudge takes a submission (source text, language id, optional stdin),
//! compiles it if the language needs it, runs it under a wall-clock deadline
//! in a private scratch directory, and returns a classified verdict.
//!
//! # Features
//!
//! - **Per-submission workspaces**: a fresh uniquely named directory, removed on every exit path.
//! - **Multi-language**: compiled and interpreted languages from TOML configuration.
//! - **Deadlines**: the whole process group is SIGKILLed when time runs out.
//! - **Classified results**: success, compile error, runtime error, time limit, system error.
//! - **Pluggable backends**: the local pipeline, or a remote Judge0 API.

pub use backend::{ExecutionBackend, Judge0Backend, Judge0Error, LocalBackend};
pub use config::{BackendKind, Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use process::{LocalProcessRunner, ProcessCommand, ProcessOutcome, ProcessRunner, Termination};
pub use registry::{LanguageRegistry, UnsupportedLanguage};
pub use runner::{CompileError, CompileResult, ExecuteError, Runner};
pub use types::{ExecutionRequest, ExecutionResult, ResourceLimits};
pub use verdict::{Judgement, NO_OUTPUT_PLACEHOLDER, Verdict, VerdictKind};
pub use workspace::{Workspace, WorkspaceError, WorkspaceManager};

pub mod backend;
pub mod config;
pub mod process;
pub mod registry;
pub mod runner;
pub mod types;
pub mod verdict;
pub mod workspace;
