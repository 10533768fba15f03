//! Code runner for codejudge
//!
//! Drives one submission through validate → compile (if needed) → execute →
//! classify, inside its own workspace, and always releases the workspace.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, instrument, warn};

pub use crate::runner::compile::{CompileResult, compile};
pub use crate::runner::execute::{execute, execute_interpreted};

mod compile;
mod execute;

use crate::{
    config::{Config, Language},
    process::{LocalProcessRunner, ProcessOutcome, ProcessRunner},
    registry::LanguageRegistry,
    types::{ExecutionRequest, ExecutionResult, ResourceLimits},
    verdict::{Judgement, Verdict},
    workspace::{Workspace, WorkspaceError, WorkspaceManager},
};

/// Errors that occur during compilation
///
/// A compiler that runs and rejects the program is not an error here; that is
/// a [`CompileResult`] with `success == false`.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("language '{0}' does not support compilation")]
    NotCompiled(String),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Errors that occur during execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("execution not started: {0}")]
    NotStarted(String),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Environment every compiler and program starts from
pub(crate) fn sandbox_env(workspace: &Workspace, path: &str) -> [(String, String); 2] {
    [
        ("PATH".to_owned(), path.to_owned()),
        (
            "HOME".to_owned(),
            workspace.path().to_string_lossy().into_owned(),
        ),
    ]
}

/// Check a request before any filesystem or process work
///
/// Returns the resolved language, or the terminal verdict for a bad request.
pub fn validate<'a>(
    request: &ExecutionRequest,
    registry: &'a LanguageRegistry,
) -> Result<&'a Language, Verdict> {
    let missing_code = request.code.trim().is_empty();
    let missing_language = request.language.trim().is_empty();
    let reason = match (missing_code, missing_language) {
        (true, true) => Some("code and language are required"),
        (true, false) => Some("code is required"),
        (false, true) => Some("language is required"),
        (false, false) => None,
    };
    if let Some(reason) = reason {
        return Err(Verdict::ValidationError {
            reason: reason.to_owned(),
        });
    }

    registry
        .resolve(&request.language)
        .map_err(|e| Verdict::UnsupportedLanguage { language: e.0 })
}

/// Map a finished execute-stage process onto a verdict
pub fn classify_run(outcome: &ProcessOutcome, limit: Option<Duration>) -> Judgement {
    let verdict = if let Some(ref reason) = outcome.spawn_error {
        error!(reason, "program could not be started");
        Verdict::SystemError
    } else if outcome.timed_out {
        Verdict::TimeLimitExceeded {
            limit: limit.unwrap_or(outcome.wall_time),
        }
    } else if outcome.exit_code == Some(0) {
        if outcome.output_truncated {
            debug!("program output was truncated at the output cap");
        }
        Verdict::Success {
            stdout: outcome.stdout_lossy(),
        }
    } else {
        Verdict::RuntimeError {
            stderr: outcome.stderr_lossy(),
            termination: outcome.termination(),
        }
    };

    Judgement::new(verdict, outcome.wall_time)
}

/// Log an engine-side fault and turn it into the generic verdict
fn system_fault(stage: &'static str, error: &dyn std::fmt::Display, storage_full: bool) -> Verdict {
    if storage_full {
        error!(
            alert = "scratch_filesystem_full",
            stage,
            %error,
            "scratch filesystem is full"
        );
    } else {
        error!(stage, %error, "system fault while judging submission");
    }
    Verdict::SystemError
}

fn workspace_fault(stage: &'static str, error: &WorkspaceError) -> Verdict {
    system_fault(stage, error, error.is_storage_full())
}

/// High-level runner for code execution
#[derive(Debug, Clone)]
pub struct Runner {
    registry: Arc<LanguageRegistry>,
    workspaces: WorkspaceManager,
    process_runner: Arc<dyn ProcessRunner>,
    compile_limits: ResourceLimits,
    run_limits: ResourceLimits,
}

impl Runner {
    /// Create a new runner that spawns processes on this host
    pub fn new(config: &Config) -> Self {
        Self {
            registry: Arc::new(LanguageRegistry::from_config(config)),
            workspaces: WorkspaceManager::new(config.scratch_root()),
            process_runner: Arc::new(LocalProcessRunner::new()),
            compile_limits: config.compile_limits.clone(),
            run_limits: config.default_limits.clone(),
        }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(&Config::default())
    }

    /// Replace the process-spawning primitive
    pub fn with_process_runner(mut self, process_runner: Arc<dyn ProcessRunner>) -> Self {
        self.process_runner = process_runner;
        self
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.workspaces.scratch_root().to_path_buf()
    }

    /// Execute-step limits for a language: engine defaults, then the language's own
    pub fn run_limits_for(&self, language: &Language) -> ResourceLimits {
        match language.run.limits {
            Some(ref lang) => self.run_limits.with_overrides(lang),
            None => self.run_limits.clone(),
        }
    }

    /// Judge one submission
    ///
    /// Never fails: every outcome, including engine faults, is a verdict.
    /// The workspace is released on every path out of this function.
    #[instrument(skip(self, request), fields(language = %request.language, code_len = request.code.len()))]
    pub async fn judge(&self, request: &ExecutionRequest) -> Judgement {
        let language = match validate(request, &self.registry) {
            Ok(language) => language,
            Err(verdict) => {
                debug!(kind = %verdict.kind(), "request rejected");
                return Judgement::early(verdict);
            }
        };

        let workspace = match self.workspaces.acquire().await {
            Ok(workspace) => workspace,
            Err(e) => return Judgement::early(workspace_fault("acquire", &e)),
        };

        let judgement = self.judge_in(&workspace, language, request).await;

        if let Err(e) = workspace.release().await {
            warn!(error = %e, "failed to release workspace");
        }

        debug!(
            kind = %judgement.verdict.kind(),
            execution_time_ms = judgement.execution_time.as_millis() as u64,
            "submission judged"
        );
        judgement
    }

    /// Judge one submission and format the caller-facing result
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.judge(request).await.to_result()
    }

    async fn judge_in(
        &self,
        workspace: &Workspace,
        language: &Language,
        request: &ExecutionRequest,
    ) -> Judgement {
        let runner = self.process_runner.as_ref();
        let source = request.code.as_bytes();
        let input = request.input.as_bytes();
        let limits = self.run_limits_for(language);

        let outcome = if let Some(artifact) = language.artifact_name() {
            match compile::compile(runner, workspace, language, source, &self.compile_limits).await
            {
                Ok(result) if !result.is_success() => {
                    return Judgement::early(Verdict::CompileError {
                        diagnostics: result.output,
                    });
                }
                Ok(_) => {}
                Err(CompileError::Workspace(e)) => {
                    return Judgement::early(workspace_fault("compile", &e));
                }
                Err(e) => return Judgement::early(system_fault("compile", &e, false)),
            }

            match workspace.file_exists(artifact).await {
                Ok(true) => {}
                Ok(false) => {
                    error!(artifact, "compiler exited 0 but produced no artifact");
                    return Judgement::early(Verdict::SystemError);
                }
                Err(e) => return Judgement::early(workspace_fault("compile", &e)),
            }

            execute::execute(runner, workspace, language, input, &limits).await
        } else {
            execute::execute_interpreted(runner, workspace, language, source, input, &limits).await
        };

        match outcome {
            Ok(outcome) => classify_run(&outcome, limits.deadline()),
            Err(ExecuteError::Workspace(e)) => Judgement::early(workspace_fault("execute", &e)),
            Err(e) => Judgement::early(system_fault("execute", &e, false)),
        }
    }
}
