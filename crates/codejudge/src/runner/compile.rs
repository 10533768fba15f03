//! Compilation step for code execution
//!
//! Handles compiling source code using language-specific compilers.

use tracing::{debug, error, instrument};

use crate::config::Language;
use crate::process::{ProcessCommand, ProcessOutcome, ProcessRunner};
use crate::runner::{CompileError, sandbox_env};
use crate::types::ResourceLimits;
use crate::workspace::Workspace;

/// Diagnostics shown when the compiler binary itself could not be started
pub(crate) const COMPILER_UNAVAILABLE: &str = "compiler could not be started";

/// Result of a compilation
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Whether compilation succeeded
    pub success: bool,

    /// What the compiler process did
    pub outcome: ProcessOutcome,

    /// Compiler output (stdout then stderr), shown to the submitter on failure
    pub output: String,
}

impl CompileResult {
    /// Check if compilation was successful
    pub fn is_success(&self) -> bool {
        self.success && self.outcome.exit_code == Some(0)
    }
}

/// Compile source code inside a workspace
///
/// `base_limits` are the engine-wide compile limits; the language's own
/// compile limits are layered on top.
#[instrument(skip(runner, workspace, language, source), fields(language = %language.name))]
pub async fn compile(
    runner: &dyn ProcessRunner,
    workspace: &Workspace,
    language: &Language,
    source: &[u8],
    base_limits: &ResourceLimits,
) -> Result<CompileResult, CompileError> {
    // Check if language requires compilation
    let compile_config = language
        .compile
        .as_ref()
        .ok_or_else(|| CompileError::NotCompiled(language.name.clone()))?;

    // Write source file to workspace
    let source_name = &compile_config.source_name;
    workspace.write_file(source_name, source).await?;

    debug!(source_name, "wrote source file");

    let limits = match compile_config.limits {
        Some(ref lang) => base_limits.with_overrides(lang),
        None => base_limits.clone(),
    };

    let expanded_cmd = Language::expand_command(
        &compile_config.command,
        source_name,
        &compile_config.output_name,
    );

    let command = ProcessCommand::new(expanded_cmd)
        .current_dir(workspace.path())
        .envs(sandbox_env(workspace, &language.run.path))
        .envs(&compile_config.env)
        .limits(&limits);

    let outcome = runner.run(&command).await;

    let output = if let Some(ref reason) = outcome.spawn_error {
        error!(reason, "compiler could not be started");
        COMPILER_UNAVAILABLE.to_owned()
    } else {
        // Combine stdout and stderr for compiler output
        let mut output = outcome.stdout_lossy();
        let stderr = outcome.stderr_lossy();
        if !output.is_empty() && !stderr.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr);

        if outcome.timed_out {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&format!(
                "compilation timed out after {} seconds",
                limits.wall_time_limit.unwrap_or_default()
            ));
        }
        output
    };

    let success = outcome.is_success();

    debug!(
        success,
        exit_code = ?outcome.exit_code,
        timed_out = outcome.timed_out,
        "compilation complete"
    );

    Ok(CompileResult {
        success,
        outcome,
        output,
    })
}
