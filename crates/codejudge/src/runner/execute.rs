//! Execution step for code running
//!
//! Handles running compiled or interpreted programs with input/output.

use tracing::{debug, instrument};

use crate::config::Language;
use crate::process::{ProcessCommand, ProcessOutcome, ProcessRunner};
use crate::runner::{ExecuteError, sandbox_env};
use crate::types::ResourceLimits;
use crate::workspace::Workspace;

/// Execute a program that is already in the workspace
///
/// For compiled languages the artifact must exist; for interpreted ones the
/// source file must. `limits` are the fully layered execute-step limits.
#[instrument(skip(runner, workspace, language, input, limits), fields(language = %language.name))]
pub async fn execute(
    runner: &dyn ProcessRunner,
    workspace: &Workspace,
    language: &Language,
    input: &[u8],
    limits: &ResourceLimits,
) -> Result<ProcessOutcome, ExecuteError> {
    // Determine the command based on whether it's compiled or interpreted
    let run_cmd = if let Some(ref compile_config) = language.compile {
        // Compiled language - use the binary
        let binary = &compile_config.output_name;

        if !workspace.file_exists(binary).await? {
            return Err(ExecuteError::NotStarted(format!(
                "artifact '{binary}' not found in workspace"
            )));
        }

        Language::expand_command(&language.run.command, &compile_config.source_name, binary)
    } else {
        // Interpreted language - source should already be in the workspace
        let source_name = language.source_name();

        if !workspace.file_exists(&source_name).await? {
            return Err(ExecuteError::NotStarted(format!(
                "source '{source_name}' not found in workspace"
            )));
        }

        Language::expand_command(&language.run.command, &source_name, &source_name)
    };

    debug!(?run_cmd, "executing program");

    let command = ProcessCommand::new(run_cmd)
        .current_dir(workspace.path())
        .envs(sandbox_env(workspace, &language.run.path))
        .envs(&language.run.env)
        .stdin_bytes(input)
        .limits(limits);

    let outcome = runner.run(&command).await;

    debug!(
        exit_code = ?outcome.exit_code,
        signal = ?outcome.signal,
        timed_out = outcome.timed_out,
        wall_time_ms = outcome.wall_time.as_millis() as u64,
        "execution complete"
    );

    Ok(outcome)
}

/// Execute an interpreted program by writing source and running
#[instrument(skip(runner, workspace, language, source, input, limits), fields(language = %language.name))]
pub async fn execute_interpreted(
    runner: &dyn ProcessRunner,
    workspace: &Workspace,
    language: &Language,
    source: &[u8],
    input: &[u8],
    limits: &ResourceLimits,
) -> Result<ProcessOutcome, ExecuteError> {
    // Write source file
    let source_name = language.source_name();
    workspace.write_file(&source_name, source).await?;

    debug!(source_name, "wrote source file for interpreted execution");

    execute(runner, workspace, language, input, limits).await
}
