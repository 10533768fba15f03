use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use codejudge::{
    ExecutionRequest, LocalProcessRunner, ProcessCommand, ProcessOutcome, ProcessRunner,
    VerdictKind,
};

use super::{Harness, shell_config};

/// Wraps the host runner and records which programs were started
#[derive(Debug, Default)]
struct RecordingRunner {
    inner: LocalProcessRunner,
    programs: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn programs(&self) -> Vec<String> {
        self.programs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, command: &ProcessCommand) -> ProcessOutcome {
        self.programs
            .lock()
            .unwrap()
            .push(command.argv().join(" "));
        self.inner.run(command).await
    }
}

#[tokio::test]
async fn test_compile_and_run_success() {
    let harness = Harness::new();

    let result = harness.run("read a b; echo $((a + b))", "shc", "2 3\n").await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.output.as_deref(), Some("5\n"));
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_compile_failure_never_executes() {
    let harness = Harness::new();
    let recorder = Arc::new(RecordingRunner::default());
    let runner = harness
        .runner()
        .clone()
        .with_process_runner(Arc::clone(&recorder) as Arc<dyn ProcessRunner>);

    let judgement = runner
        .judge(&ExecutionRequest::new("if then fi (", "shc"))
        .await;

    assert_eq!(judgement.verdict.kind(), VerdictKind::CompileError);
    let error = judgement.to_result().error.unwrap();
    assert!(error.starts_with("CompileError: Compilation failed:\n"), "{error}");
    assert_eq!(judgement.to_result().execution_time_ms, 0);

    let programs = recorder.programs();
    assert_eq!(programs.len(), 1, "{programs:?}");
    assert!(programs[0].starts_with("sh -c"));
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_compile_timeout_is_compile_error() {
    let mut config = shell_config();
    config.compile_limits.wall_time_limit = Some(0.3);
    if let Some(compile) = config
        .languages
        .get_mut("shc")
        .and_then(|lang| lang.compile.as_mut())
    {
        compile.command = vec!["sleep".to_owned(), "10".to_owned()];
    }
    let harness = Harness::with_config(config);

    let result = harness.run("echo hi", "shc", "").await;

    let error = result.error.unwrap();
    assert!(error.starts_with("CompileError"), "{error}");
    assert!(error.contains("compilation timed out"), "{error}");
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_compile_without_artifact_is_system_error() {
    let harness = Harness::new();

    let result = harness.run("echo hi", "hollow", "").await;

    assert_eq!(
        result.error.as_deref(),
        Some("SystemError: internal error while executing submission")
    );
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_compiled_runtime_error_after_successful_compile() {
    let harness = Harness::new();

    let result = harness.run("echo bad >&2; exit 7", "shc", "").await;

    assert_eq!(
        result.error.as_deref(),
        Some("RuntimeError (exit code 7):\nbad\n")
    );
}
