use codejudge::{ExecutionRequest, VerdictKind};

use super::Harness;

#[tokio::test]
async fn test_execute_success_returns_stdout_verbatim() {
    let harness = Harness::new();

    let result = harness.run("echo 2", "sh", "").await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("2\n"));
    assert_eq!(result.error, None);
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_execute_stdin_round_trip() {
    let harness = Harness::new();

    let result = harness
        .run("tr a-z A-Z", "sh", "hello world\nsecond line\n")
        .await;

    assert!(result.success);
    assert_eq!(
        result.output.as_deref(),
        Some("HELLO WORLD\nSECOND LINE\n")
    );
}

#[tokio::test]
async fn test_execute_empty_output_placeholder() {
    let harness = Harness::new();

    let result = harness.run("true", "sh", "").await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("(no output)"));
}

#[tokio::test]
async fn test_execute_non_zero_exit_is_runtime_error() {
    let harness = Harness::new();

    let result = harness.run("echo partial; echo oops >&2; exit 3", "sh", "").await;

    assert!(!result.success);
    assert_eq!(result.output, None);
    assert_eq!(
        result.error.as_deref(),
        Some("RuntimeError (exit code 3):\noops\n")
    );
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_execute_signal_is_classified() {
    let harness = Harness::new();

    let result = harness.run("kill -SEGV $$", "sh", "").await;

    let error = result.error.expect("expected an error");
    assert!(error.starts_with("RuntimeError (killed by signal"), "{error}");
    assert!(error.contains("SIGSEGV"), "{error}");
}

#[tokio::test]
async fn test_execute_output_is_capped() {
    let harness = Harness::new();

    // Fixture caps each stream at 64 KB
    let result = harness
        .run("head -c 200000 /dev/zero | tr '\\0' a", "sh", "")
        .await;

    assert!(result.success);
    assert_eq!(result.output.unwrap().len(), 64 * 1024);
}

#[tokio::test]
async fn test_execute_missing_interpreter_is_non_leaky_system_error() {
    let harness = Harness::new();

    let result = harness.run("anything", "missing", "").await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error, "SystemError: internal error while executing submission");
    assert!(!error.contains("/nonexistent"));
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_execute_environment_is_cleared() {
    let harness = Harness::new();

    let code = r#"
echo "${CARGO_MANIFEST_DIR:-unset}"
[ "$(cd "$HOME" && pwd -P)" = "$(pwd -P)" ] && echo home
"#;
    let result = harness.run(code, "sh", "").await;

    assert_eq!(result.output.as_deref(), Some("unset\nhome\n"));
}

#[tokio::test]
async fn test_execute_validation_errors() {
    let harness = Harness::new();

    let judgement = harness
        .runner()
        .judge(&ExecutionRequest::new("", "sh"))
        .await;
    assert_eq!(judgement.verdict.kind(), VerdictKind::ValidationError);
    assert!(judgement.verdict.is_bad_request());

    let judgement = harness
        .runner()
        .judge(&ExecutionRequest::new("echo hi", ""))
        .await;
    assert_eq!(judgement.verdict.kind(), VerdictKind::ValidationError);
}

#[tokio::test]
async fn test_execute_unsupported_language_creates_nothing() {
    let harness = Harness::new();

    let result = harness.run("IDENTIFICATION DIVISION.", "cobol-98", "").await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("UnsupportedLanguage: language 'cobol-98' is not supported")
    );
    assert_eq!(result.execution_time_ms, 0);
    assert!(!harness.scratch_root().exists());
}
