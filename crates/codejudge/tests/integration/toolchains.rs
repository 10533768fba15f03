//! Tests against real compilers and interpreters from the default config

use codejudge::Config;

use super::{Harness, fixture_source};

fn default_harness() -> Harness {
    Harness::with_config(Config::default())
}

#[tokio::test]
async fn test_python_print_keeps_trailing_newline() {
    let harness = default_harness();

    let result = harness.run(&fixture_source("add.py"), "python", "").await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.output.as_deref(), Some("2\n"));
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_python_reads_stdin() {
    let harness = default_harness();

    let result = harness
        .run(&fixture_source("echo_input.py"), "python", "abc\ndef\n")
        .await;

    assert_eq!(result.output.as_deref(), Some("ABC\nDEF\n"));
}

#[tokio::test]
async fn test_python_exception_is_runtime_error() {
    let harness = default_harness();

    let result = harness.run("raise ValueError('nope')", "python", "").await;

    let error = result.error.unwrap();
    assert!(error.starts_with("RuntimeError (exit code 1):"), "{error}");
    assert!(error.contains("ValueError: nope"), "{error}");
}

#[tokio::test]
async fn test_cpp_compile_and_run() {
    let harness = default_harness();

    let result = harness.run(&fixture_source("hello.cpp"), "cpp", "2 3\n").await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.output.as_deref(), Some("5\n"));
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_cpp_syntax_error_is_compile_error() {
    let harness = default_harness();

    let result = harness
        .run(&fixture_source("compile_error.cpp"), "cpp", "")
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.starts_with("CompileError"), "{error}");
    assert!(error.contains("error"), "{error}");
    assert_eq!(result.execution_time_ms, 0);
    harness.assert_no_leftovers();
}
