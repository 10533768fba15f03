use std::time::{Duration, Instant};

use super::{Harness, shell_config};

fn harness_with_limit(seconds: f64) -> Harness {
    let mut config = shell_config();
    config.default_limits.wall_time_limit = Some(seconds);
    Harness::with_config(config)
}

#[tokio::test]
async fn test_infinite_loop_killed_at_deadline() {
    let harness = harness_with_limit(0.5);
    let started = Instant::now();

    let result = harness.run("while :; do :; done", "sh", "").await;

    let elapsed = started.elapsed();
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("TimeLimitExceeded: Time limit exceeded (0.5 seconds)")
    );
    assert!(result.execution_time_ms >= 500, "{result:?}");
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_sleep_beyond_deadline() {
    let harness = harness_with_limit(0.5);

    let result = harness.run("sleep 10", "sh", "").await;

    assert!(
        result
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("TimeLimitExceeded")),
        "{result:?}"
    );
}

#[tokio::test]
async fn test_deadline_kills_background_grandchildren() {
    let harness = harness_with_limit(0.5);
    let probe = harness.probe_dir();

    let code = r#"
read probe
(sleep 1; touch "$probe/escaped") &
sleep 30
"#;
    let result = harness
        .run(code, "sh", &format!("{}\n", probe.display()))
        .await;
    assert!(result.error.unwrap().starts_with("TimeLimitExceeded"));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!probe.join("escaped").exists(), "grandchild survived the deadline");
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_background_children_reaped_after_normal_exit() {
    let harness = Harness::new();
    let probe = harness.probe_dir();

    let code = r#"
read probe
(sleep 1; touch "$probe/escaped") &
echo done
"#;
    let started = Instant::now();
    let result = harness
        .run(code, "sh", &format!("{}\n", probe.display()))
        .await;

    assert_eq!(result.output.as_deref(), Some("done\n"));
    assert!(started.elapsed() < Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!probe.join("escaped").exists(), "background child outlived its parent");
}

#[tokio::test]
async fn test_fast_program_reports_execution_time() {
    let harness = Harness::new();

    let result = harness.run("sleep 0.2; echo ok", "sh", "").await;

    assert!(result.success);
    assert!(result.execution_time_ms >= 200, "{result:?}");
    assert!(result.execution_time_ms < 2000, "{result:?}");
}
