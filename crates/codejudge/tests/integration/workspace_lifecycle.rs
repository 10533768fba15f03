use std::collections::HashSet;

use codejudge::{ExecutionRequest, Runner, WorkspaceManager};

use super::{Harness, shell_config};

#[tokio::test]
async fn test_no_leaked_workspaces_across_verdicts() {
    let harness = Harness::new();

    harness.run("echo ok", "sh", "").await;
    harness.run("exit 1", "sh", "").await;
    harness.run("if then (", "shc", "").await;
    harness.run("echo hi", "shc", "").await;
    harness.run("x", "missing", "").await;
    harness.run("x", "hollow", "").await;

    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let harness = Harness::new();
    let runner = harness.runner().clone();

    let code = r#"
read id
echo "$id" > mine
sleep 0.2
ls
cat mine
"#;

    let handles: Vec<_> = (0..8)
        .map(|id| {
            let runner = runner.clone();
            tokio::spawn(async move {
                let request = ExecutionRequest::new(code, "sh").with_input(format!("{id}\n"));
                (id, runner.execute(&request).await)
            })
        })
        .collect();

    for handle in handles {
        let (id, result) = handle.await.expect("task panicked");
        assert_eq!(
            result.output.as_deref(),
            Some(format!("main.sh\nmine\n{id}\n").as_str()),
            "request {id} saw foreign files"
        );
    }
    harness.assert_no_leftovers();
}

#[tokio::test]
async fn test_workspace_paths_are_unique() {
    let scratch = tempfile::tempdir().unwrap();
    let manager = WorkspaceManager::new(scratch.path());

    let mut workspaces = Vec::new();
    for _ in 0..32 {
        workspaces.push(manager.acquire().await.unwrap());
    }
    let paths: HashSet<_> = workspaces.iter().map(|w| w.path().to_path_buf()).collect();
    assert_eq!(paths.len(), workspaces.len());

    for workspace in workspaces {
        workspace.release().await.unwrap();
    }
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_workspace_rejects_traversal() {
    let scratch = tempfile::tempdir().unwrap();
    let workspace = WorkspaceManager::new(scratch.path().join("root"))
        .acquire()
        .await
        .unwrap();

    assert!(workspace.write_file("../escape.txt", b"x").await.is_err());
    assert!(!scratch.path().join("root").join("escape.txt").exists());
    assert!(!scratch.path().join("escape.txt").exists());

    workspace.release().await.unwrap();
}

#[tokio::test]
async fn test_unusable_scratch_root_is_system_error() {
    let scratch = tempfile::tempdir().unwrap();
    let not_a_dir = scratch.path().join("scratch-file");
    std::fs::write(&not_a_dir, b"occupied").unwrap();

    let mut config = shell_config();
    config.scratch_root = Some(not_a_dir.clone());
    let runner = Runner::new(&config);

    let result = runner.execute(&ExecutionRequest::new("echo hi", "sh")).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error, "SystemError: internal error while executing submission");
    assert!(!error.contains(&*not_a_dir.to_string_lossy()));
    assert_eq!(std::fs::read(&not_a_dir).unwrap(), b"occupied");
}
