#![cfg(unix)]

use std::time::Duration;

use futures::StreamExt;
use maestro_core::{BoxStream, CommandSpec, ProcId, ProcessManager, UnixProcessManager};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn sh(name: &str, script: &str) -> CommandSpec {
    CommandSpec {
        name: name.to_owned(),
        cmd: vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()],
        cwd: None,
        env: vec![],
    }
}

async fn read_all(stream: BoxStream<Vec<u8>>) -> String {
    let chunks: Vec<Vec<u8>> = timeout(WAIT, stream.collect()).await.unwrap();
    String::from_utf8_lossy(&chunks.concat()).into_owned()
}

#[tokio::test]
async fn test_process_manager_stdout_and_exit_code() {
    let mut pm = UnixProcessManager::new();

    let out = pm
        .spawn(sh("stdout", "echo 'INFO: line 1'; echo 'INFO: line 2'; exit 3"))
        .await
        .unwrap();

    assert!(out.pid.is_some());
    assert_eq!(read_all(out.stdout).await, "INFO: line 1\nINFO: line 2\n");
    assert_eq!(read_all(out.stderr).await, "");
    assert_eq!(timeout(WAIT, out.exit).await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_process_manager_stderr() {
    let mut pm = UnixProcessManager::new();

    let out = pm
        .spawn(sh("stderr", "echo 'ERROR: line 1' >&2"))
        .await
        .unwrap();

    assert_eq!(read_all(out.stdout).await, "");
    assert_eq!(read_all(out.stderr).await, "ERROR: line 1\n");
    assert_eq!(timeout(WAIT, out.exit).await.unwrap(), Some(0));
}

#[tokio::test]
async fn test_process_manager_cwd_and_env() {
    let mut pm = UnixProcessManager::new();
    let dir = std::env::temp_dir().canonicalize().unwrap();

    let mut spec = sh("env", "pwd -P; echo \"$GREETING\"");
    spec.cwd = Some(dir.clone());
    spec.env = vec![("GREETING".to_owned(), "hello".to_owned())];

    let out = pm.spawn(spec).await.unwrap();

    assert_eq!(
        read_all(out.stdout).await,
        format!("{}\nhello\n", dir.display())
    );
}

#[tokio::test]
async fn test_process_manager_terminate() {
    let mut pm = UnixProcessManager::new();

    let out = pm.spawn(sh("sleep", "sleep 30")).await.unwrap();

    pm.terminate(out.id).await.unwrap();
    assert_eq!(timeout(WAIT, out.exit).await.unwrap(), None);
}

#[tokio::test]
async fn test_process_manager_terminate_reaches_process_group() {
    let mut pm = UnixProcessManager::new();

    // The background sleep inherits stdout, so the stream only ends once the
    // whole group is gone.
    let out = pm
        .spawn(sh("group", "sleep 30 & echo started; wait"))
        .await
        .unwrap();

    let mut stdout = out.stdout;
    let first = timeout(WAIT, stdout.next()).await.unwrap().unwrap();
    assert_eq!(String::from_utf8_lossy(&first), "started\n");

    pm.terminate(out.id).await.unwrap();
    assert_eq!(read_all(stdout).await, "");
    assert_eq!(timeout(WAIT, out.exit).await.unwrap(), None);
}

#[tokio::test]
async fn test_process_manager_terminate_exited_process() {
    let mut pm = UnixProcessManager::new();

    let out = pm.spawn(sh("quick", "exit 0")).await.unwrap();
    assert_eq!(timeout(WAIT, out.exit).await.unwrap(), Some(0));

    pm.terminate(out.id).await.unwrap();

    pm.release(out.id);
    assert!(pm.terminate(out.id).await.is_err());
}

#[tokio::test]
async fn test_process_manager_unknown_id() {
    let mut pm = UnixProcessManager::new();
    assert!(pm.terminate(ProcId(42)).await.is_err());
}

#[tokio::test]
async fn test_process_manager_missing_binary() {
    let mut pm = UnixProcessManager::new();

    let result = pm
        .spawn(CommandSpec {
            name: "missing".to_owned(),
            cmd: vec!["./definitely-not-a-real-binary".to_owned()],
            cwd: None,
            env: vec![],
        })
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_process_manager_empty_cmd() {
    let mut pm = UnixProcessManager::new();

    let result = pm
        .spawn(CommandSpec {
            name: "empty".to_owned(),
            cmd: vec![],
            cwd: None,
            env: vec![],
        })
        .await;

    assert!(result.is_err());
}
