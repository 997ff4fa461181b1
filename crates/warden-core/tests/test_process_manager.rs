use std::{path::PathBuf, time::Duration};

use warden_core::{CommandSpec, Pgid, ProcessManager, Signal, UnixProcessManager};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn bash(name: &str, cwd: PathBuf, output: Option<PathBuf>) -> CommandSpec {
    CommandSpec {
        name: name.to_owned(),
        program: "bash".into(),
        args: vec![fixture(name)],
        cwd,
        env: vec![],
        output,
    }
}

async fn wait_dead(pm: &mut UnixProcessManager, pid: u32, timeout: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if !pm.is_alive(pid).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_process_manager_output_env_and_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("console.log");
    std::fs::write(&log, "previous run\n").unwrap();
    let mut pm = UnixProcessManager::new();

    let mut spec = bash("env_and_cwd.sh", dir.path().to_path_buf(), Some(log.clone()));
    spec.args.extend(["one".to_owned(), "two".to_owned()]);
    spec.env = vec![("GREETING".to_owned(), "hello".to_owned())];
    let spawned = pm.spawn(spec).await.unwrap();

    assert!(wait_dead(&mut pm, spawned.pid, Duration::from_secs(5)).await);

    let output = std::fs::read_to_string(&log).unwrap();
    let cwd = std::fs::canonicalize(dir.path()).unwrap();
    assert!(output.starts_with("previous run\n"));
    assert!(output.contains(&format!("cwd={}\n", cwd.display())));
    assert!(output.contains("GREETING=hello\n"));
    assert!(output.contains("args=one two\n"));
    assert!(output.contains("to stderr\n"));
}

#[tokio::test]
async fn test_process_manager_own_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(bash("forever.sh", dir.path().to_path_buf(), None))
        .await
        .unwrap();

    let group = pm.process_group(spawned.pid).await.unwrap();
    let own = pm.process_group(std::process::id()).await.unwrap();
    assert_eq!(group, Pgid(i32::try_from(spawned.pid).unwrap()));
    assert_ne!(group, own);
    assert!(pm.is_alive(spawned.pid).await);

    pm.signal_group(group, Signal::Force).await.unwrap();
    assert!(wait_dead(&mut pm, spawned.pid, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_process_manager_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(bash("forever.sh", dir.path().to_path_buf(), None))
        .await
        .unwrap();
    let group = pm.process_group(spawned.pid).await.unwrap();

    pm.signal_group(group, Signal::Graceful).await.unwrap();
    assert!(wait_dead(&mut pm, spawned.pid, Duration::from_secs(5)).await);

    // The group is gone, signaling it again is not an error.
    pm.signal_group(group, Signal::Graceful).await.unwrap();
}

#[tokio::test]
async fn test_process_manager_ignored_sigterm_needs_sigalrm() {
    let dir = tempfile::tempdir().unwrap();
    let mut pm = UnixProcessManager::new();

    let spawned = pm
        .spawn(bash("ignore_sigterm.sh", dir.path().to_path_buf(), None))
        .await
        .unwrap();
    let group = pm.process_group(spawned.pid).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    pm.signal_group(group, Signal::Graceful).await.unwrap();
    assert!(!wait_dead(&mut pm, spawned.pid, Duration::from_millis(500)).await);

    pm.signal_group(group, Signal::Secondary).await.unwrap();
    assert!(wait_dead(&mut pm, spawned.pid, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_process_manager_unknown_pids() {
    let mut pm = UnixProcessManager::new();

    assert!(!pm.is_alive(0).await);
    assert!(!pm.is_alive(u32::MAX).await);
    assert!(!pm.is_alive(i32::MAX as u32).await);
    // Not ours, but alive.
    assert!(pm.is_alive(1).await);
}
