// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use monoco_storage::PidFile;

fn config(root: &std::path::Path, port: u16) -> DaemonConfig {
    let mut config = DaemonConfig::load(root.to_path_buf()).unwrap();
    config.project.http.port = port;
    config.project.http.scan_range = 8;
    config
}

#[tokio::test]
async fn startup_claims_pid_and_port_and_shutdown_releases() {
    let tmp = tempfile::tempdir().unwrap();
    let daemon = startup(config(tmp.path(), 39_412), ProviderRegistry::new())
        .await
        .unwrap();

    let pid_path = daemon.state.paths.pid_file();
    let pidfile = PidFile::read(&pid_path).unwrap().unwrap();
    assert_eq!(pidfile.pid, std::process::id());
    assert_eq!(pidfile.port, daemon.port);
    assert!(daemon.port >= 39_412);

    daemon.shutdown(false).await;
    assert!(PidFile::read(&pid_path).unwrap().is_none());
}

#[tokio::test]
async fn second_startup_against_live_pid_refuses() {
    let tmp = tempfile::tempdir().unwrap();
    let daemon = startup(config(tmp.path(), 39_430), ProviderRegistry::new())
        .await
        .unwrap();

    let err = startup(config(tmp.path(), 39_430), ProviderRegistry::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning { .. }));
    daemon.shutdown(false).await;
}

#[tokio::test]
async fn stale_pid_file_does_not_block_startup() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), 39_450);
    // A dead daemon left its pid file behind
    PidFile::new(4_194_001, "127.0.0.1", 39_450, 0)
        .write(&cfg.paths.pid_file())
        .unwrap();

    let daemon = startup(cfg, ProviderRegistry::new()).await.unwrap();
    daemon.shutdown(false).await;
}

#[tokio::test]
async fn port_scan_skips_occupied_ports() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tokio::net::TcpListener::bind(("127.0.0.1", 39_470))
        .await
        .unwrap();

    let daemon = startup(config(tmp.path(), 39_470), ProviderRegistry::new())
        .await
        .unwrap();
    assert!(daemon.port > 39_470);
    drop(blocker);
    daemon.shutdown(false).await;
}

#[tokio::test]
async fn http_answers_on_the_claimed_port() {
    let tmp = tempfile::tempdir().unwrap();
    let daemon = startup(config(tmp.path(), 39_490), ProviderRegistry::new())
        .await
        .unwrap();

    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", daemon.port))
        .await
        .unwrap();
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream
        .write_all(b"GET /api/v1/issues HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");

    daemon.shutdown(false).await;
}

#[test]
fn malformed_config_is_fatal_at_load() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join(".monoco")).unwrap();
    std::fs::write(tmp.path().join(".monoco/config.toml"), "trunk = [broken").unwrap();

    assert!(matches!(
        DaemonConfig::load(tmp.path().to_path_buf()),
        Err(LifecycleError::Config(_))
    ));
}
