// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monoco Daemon (monocod)
//!
//! Background process that owns the watchers, the event bus, the scheduler,
//! and the HTTP surface for one project.
//!
//! Typically started by the `monoco` CLI; it serves the project rooted at
//! the working directory (or `MONOCO_PROJECT`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use monoco_daemon::lifecycle::{self, DaemonConfig, LifecycleError};
use monoco_engine::ProviderRegistry;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Environment flag marking the re-executed detached child.
const DAEMONIZED_ENV: &str = "MONOCO_DAEMONIZED";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut daemonize = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("monocod {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("monocod {}", env!("CARGO_PKG_VERSION"));
                println!("Monoco daemon - watches a project and orchestrates its agents");
                println!();
                println!("USAGE:");
                println!("    monocod [--daemon]");
                println!();
                println!("The daemon serves the project rooted at the current directory");
                println!("(override with MONOCO_PROJECT). It is typically started by the");
                println!("`monoco` CLI rather than invoked directly.");
                println!();
                println!("OPTIONS:");
                println!("    --daemon         Detach and log to .monoco/log/daemon.log");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            "--daemon" => daemonize = true,
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: monocod [--daemon | --help | --version]");
                std::process::exit(1);
            }
        }
    }

    let root = project_root()?;
    let config = DaemonConfig::load(root)?;

    if daemonize && std::env::var(DAEMONIZED_ENV).is_err() {
        return respawn_detached(&config);
    }

    rotate_log_if_needed(&config.paths.daemon_log());
    write_startup_marker(&config)?;
    let _log_guard = setup_logging(&config)?;

    info!("starting monocod");
    let daemon = match lifecycle::startup(config.clone(), ProviderRegistry::new()).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::AlreadyRunning { pid, port }) => {
            eprintln!("monocod is already running");
            eprintln!("  pid: {pid}");
            eprintln!("  port: {port}");
            std::process::exit(1);
        }
        Err(err) => {
            write_startup_error(&config, &err);
            error!("failed to start daemon: {err}");
            return Err(err.into());
        }
    };

    // Signal ready for a parent waiting on startup
    println!("READY {}", daemon.port);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    // Agents stay alive across daemon restarts; the next start adopts them
    daemon.shutdown(false).await;
    Ok(())
}

fn project_root() -> Result<PathBuf, std::io::Error> {
    match std::env::var("MONOCO_PROJECT") {
        Ok(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => std::env::current_dir(),
    }
}

/// Re-exec ourselves detached, stdout/stderr onto the daemon log.
fn respawn_detached(config: &DaemonConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = config.paths.daemon_log();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let stdout = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let stderr = stdout.try_clone()?;

    let exe = std::env::current_exe()?;
    let child = std::process::Command::new(exe)
        .env(DAEMONIZED_ENV, "1")
        .current_dir(config.paths.root())
        .stdin(std::process::Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()?;
    println!("monocod detached (pid {})", child.id());
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures never block startup.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else; the CLI
/// uses it to find where the current startup attempt begins.
const STARTUP_MARKER_PREFIX: &str = "--- monocod: starting (pid: ";

fn write_startup_marker(config: &DaemonConfig) -> Result<(), std::io::Error> {
    use std::io::Write;

    let log_path = config.paths.daemon_log();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write a startup error synchronously so the CLI sees it even when the
/// process exits before the async appender flushes.
fn write_startup_error(config: &DaemonConfig, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.paths.daemon_log())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.paths.daemon_log();
    let log_dir = log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir)?;
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "daemon.log".to_string());

    let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
