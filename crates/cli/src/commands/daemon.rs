// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `monoco daemon` verbs

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use monoco_adapters::{pid_alive, terminate_graceful};
use monoco_storage::PidFile;
use std::time::Duration;

/// How long `stop` waits after SIGTERM before SIGKILL.
const STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    verb: DaemonVerb,
}

#[derive(Subcommand)]
enum DaemonVerb {
    /// Launch monocod for this project
    Start {
        /// Detach; logs go to .monoco/log/daemon.log
        #[arg(long)]
        daemon: bool,
    },
    /// SIGTERM the daemon, escalating to SIGKILL after 10s
    Stop,
    /// Report daemon liveness
    Status,
}

/// The monocod binary: sibling of the running `monoco`, falling back to PATH.
fn daemon_binary() -> std::path::PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("monocod")))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| std::path::PathBuf::from("monocod"))
}

pub async fn run(args: DaemonArgs) -> Result<()> {
    let (paths, _) = super::project()?;
    let pid_path = paths.pid_file();

    match args.verb {
        DaemonVerb::Start { daemon } => {
            if let Some(live) = PidFile::read_live(&pid_path, pid_alive)? {
                bail!("daemon already running (pid {}, port {})", live.pid, live.port);
            }
            let mut cmd = std::process::Command::new(daemon_binary());
            cmd.current_dir(paths.root());
            if daemon {
                cmd.arg("--daemon");
            }
            let status = cmd.status().context("launching monocod")?;
            if !status.success() {
                bail!("monocod exited {}", status.code().unwrap_or(-1));
            }
        }
        DaemonVerb::Stop => {
            let Some(live) = PidFile::read_live(&pid_path, pid_alive)? else {
                println!("daemon not running");
                return Ok(());
            };
            let killed = terminate_graceful(live.pid, STOP_GRACE).await;
            PidFile::remove(&pid_path);
            if killed {
                println!("daemon {} killed (did not exit in {STOP_GRACE:?})", live.pid);
            } else {
                println!("daemon {} stopped", live.pid);
            }
        }
        DaemonVerb::Status => match PidFile::read_live(&pid_path, pid_alive)? {
            Some(live) => println!(
                "running: pid {} on {}:{}",
                live.pid, live.host, live.port
            ),
            None => println!("not running"),
        },
    }
    Ok(())
}
