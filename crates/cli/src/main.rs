// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! monoco - Monoco CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod exit_error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, hook, issue, memo, send};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "monoco",
    version,
    about = "Monoco - orchestration for autonomous coding agents"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue lifecycle (create, start, submit, close, sync, lint, list)
    Issue(issue::IssueArgs),
    /// Daemon management (start, stop, status)
    Daemon(daemon::DaemonArgs),
    /// Append a memo to the inbox
    Memo(memo::MemoArgs),
    /// Hook management (install, run)
    Hook(hook::HookArgs),
    /// Validate a draft message and move it into the outbound mailbox
    Send(send::SendArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(dir) = &cli.directory {
        if let Err(err) = std::env::set_current_dir(dir) {
            eprintln!("error: cannot enter {}: {err}", dir.display());
            std::process::exit(1);
        }
    }

    let result = dispatch(cli.command).await;
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_error::exit_code(&err));
    }
}

/// The flat (verb, noun) table: every subcommand resolves to one handler.
async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Issue(args) => issue::run(args).await,
        Commands::Daemon(args) => daemon::run(args).await,
        Commands::Memo(args) => memo::run(args),
        Commands::Hook(args) => hook::run(args).await,
        Commands::Send(args) => send::run(args),
    }
}
