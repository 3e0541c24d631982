// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `monoco memo` verbs

use anyhow::Result;
use clap::{Args, Subcommand};
use monoco_core::{MemoEntry, MemoId};
use monoco_ticket::memo::render_memo;

#[derive(Args)]
pub struct MemoArgs {
    #[command(subcommand)]
    verb: MemoVerb,
}

#[derive(Subcommand)]
enum MemoVerb {
    /// Append a memo block to Memos/inbox.md
    Add {
        text: String,
        #[arg(long, default_value = "user")]
        from: String,
    },
}

fn memo_id() -> MemoId {
    let n: u32 = rand::random();
    MemoId::new(format!("{:06x}", n & 0xff_ffff))
}

pub fn run(args: MemoArgs) -> Result<()> {
    let (paths, _) = super::project()?;
    match args.verb {
        MemoVerb::Add { text, from } => {
            let entry = MemoEntry {
                id: memo_id(),
                at: chrono::Utc::now()
                    .naive_utc()
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
                author: Some(from),
                body: text,
            };
            monoco_storage::append_atomic(&paths.memo_inbox(), &render_memo(&entry))?;
            println!("memo {} queued", entry.id);
        }
    }
    Ok(())
}
