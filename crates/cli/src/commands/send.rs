// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `monoco send`: draft validation and hand-off to the outbound mailbox

use anyhow::Result;
use clap::Args;
use monoco_engine::Mailbox;
use std::path::PathBuf;

#[derive(Args)]
pub struct SendArgs {
    /// Path to the draft message (YAML preamble + body)
    pub draft: PathBuf,
}

pub fn run(args: SendArgs) -> Result<()> {
    let (paths, config) = super::project()?;
    let mailbox = Mailbox::new(paths, config.mailbox);
    let target = mailbox.submit_draft(&args.draft)?;
    println!("queued {}", target.display());
    Ok(())
}
