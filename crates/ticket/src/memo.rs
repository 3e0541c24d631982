// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memo inbox parsing and draining
//!
//! `Memos/inbox.md` is a sequence of blocks, each headed
//! `## [uid] <timestamp>` with an optional `- **From**: ...` line. Memos are
//! signals: consumption deletes them from the inbox, and the historical
//! trace lives in version control. Draining is read-then-truncate so a
//! daemon restart never re-observes consumed memos.

use crate::TicketError;
use monoco_core::{MemoEntry, MemoId};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[allow(clippy::unwrap_used)] // pattern is a compile-time constant
fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^## \[([0-9a-f]{6})\] (.+?)\s*$").unwrap())
}

fn from_line(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("- **From**:")?;
    Some(rest.trim().to_string())
}

/// Parse every memo block in the inbox text.
pub fn parse_inbox(text: &str) -> Vec<MemoEntry> {
    let mut memos: Vec<MemoEntry> = Vec::new();
    let mut current: Option<MemoEntry> = None;

    for line in text.lines() {
        if let Some(caps) = header_re().captures(line) {
            if let Some(mut done) = current.take() {
                done.body = done.body.trim().to_string();
                memos.push(done);
            }
            current = Some(MemoEntry {
                id: MemoId::new(&caps[1]),
                at: caps[2].to_string(),
                author: None,
                body: String::new(),
            });
            continue;
        }

        let Some(memo) = current.as_mut() else {
            continue; // preamble text before the first block
        };
        if memo.author.is_none() && memo.body.trim().is_empty() {
            if let Some(author) = from_line(line) {
                memo.author = Some(author);
                continue;
            }
        }
        memo.body.push_str(line);
        memo.body.push('\n');
    }

    if let Some(mut done) = current.take() {
        done.body = done.body.trim().to_string();
        memos.push(done);
    }
    memos
}

/// Render one memo block (the CLI `memo add` shape).
pub fn render_memo(memo: &MemoEntry) -> String {
    let mut out = format!("## [{}] {}\n", memo.id, memo.at);
    if let Some(author) = &memo.author {
        out.push_str(&format!("- **From**: {author}\n"));
    }
    out.push('\n');
    out.push_str(&memo.body);
    out.push_str("\n\n");
    out
}

/// Atomically consume the inbox: read all memos, truncate the file, return
/// what was read.
///
/// The truncate happens before the caller acts on the memos, so a crash
/// between drain and action loses the signal rather than duplicating it;
/// the design is at-least-once end to end only for mailbox traffic; memos
/// are deliberately fire-once.
pub fn drain_inbox(path: &Path) -> Result<Vec<MemoEntry>, TicketError> {
    let Some(text) = monoco_storage::read_if_exists(path)? else {
        return Ok(Vec::new());
    };
    let memos = parse_inbox(&text);
    if !memos.is_empty() {
        monoco_storage::write_atomic(path, b"")?;
    }
    Ok(memos)
}

#[cfg(test)]
#[path = "memo_tests.rs"]
mod tests;
