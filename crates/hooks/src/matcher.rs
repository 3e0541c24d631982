// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glob matching for hook matchers
//!
//! Matchers name tools (`Bash`, `mcp__*`) or file globs. Only `*` and `?`
//! carry meaning; everything else matches literally.

use regex::Regex;

/// Whether `candidate` matches the glob `pattern` (full-string, case-sensitive).
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 4);
    regex.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    match Regex::new(&regex) {
        Ok(re) => re.is_match(candidate),
        Err(_) => pattern == candidate,
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
