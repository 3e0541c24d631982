// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    simple = { "Add rate limit", "add-rate-limit" },
    punctuation = { "Fix: NPE in parser!!", "fix-npe-in-parser" },
    unicode = { "café menu", "caf-menu" },
    leading_junk = { "  --hello--  ", "hello" },
    empty = { "", "" },
    digits = { "HTTP 429 handling", "http-429-handling" },
)]
fn slugify_cases(input: &str, expected: &str) {
    assert_eq!(slugify(input, MAX_SLUG_LEN), expected);
}

#[test]
fn truncation_never_leaves_trailing_hyphen() {
    let slug = slugify("one two three four", 8);
    assert_eq!(slug, "one-two");
    assert!(!slug.ends_with('-'));
}
