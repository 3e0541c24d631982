// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn short_truncates_long_strings() {
    assert_eq!("abcdefgh".short(4), "abcd");
    assert_eq!("ab".short(4), "ab");
    assert_eq!("".short(4), "");
}

#[parameterized(
    feature = { "FEAT-0042", "FEAT", 42 },
    fix = { "FIX-0001", "FIX", 1 },
    epic = { "EPIC-1203", "EPIC", 1203 },
    chore = { "CHORE-0007", "CHORE", 7 },
)]
fn issue_id_parses_known_prefixes(raw: &str, prefix: &str, number: u32) {
    let id = IssueId::parse(raw).unwrap();
    assert_eq!(id.prefix(), prefix);
    assert_eq!(id.number(), number);
    assert_eq!(id.as_str(), raw);
}

#[parameterized(
    unknown_prefix = { "BUG-0042" },
    missing_dash = { "FEAT0042" },
    empty_number = { "FEAT-" },
    alpha_number = { "FEAT-00x2" },
    empty = { "" },
)]
fn issue_id_rejects_malformed(raw: &str) {
    assert!(IssueId::parse(raw).is_none());
}

#[test]
fn issue_id_from_parts_zero_pads() {
    assert_eq!(IssueId::from_parts("FEAT", 7).as_str(), "FEAT-0007");
    assert_eq!(IssueId::from_parts("FIX", 12345).as_str(), "FIX-12345");
}

#[test]
fn sequential_id_gen_is_deterministic() {
    let idgen = SequentialIdGen::new("sess");
    assert_eq!(idgen.next(), "sess-1");
    assert_eq!(idgen.next(), "sess-2");

    // Clones share the counter
    let clone = idgen.clone();
    assert_eq!(clone.next(), "sess-3");
}

#[test]
fn uuid_id_gen_produces_unique_ids() {
    let idgen = UuidIdGen;
    assert_ne!(idgen.next(), idgen.next());
}

#[test]
fn issue_id_serializes_as_plain_string() {
    let id = IssueId::parse("FEAT-0042").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"FEAT-0042\"");
}
