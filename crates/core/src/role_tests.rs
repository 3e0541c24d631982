// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    architect = { "architect", Role::Architect },
    engineer = { "Engineer", Role::Engineer },
    reviewer = { "REVIEWER", Role::Reviewer },
    coroner = { "coroner", Role::Coroner },
    prime = { "prime", Role::Prime },
)]
fn parse_builtin_roles_case_insensitive(input: &str, expected: Role) {
    assert_eq!(Role::parse(input), expected);
}

#[test]
fn parse_unknown_role_is_custom() {
    let role = Role::parse("librarian");
    assert_eq!(role, Role::Custom("librarian".to_string()));
    assert_eq!(role.name(), "librarian");
}

#[test]
fn role_serde_round_trip() {
    for role in Role::builtin() {
        let json = serde_json::to_string(&role).unwrap();
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, role);
    }

    let custom: Role = serde_json::from_str("\"auditor\"").unwrap();
    assert_eq!(custom, Role::Custom("auditor".to_string()));
}

#[test]
fn default_quotas_are_at_least_one() {
    for role in Role::builtin() {
        assert!(role.default_concurrency() >= 1);
    }
}
