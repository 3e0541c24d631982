// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn now() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn sample() -> Issue {
    let mut issue = Issue::new(
        IssueId::from("FEAT-0097"),
        IssueType::Feature,
        "Add rate limit",
        now(),
    );
    issue.body = "## Body\n\nDetails.\n".to_string();
    issue
}

const RAW: &str = r#"---
id: FEAT-0097
type: feature
status: open
stage: doing
title: "Add rate limit"
created_at: '2026-01-01T00:00:00'
updated_at: '2026-01-01T00:00:00'
parent: EPIC-0001
dependencies: []
related: []
domains: []
tags: []
files:
- src/foo.rs
isolation:
  type: worktree
  ref: feat-0097-add-rate-limit
  path: .monoco/worktrees/feat-0097
  created_at: '2026-01-02T09:30:00'
criticality: medium
solution: null
x_kanban_column: wip
---
## Body
"#;

#[test]
fn parse_full_preamble() {
    let issue = Issue::parse(RAW).unwrap();
    assert_eq!(issue.id, "FEAT-0097");
    assert_eq!(issue.issue_type, IssueType::Feature);
    assert_eq!(issue.status, Status::Open);
    assert_eq!(issue.stage, Stage::Doing);
    assert_eq!(issue.parent, Some(IssueId::from("EPIC-0001")));
    assert_eq!(issue.files, vec!["src/foo.rs"]);
    assert_eq!(issue.solution, None);
    assert_eq!(issue.body, "## Body\n");

    let isolation = issue.isolation.as_ref().unwrap();
    assert_eq!(isolation.isolation_type, IsolationType::Worktree);
    assert_eq!(isolation.ref_name, "feat-0097-add-rate-limit");
}

#[test]
fn unknown_keys_survive_round_trip() {
    let issue = Issue::parse(RAW).unwrap();
    assert_eq!(
        issue.extras.get("x_kanban_column"),
        Some(&serde_yaml::Value::String("wip".to_string()))
    );

    let rendered = issue.render().unwrap();
    let again = Issue::parse(&rendered).unwrap();
    assert_eq!(again, issue);
    assert!(rendered.contains("x_kanban_column"));
}

#[test]
fn solution_null_is_rendered_explicitly() {
    let rendered = sample().render().unwrap();
    assert!(rendered.contains("solution: null"));
}

#[test]
fn unknown_enum_value_is_rejected() {
    let text = RAW.replace("stage: doing", "stage: flying");
    assert!(matches!(Issue::parse(&text), Err(TicketError::Yaml(_))));
}

#[parameterized(
    epic = { IssueType::Epic, "EPIC", "Epics" },
    feature = { IssueType::Feature, "FEAT", "Features" },
    fix = { IssueType::Fix, "FIX", "Fixes" },
    chore = { IssueType::Chore, "CHORE", "Chores" },
)]
fn type_prefixes_and_dirs(t: IssueType, prefix: &str, plural: &str) {
    assert_eq!(t.id_prefix(), prefix);
    assert_eq!(t.plural_dir(), plural);
    assert_eq!(IssueType::from_id(&IssueId::from_parts(prefix, 1)), Some(t));
}

#[test]
fn file_name_and_expected_path() {
    let issue = sample();
    assert_eq!(issue.file_name(), "FEAT-0097-add-rate-limit.md");
    assert_eq!(
        issue.expected_path(Path::new("Issues")),
        PathBuf::from("Issues/Features/open/FEAT-0097-add-rate-limit.md")
    );
}

#[test]
fn save_load_and_find() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Issues");
    let issue = sample();
    issue.save(&issue.expected_path(&root)).unwrap();

    let found = find_issue(&root, &IssueId::from("FEAT-0097")).unwrap();
    let loaded = Issue::load(&found).unwrap();
    assert_eq!(loaded, issue);

    assert!(find_issue(&root, &IssueId::from("FEAT-9999")).is_none());
}

#[test]
fn next_issue_id_allocates_per_type() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Issues");

    assert_eq!(next_issue_id(&root, IssueType::Feature), "FEAT-0001");

    sample().save(&sample().expected_path(&root)).unwrap();
    let mut fix = Issue::new(IssueId::from("FIX-0005"), IssueType::Fix, "crash", now());
    fix.save(&fix.expected_path(&root)).unwrap();

    assert_eq!(next_issue_id(&root, IssueType::Feature), "FEAT-0098");
    assert_eq!(next_issue_id(&root, IssueType::Fix), "FIX-0006");
    assert_eq!(next_issue_id(&root, IssueType::Epic), "EPIC-0001");
}

#[test]
fn scan_skips_unparseable_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Issues");
    sample().save(&sample().expected_path(&root)).unwrap();
    std::fs::write(root.join("Features/open/broken.md"), "no preamble").unwrap();

    assert_eq!(scan_issues(&root).len(), 1);
}
