// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_hook(dir: &Path, name: &str, event: &str, priority: i32) {
    let script = format!(
        "#!/bin/sh\n# ---\n# type: issue\n# event: {event}\n# priority: {priority}\n# ---\nexit 0\n"
    );
    std::fs::write(dir.join(name), script).unwrap();
}

#[test]
fn scan_finds_hooks_and_skips_helpers() {
    let dir = tempfile::tempdir().unwrap();
    write_hook(dir.path(), "a-lint.sh", "pre-submit", 0);
    write_hook(dir.path(), "b-guard.sh", "pre-close", 10);
    std::fs::write(dir.path().join("common.sh"), "# shared helpers\nfoo() { :; }\n").unwrap();
    std::fs::create_dir(dir.path().join("lib")).unwrap();

    let hooks = scan_dir(dir.path());
    assert_eq!(hooks.len(), 2);
    assert_eq!(hooks[0].event, "pre-submit");
    assert_eq!(hooks[1].event, "pre-close");
}

#[test]
fn discover_concatenates_in_precedence_order() {
    let project = tempfile::tempdir().unwrap();
    let user = tempfile::tempdir().unwrap();
    write_hook(project.path(), "local.sh", "pre-submit", 0);
    write_hook(user.path(), "global.sh", "pre-submit", 0);

    let hooks = discover_hooks(&[project.path(), user.path()]);
    assert_eq!(hooks.len(), 2);
    assert!(hooks[0].path.ends_with("local.sh"));
    assert!(hooks[1].path.ends_with("global.sh"));
}

#[test]
fn missing_directory_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(scan_dir(&dir.path().join("absent")).is_empty());
}
