// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn entry(root: &str) -> ProjectEntry {
    ProjectEntry {
        root: PathBuf::from(root),
        credentials: HashMap::new(),
    }
}

#[test]
fn register_and_resolve() {
    let mut registry = ProjectRegistry::default();
    registry.register("acme-api", entry("/srv/acme")).unwrap();

    assert_eq!(
        registry.resolve("acme-api").unwrap().root,
        PathBuf::from("/srv/acme")
    );
    assert!(registry.resolve("other").is_none());
}

#[parameterized(
    uppercase = { "Acme" },
    space = { "acme api" },
    slash = { "acme/api" },
    empty = { "" },
    unicode = { "acmé" },
)]
fn register_rejects_unsafe_slugs(slug: &str) {
    let mut registry = ProjectRegistry::default();
    assert!(matches!(
        registry.register(slug, entry("/srv/x")),
        Err(RegistryError::BadSlug(_))
    ));
}

#[test]
fn register_rejects_duplicate_slug() {
    let mut registry = ProjectRegistry::default();
    registry.register("acme", entry("/srv/a")).unwrap();
    assert!(matches!(
        registry.register("acme", entry("/srv/b")),
        Err(RegistryError::DuplicateSlug(_))
    ));
}

#[test]
fn register_rejects_relative_root() {
    let mut registry = ProjectRegistry::default();
    assert!(matches!(
        registry.register("acme", entry("srv/a")),
        Err(RegistryError::RelativeRoot(_))
    ));
}

#[test]
fn update_persists_through_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");

    ProjectRegistry::update(&path, |registry| {
        registry.register("acme", entry("/srv/acme"))
    })
    .unwrap();

    let loaded = ProjectRegistry::load(&path).unwrap();
    assert!(loaded.resolve("acme").is_some());
}

#[test]
fn load_missing_registry_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ProjectRegistry::load(&dir.path().join("inventory.json")).unwrap();
    assert!(registry.projects.is_empty());
}

#[test]
fn load_corrupt_registry_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        ProjectRegistry::load(&path),
        Err(RegistryError::Corrupt { .. })
    ));
}
