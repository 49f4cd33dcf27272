use hotload::{FileUnit, FileUnitLoader, Registry};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::integration::support::{registry_with, ScriptedLoader};

#[test]
fn dotted_path_matches_registered_source() {
    let loader = ScriptedLoader::new();
    loader.succeed("c", "C1");
    let registry = registry_with(&loader, 500);
    registry
        .register_with_source("c", Some(PathBuf::from("/a/b/c.mod")))
        .unwrap();

    let records = registry.reload_by_path(Path::new("/a/./b/c.mod"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].unit_name, "c");
    assert!(records[0].success);

    let records = registry.reload_by_path(Path::new("/a/b/../b/c.mod"));
    assert_eq!(records.len(), 1);
}

#[test]
fn unrelated_path_reloads_nothing() {
    let loader = ScriptedLoader::new();
    loader.succeed("c", "C1");
    let registry = registry_with(&loader, 500);
    registry
        .register_with_source("c", Some(PathBuf::from("/a/b/c.mod")))
        .unwrap();

    assert!(registry.reload_by_path(Path::new("/a/b/d.mod")).is_empty());
    assert!(registry.history().is_empty());
}

#[test]
fn units_without_source_never_match() {
    let loader = ScriptedLoader::new();
    loader.succeed("inline", "I1");
    let registry = registry_with(&loader, 500);
    registry.register("inline").unwrap();

    assert!(registry.units_for_path(Path::new("/anything")).is_empty());
}

#[test]
fn path_reload_bypasses_debounce_and_hits_every_sharing_unit() {
    let loader = ScriptedLoader::new();
    loader.succeed("a", "A1");
    loader.succeed("b", "B1");
    let registry = registry_with(&loader, 500);
    let shared = PathBuf::from("/srv/shared.mod");
    registry.register_with_source("b", Some(shared.clone())).unwrap();
    registry.register_with_source("a", Some(shared.clone())).unwrap();

    assert!(registry.reload("a", false).success);
    let records = registry.reload_by_path(&shared);
    let names: Vec<&str> = records.iter().map(|r| r.unit_name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(records.iter().all(|r| r.success));
}

#[test]
fn file_units_match_through_relative_segments() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("units");
    fs::create_dir_all(root.join("nested")).unwrap();
    fs::write(root.join("auth.mod"), "v1").unwrap();

    let registry: Registry<FileUnit> = Registry::with_defaults(FileUnitLoader::new(&root, "mod"));
    registry.register("auth").unwrap();
    fs::write(root.join("auth.mod"), "v2").unwrap();

    let records = registry.reload_by_path(&root.join("nested").join("..").join("auth.mod"));
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(registry.get_handle("auth").unwrap().contents, "v2");
}

#[cfg(unix)]
#[test]
fn symlinked_path_matches_its_target() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("units");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("auth.mod"), "v1").unwrap();
    let link = temp.path().join("linked.mod");
    std::os::unix::fs::symlink(root.join("auth.mod"), &link).unwrap();

    let registry: Registry<FileUnit> = Registry::with_defaults(FileUnitLoader::new(&root, "mod"));
    registry.register("auth").unwrap();

    assert_eq!(registry.units_for_path(&link), vec!["auth".to_string()]);
}

#[cfg(unix)]
#[test]
fn deleted_file_under_symlinked_root_still_matches() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real");
    fs::create_dir_all(&real).unwrap();
    fs::write(real.join("auth.mod"), "v1").unwrap();
    let linked = temp.path().join("units");
    std::os::unix::fs::symlink(&real, &linked).unwrap();

    let registry: Registry<FileUnit> =
        Registry::with_defaults(FileUnitLoader::new(&linked, "mod"));
    registry.register("auth").unwrap();
    fs::remove_file(real.join("auth.mod")).unwrap();

    assert_eq!(registry.units_for_path(&real.join("auth.mod")), vec!["auth".to_string()]);
    assert_eq!(registry.units_for_path(&linked.join("auth.mod")), vec!["auth".to_string()]);

    let records = registry.reload_by_path(&real.join("auth.mod"));
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(registry.get_handle("auth").unwrap().contents, "v1");
}
