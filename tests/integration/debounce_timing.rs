use hotload::RecordErrorKind;
use std::thread;
use std::time::Duration;

use crate::integration::support::{registry_with, ScriptedLoader};

#[test]
fn second_reload_inside_window_is_debounced() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    assert!(registry.reload("auth", false).success);
    thread::sleep(Duration::from_millis(100));

    let record = registry.reload("auth", false);
    assert!(!record.success);
    assert_eq!(record.error.as_deref(), Some("debounced"));
    assert_eq!(record.error_kind(), Some(RecordErrorKind::Debounced));
    assert_eq!(registry.history().len(), 1);
    assert_eq!(registry.status().units["auth"].reload_count, 1);
}

#[test]
fn reload_after_window_succeeds() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    assert!(registry.reload("auth", false).success);
    thread::sleep(Duration::from_millis(600));
    assert!(registry.reload("auth", false).success);
    assert_eq!(registry.status().units["auth"].reload_count, 2);
}

#[test]
fn force_bypasses_the_window() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    assert!(registry.reload("auth", false).success);
    assert!(registry.reload("auth", true).success);
    assert!(registry.reload("auth", true).success);
    assert_eq!(registry.history().len(), 3);
}

#[test]
fn failed_reload_also_starts_a_window() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    loader.fail("auth", "broken");
    assert!(!registry.reload("auth", false).success);
    loader.succeed("auth", "H2");
    assert!(registry.reload("auth", false).is_debounced());
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");
}

#[test]
fn units_are_debounced_independently() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "A");
    loader.succeed("billing", "B");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();
    registry.register("billing").unwrap();

    assert!(registry.reload("auth", false).success);
    assert!(registry.reload("billing", false).success);
    assert!(registry.reload("auth", false).is_debounced());
}
