use hotload::{RecordErrorKind, ReloadError};

use crate::integration::support::{registry_with, ScriptedLoader};

#[test]
fn failed_reload_keeps_previous_handle() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    assert_eq!(registry.register("auth"), Ok(true));

    loader.fail("auth", "syntax error on line 3");
    let record = registry.reload("auth", false);

    assert!(!record.success);
    assert_eq!(record.error.as_deref(), Some("syntax error on line 3"));
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");
    assert_eq!(registry.status().units["auth"].reload_count, 0);
    assert_eq!(registry.history(), vec![record]);
}

#[test]
fn auth_unit_end_to_end() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    loader.fail("auth", "bad import");
    let failed = registry.reload("auth", true);
    assert!(!failed.success);
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");

    loader.succeed("auth", "H2");
    let ok = registry.reload("auth", true);
    assert!(ok.success);
    assert_eq!(ok.error, None);
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H2");

    let status = registry.status();
    assert_eq!(status.units["auth"].reload_count, 1);
    assert_eq!(status.units["auth"].last_reloaded_at, Some(ok.timestamp));
    assert_eq!(status.total_reloads, 1);
    assert_eq!(status.history_length, 2);
    assert_eq!(registry.history(), vec![failed, ok]);
}

#[test]
fn swapping_the_loader_takes_effect_on_next_reload() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();

    registry.set_loader(|name: &str| -> Result<std::sync::Arc<String>, String> {
        Ok(std::sync::Arc::new(format!("{}-v2", name)))
    });
    assert!(registry.reload("auth", true).success);
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "auth-v2");
}

#[test]
fn register_is_idempotent_and_failed_register_leaves_no_entry() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    loader.fail("billing", "missing");
    let registry = registry_with(&loader, 500);

    assert_eq!(registry.register("auth"), Ok(true));
    loader.succeed("auth", "H-other");
    assert_eq!(registry.register("auth"), Ok(false));
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");

    assert_eq!(
        registry.register("billing"),
        Err(ReloadError::Load("missing".to_string()))
    );
    assert!(!registry.contains("billing"));
    assert!(registry.history().is_empty());
}

#[test]
fn reload_of_unknown_unit_is_rejected_without_history() {
    let loader = ScriptedLoader::new();
    let registry = registry_with(&loader, 500);

    let record = registry.reload("ghost", false);
    assert!(!record.success);
    assert_eq!(record.error.as_deref(), Some("not registered"));
    assert_eq!(record.error_kind(), Some(RecordErrorKind::NotRegistered));
    assert_eq!(record.duration_ms, 0);
    assert!(registry.history().is_empty());
}

#[test]
fn unregister_then_register_starts_fresh() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry.register("auth").unwrap();
    assert!(registry.reload("auth", false).success);

    assert!(registry.unregister("auth"));
    assert!(!registry.unregister("auth"));
    assert!(registry.get_handle("auth").is_none());

    loader.succeed("auth", "H2");
    assert_eq!(registry.register("auth"), Ok(true));
    // Debounce state went with the old entry
    assert!(registry.reload("auth", false).success);
    assert_eq!(registry.status().units["auth"].reload_count, 1);
}

#[test]
fn loader_message_matching_a_rejection_is_still_a_load_failure() {
    let loader = ScriptedLoader::new();
    loader.succeed("auth", "H1");
    let registry = registry_with(&loader, 500);
    registry
        .register_with_source("auth", Some(std::path::PathBuf::from("/srv/auth.mod")))
        .unwrap();

    loader.fail("auth", "not registered");
    let all = registry.reload_all(true);
    assert_eq!(all.len(), registry.history().len());
    assert_eq!(all[0].error_kind(), Some(RecordErrorKind::Load));

    loader.fail("auth", "debounced");
    let by_path = registry.reload_by_path(std::path::Path::new("/srv/auth.mod"));
    assert_eq!(by_path.len(), 1);
    assert!(!by_path[0].is_debounced());
    assert_eq!(
        by_path[0].clone().into_result(),
        Err(ReloadError::Load("debounced".to_string()))
    );
    assert_eq!(registry.history().len(), 2);
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");
}
