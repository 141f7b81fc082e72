use safeswipe::decoy::{DecoyType, ExternalSite};
use safeswipe::settings::{DisguiseType, PanicSettings, ProtectedApp, SettingsPatch};
use safeswipe::store::{FileStore, SettingsStore, StoredData};
use std::fs;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().join("nested").join("settings.toml"))
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    assert_eq!(store.get_settings().unwrap(), PanicSettings::default());
    assert_eq!(store.get_protected_apps().unwrap().len(), 3);
    assert!(!store.path().exists(), "Reading must not create the file");
}

#[test]
fn test_update_persists_and_preserves_other_fields() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let patch = SettingsPatch {
        swipe_count: Some(4),
        decoy_type: Some(DecoyType::ExternalSite(ExternalSite::News)),
        ..SettingsPatch::default()
    };
    let updated = store.update_settings(&patch).unwrap();
    assert_eq!(updated.swipe_count, 4);

    let reopened = FileStore::new(store.path()).load().unwrap();
    assert_eq!(reopened.settings, updated);
    assert_eq!(
        reopened.settings.decoy_type,
        DecoyType::ExternalSite(ExternalSite::News)
    );
    assert_eq!(
        reopened.settings.hold_duration,
        PanicSettings::default().hold_duration
    );
}

#[test]
fn test_file_layout_uses_camel_case() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.create_default().unwrap();

    let contents = fs::read_to_string(store.path()).unwrap();
    assert!(contents.contains("[settings]"));
    assert!(contents.contains("swipeCount = 3"));
    assert!(contents.contains("decoyType = \"fake_lock_screen\""));
    assert!(contents.contains("[[protectedApps]]"));
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "[settings]\nburnMode = true\n").unwrap();

    let data = store.load().unwrap();
    assert!(data.settings.burn_mode);
    assert_eq!(data.settings.swipe_count, 3);
    assert_eq!(data.protected_apps, StoredData::default().protected_apps);
}

#[test]
fn test_unknown_decoy_type_is_kept() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "[settings]\ndecoyType = \"pinball\"\n").unwrap();

    let data = store.load().unwrap();
    assert_eq!(
        data.settings.decoy_type,
        DecoyType::Unknown("pinball".to_string())
    );
}

#[test]
fn test_out_of_range_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "[settings]\nswipeCount = 11\n").unwrap();

    let err = store.load().unwrap_err();
    assert!(format!("{:#}", err).contains("swipeCount"));
}

#[test]
fn test_invalid_patch_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    store.create_default().unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let patch = SettingsPatch {
        delayed_panic_minutes: Some(0),
        ..SettingsPatch::default()
    };
    assert!(store.update_settings(&patch).is_err());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

#[cfg(unix)]
#[test]
fn test_saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.create_default().unwrap();

    let mode = fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_protected_app_crud() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let added = store
        .add_protected_app(ProtectedApp {
            id: 42,
            name: "Wire".to_string(),
            icon: "lock".to_string(),
            description: None,
            is_active: false,
            disguise_type: DisguiseType::Crash,
            disguise_as: None,
            disguise_icon: None,
            clear_chats: true,
            log_out: true,
        })
        .unwrap();
    assert_eq!(added.id, 4, "Caller-supplied ids are replaced");

    let mut edited = added.clone();
    edited.is_active = true;
    store.update_protected_app(edited).unwrap();

    let apps = store.get_protected_apps().unwrap();
    assert_eq!(apps.len(), 4);
    assert!(apps.iter().any(|a| a.id == 4 && a.is_active));

    assert!(store.delete_protected_app(1).unwrap());
    assert!(!store.delete_protected_app(1).unwrap());
    assert_eq!(store.get_protected_apps().unwrap().len(), 3);
}

#[test]
fn test_external_edits_are_picked_up() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    store.create_default().unwrap();

    let mut data = store.load().unwrap();
    data.settings.larger_text = true;
    FileStore::new(store.path()).save(&data).unwrap();

    assert!(store.get_settings().unwrap().larger_text);
}
