use parking_lot::Mutex;
use prefstore_core::memory::MemoryStore;
use prefstore_core::{
    SettingDescriptor, SettingValue, SettingsError, SettingsMap, SettingsResolver, SettingsStore,
    StorePaths, ValueSource, WriteTarget,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG: &str = "/app/tool.db";
const ROAMING: &str = "/roaming/dir/userSettings.db";
const LOCAL: &str = "/local/dir/userSettings.db";

fn test_paths() -> StorePaths {
    StorePaths {
        application_config: Some(PathBuf::from(CONFIG)),
        roaming_directory: Some(PathBuf::from("/roaming/dir")),
        roaming_store: Some(PathBuf::from(ROAMING)),
        local_directory: Some(PathBuf::from("/local/dir")),
        local_store: Some(PathBuf::from(LOCAL)),
    }
}

// records which files get opened for reading
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    reads: Mutex<Vec<PathBuf>>,
}

impl SettingsStore for RecordingStore {
    fn read(&self, store_file: &Path, section: &str) -> Result<SettingsMap, SettingsError> {
        self.reads.lock().push(store_file.to_path_buf());
        self.inner.read(store_file, section)
    }

    fn write(
        &self,
        store_file: &Path,
        section: &str,
        values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        self.inner.write(store_file, section, values)
    }
}

// reads always fail; resolution must degrade, not propagate
struct FailingStore;

impl SettingsStore for FailingStore {
    fn read(&self, _store_file: &Path, _section: &str) -> Result<SettingsMap, SettingsError> {
        Err(SettingsError::Storage("boom"))
    }

    fn write(
        &self,
        _store_file: &Path,
        _section: &str,
        _values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        Err(SettingsError::Storage("boom"))
    }
}

#[test]
fn local_value_wins_over_roaming() {
    let store = MemoryStore::new();
    store.seed(ROAMING, "app", "Theme", SettingValue::plain("1"));
    store.seed(LOCAL, "app", "Theme", SettingValue::plain("2"));
    let resolver = SettingsResolver::new(store, test_paths());

    let out = resolver
        .resolve("app", &[SettingDescriptor::application("Theme")])
        .unwrap();
    let r = &out["Theme"];
    assert_eq!(r.value.as_deref(), Some("2"));
    assert_eq!(r.source, ValueSource::Stored);
}

#[test]
fn roaming_value_survives_when_local_has_other_keys() {
    let store = MemoryStore::new();
    store.seed(ROAMING, "app", "Theme", SettingValue::plain("1"));
    store.seed(LOCAL, "app", "FontSize", SettingValue::plain("11"));
    let resolver = SettingsResolver::new(store, test_paths());

    let out = resolver
        .resolve(
            "app",
            &[
                SettingDescriptor::application("Theme"),
                SettingDescriptor::application("FontSize"),
            ],
        )
        .unwrap();
    assert_eq!(out["Theme"].value.as_deref(), Some("1"));
    assert_eq!(out["FontSize"].value.as_deref(), Some("11"));
}

#[test]
fn user_scope_reads_only_the_application_config_store() {
    let store = RecordingStore::default();
    store.inner.seed(CONFIG, "app", "Theme", SettingValue::plain("cfg"));
    store.inner.seed(ROAMING, "app", "Theme", SettingValue::plain("roam"));
    let resolver = SettingsResolver::new(store, test_paths());

    let out = resolver
        .resolve("app", &[SettingDescriptor::user("Theme")])
        .unwrap();
    assert_eq!(out["Theme"].value.as_deref(), Some("cfg"));
    let reads = resolver.store().reads.lock();
    assert_eq!(reads.as_slice(), [PathBuf::from(CONFIG)]);
}

#[test]
fn application_scope_never_opens_the_config_store() {
    let store = RecordingStore::default();
    store.inner.seed(CONFIG, "app", "Theme", SettingValue::plain("cfg"));
    let resolver = SettingsResolver::new(store, test_paths());

    resolver
        .resolve("app", &[SettingDescriptor::application("Theme")])
        .unwrap();
    let reads = resolver.store().reads.lock();
    assert_eq!(
        reads.as_slice(),
        [PathBuf::from(ROAMING), PathBuf::from(LOCAL)]
    );
}

#[test]
fn default_fills_in_for_missing_values() {
    let resolver = SettingsResolver::new(MemoryStore::new(), test_paths());
    let out = resolver
        .resolve(
            "app",
            &[SettingDescriptor::user("FontSize").with_default("11")],
        )
        .unwrap();
    let r = &out["FontSize"];
    assert_eq!(r.value.as_deref(), Some("11"));
    assert_eq!(r.source, ValueSource::Default);
}

#[test]
fn absent_without_default_resolves_to_none() {
    let resolver = SettingsResolver::new(MemoryStore::new(), test_paths());
    let out = resolver
        .resolve("app", &[SettingDescriptor::application("Missing")])
        .unwrap();
    let r = &out["Missing"];
    assert_eq!(r.value, None);
    assert_eq!(r.source, ValueSource::Absent);
}

#[test]
fn connection_string_reads_the_config_store_despite_no_scope() {
    let store = MemoryStore::new();
    store.seed(CONFIG, "app", "MainDb", SettingValue::plain("Data Source=x"));
    let resolver = SettingsResolver::new(store, test_paths());

    let out = resolver
        .resolve("app", &[SettingDescriptor::connection_string("MainDb")])
        .unwrap();
    assert_eq!(out["MainDb"].value.as_deref(), Some("Data Source=x"));
}

#[test]
fn connection_string_falls_back_to_empty_string() {
    let resolver = SettingsResolver::new(MemoryStore::new(), test_paths());
    let out = resolver
        .resolve("app", &[SettingDescriptor::connection_string("MainDb")])
        .unwrap();
    let r = &out["MainDb"];
    assert_eq!(r.value.as_deref(), Some(""));
    assert_eq!(r.source, ValueSource::Absent);
}

#[test]
fn conflicting_scope_fails_before_any_store_read() {
    let store = RecordingStore::default();
    store.inner.seed(CONFIG, "app", "Ok", SettingValue::plain("1"));
    let resolver = SettingsResolver::new(store, test_paths());

    let mut broken = SettingDescriptor::application("Broken");
    broken.user_scoped = true;
    let err = resolver
        .resolve("app", &[SettingDescriptor::user("Ok"), broken])
        .unwrap_err();
    assert!(matches!(err, SettingsError::ConflictingScope(name) if name == "Broken"));
    assert!(resolver.store().reads.lock().is_empty());
}

#[test]
fn missing_scope_fails_before_any_store_read() {
    let store = RecordingStore::default();
    let resolver = SettingsResolver::new(store, test_paths());

    let mut unscoped = SettingDescriptor::user("Nope");
    unscoped.user_scoped = false;
    let err = resolver.resolve("app", &[unscoped]).unwrap_err();
    assert!(matches!(err, SettingsError::MissingScope(name) if name == "Nope"));
    assert!(resolver.store().reads.lock().is_empty());
}

#[test]
fn write_goes_to_the_selected_user_store() {
    let resolver = SettingsResolver::new(MemoryStore::new(), test_paths());
    let mut values = BTreeMap::new();
    values.insert("Theme".to_string(), SettingValue::plain("dark"));

    resolver
        .write_user_settings("app", WriteTarget::Local, &values)
        .unwrap();

    let local = resolver.store().read(Path::new(LOCAL), "app").unwrap();
    assert_eq!(local["app.Theme"].value, "dark");
    let roaming = resolver.store().read(Path::new(ROAMING), "app").unwrap();
    assert!(roaming.is_empty());
}

#[test]
fn write_fails_loudly_for_unplanned_target() {
    let mut paths = test_paths();
    paths.local_store = None;
    let resolver = SettingsResolver::new(MemoryStore::new(), paths);

    let err = resolver
        .write_user_settings("app", WriteTarget::Local, &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, SettingsError::StoreUnavailable(_)));
}

#[test]
fn framework_write_back_surface_is_unsupported() {
    let resolver = SettingsResolver::new(MemoryStore::new(), test_paths());
    assert!(matches!(
        resolver.set_property_values("app", &BTreeMap::new()),
        Err(SettingsError::Unsupported(_))
    ));
    assert!(matches!(
        resolver.previous_version("app", "Theme"),
        Err(SettingsError::Unsupported(_))
    ));
    assert!(matches!(
        resolver.reset("app"),
        Err(SettingsError::Unsupported(_))
    ));
    assert!(matches!(
        resolver.upgrade("app", &[]),
        Err(SettingsError::Unsupported(_))
    ));
}

#[test]
fn failed_store_reads_degrade_to_defaults() {
    let resolver = SettingsResolver::new(FailingStore, test_paths());
    let out = resolver
        .resolve(
            "app",
            &[
                SettingDescriptor::application("Theme").with_default("light"),
                SettingDescriptor::user("FontSize"),
            ],
        )
        .unwrap();
    assert_eq!(out["Theme"].value.as_deref(), Some("light"));
    assert_eq!(out["Theme"].source, ValueSource::Default);
    assert_eq!(out["FontSize"].value, None);
}

#[test]
fn resolution_is_keyed_by_qualified_name_in_the_store() {
    // A value stored under another section must not leak in.
    let store = MemoryStore::new();
    store.seed(CONFIG, "other", "Theme", SettingValue::plain("x"));
    let resolver = SettingsResolver::new(store, test_paths());

    let out = resolver
        .resolve("app", &[SettingDescriptor::user("Theme")])
        .unwrap();
    assert_eq!(out["Theme"].value, None);
}
