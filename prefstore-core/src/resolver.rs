use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::store::SettingsStore;
use crate::{
    setting_key, ResolvedSetting, SerializeAs, SettingDescriptor, SettingScope, SettingValue,
    SettingsError, SettingsMap, StorePaths, StoredSetting, ValueSource,
};

// Exactly one store file is ever written per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteTarget {
    Roaming,
    Local,
}

// Application scope reads roaming+local merged (local wins); user scope and
// connection strings read the application-config store alone.
pub struct SettingsResolver<S> {
    store: S,
    paths: StorePaths,
}

enum Lookup {
    ConnectionString,
    Scoped(SettingScope),
}

impl<S: SettingsStore> SettingsResolver<S> {
    pub fn new(store: S, paths: StorePaths) -> Self {
        Self { store, paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolve(
        &self,
        section: &str,
        descriptors: &[SettingDescriptor],
    ) -> Result<BTreeMap<String, ResolvedSetting>, SettingsError> {
        // Validate every scope before opening any store file.
        let mut lookups = Vec::with_capacity(descriptors.len());
        for d in descriptors {
            if d.connection_string {
                lookups.push(Lookup::ConnectionString);
            } else {
                lookups.push(Lookup::Scoped(d.scope()?));
            }
        }

        let needs_user = lookups.iter().any(|l| {
            matches!(
                l,
                Lookup::ConnectionString | Lookup::Scoped(SettingScope::User)
            )
        });
        let needs_app = lookups
            .iter()
            .any(|l| matches!(l, Lookup::Scoped(SettingScope::Application)));

        let user_source = if needs_user {
            self.read_user_source(section)
        } else {
            SettingsMap::new()
        };
        let app_source = if needs_app {
            self.read_app_source(section)
        } else {
            SettingsMap::new()
        };

        let mut resolved = BTreeMap::new();
        for (d, lookup) in descriptors.iter().zip(&lookups) {
            let key = setting_key(section, &d.name);
            let setting = match lookup {
                Lookup::ConnectionString => match user_source.get(&key) {
                    Some(item) => stored_hit(d, item),
                    None => fallback(d, true),
                },
                Lookup::Scoped(SettingScope::User) => match user_source.get(&key) {
                    Some(item) => stored_hit(d, item),
                    None => fallback(d, false),
                },
                Lookup::Scoped(SettingScope::Application) => match app_source.get(&key) {
                    Some(item) => stored_hit(d, item),
                    None => fallback(d, false),
                },
            };
            resolved.insert(d.name.clone(), setting);
        }
        Ok(resolved)
    }

    // The supported write path: merge values into the one user store
    // selected by target.
    pub fn write_user_settings(
        &self,
        section: &str,
        target: WriteTarget,
        values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        let path = match target {
            WriteTarget::Roaming => self.paths.roaming_store.as_deref(),
            WriteTarget::Local => self.paths.local_store.as_deref(),
        };
        let Some(path) = path else {
            return Err(SettingsError::StoreUnavailable(match target {
                WriteTarget::Roaming => "roaming user store",
                WriteTarget::Local => "local user store",
            }));
        };
        debug!(store = %path.display(), section, count = values.len(), "writing user settings");
        self.store.write(path, section, values)
    }

    // Framework write-back surface; not provided by this core.
    pub fn set_property_values(
        &self,
        _section: &str,
        _values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        Err(SettingsError::Unsupported("set_property_values"))
    }

    pub fn previous_version(
        &self,
        _section: &str,
        _name: &str,
    ) -> Result<ResolvedSetting, SettingsError> {
        Err(SettingsError::Unsupported("previous_version"))
    }

    pub fn reset(&self, _section: &str) -> Result<(), SettingsError> {
        Err(SettingsError::Unsupported("reset"))
    }

    pub fn upgrade(
        &self,
        _section: &str,
        _descriptors: &[SettingDescriptor],
    ) -> Result<(), SettingsError> {
        Err(SettingsError::Unsupported("upgrade"))
    }

    fn read_user_source(&self, section: &str) -> SettingsMap {
        self.read_optional(self.paths.application_config.as_deref(), section)
    }

    // Roaming first, local merged over it; local wins on key collision.
    fn read_app_source(&self, section: &str) -> SettingsMap {
        let mut map = self.read_optional(self.paths.roaming_store.as_deref(), section);
        let local = self.read_optional(self.paths.local_store.as_deref(), section);
        map.extend(local);
        map
    }

    fn read_optional(&self, path: Option<&Path>, section: &str) -> SettingsMap {
        let Some(path) = path else {
            return SettingsMap::new();
        };
        match self.store.read(path, section) {
            Ok(map) => map,
            Err(err) => {
                warn!(store = %path.display(), %err, "store read failed, treating as empty");
                SettingsMap::new()
            }
        }
    }
}

fn stored_hit(d: &SettingDescriptor, item: &StoredSetting) -> ResolvedSetting {
    ResolvedSetting {
        name: d.name.clone(),
        value: Some(item.value.clone()),
        serialize_as: item.serialize_as,
        source: ValueSource::Stored,
    }
}

// Connection strings fall back to "" when absent; scoped settings to None.
fn fallback(d: &SettingDescriptor, empty_when_absent: bool) -> ResolvedSetting {
    match &d.default_value {
        Some(def) => ResolvedSetting {
            name: d.name.clone(),
            value: Some(def.clone()),
            serialize_as: SerializeAs::String,
            source: ValueSource::Default,
        },
        None => ResolvedSetting {
            name: d.name.clone(),
            value: empty_when_absent.then(String::new),
            serialize_as: SerializeAs::String,
            source: ValueSource::Absent,
        },
    }
}
