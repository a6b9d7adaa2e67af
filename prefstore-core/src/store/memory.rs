use crate::{setting_key, SettingValue, SettingsError, SettingsMap, StoredSetting};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

type Section = BTreeMap<String, SettingValue>;
type StoreFile = HashMap<String, Section>;

// Same observable contract as the embedded store; a "file" exists once
// anything has been written to its path.
#[derive(Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<PathBuf, StoreFile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Test seam: seed one value without going through write.
    pub fn seed(
        &self,
        store_file: impl Into<PathBuf>,
        section: &str,
        name: &str,
        value: SettingValue,
    ) {
        let mut files = self.files.write();
        files
            .entry(store_file.into())
            .or_default()
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }
}

impl crate::store::SettingsStore for MemoryStore {
    fn read(&self, store_file: &Path, section: &str) -> Result<SettingsMap, SettingsError> {
        let files = self.files.read();
        let mut out = SettingsMap::new();
        let Some(file) = files.get(store_file) else {
            return Ok(out);
        };
        if let Some(values) = file.get(section) {
            for (name, v) in values {
                out.insert(
                    setting_key(section, name),
                    StoredSetting {
                        group: section.to_string(),
                        name: name.clone(),
                        value: v.value.clone(),
                        serialize_as: v.serialize_as,
                    },
                );
            }
        }
        Ok(out)
    }

    fn write(
        &self,
        store_file: &Path,
        section: &str,
        values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        let mut files = self.files.write();
        let current = files
            .entry(store_file.to_path_buf())
            .or_default()
            .entry(section.to_string())
            .or_default();
        for (name, v) in values {
            current.insert(name.clone(), v.clone());
        }
        Ok(())
    }
}
