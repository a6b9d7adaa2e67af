use crate::{SettingValue, SettingsError, SettingsMap};
use std::collections::BTreeMap;
use std::path::Path;

pub mod memory;

// Implementations open whatever handle they need per call and release it
// before returning; no handle outlives a call.
pub trait SettingsStore: Send + Sync {
    // A missing store file reads as empty; keys are "<group>.<name>".
    fn read(&self, store_file: &Path, section: &str) -> Result<SettingsMap, SettingsError>;

    // Merge: existing names update in place, new names insert, untouched
    // names are kept. Creates the file, directories, and schema as needed.
    fn write(
        &self,
        store_file: &Path,
        section: &str,
        values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError>;
}
