use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettingScope {
    Application,
    User,
}

// Stored as a text tag; the store never interprets the value text.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SerializeAs {
    #[default]
    String,
    Xml,
    Binary,
    ProviderSpecific,
}

impl SerializeAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializeAs::String => "String",
            SerializeAs::Xml => "Xml",
            SerializeAs::Binary => "Binary",
            SerializeAs::ProviderSpecific => "ProviderSpecific",
        }
    }

    // Canonical names or their numeric forms; anything else reads as String.
    pub fn parse_tag(tag: &str) -> SerializeAs {
        match tag.trim() {
            "String" | "0" => SerializeAs::String,
            "Xml" | "1" => SerializeAs::Xml,
            "Binary" | "2" => SerializeAs::Binary,
            "ProviderSpecific" | "3" => SerializeAs::ProviderSpecific,
            _ => SerializeAs::String,
        }
    }
}

// Scope flags mirror the caller's declaration verbatim; validity is
// checked at resolve time, not at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub name: String,
    pub application_scoped: bool,
    pub user_scoped: bool,
    pub default_value: Option<String>,
    pub connection_string: bool,
}

impl SettingDescriptor {
    pub fn application(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_scoped: true,
            user_scoped: false,
            default_value: None,
            connection_string: false,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_scoped: false,
            user_scoped: true,
            default_value: None,
            connection_string: false,
        }
    }

    // Connection-string settings bypass scope selection; the flags stay unset.
    pub fn connection_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_scoped: false,
            user_scoped: false,
            default_value: None,
            connection_string: true,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn scope(&self) -> Result<SettingScope, crate::SettingsError> {
        match (self.application_scoped, self.user_scoped) {
            (true, false) => Ok(SettingScope::Application),
            (false, true) => Ok(SettingScope::User),
            (true, true) => Err(crate::SettingsError::ConflictingScope(self.name.clone())),
            (false, false) => Err(crate::SettingsError::MissingScope(self.name.clone())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSetting {
    pub group: String,
    pub name: String,
    pub value: String,
    pub serialize_as: SerializeAs,
}

// Write payload for one setting, keyed by bare name in the batch map.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingValue {
    pub value: String,
    pub serialize_as: SerializeAs,
}

impl SettingValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            serialize_as: SerializeAs::String,
        }
    }
}

// One section of one store file, keyed "<group>.<name>".
pub type SettingsMap = BTreeMap<String, StoredSetting>;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Stored,
    Default,
    Absent,
}

// value is None only when the setting was absent from its source and
// carried no default.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedSetting {
    pub name: String,
    pub value: Option<String>,
    pub serialize_as: SerializeAs,
    pub source: ValueSource,
}

pub fn setting_key(section: &str, name: &str) -> String {
    format!("{section}.{name}")
}

// Group name, qualified by the per-instance settings key when one is present.
pub fn qualified_section(group: &str, key: Option<&str>) -> String {
    match key {
        Some(k) if !k.is_empty() => format!("{group}.{k}"),
        _ => group.to_string(),
    }
}
