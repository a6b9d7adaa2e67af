use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting `{0}` declares both application and user scope")]
    ConflictingScope(String),
    #[error("setting `{0}` declares neither application nor user scope")]
    MissingScope(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("store unavailable: {0}")]
    StoreUnavailable(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
}
