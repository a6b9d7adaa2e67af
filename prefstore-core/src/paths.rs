use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::identity::AppIdentity;

pub const USER_STORE_FILENAME: &str = "userSettings.db";

// Appended to the application path (or override base) to form the
// application-config store path.
pub const STORE_EXTENSION: &str = ".db";

// Companion file synthesized next to single-binary executables.
pub const SINGLE_FILE_COMPANION_EXT: &str = "dll";

// Used when neither a friendly name nor a product name survives sanitization.
pub const UNNAMED_APP: &str = "UnNameApp";

pub const CONFIG_FILE_ENV: &str = "PREFSTORE_CONFIG_FILE";

// None always means "store unavailable", handled by reading nothing or
// refusing writes, never by erroring during planning.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorePaths {
    pub application_config: Option<PathBuf>,
    pub roaming_directory: Option<PathBuf>,
    pub roaming_store: Option<PathBuf>,
    pub local_directory: Option<PathBuf>,
    pub local_store: Option<PathBuf>,
}

// Tests inject all three; plan() fills them from the environment.
#[derive(Clone, Debug, Default)]
pub struct PlanOptions {
    pub config_override: Option<String>,
    pub roaming_base: Option<PathBuf>,
    pub local_base: Option<PathBuf>,
}

impl PlanOptions {
    pub fn from_env() -> Self {
        let dirs = BaseDirs::new();
        Self {
            config_override: std::env::var(CONFIG_FILE_ENV)
                .ok()
                .filter(|s| !s.is_empty()),
            roaming_base: dirs.as_ref().map(|d| d.data_dir().to_path_buf()),
            local_base: dirs.as_ref().map(|d| d.data_local_dir().to_path_buf()),
        }
    }
}

impl StorePaths {
    pub fn plan(identity: &AppIdentity) -> StorePaths {
        Self::plan_with(identity, &PlanOptions::from_env())
    }

    pub fn plan_with(identity: &AppIdentity, opts: &PlanOptions) -> StorePaths {
        let mut paths = StorePaths {
            application_config: match opts.config_override.as_deref() {
                Some(raw) => resolve_override(raw, identity),
                None => derive_application_config(identity),
            },
            ..StorePaths::default()
        };

        // Remote-hosted configuration has no local user stores.
        if let Some(cfg) = &paths.application_config {
            if is_http_uri(&cfg.to_string_lossy()) {
                debug!(config = %cfg.display(), "application config is remote, skipping user stores");
                return paths;
            }
        }

        if let Some(suffix) = directory_suffix(identity) {
            if let Some(dir) = combine_if_absolute(opts.roaming_base.as_deref(), &suffix) {
                paths.roaming_store = Some(dir.join(USER_STORE_FILENAME));
                paths.roaming_directory = Some(dir);
            }
            if let Some(dir) = combine_if_absolute(opts.local_base.as_deref(), &suffix) {
                paths.local_store = Some(dir.join(USER_STORE_FILENAME));
                paths.local_directory = Some(dir);
            }
        }

        debug!(
            config = ?paths.application_config,
            roaming = ?paths.roaming_store,
            local = ?paths.local_store,
            "planned store paths"
        );
        paths
    }
}

// company/name-prefix/version. An empty company or prefix poisons the whole
// suffix; an empty version is merely dropped.
fn directory_suffix(identity: &AppIdentity) -> Option<PathBuf> {
    let part1 = identity.company.as_str();
    let part2 = if identity.name_prefix.is_empty() {
        UNNAMED_APP
    } else {
        identity.name_prefix.as_str()
    };
    let part3 = identity.version.as_str();

    if part1.is_empty() || part2.is_empty() {
        return None;
    }
    let mut suffix = PathBuf::from(part1);
    suffix.push(part2);
    if !part3.is_empty() {
        suffix.push(part3);
    }
    Some(suffix)
}

fn combine_if_absolute(base: Option<&Path>, suffix: &Path) -> Option<PathBuf> {
    let base = base?;
    if base.is_absolute() {
        Some(base.join(suffix))
    } else {
        None
    }
}

fn resolve_override(raw: &str, identity: &AppIdentity) -> Option<PathBuf> {
    if let Some(rest) = strip_prefix_ignore_ascii_case(raw, "file://") {
        let candidate = PathBuf::from(rest);
        return candidate.is_absolute().then_some(candidate);
    }
    // Any other scheme is unusable as a local store path.
    if raw.contains("://") {
        return None;
    }

    let candidate = PathBuf::from(raw);
    if candidate.is_absolute() {
        return Some(candidate);
    }

    let base = identity
        .application_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    Some(base.join(candidate))
}

// The store extension lands on the full file name ("app.exe" becomes
// "app.exe.db"); single-file deployments get the companion path first.
fn derive_application_config(identity: &AppIdentity) -> Option<PathBuf> {
    let exe = identity.application_path.as_deref()?;
    let base = if identity.single_file {
        companion_path(exe)
    } else {
        exe.to_path_buf()
    };
    Some(append_extension(&base, STORE_EXTENSION))
}

fn companion_path(exe: &Path) -> PathBuf {
    if cfg!(windows) {
        exe.with_extension(SINGLE_FILE_COMPANION_EXT)
    } else {
        append_extension(exe, &format!(".{SINGLE_FILE_COMPANION_EXT}"))
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(ext);
    PathBuf::from(os)
}

pub fn is_http_uri(s: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|p| strip_prefix_ignore_ascii_case(s, p).is_some())
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}
