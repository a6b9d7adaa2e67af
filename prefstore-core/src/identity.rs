use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Applies to company and name-prefix segments; versions are never truncated.
pub const MAX_SEGMENT_LEN: usize = 25;

pub const FALLBACK_VERSION: &str = "1.0.0.0";

// What the host process declares about itself; missing fields are derived
// from the process image.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HostInfo {
    pub company: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    // Dot-separated entry-point namespace, e.g. "Acme.Paint".
    pub entry_namespace: Option<String>,
    // Defaults to the executable file stem.
    pub friendly_name: Option<String>,
    pub single_file: bool,
}

// Computed once at startup and passed by reference; all fields path-safe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppIdentity {
    pub company: String,
    pub product: String,
    pub version: String,
    // Friendly name else product name; may be empty.
    pub name_prefix: String,
    pub has_entry_point: bool,
    pub single_file: bool,
    pub application_path: Option<PathBuf>,
}

impl AppIdentity {
    pub fn resolve(host: Option<&HostInfo>) -> Self {
        Self::resolve_with_exe(host, std::env::current_exe().ok())
    }

    pub fn resolve_with_exe(host: Option<&HostInfo>, exe: Option<PathBuf>) -> Self {
        let single_file = host.map(|h| h.single_file).unwrap_or(false);

        let declared_company = host.and_then(|h| trimmed(h.company.as_deref()));
        let declared_product = host.and_then(|h| trimmed(h.product.as_deref()));
        let declared_version = host.and_then(|h| trimmed(h.version.as_deref()));
        let namespace = host.and_then(|h| trimmed(h.entry_namespace.as_deref()));

        let exe_stem = exe
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().trim().to_string())
            .filter(|s| !s.is_empty());

        let product = declared_product
            .or_else(|| namespace.as_deref().map(namespace_last_segment))
            .or(exe_stem.clone())
            .unwrap_or_default();

        // A namespace like ".Acme" has an empty first segment; fall through
        // to the product name rather than keep it.
        let company = declared_company
            .or_else(|| {
                namespace
                    .as_deref()
                    .map(namespace_first_segment)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| product.clone());

        let version = declared_version.unwrap_or_else(|| FALLBACK_VERSION.to_string());

        let friendly = host
            .and_then(|h| trimmed(h.friendly_name.as_deref()))
            .or(exe_stem);
        let mut name_prefix = friendly
            .map(|f| sanitize_segment(&f, true))
            .unwrap_or_default();
        if name_prefix.is_empty() {
            name_prefix = sanitize_segment(&product, true);
        }

        AppIdentity {
            company: sanitize_segment(&company, true),
            product: sanitize_segment(&product, false),
            version: sanitize_segment(&version, false),
            name_prefix,
            has_entry_point: host.is_some(),
            single_file,
            application_path: exe,
        }
    }
}

fn trimmed(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn namespace_last_segment(ns: &str) -> String {
    match ns.rfind('.') {
        Some(pos) if pos + 1 < ns.len() => ns[pos + 1..].trim().to_string(),
        _ => ns.trim().to_string(),
    }
}

fn namespace_first_segment(ns: &str) -> String {
    match ns.find('.') {
        Some(pos) => ns[..pos].trim().to_string(),
        None => ns.trim().to_string(),
    }
}

// Illegal filename characters and spaces become '_'; capped at
// MAX_SEGMENT_LEN when limit is set.
pub fn sanitize_segment(s: &str, limit: bool) -> String {
    let replaced: String = s
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' => '_',
            c if c.is_ascii_control() => '_',
            c => c,
        })
        .collect();

    if limit {
        replaced.chars().take(MAX_SEGMENT_LEN).collect()
    } else {
        replaced
    }
}
