use crate::cli::opts::*;

use anyhow::{bail, Result};
use prefstore_core::{
    qualified_section, AppIdentity, HostInfo, PlanOptions, ResolvedSetting, SerializeAs,
    SettingDescriptor, SettingValue, SettingsResolver, SettingsStore, StorePaths, ValueSource,
    WriteTarget,
};
use prefstore_sqlite::SqliteStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

pub fn run_cli(args: Cli) -> Result<()> {
    let host = HostInfo {
        company: args.company.clone(),
        product: args.product.clone(),
        version: args.app_version.clone(),
        entry_namespace: args.namespace.clone(),
        friendly_name: None,
        single_file: false,
    };
    let identity = AppIdentity::resolve(Some(&host));

    // --config-file behaves exactly like the environment override; an empty
    // flag value is ignored the same way an empty variable is.
    let mut opts = PlanOptions::from_env();
    if let Some(cfg) = args.config_file.clone().filter(|s| !s.is_empty()) {
        opts.config_override = Some(cfg);
    }
    let paths = StorePaths::plan_with(&identity, &opts);

    let resolver = SettingsResolver::new(SqliteStore::new(), paths);
    match args.cmd.clone() {
        Command::Paths { json } => paths_cmd(&resolver, &identity, json),
        Command::Resolve(cmd) => resolve_cmd(&resolver, cmd),
        Command::Get(cmd) => get_cmd(&resolver, cmd),
        Command::Set(cmd) => set_cmd(&resolver, cmd),
        Command::List(cmd) => list_cmd(&resolver, cmd),
    }
}

fn paths_cmd(
    resolver: &SettingsResolver<SqliteStore>,
    identity: &AppIdentity,
    json: bool,
) -> Result<()> {
    let paths = resolver.paths();
    if json {
        let doc = serde_json::json!({ "identity": identity, "paths": paths });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("company\t{}", identity.company);
    println!("product\t{}", identity.product);
    println!("version\t{}", identity.version);
    println!("name-prefix\t{}", identity.name_prefix);
    println!("application-config\t{}", display_path(&paths.application_config));
    println!("roaming-store\t{}", display_path(&paths.roaming_store));
    println!("local-store\t{}", display_path(&paths.local_store));
    Ok(())
}

fn resolve_cmd(resolver: &SettingsResolver<SqliteStore>, cmd: ResolveCmd) -> Result<()> {
    let mut descriptors = Vec::new();
    for raw in &cmd.app {
        descriptors.push(parse_descriptor(raw, SettingDescriptor::application));
    }
    for raw in &cmd.user {
        descriptors.push(parse_descriptor(raw, SettingDescriptor::user));
    }
    for raw in &cmd.conn {
        descriptors.push(parse_descriptor(raw, SettingDescriptor::connection_string));
    }
    if descriptors.is_empty() {
        bail!("no descriptors given; pass --app/--user/--conn");
    }

    let section = qualified_section(&cmd.section, cmd.key.as_deref());
    debug!(%section, count = descriptors.len(), "resolving settings");
    let resolved = resolver.resolve(&section, &descriptors)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }
    for (name, r) in &resolved {
        println!(
            "{}\t{}\t{}\t{}",
            name,
            r.value.as_deref().unwrap_or("-"),
            r.serialize_as.as_str(),
            source_tag(r)
        );
    }
    Ok(())
}

fn get_cmd(resolver: &SettingsResolver<SqliteStore>, cmd: GetCmd) -> Result<()> {
    let mut descriptor = match cmd.scope {
        ScopeKind::App => SettingDescriptor::application(&cmd.name),
        ScopeKind::User => SettingDescriptor::user(&cmd.name),
    };
    if let Some(default) = &cmd.default {
        descriptor = descriptor.with_default(default.as_str());
    }

    let section = qualified_section(&cmd.section, cmd.key.as_deref());
    let resolved = resolver.resolve(&section, &[descriptor])?;
    let Some(r) = resolved.get(&cmd.name) else {
        bail!("setting `{}` was not resolved", cmd.name);
    };
    println!("{}", r.value.as_deref().unwrap_or("-"));
    Ok(())
}

fn set_cmd(resolver: &SettingsResolver<SqliteStore>, cmd: SetCmd) -> Result<()> {
    let serialize_as = to_serialize_as(&cmd.serialize_as);
    let mut values = BTreeMap::new();
    for pair in &cmd.values {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("expected NAME=VALUE, got `{pair}`");
        };
        if name.is_empty() {
            bail!("empty setting name in `{pair}`");
        }
        values.insert(
            name.to_string(),
            SettingValue {
                value: value.to_string(),
                serialize_as,
            },
        );
    }

    let section = qualified_section(&cmd.section, cmd.key.as_deref());
    match cmd.target {
        TargetKind::Roaming => {
            resolver.write_user_settings(&section, WriteTarget::Roaming, &values)?
        }
        TargetKind::Local => resolver.write_user_settings(&section, WriteTarget::Local, &values)?,
        // The application-config store has no facade write path; talk to
        // the store contract directly.
        TargetKind::Config => {
            let path = require_target(resolver, &TargetKind::Config)?;
            resolver.store().write(&path, &section, &values)?
        }
    }
    println!("ok");
    Ok(())
}

fn list_cmd(resolver: &SettingsResolver<SqliteStore>, cmd: ListCmd) -> Result<()> {
    let path = require_target(resolver, &cmd.target)?;
    let section = qualified_section(&cmd.section, cmd.key.as_deref());
    let map = resolver.store().read(&path, &section)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for (key, item) in &map {
        println!("{}\t{}\t{}", key, item.value, item.serialize_as.as_str());
    }
    Ok(())
}

fn require_target(
    resolver: &SettingsResolver<SqliteStore>,
    target: &TargetKind,
) -> Result<PathBuf> {
    let (path, label) = match target {
        TargetKind::Roaming => (&resolver.paths().roaming_store, "roaming"),
        TargetKind::Local => (&resolver.paths().local_store, "local"),
        TargetKind::Config => (&resolver.paths().application_config, "application-config"),
    };
    match path {
        Some(p) => Ok(p.clone()),
        None => bail!("{label} store is not planned for this identity"),
    }
}

fn parse_descriptor(raw: &str, make: fn(String) -> SettingDescriptor) -> SettingDescriptor {
    match raw.split_once('=') {
        Some((name, default)) => make(name.to_string()).with_default(default),
        None => make(raw.to_string()),
    }
}

fn to_serialize_as(kind: &SerializeKind) -> SerializeAs {
    match kind {
        SerializeKind::String => SerializeAs::String,
        SerializeKind::Xml => SerializeAs::Xml,
        SerializeKind::Binary => SerializeAs::Binary,
        SerializeKind::ProviderSpecific => SerializeAs::ProviderSpecific,
    }
}

fn source_tag(r: &ResolvedSetting) -> &'static str {
    match r.source {
        ValueSource::Stored => "stored",
        ValueSource::Default => "default",
        ValueSource::Absent => "absent",
    }
}

fn display_path(p: &Option<PathBuf>) -> String {
    match p {
        Some(p) => p.display().to_string(),
        None => "-".to_string(),
    }
}
