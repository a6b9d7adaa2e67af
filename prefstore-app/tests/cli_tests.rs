use std::process::Command;

fn prefstore() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prefstore-app"));
    cmd.env_remove("PREFSTORE_CONFIG_FILE");
    cmd
}

fn paths_line<'a>(stdout: &'a str, key: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix(key).and_then(|l| l.strip_prefix('\t')))
        .unwrap_or_else(|| panic!("missing {key} line in:\n{stdout}"))
}

#[test]
fn empty_config_file_flag_is_ignored() {
    let out = prefstore()
        .args(["--company", "Acme", "--product", "Paint", "--config-file", "", "paths"])
        .output()
        .unwrap();
    assert!(out.status.success());

    // Falls through to the exe-derived store instead of an empty override.
    let stdout = String::from_utf8(out.stdout).unwrap();
    let config = paths_line(&stdout, "application-config");
    assert!(config.ends_with(".db"), "got {config}");
}

#[test]
fn absolute_config_file_flag_is_used_verbatim() {
    let target = std::env::temp_dir().join("prefstore-cli-test.db");
    let out = prefstore()
        .args([
            "--company",
            "Acme",
            "--product",
            "Paint",
            "--config-file",
            target.to_str().unwrap(),
            "paths",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(
        paths_line(&stdout, "application-config"),
        target.to_str().unwrap()
    );
}
