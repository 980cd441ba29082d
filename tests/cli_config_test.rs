use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bundlemap(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bundlemap"))
        .args(args)
        .current_dir(dir)
        .env_remove("BUNDLEMAP_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run bundlemap")
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = bundlemap(temp_dir.path(), &["init"]);
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".bundlemap/settings.toml");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[[bundles]]"));
    assert!(content.contains("/bundles/app.js"));

    // A second init refuses to overwrite
    let output = bundlemap(temp_dir.path(), &["init"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"), "stderr: {stderr}");

    let output = bundlemap(temp_dir.path(), &["init", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_resolve_command_prints_json() {
    let temp_dir = TempDir::new().unwrap();
    assert!(bundlemap(temp_dir.path(), &["init"]).status.success());

    fs::create_dir_all(temp_dir.path().join("js/lib")).unwrap();
    fs::write(temp_dir.path().join("js/app.js"), "app").unwrap();
    fs::write(temp_dir.path().join("js/lib/util.js"), "util").unwrap();

    let output = bundlemap(temp_dir.path(), &["resolve", "--json"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let bundle = &json[0];
    assert_eq!(bundle["name"], "/bundles/app.js");
    let items: Vec<&str> = bundle["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["path"].as_str().unwrap())
        .collect();
    assert_eq!(items, vec!["/js/app.js", "/js/lib/util.js"]);
}

#[test]
fn test_unknown_bundle_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(bundlemap(temp_dir.path(), &["init"]).status.success());
    fs::create_dir_all(temp_dir.path().join("js")).unwrap();

    let output = bundlemap(temp_dir.path(), &["variants", "/bundles/missing.js"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown bundle"));
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(
        &config_path,
        r#"
[watcher]
quiescence_delay_ms = 250
"#,
    )
    .unwrap();

    let output = bundlemap(
        temp_dir.path(),
        &["--config", config_path.to_str().unwrap(), "config"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("quiescence_delay_ms = 250"));
}
