use bundlemap::Settings;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_env_overrides_file_and_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    fs::write(
        &config_path,
        r#"
[watcher]
quiescence_delay_ms = 250
queue_capacity = 64
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nesting levels
        env::set_var("BM_WATCHER__QUIESCENCE_DELAY_MS", "42");
        env::set_var("BM_LOGGING__DEFAULT", "debug");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("BM_WATCHER__QUIESCENCE_DELAY_MS");
        env::remove_var("BM_LOGGING__DEFAULT");
    }

    assert_eq!(settings.watcher.quiescence_delay_ms, 42);
    assert_eq!(settings.watcher.queue_capacity, 64);
    assert_eq!(settings.watcher.poll_interval_ms, 100);
    assert_eq!(settings.logging.default, "debug");
}
