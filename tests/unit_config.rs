use std::fs;
use std::path::PathBuf;

use tickler::config::{Config, CONFIG_FILE_NAME};

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.store.file, PathBuf::from("tasks.json"));
    assert_eq!(config.schedule.buffer_days, 10);
    assert_eq!(config.schedule.due_soon_days, 7);
    assert_eq!(config.submission.min_lead_days, 2);
    assert_eq!(config.store.lock_timeout_ms, 5000);
    assert!(config.companies.is_empty());
    assert_eq!(config.store_path(dir.path()), dir.path().join("tasks.json"));
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let toml = r#"
[store]
file = "data/deadlines.json"

[schedule]
buffer_days = 14
due_soon_days = 3

[submission]
min_lead_days = 3

[[companies]]
index = 1
name = "Acme Corp"

[[companies]]
index = 2
name = "Harbor LLC"
"#;
    fs::write(dir.path().join(CONFIG_FILE_NAME), toml)?;

    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.schedule.buffer_days, 14);
    assert_eq!(config.schedule.due_soon_days, 3);
    assert_eq!(config.submission.min_lead_days, 3);
    assert_eq!(config.companies.len(), 2);
    assert_eq!(config.companies[1].name, "Harbor LLC");
    assert_eq!(
        config.store_path(dir.path()),
        dir.path().join("data").join("deadlines.json")
    );

    Ok(())
}

#[test]
fn invalid_toml_fails_explicit_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[schedule\nbuffer_days = ")?;

    assert!(Config::load(&path).is_err());
    assert_eq!(Config::load_from_dir(dir.path()).schedule.buffer_days, 10);
    Ok(())
}

#[test]
fn invalid_values_fall_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "[[companies]]\nindex = 1\nname = \"A\"\n\n[[companies]]\nindex = 1\nname = \"B\"\n",
    )?;

    let err = Config::load(&path).expect_err("duplicate index");
    assert!(err.to_string().contains("duplicate index 1"));
    assert!(Config::load_from_dir(dir.path()).companies.is_empty());
    Ok(())
}

#[test]
fn lock_timeout_reads_from_store_section() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[store]\nlock_timeout_ms = 250\n")?;

    let config = Config::load(&path)?;
    assert_eq!(config.store.lock_timeout_ms, 250);
    assert_eq!(config.store.file, PathBuf::from("tasks.json"));
    Ok(())
}
