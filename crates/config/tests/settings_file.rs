use ledgerbridge_config::{ConfigError, Settings};
use ledgerbridge_journal::FetchMode;

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.toml");

    let settings = Settings {
        connection_key: "netsuite-sandbox".into(),
        fetch_mode: FetchMode::Concurrent,
        max_pages_per_account: 5,
        ..Settings::default()
    };
    settings.save_to(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("connection_key = \"netsuite-sandbox\""));
    assert!(written.contains("fetch_mode = \"concurrent\""));

    assert_eq!(Settings::load_from(&path).unwrap(), settings);
}

#[test]
fn invalid_settings_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");

    let settings = Settings { page_size: 0, ..Settings::default() };
    assert!(matches!(settings.save_to(&path), Err(ConfigError::Validation(_))));
    assert!(!path.exists());
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "page_size = \"ten\"").unwrap();

    let err = Settings::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("invalid settings file"));
}
