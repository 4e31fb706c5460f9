//! Config loading and defaults integration tests

use std::path::PathBuf;

use cartpath::Config;

#[test]
fn test_empty_config_uses_defaults() {
    let config = Config::parse("").expect("empty TOML is valid");

    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.api.api_key.is_none());
    assert_eq!(config.storage.data_dir, PathBuf::from(".cartpath"));
    assert!(config.session.user_id.is_none());
}

#[test]
fn test_config_with_all_fields() {
    let toml_str = r#"
[api]
base_url = "https://api.cartpath.example"
api_key = "secret123"
timeout_secs = 10

[storage]
data_dir = "/var/lib/cartpath"

[session]
user_id = "u-42"
"#;

    let config = Config::parse(toml_str).expect("valid TOML");

    assert_eq!(config.api.base_url, "https://api.cartpath.example");
    assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/cartpath"));
    assert_eq!(config.session.user_id.as_deref(), Some("u-42"));

    let api = config.api_config();
    assert_eq!(api.api_key.as_deref(), Some("secret123"));
    assert_eq!(api.timeout_secs, 10);
}

#[test]
fn test_partial_section_fills_defaults() {
    let config = Config::parse("[api]\napi_key = \"k\"\n").expect("valid TOML");

    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.api.api_key.as_deref(), Some("k"));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.api.timeout_secs, 30);
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cartpath.toml");
    std::fs::write(&path, "[session]\nuser_id = \"family\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.session.user_id.as_deref(), Some("family"));
}

#[test]
fn test_invalid_toml_is_an_error() {
    assert!(Config::parse("[api\nbase_url = ").is_err());
}
