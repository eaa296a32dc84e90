//! Tests for Config serialization and file round trips

use monitask_config::{Config, ConfigError, ProviderConfig};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.agent.defaults.model, "anthropic/claude-sonnet-4");
    assert_eq!(config.agent.defaults.max_tokens, 4096);
    assert_eq!(config.agent.defaults.temperature, 0.7);
    assert_eq!(config.agent.defaults.max_rounds, 8);

    assert!(config.providers.openrouter.api_key.is_empty());
    assert!(config.providers.openai.api_base.is_none());
    assert!(config.providers.custom.api_base.is_none());

    assert!(!config.session.persist);
}

#[test]
fn test_empty_json_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_json_field_names() {
    let mut config = Config::default();
    config.providers.custom = ProviderConfig {
        api_key: "k".into(),
        api_base: Some("http://localhost:8000/v1".into()),
    };
    config.session.persist = true;

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["agent"]["defaults"]["max_rounds"], 8);
    assert_eq!(json["providers"]["custom"]["api_base"], "http://localhost:8000/v1");
    assert_eq!(json["session"]["persist"], true);
    // Unset optional fields are omitted
    assert!(json["providers"]["openai"].get("api_base").is_none());
    assert!(json["session"].get("dir").is_none());
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.agent.defaults.model = "gpt-4o".into();
    config.agent.defaults.max_rounds = 3;
    config.providers.openai.api_key = "sk-test".into();
    config.session.persist = true;
    config.session.dir = Some("/tmp/sessions".into());

    config.save_to(&path).await.unwrap();
    assert!(path.exists());

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_load_missing_file_yields_defaults() {
    let dir = temp_dir();
    let loaded = Config::load_from(&dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(loaded, Config::default());
}

#[tokio::test]
async fn test_load_invalid_json_fails() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{not json").await.unwrap();

    let err = Config::load_from(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[tokio::test]
async fn test_load_partial_file_fills_defaults() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    tokio::fs::write(
        &path,
        r#"{"providers": {"openrouter": {"api_key": "or-key"}}, "session": {"persist": true}}"#,
    )
    .await
    .unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.providers.openrouter.api_key, "or-key");
    assert!(loaded.session.persist);
    assert_eq!(loaded.agent.defaults.max_rounds, 8);
}
