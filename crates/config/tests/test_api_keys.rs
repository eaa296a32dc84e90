//! Tests for API key lookup and endpoint selection

use monitask_config::Config;

#[test]
fn test_api_key_none_when_empty() {
    let config = Config::default();
    assert_eq!(config.api_key_with_override(None), None);
}

#[test]
fn test_api_key_prefers_openrouter() {
    let mut config = Config::default();
    config.providers.openrouter.api_key = "openrouter".to_string();
    config.providers.openai.api_key = "openai".to_string();
    config.providers.custom.api_key = "custom".to_string();

    assert_eq!(
        config.api_key_with_override(None),
        Some("openrouter".to_string())
    );
}

#[test]
fn test_api_key_falls_back_in_order() {
    let mut config = Config::default();
    config.providers.custom.api_key = "custom".to_string();
    assert_eq!(config.api_key_with_override(None), Some("custom".to_string()));

    config.providers.openai.api_key = "openai".to_string();
    assert_eq!(config.api_key_with_override(None), Some("openai".to_string()));
}

#[test]
fn test_override_wins_over_file_keys() {
    let mut config = Config::default();
    config.providers.openrouter.api_key = "openrouter".to_string();

    assert_eq!(
        config.api_key_with_override(Some(" env-key ")),
        Some("env-key".to_string())
    );
}

#[test]
fn test_blank_override_is_ignored() {
    let mut config = Config::default();
    config.providers.openai.api_key = "openai".to_string();

    assert_eq!(
        config.api_key_with_override(Some("   ")),
        Some("openai".to_string())
    );
}

#[test]
fn test_api_base_for_openrouter_has_default() {
    let mut config = Config::default();
    config.providers.openrouter.api_key = "k".to_string();
    assert_eq!(
        config.api_base(),
        Some("https://openrouter.ai/api/v1".to_string())
    );

    config.providers.openrouter.api_base = Some("https://proxy.local/v1".into());
    assert_eq!(config.api_base(), Some("https://proxy.local/v1".to_string()));
}

#[test]
fn test_api_base_follows_active_key() {
    let mut config = Config::default();
    config.providers.openai.api_key = "k".to_string();
    config.providers.custom.api_base = Some("http://localhost:8000/v1".into());
    assert_eq!(config.api_base(), None);

    config.providers.openai.api_key.clear();
    assert_eq!(
        config.api_base(),
        Some("http://localhost:8000/v1".to_string())
    );
}

#[test]
fn test_default_model() {
    let mut config = Config::default();
    config.agent.defaults.model = "gpt-4o-mini".into();
    assert_eq!(config.default_model(), "gpt-4o-mini");
}
