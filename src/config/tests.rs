use super::*;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    config.validate().expect("default config should validate");
}

#[test]
fn load_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.retrieval, RetrievalConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_then_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.server.rate_limit_per_minute = 10;
    config.server.cache_capacity = 5;
    config.retrieval.max_context_length = 500;
    config.embedding.local.host = "embed-host".to_string();

    config.save().expect("save should succeed");

    let loaded = Config::load(temp_dir.path()).expect("load should succeed");
    assert_eq!(loaded.server.rate_limit_per_minute, 10);
    assert_eq!(loaded.server.cache_capacity, 5);
    assert_eq!(loaded.retrieval.max_context_length, 500);
    assert_eq!(loaded.embedding.local.host, "embed-host");
}

#[test]
fn partial_toml_fills_defaults() {
    let partial_toml = r#"
        [server]
        max_concurrent_requests = 4

        [embedding.local]
        port = 12345
    "#;

    let config: Config = toml::from_str(partial_toml).expect("should parse toml successfully");
    assert_eq!(config.server.max_concurrent_requests, 4);
    assert_eq!(config.server.rate_limit_per_minute, 60);
    assert_eq!(config.embedding.local.port, 12345);
    assert_eq!(config.embedding.local.host, "localhost");
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [server
        rate_limit_per_minute = "not a number"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn zero_rate_limit_rejected() {
    let mut config = Config::default();
    config.server.rate_limit_per_minute = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidRateLimit(0))
    ));
}

#[test]
fn zero_concurrency_rejected() {
    let mut config = Config::default();
    config.server.max_concurrent_requests = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidConcurrency(0))
    ));
}

#[test]
fn disabled_remote_skips_url_validation() {
    let config = Config::default();
    assert!(config.embedding.remote.api_url.is_empty());
    config
        .validate()
        .expect("disabled remote tier should not require a URL");
}

#[test]
fn enabled_remote_requires_valid_url() {
    let mut config = Config::default();
    config.embedding.remote.enabled = true;
    config.embedding.remote.api_url = "not a url".to_string();

    assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
}

#[test]
fn min_score_out_of_range_rejected() {
    let mut config = Config::default();
    config.retrieval.min_score = 1.5;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidMinScore(_))
    ));
}

#[test]
fn local_endpoint_url() {
    let local = LocalEmbeddingConfig::default();
    let url = local.endpoint_url().expect("default endpoint should parse");
    assert_eq!(url.host_str(), Some("localhost"));
    assert_eq!(url.port(), Some(11434));
}

#[test]
fn knowledge_base_path_under_base_dir() {
    let config = Config {
        base_dir: std::path::PathBuf::from("/tmp/pg-test"),
        ..Config::default()
    };
    assert_eq!(
        config.knowledge_base_path(),
        std::path::PathBuf::from("/tmp/pg-test/knowledge_base")
    );
}
