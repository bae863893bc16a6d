//! Configuration loading and environment overlay tests.
//!
//! Env mutation is process-global, hence `#[serial]` and the unsafe blocks
//! (edition 2024 marks `set_var`/`remove_var` unsafe).
#![allow(unsafe_code)]

use serial_test::serial;

use mcw_infrastructure::config::{AppConfig, ConfigLoader, EmbeddingBackend, TransportMode};

fn clear_documented_env() {
    for name in [
        "HOST",
        "PORT",
        "LOG_LEVEL",
        "NAMESPACE_DEFAULT",
        "VECTOR_STORE_PATH",
        "EMBEDDING_DIM",
        "REQUEST_TIMEOUT",
        "MAX_CONCURRENT",
    ] {
        unsafe { std::env::remove_var(name) };
    }
}

fn set_env(name: &str, value: &str) {
    unsafe { std::env::set_var(name, value) };
}

#[test]
#[serial]
fn defaults_load_without_a_file() {
    clear_documented_env();
    let config = ConfigLoader::new()
        .with_config_path("/nonexistent/mcw.toml")
        .load()
        .expect("defaults");
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.server.mode, TransportMode::Combined);
    assert_eq!(config.embedding.backend, EmbeddingBackend::Hash);
}

#[test]
#[serial]
fn toml_file_overrides_defaults() {
    clear_documented_env();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mcw.toml");
    std::fs::write(
        &path,
        r#"
namespace_default = "team-a"

[server]
host = "0.0.0.0"
port = 8080
mode = "http"

[embedding]
backend = "hash"
dimensions = 128
ollama_url = "http://localhost:11434"
ollama_model = "nomic-embed-text"
"#,
    )
    .expect("write config");

    let config = ConfigLoader::new()
        .with_config_path(&path)
        .load()
        .expect("load");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.mode, TransportMode::Http);
    assert_eq!(config.namespace_default, "team-a");
    assert_eq!(config.embedding.dimensions, 128);
}

#[test]
#[serial]
fn environment_wins_over_file() {
    clear_documented_env();
    set_env("PORT", "9999");
    set_env("NAMESPACE_DEFAULT", "env-ns");
    set_env("EMBEDDING_DIM", "32");

    let config = ConfigLoader::new()
        .with_config_path("/nonexistent/mcw.toml")
        .load()
        .expect("load");
    clear_documented_env();

    assert_eq!(config.server.port, 9999);
    assert_eq!(config.namespace_default, "env-ns");
    assert_eq!(config.embedding.dimensions, 32);
}

#[test]
#[serial]
fn invalid_environment_values_fail_with_config_error() {
    clear_documented_env();
    set_env("PORT", "not-a-port");
    let result = ConfigLoader::new()
        .with_config_path("/nonexistent/mcw.toml")
        .load();
    clear_documented_env();
    let err = result.expect_err("bad PORT must fail");
    assert_eq!(err.code(), "ErrInternal");
    assert!(err.to_string().contains("PORT"));
}

#[test]
#[serial]
fn invalid_namespace_default_is_rejected() {
    clear_documented_env();
    set_env("NAMESPACE_DEFAULT", "NOT VALID");
    let result = ConfigLoader::new()
        .with_config_path("/nonexistent/mcw.toml")
        .load();
    clear_documented_env();
    assert!(result.is_err());
}
