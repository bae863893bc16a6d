//! Configuration validation.

use mcw_domain::value_objects::Namespace;

use crate::config::AppConfig;

/// Every violation in a configuration, with field paths. Empty means valid.
#[must_use]
pub fn validate_config(config: &AppConfig) -> Vec<String> {
    let mut violations = Vec::new();
    if config.server.host.is_empty() {
        violations.push("server.host: must not be empty".to_owned());
    }
    if config.server.port == 0 {
        violations.push("server.port: must not be 0".to_owned());
    }
    if let Err(e) = Namespace::parse(&config.namespace_default) {
        violations.push(format!("namespace_default: {e}"));
    }
    if config.embedding.dimensions == 0 {
        violations.push("embedding.dimensions: must be positive".to_owned());
    }
    if config.request_timeout_secs == 0 {
        violations.push("request_timeout_secs: must be positive".to_owned());
    }
    if config.max_concurrent == 0 {
        violations.push("max_concurrent: must be positive".to_owned());
    }
    if config.vector_store_path.as_os_str().is_empty() {
        violations.push("vector_store_path: must not be empty".to_owned());
    }
    violations
}
