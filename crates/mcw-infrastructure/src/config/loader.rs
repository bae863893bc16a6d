//! Configuration loader.
//!
//! Resolution order: built-in defaults, then an optional `mcw.toml` file,
//! then the documented environment variables (`HOST`, `PORT`, `LOG_LEVEL`,
//! `NAMESPACE_DEFAULT`, `VECTOR_STORE_PATH`, `EMBEDDING_DIM`,
//! `REQUEST_TIMEOUT`, `MAX_CONCURRENT`). Unknown environment names are
//! ignored.

use std::path::{Path, PathBuf};

use figment::providers::{Format, Serialized, Toml};
use figment::Figment;

use mcw_domain::error::{Error, Result};

use crate::config::{validate_config, AppConfig};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "mcw.toml";

/// Configuration loader service.
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Optional explicit config file path (overrides the default lookup)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader using the default file lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration file path.
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load and overlay the environment without validating.
    ///
    /// Used by `tools validate-config`, which wants every violation rather
    /// than the first.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file fails to parse or an
    /// environment value does not parse.
    pub fn load_unvalidated(&self) -> Result<AppConfig> {
        let file = self
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(file));
        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to load configuration: {e}")))?;
        Self::apply_env(&mut config)?;
        Ok(config)
    }

    /// Load, overlay the environment, and validate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file fails to parse or a
    /// value fails validation.
    pub fn load(&self) -> Result<AppConfig> {
        let config = self.load_unvalidated()?;
        let violations = validate_config(&config);
        if let Some(first) = violations.first() {
            return Err(Error::config(first.clone()));
        }
        Ok(config)
    }

    /// Overlay the documented environment variables onto a configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a variable is present but does
    /// not parse.
    pub fn apply_env(config: &mut AppConfig) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| Error::config(format!("PORT is not a port number: {e}")))?;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(namespace) = std::env::var("NAMESPACE_DEFAULT") {
            config.namespace_default = namespace;
        }
        if let Ok(path) = std::env::var("VECTOR_STORE_PATH") {
            config.vector_store_path = PathBuf::from(path);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            config.embedding.dimensions = dim
                .parse()
                .map_err(|e| Error::config(format!("EMBEDDING_DIM is not a number: {e}")))?;
        }
        if let Ok(timeout) = std::env::var("REQUEST_TIMEOUT") {
            config.request_timeout_secs = timeout
                .parse()
                .map_err(|e| Error::config(format!("REQUEST_TIMEOUT is not a number: {e}")))?;
        }
        if let Ok(max) = std::env::var("MAX_CONCURRENT") {
            config.max_concurrent = max
                .parse()
                .map_err(|e| Error::config(format!("MAX_CONCURRENT is not a number: {e}")))?;
        }
        Ok(())
    }
}
