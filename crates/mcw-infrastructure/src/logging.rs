//! Logging bootstrap.
//!
//! Installs the tracing subscriber and registers the tracing-backed sink
//! behind the domain log facade, so domain and application code log without
//! a tracing dependency.

use tracing_subscriber::EnvFilter;

use mcw_domain::infra::logging::{set_log_fn, LogLevel};

fn facade_sink(level: LogLevel, context: &str, message: &str, detail: Option<&dyn std::fmt::Display>) {
    let detail = detail.map(ToString::to_string).unwrap_or_default();
    match level {
        LogLevel::Trace => tracing::trace!(target: "mcw", context, detail = %detail, "{message}"),
        LogLevel::Debug => tracing::debug!(target: "mcw", context, detail = %detail, "{message}"),
        LogLevel::Info => tracing::info!(target: "mcw", context, detail = %detail, "{message}"),
        LogLevel::Warn => tracing::warn!(target: "mcw", context, detail = %detail, "{message}"),
        LogLevel::Error => tracing::error!(target: "mcw", context, detail = %detail, "{message}"),
    }
}

/// Install the global subscriber and the domain log facade.
///
/// `level` uses tracing env-filter syntax; `RUST_LOG` wins when set.
/// Safe to call more than once (later calls keep the first subscriber).
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    set_log_fn(facade_sink);
}
