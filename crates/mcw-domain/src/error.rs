//! Error handling types.
//!
//! Every variant carries a stable wire code (`ErrNotFound`, `ErrValidation`,
//! ...) surfaced to clients via [`Error::code`]. Human messages never leak
//! internal details beyond what the variant explicitly carries.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the work-management service
#[derive(Error, Debug)]
pub enum Error {
    /// Target entity absent
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Argument fails schema or domain validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated rule
        message: String,
    },

    /// Parent/child type combination forbidden by the hierarchy table
    #[error("Hierarchy violation: {message}")]
    Hierarchy {
        /// Description of the forbidden edge
        message: String,
    },

    /// Reparent would create a cycle
    #[error("Cycle detected: {message}")]
    Cycle {
        /// Description of the offending link
        message: String,
    },

    /// Reorder id set does not match the current sibling set
    #[error("Reorder set mismatch: {message}")]
    OrderSet {
        /// Description of the mismatch
        message: String,
    },

    /// Attempt to set a derived attribute directly
    #[error("Derived attribute: {message}")]
    Derived {
        /// Description of the derived attribute
        message: String,
    },

    /// Namespace mismatch or attempt to change after binding
    #[error("Namespace binding violation: {message}")]
    NamespaceBinding {
        /// Description of the violation
        message: String,
    },

    /// Concurrent mutation lost a race (callers may retry)
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting mutation
        message: String,
    },

    /// Deadline exceeded
    #[error("Timeout: {message}")]
    Timeout {
        /// Description of the timed-out operation
        message: String,
    },

    /// Framing or JSON-RPC error
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// Vector store operation error
    #[error("Store error: {message}")]
    Store {
        /// Description of the store error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding provider operation error
    #[error("Embedding provider error: {message}")]
    Embedding {
        /// Description of the embedding error
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Unexpected internal error; logged with a correlation id upstream
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl Error {
    /// Stable wire code for the error taxonomy.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ErrNotFound",
            Self::Validation { .. } => "ErrValidation",
            Self::Hierarchy { .. } => "ErrHierarchy",
            Self::Cycle { .. } => "ErrCycle",
            Self::OrderSet { .. } => "ErrOrderSet",
            Self::Derived { .. } => "ErrDerived",
            Self::NamespaceBinding { .. } => "ErrNamespaceBinding",
            Self::Conflict { .. } => "ErrConflict",
            Self::Timeout { .. } => "ErrTimeout",
            Self::Transport { .. } => "ErrTransport",
            Self::Store { .. }
            | Self::Embedding { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Json { .. }
            | Self::Internal { .. } => "ErrInternal",
        }
    }

    /// True when a client retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Timeout { .. })
    }
}

// Error creation methods
impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a hierarchy violation error
    pub fn hierarchy<S: Into<String>>(message: S) -> Self {
        Self::Hierarchy {
            message: message.into(),
        }
    }

    /// Create a cycle error
    pub fn cycle<S: Into<String>>(message: S) -> Self {
        Self::Cycle {
            message: message.into(),
        }
    }

    /// Create a reorder set mismatch error
    pub fn order_set<S: Into<String>>(message: S) -> Self {
        Self::OrderSet {
            message: message.into(),
        }
    }

    /// Create a derived attribute error
    pub fn derived<S: Into<String>>(message: S) -> Self {
        Self::Derived {
            message: message.into(),
        }
    }

    /// Create a namespace binding error
    pub fn namespace_binding<S: Into<String>>(message: S) -> Self {
        Self::NamespaceBinding {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with source
    pub fn store_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an embedding provider error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
