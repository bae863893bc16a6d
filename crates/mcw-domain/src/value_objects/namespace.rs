//! Validated tenant namespace.
//!
//! All entities live inside exactly one namespace; no cross-namespace
//! reference is legal anywhere in the system.

use serde::{Deserialize, Serialize};

use crate::constants::NAMESPACE_MAX_CHARS;
use crate::error::{Error, Result};

/// The namespace every session is bound to when no intent is presented.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Isolation boundary for all stored entities.
///
/// A namespace is 1-64 characters of `[a-z0-9_-]`. Construction validates;
/// once built the value is immutable.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Parse and validate a namespace name.
    ///
    /// # Errors
    ///
    /// Returns `ErrValidation` when the name is empty, longer than 64
    /// characters, or contains anything outside `[a-z0-9_-]`.
    pub fn parse<S: AsRef<str>>(name: S) -> Result<Self> {
        let name = name.as_ref();
        if name.is_empty() || name.len() > NAMESPACE_MAX_CHARS {
            return Err(Error::validation(format!(
                "namespace must be 1-{NAMESPACE_MAX_CHARS} characters, got {}",
                name.len()
            )));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
        {
            return Err(Error::validation(format!(
                "namespace '{name}' may only contain [a-z0-9_-]"
            )));
        }
        Ok(Self(name.to_owned()))
    }

    /// The namespace name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_owned())
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
