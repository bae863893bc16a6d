//! Infrastructure-facing seams that live in the domain crate.

/// Log facade registration point
pub mod logging;
