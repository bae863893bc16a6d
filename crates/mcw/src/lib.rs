//! # mcw
//!
//! Work-management MCP server: a hierarchy of work items with automatic
//! progress propagation, vector-indexed retrieval, reusable architecture
//! and troubleshoot memories, and markdown import/export, served over
//! stdio, HTTP, and WebSocket JSON-RPC.
//!
//! This crate is the CLI entry point; the layers live in `mcw-domain`,
//! `mcw-application`, `mcw-infrastructure`, `mcw-providers`, and
//! `mcw-server`.

/// Command-line interface
pub mod cli;

pub use cli::{run, Cli};
