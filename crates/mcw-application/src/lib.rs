//! # Application Layer
//!
//! Use-case services orchestrating the domain over the provider ports:
//! the work-item graph engine, memory stores, smart retrieval, markdown
//! sync, and search. Services are constructed once at startup and shared
//! behind the domain's interface traits.

/// Service-layer constants
pub mod constants;
/// Item payload shaping
pub mod format;
/// Per-namespace mutation locks
pub mod locks;
/// Markdown document rendering and parsing
pub mod markdown;
/// Entity/record conversion for the vector store
pub mod records;
/// Use-case services
pub mod use_cases;

pub use use_cases::memory_service::MemoryServiceImpl;
pub use use_cases::search_service::SearchServiceImpl;
pub use use_cases::sync_service::SyncServiceImpl;
pub use use_cases::work_item_service::WorkItemServiceImpl;
