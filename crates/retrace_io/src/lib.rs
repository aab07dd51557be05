//! # Retrace IO
//!
//! Persistence layer for recorded sessions.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - The append-only `LogStore` abstraction with file and in-memory backends
//! - Session naming and "most recent recording" selection

/// Error types and result aliases for I/O operations
pub mod error;
/// Name sanitizing and timestamped session identifiers
pub mod naming;
/// Append-only log stores
pub mod storage;

pub use error::{IoError, Result};
pub use naming::{latest_recording, sanitize_name, session_name};
pub use storage::{FileLogStore, LogStore, MemoryLogStore, DEFAULT_RECORDINGS_DIR};
