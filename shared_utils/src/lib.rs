//! Shared Utilities for heic_merger tools
//!
//! This crate provides common functionality shared across the converters:
//! - Common logging setup (file + stderr, rotation, retention)
//! - Unified error types for decode/encode pipelines

pub mod errors;
pub mod logging;

pub use errors::{HeicMergeError, Result};
pub use logging::{init_logging, LogConfig};
