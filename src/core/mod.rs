//! Core storage for the raw input bridge.
//!
//! This module contains the bounded sample buffer shared between the
//! input-producing thread and the polling consumer.

pub mod buffer;

// Re-export commonly used types
pub use buffer::{BufferCounts, EventBuffer, DEFAULT_CAPACITY};
