//! Capture statistics for the raw input bridge.
//!
//! This module tracks where samples go after they are recorded, including the
//! ones lost to overflow, so drops are observable without changing `poll`.

pub mod counters;

// Re-export commonly used types
pub use counters::{create_shared_stats, CaptureStats, CaptureStatsSnapshot, SharedCaptureStats};
