//! Raw Input Bridge - raw multi-touch capture for an embedded script layer.
//!
//! This library hooks the host application's input surface, turns every
//! multi-pointer motion event into one sample per pointer, and keeps those
//! samples in a bounded buffer that a consumer drains by polling.
//!
//! # Guarantees
//!
//! - **Bounded**: the buffer never holds more than its capacity; on overflow
//!   the oldest sample is evicted
//! - **Ordered**: samples are polled in the order they were recorded
//! - **Atomic handoff**: a poll takes the whole buffer in one step, so no
//!   sample is ever returned twice
//! - **Passive**: the capture listener observes events without consuming them
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Raw Input Bridge                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │    Host     │──▶│  Recorder   │──▶│ EventBuffer │──▶ poll  │
//! │  │  (surface)  │   │ (fan-out)   │   │ (bounded)   │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         ▲                                                     │
//! │  ┌─────────────┐                                              │
//! │  │ HookManager │  re-attach on create / setup / resume        │
//! │  └─────────────┘                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rawinput_bridge::collector::{
//!     MotionAction, PointerSlot, RawPointerEvent, ReplayHost, ToolType,
//! };
//! use rawinput_bridge::{LifecycleSignal, RawInputPlugin};
//! use std::sync::Arc;
//!
//! let host = Arc::new(ReplayHost::inline().with_render_surface("GodotRenderView"));
//! let plugin = RawInputPlugin::new(host.clone());
//! plugin.on_lifecycle(LifecycleSignal::MainCreate);
//!
//! host.dispatch(&RawPointerEvent {
//!     event_time_ms: 10,
//!     action: MotionAction::Down,
//!     action_index: 0,
//!     button_state: 0,
//!     meta_state: 0,
//!     edge_flags: 0,
//!     pointers: vec![PointerSlot::at(0, ToolType::Finger, 12.0, 34.0)],
//! });
//!
//! let samples = plugin.poll_events();
//! assert_eq!(samples.len(), 1);
//! assert!(plugin.get_status().contains("hooked"));
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod plugin;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{
    Host, HostSurface, HookStatus, MotionAction, PointerSlot, RawPointerEvent, Sample, ToolType,
};
pub use config::{Config, ConfigError};
pub use core::{EventBuffer, DEFAULT_CAPACITY};
pub use plugin::{LifecycleSignal, RawInputPlugin};
pub use stats::{CaptureStats, CaptureStatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
