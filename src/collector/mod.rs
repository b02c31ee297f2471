//! Pointer capture for the raw input bridge.
//!
//! This module defines the host interface, the raw event and sample types,
//! and the hook manager that installs the capture callback on the host's
//! input surface.

pub mod hook;
pub mod host;
pub mod replay;
pub mod types;

// Re-export commonly used types
pub use hook::{HookManager, HookState, HookStatus, Recorder, NO_VIEW_NAME};
pub use host::{Host, HostSurface, TouchListener, UiTask};
pub use replay::{
    load_events, read_events, ReplayError, ReplayHost, ReplaySurface, UiDispatcher, UiThread,
};
pub use types::{MotionAction, PointerSlot, RawPointerEvent, Sample, ToolType};
