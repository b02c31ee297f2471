//! Interface to the embedding host.
//!
//! The host owns the view hierarchy and the UI thread. This crate only needs
//! to find an input surface, make it deliver pointer events, and install a
//! listener on it; everything else about the host stays opaque.

use crate::collector::types::RawPointerEvent;
use std::sync::Arc;

/// Listener installed on a surface.
///
/// Returns `true` if the event was consumed and should not propagate further.
pub type TouchListener = Arc<dyn Fn(&RawPointerEvent) -> bool + Send + Sync>;

/// Work posted to the host's UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// A view that can deliver pointer events.
pub trait HostSurface: Send + Sync {
    /// Identifier reported in the hook status (typically the view class name).
    fn identifier(&self) -> String;

    /// Make the surface clickable and focusable so pointer events reach it.
    fn enable_pointer_input(&self);

    /// Install `listener`, replacing any listener installed before.
    fn set_touch_listener(&self, listener: TouchListener);
}

/// The embedding application.
pub trait Host: Send + Sync {
    /// Run `task` on the UI thread.
    ///
    /// Returns `false` if the host has no live UI context; the task is dropped.
    fn run_on_ui_thread(&self, task: UiTask) -> bool;

    /// The engine's render surface, if one exists yet.
    fn render_surface(&self) -> Option<Arc<dyn HostSurface>>;

    /// The window's root view, if the window is attached.
    fn root_surface(&self) -> Option<Arc<dyn HostSurface>>;
}
