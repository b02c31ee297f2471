//! Hooking the host's input surface.
//!
//! [`HookManager::attach`] runs on every host lifecycle signal, because the
//! surface the host presents can change (or vanish) across creation, setup and
//! resume. The listener it installs is a [`Recorder`], which expands each raw
//! event into samples and pushes them into the shared buffer.

use crate::collector::host::{Host, HostSurface, TouchListener};
use crate::collector::types::RawPointerEvent;
use crate::core::EventBuffer;
use crate::stats::SharedCaptureStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, trace};

/// View name reported when nothing is hooked.
pub const NO_VIEW_NAME: &str = "none";

/// Whether a capture listener is currently installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    /// No lifecycle signal has been handled yet
    Uninitialized,
    /// The last attach found no surface to hook
    NoView,
    /// A listener is installed on a surface
    Hooked,
}

impl HookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStatus::Uninitialized => "uninitialized",
            HookStatus::NoView => "no_view",
            HookStatus::Hooked => "hooked",
        }
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Binding {
    status: HookStatus,
    view_name: String,
}

/// Hook status, hooked view name and the recording flag.
///
/// Written from the UI thread (status, view) or any thread (recording flag)
/// and read from the consumer thread.
#[derive(Debug)]
pub struct HookState {
    binding: RwLock<Binding>,
    recording_enabled: AtomicBool,
}

impl HookState {
    /// Create an unhooked state with recording set to `recording_enabled`.
    pub fn new(recording_enabled: bool) -> Self {
        Self {
            binding: RwLock::new(Binding {
                status: HookStatus::Uninitialized,
                view_name: NO_VIEW_NAME.to_string(),
            }),
            recording_enabled: AtomicBool::new(recording_enabled),
        }
    }

    pub fn status(&self) -> HookStatus {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    pub fn view_name(&self) -> String {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .view_name
            .clone()
    }

    /// Status and view name read together.
    pub fn binding(&self) -> (HookStatus, String) {
        let binding = self.binding.read().unwrap_or_else(PoisonError::into_inner);
        (binding.status, binding.view_name.clone())
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.recording_enabled.load(Ordering::SeqCst)
    }

    /// Set the recording flag, returning the previous value.
    pub fn set_recording_enabled(&self, enabled: bool) -> bool {
        self.recording_enabled.swap(enabled, Ordering::SeqCst)
    }

    fn set_hooked(&self, view_name: String) {
        let mut binding = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        binding.status = HookStatus::Hooked;
        binding.view_name = view_name;
    }

    fn set_no_view(&self) {
        let mut binding = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        binding.status = HookStatus::NoView;
        binding.view_name = NO_VIEW_NAME.to_string();
    }
}

impl Default for HookState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// The capture callback: turns raw events into buffered samples.
#[derive(Clone)]
pub struct Recorder {
    buffer: Arc<EventBuffer>,
    state: Arc<HookState>,
    stats: SharedCaptureStats,
}

impl Recorder {
    pub fn new(buffer: Arc<EventBuffer>, state: Arc<HookState>, stats: SharedCaptureStats) -> Self {
        Self {
            buffer,
            state,
            stats,
        }
    }

    /// Record one raw event. Returns the number of samples inserted.
    ///
    /// All samples of the event go in under one buffer lock, in slot order.
    /// While recording is disabled the event is ignored.
    pub fn record(&self, event: &RawPointerEvent) -> usize {
        self.stats.record_event_received();
        if !self.state.is_recording_enabled() {
            self.stats.record_event_ignored();
            return 0;
        }

        let count = event.pointer_count();
        trace!(
            t_ms = event.event_time_ms,
            action = event.action.code(),
            pointers = count,
            "raw pointer event"
        );
        self.buffer.insert_batch(event.samples());
        count
    }

    /// Wrap this recorder as a surface listener that never consumes events.
    pub fn into_listener(self) -> TouchListener {
        Arc::new(move |event: &RawPointerEvent| {
            self.record(event);
            false
        })
    }
}

/// Attaches the recorder to whichever surface the host currently presents.
pub struct HookManager {
    host: Arc<dyn Host>,
    state: Arc<HookState>,
    recorder: Recorder,
}

impl HookManager {
    pub fn new(host: Arc<dyn Host>, state: Arc<HookState>, recorder: Recorder) -> Self {
        Self {
            host,
            state,
            recorder,
        }
    }

    /// Hook the current input surface from the host's UI thread.
    ///
    /// Safe to call repeatedly; each call reinstalls an equivalent listener.
    /// If the host has no UI context the call does nothing.
    pub fn attach(&self) {
        let host = Arc::clone(&self.host);
        let state = Arc::clone(&self.state);
        let recorder = self.recorder.clone();

        let posted = self.host.run_on_ui_thread(Box::new(move || {
            hook_input_surface(host.as_ref(), &state, recorder);
        }));

        if !posted {
            debug!("Host has no UI context, attach skipped");
        }
    }

    /// Feed a raw event straight to the recorder.
    pub fn on_raw_event(&self, event: &RawPointerEvent) -> usize {
        self.recorder.record(event)
    }
}

/// Resolve the target surface (render surface first, then the root view) and
/// install the listener. Must run on the UI thread.
fn hook_input_surface(host: &dyn Host, state: &HookState, recorder: Recorder) {
    let target: Option<Arc<dyn HostSurface>> =
        host.render_surface().or_else(|| host.root_surface());

    let Some(target) = target else {
        debug!("No input surface available yet");
        state.set_no_view();
        return;
    };

    target.enable_pointer_input();
    target.set_touch_listener(recorder.into_listener());

    let view_name = target.identifier();
    info!(view = %view_name, "Input surface hooked");
    state.set_hooked(view_name);
}
