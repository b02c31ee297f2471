//! The component the embedding engine talks to.
//!
//! [`RawInputPlugin`] owns the sample buffer and hook state. The host drives
//! it with lifecycle signals and raw events; the script layer drives it with
//! the control operations (`poll_events`, `clear_events`, ...). The two sides
//! may run on different threads without any coordination between them.

use crate::collector::hook::{HookManager, HookState, HookStatus, Recorder};
use crate::collector::host::Host;
use crate::collector::types::{RawPointerEvent, Sample};
use crate::config::Config;
use crate::core::{EventBuffer, DEFAULT_CAPACITY};
use crate::stats::{create_shared_stats, CaptureStatsSnapshot, SharedCaptureStats};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Host lifecycle transitions after which the input surface is re-hooked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    MainCreate,
    SetupCompleted,
    MainResume,
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleSignal::MainCreate => "main_create",
            LifecycleSignal::SetupCompleted => "setup_completed",
            LifecycleSignal::MainResume => "main_resume",
        };
        f.write_str(name)
    }
}

/// Raw pointer capture exposed as a pollable batch of samples.
pub struct RawInputPlugin {
    buffer: Arc<EventBuffer>,
    state: Arc<HookState>,
    stats: SharedCaptureStats,
    hooks: HookManager,
}

impl RawInputPlugin {
    /// Name the plugin registers under in the engine.
    pub const NAME: &'static str = "RawInput";

    /// Create a plugin with the default buffer capacity and recording on.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::build(host, DEFAULT_CAPACITY, true)
    }

    /// Create a plugin whose buffer holds at most `capacity` samples.
    pub fn with_capacity(host: Arc<dyn Host>, capacity: usize) -> Self {
        Self::build(host, capacity, true)
    }

    /// Create a plugin from configuration.
    pub fn from_config(host: Arc<dyn Host>, config: &Config) -> Self {
        Self::build(host, config.buffer_capacity, config.recording_enabled)
    }

    fn build(host: Arc<dyn Host>, capacity: usize, recording_enabled: bool) -> Self {
        let buffer = Arc::new(EventBuffer::new(capacity));
        let state = Arc::new(HookState::new(recording_enabled));
        let stats = create_shared_stats();
        let recorder = Recorder::new(Arc::clone(&buffer), Arc::clone(&state), Arc::clone(&stats));
        let hooks = HookManager::new(host, Arc::clone(&state), recorder);

        Self {
            buffer,
            state,
            stats,
            hooks,
        }
    }

    pub fn plugin_name(&self) -> &'static str {
        Self::NAME
    }

    /// Handle a host lifecycle transition by re-hooking the input surface.
    pub fn on_lifecycle(&self, signal: LifecycleSignal) {
        debug!(%signal, "Lifecycle signal");
        self.hooks.attach();
    }

    /// Record a raw event delivered outside any installed listener.
    pub fn on_raw_event(&self, event: &RawPointerEvent) -> usize {
        self.hooks.on_raw_event(event)
    }

    /// Take every buffered sample, oldest first.
    pub fn poll_events(&self) -> Vec<Sample> {
        let samples = self.buffer.drain();
        self.stats.record_poll();
        samples
    }

    /// Take every buffered sample in the flat dictionary form.
    pub fn poll_events_as_dictionaries(&self) -> Vec<Map<String, Value>> {
        self.poll_events()
            .iter()
            .map(Sample::to_dictionary)
            .collect()
    }

    /// Discard every buffered sample.
    pub fn clear_events(&self) {
        self.buffer.clear();
    }

    /// Turn recording on or off. Turning it off also clears the buffer.
    pub fn set_recording_enabled(&self, enabled: bool) {
        let was_enabled = self.state.set_recording_enabled(enabled);
        if !enabled {
            self.clear_events();
        }
        if was_enabled != enabled {
            info!(enabled, "Recording toggled");
        }
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.state.is_recording_enabled()
    }

    /// Diagnostic status, e.g. `hooked:GodotRenderView:rec=true`.
    ///
    /// Not a stable format; callers should only look for substrings.
    pub fn get_status(&self) -> String {
        let (status, view_name) = self.state.binding();
        format!(
            "{status}:{view_name}:rec={}",
            self.state.is_recording_enabled()
        )
    }

    pub fn hook_status(&self) -> HookStatus {
        self.state.status()
    }

    pub fn hook_view_name(&self) -> String {
        self.state.view_name()
    }

    /// Number of samples waiting to be polled.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Current capture counters, including overflow drops.
    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot(self.buffer.counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::replay::ReplayHost;
    use crate::collector::types::{MotionAction, PointerSlot, ToolType};

    fn event(t_ms: i64, pointers: usize) -> RawPointerEvent {
        RawPointerEvent {
            event_time_ms: t_ms,
            action: MotionAction::Move,
            action_index: 0,
            button_state: 0,
            meta_state: 0,
            edge_flags: 0,
            pointers: (0..pointers)
                .map(|i| PointerSlot::at(i as i32, ToolType::Finger, i as f32, i as f32))
                .collect(),
        }
    }

    #[test]
    fn test_initial_status() {
        let plugin = RawInputPlugin::new(Arc::new(ReplayHost::inline()));
        assert_eq!(plugin.plugin_name(), "RawInput");
        assert_eq!(plugin.get_status(), "uninitialized:none:rec=true");
        assert_eq!(plugin.buffer_capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_status_after_lifecycle() {
        let host = Arc::new(ReplayHost::inline().with_render_surface("GodotRenderView"));
        let plugin = RawInputPlugin::new(host);

        plugin.on_lifecycle(LifecycleSignal::MainCreate);
        let status = plugin.get_status();
        assert!(status.contains("hooked"));
        assert!(status.contains("GodotRenderView"));
        assert_eq!(status, "hooked:GodotRenderView:rec=true");
    }

    #[test]
    fn test_status_without_surface() {
        let plugin = RawInputPlugin::new(Arc::new(ReplayHost::inline()));
        plugin.on_lifecycle(LifecycleSignal::SetupCompleted);

        let status = plugin.get_status();
        assert!(status.contains("no_view"));
        assert!(status.contains("none"));
    }

    #[test]
    fn test_poll_drains() {
        let plugin = RawInputPlugin::with_capacity(Arc::new(ReplayHost::inline()), 16);
        plugin.on_raw_event(&event(1, 2));
        plugin.on_raw_event(&event(2, 1));

        let samples = plugin.poll_events();
        assert_eq!(samples.len(), 3);
        assert_eq!(plugin.buffered_len(), 0);
        assert!(plugin.poll_events().is_empty());
    }

    #[test]
    fn test_disable_clears_and_blocks() {
        let plugin = RawInputPlugin::new(Arc::new(ReplayHost::inline()));
        plugin.on_raw_event(&event(1, 3));
        assert_eq!(plugin.buffered_len(), 3);

        plugin.set_recording_enabled(false);
        assert!(!plugin.is_recording_enabled());
        assert!(plugin.get_status().ends_with("rec=false"));
        assert!(plugin.poll_events().is_empty());

        plugin.on_raw_event(&event(2, 3));
        assert!(plugin.poll_events().is_empty());

        plugin.set_recording_enabled(true);
        plugin.on_raw_event(&event(3, 2));
        assert_eq!(plugin.poll_events().len(), 2);
    }

    #[test]
    fn test_config_controls_initial_recording() {
        let config = Config {
            buffer_capacity: 4,
            recording_enabled: false,
            ..Config::default()
        };
        let plugin = RawInputPlugin::from_config(Arc::new(ReplayHost::inline()), &config);

        assert_eq!(plugin.buffer_capacity(), 4);
        assert!(!plugin.is_recording_enabled());
        assert_eq!(plugin.on_raw_event(&event(1, 1)), 0);
    }

    #[test]
    fn test_dictionaries_use_script_keys() {
        let plugin = RawInputPlugin::new(Arc::new(ReplayHost::inline()));
        plugin.on_raw_event(&event(42, 1));

        let batch = plugin.poll_events_as_dictionaries();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0]["t_ms"], Value::from(42));
        assert_eq!(batch[0]["is_action_index"], Value::from(true));
    }

    #[test]
    fn test_stats_track_overflow() {
        let plugin = RawInputPlugin::with_capacity(Arc::new(ReplayHost::inline()), 2);
        for t in 0..5 {
            plugin.on_raw_event(&event(t, 1));
        }
        plugin.poll_events();

        let stats = plugin.stats();
        assert_eq!(stats.events_received, 5);
        assert_eq!(stats.samples_recorded, 5);
        assert_eq!(stats.samples_delivered, 2);
        assert_eq!(stats.samples_evicted, 3);
        assert!(stats.is_balanced());
    }
}
