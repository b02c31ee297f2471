//! In-process host used to replay recorded pointer events.
//!
//! [`ReplayHost`] stands in for the embedding application: it owns named
//! surfaces that keep whatever listener is installed on them, and it runs UI
//! work either inline or on a dedicated [`UiThread`]. Raw events are fed to
//! the hooked surface with [`ReplayHost::dispatch`].

use crate::collector::host::{Host, HostSurface, TouchListener, UiTask};
use crate::collector::types::RawPointerEvent;
use crossbeam_channel::{bounded, unbounded, Sender};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Errors from setting up or loading a replay.
#[derive(Debug)]
pub enum ReplayError {
    Io(std::io::Error),
    /// A line of the input could not be parsed as a raw pointer event
    Parse {
        line: usize,
        message: String,
    },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "IO error: {e}"),
            ReplayError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        ReplayError::Io(e)
    }
}

/// Read raw pointer events, one JSON object per line. Blank lines are skipped.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<RawPointerEvent>, ReplayError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|e| ReplayError::Parse {
            line: index + 1,
            message: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Load raw pointer events from a JSON Lines file.
pub fn load_events(path: &Path) -> Result<Vec<RawPointerEvent>, ReplayError> {
    let file = std::fs::File::open(path)?;
    read_events(std::io::BufReader::new(file))
}

/// A single thread that runs posted UI tasks in order.
pub struct UiThread {
    sender: Option<Sender<UiTask>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl UiThread {
    /// Spawn the UI thread.
    pub fn spawn() -> Result<Self, ReplayError> {
        let (sender, receiver) = unbounded::<UiTask>();
        let handle = thread::Builder::new()
            .name("ui".to_string())
            .spawn(move || {
                // Exits once every sender is dropped
                for task in receiver {
                    task();
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            thread_handle: Some(handle),
        })
    }

    /// Queue a task. Returns `false` if the thread has shut down.
    pub fn post(&self, task: UiTask) -> bool {
        match &self.sender {
            Some(sender) => sender.send(task).is_ok(),
            None => false,
        }
    }

    /// Block until every task posted before this call has run.
    pub fn sync(&self) {
        let (done_tx, done_rx) = bounded::<()>(1);
        let posted = self.post(Box::new(move || {
            let _ = done_tx.send(());
        }));
        if posted {
            let _ = done_rx.recv();
        }
    }

    /// Stop accepting tasks and wait for the queue to finish.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.thread_handle.take() {
            // Dropped from one of its own tasks; the loop ends on its own.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("UI thread panicked");
            }
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// How a [`ReplayHost`] runs UI work.
pub enum UiDispatcher {
    /// Run tasks immediately on the calling thread
    Inline,
    Thread(UiThread),
}

impl UiDispatcher {
    fn run(&self, task: UiTask) -> bool {
        match self {
            UiDispatcher::Inline => {
                task();
                true
            }
            UiDispatcher::Thread(ui) => ui.post(task),
        }
    }
}

/// A named surface that stores the listener installed on it.
pub struct ReplaySurface {
    name: String,
    accepts_pointer_input: AtomicBool,
    listener: RwLock<Option<TouchListener>>,
    listener_installs: AtomicU32,
}

impl ReplaySurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accepts_pointer_input: AtomicBool::new(false),
            listener: RwLock::new(None),
            listener_installs: AtomicU32::new(0),
        }
    }

    /// Deliver an event to the installed listener.
    ///
    /// Returns `None` if no listener is installed, otherwise whether the
    /// listener consumed the event.
    pub fn dispatch(&self, event: &RawPointerEvent) -> Option<bool> {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        listener.map(|listener| listener(event))
    }

    pub fn has_listener(&self) -> bool {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn accepts_pointer_input(&self) -> bool {
        self.accepts_pointer_input.load(Ordering::SeqCst)
    }

    /// How many times a listener has been installed.
    pub fn listener_installs(&self) -> u32 {
        self.listener_installs.load(Ordering::SeqCst)
    }
}

impl HostSurface for ReplaySurface {
    fn identifier(&self) -> String {
        self.name.clone()
    }

    fn enable_pointer_input(&self) {
        self.accepts_pointer_input.store(true, Ordering::SeqCst);
    }

    fn set_touch_listener(&self, listener: TouchListener) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = Some(listener);
        self.listener_installs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Host with swappable render and root surfaces.
pub struct ReplayHost {
    dispatcher: UiDispatcher,
    ui_available: AtomicBool,
    render: RwLock<Option<Arc<ReplaySurface>>>,
    root: RwLock<Option<Arc<ReplaySurface>>>,
}

impl ReplayHost {
    pub fn new(dispatcher: UiDispatcher) -> Self {
        Self {
            dispatcher,
            ui_available: AtomicBool::new(true),
            render: RwLock::new(None),
            root: RwLock::new(None),
        }
    }

    /// A host that runs UI tasks on the calling thread.
    pub fn inline() -> Self {
        Self::new(UiDispatcher::Inline)
    }

    pub fn with_render_surface(self, name: &str) -> Self {
        self.set_render_surface(Some(Arc::new(ReplaySurface::new(name))));
        self
    }

    pub fn with_root_surface(self, name: &str) -> Self {
        self.set_root_surface(Some(Arc::new(ReplaySurface::new(name))));
        self
    }

    pub fn set_render_surface(&self, surface: Option<Arc<ReplaySurface>>) {
        *self.render.write().unwrap_or_else(PoisonError::into_inner) = surface;
    }

    pub fn set_root_surface(&self, surface: Option<Arc<ReplaySurface>>) {
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = surface;
    }

    pub fn render_surface_handle(&self) -> Option<Arc<ReplaySurface>> {
        self.render
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn root_surface_handle(&self) -> Option<Arc<ReplaySurface>> {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate the host gaining or losing its UI context.
    pub fn set_ui_available(&self, available: bool) {
        self.ui_available.store(available, Ordering::SeqCst);
    }

    /// Wait for queued UI work when running on a [`UiThread`].
    pub fn sync_ui(&self) {
        if let UiDispatcher::Thread(ui) = &self.dispatcher {
            ui.sync();
        }
    }

    /// Deliver an event the way the platform would: to the render surface's
    /// listener, or the root view's if the render surface has none.
    ///
    /// Returns `false` if no surface has a listener and the event was lost.
    pub fn dispatch(&self, event: &RawPointerEvent) -> bool {
        let surfaces = [self.render_surface_handle(), self.root_surface_handle()];
        surfaces
            .iter()
            .flatten()
            .find_map(|surface| surface.dispatch(event))
            .is_some()
    }
}

impl Host for ReplayHost {
    fn run_on_ui_thread(&self, task: UiTask) -> bool {
        if !self.ui_available.load(Ordering::SeqCst) {
            return false;
        }
        self.dispatcher.run(task)
    }

    fn render_surface(&self) -> Option<Arc<dyn HostSurface>> {
        self.render_surface_handle()
            .map(|surface| surface as Arc<dyn HostSurface>)
    }

    fn root_surface(&self) -> Option<Arc<dyn HostSurface>> {
        self.root_surface_handle()
            .map(|surface| surface as Arc<dyn HostSurface>)
    }
}
