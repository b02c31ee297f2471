//! Raw Input Bridge CLI
//!
//! Replays recorded pointer events through the capture pipeline and manages
//! the persisted configuration.

use clap::{Parser, Subcommand};
use rawinput_bridge::{
    collector::{load_events, RawPointerEvent, ReplayHost, UiDispatcher, UiThread},
    config::Config,
    LifecycleSignal, RawInputPlugin, VERSION,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Identifier of the root view used as the fallback surface.
const ROOT_SURFACE_NAME: &str = "DecorView";

#[derive(Parser)]
#[command(name = "rawinput")]
#[command(version = VERSION)]
#[command(about = "Raw multi-touch capture bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay raw pointer events (JSON Lines) and print the polled samples
    Replay {
        /// File with one raw pointer event per line
        #[arg(long, short)]
        input: PathBuf,

        /// Write samples here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Buffer capacity (defaults to the configured value)
        #[arg(long)]
        capacity: Option<usize>,

        /// Poll interval in milliseconds (defaults to the configured value)
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Identifier of the render surface
        #[arg(long, default_value = "GodotRenderView")]
        surface: String,

        /// Present no render surface, so the root view is hooked instead
        #[arg(long)]
        no_render_surface: bool,

        /// Pace events by their timestamps instead of sending them at once
        #[arg(long)]
        realtime: bool,
    },

    /// Enable recording in the persisted configuration
    Enable,

    /// Disable recording in the persisted configuration
    Disable,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    });
    init_tracing(&config);

    match cli.command {
        Commands::Replay {
            input,
            output,
            capacity,
            poll_interval_ms,
            surface,
            no_render_surface,
            realtime,
        } => {
            let mut config = config;
            if let Some(capacity) = capacity {
                config.buffer_capacity = capacity;
            }
            if let Some(ms) = poll_interval_ms {
                config.poll_interval = Duration::from_millis(ms);
            }
            if let Err(e) = config.validate() {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
            let render_surface = (!no_render_surface).then_some(surface);
            cmd_replay(&config, input, output, render_surface, realtime);
        }
        Commands::Enable => {
            cmd_set_recording(config, true);
        }
        Commands::Disable => {
            cmd_set_recording(config, false);
        }
        Commands::Config => {
            cmd_config(&config);
        }
    }
}

/// Log to stderr, filtered by RUST_LOG or the configured filter.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cmd_replay(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    render_surface: Option<String>,
    realtime: bool,
) {
    let events = match load_events(&input) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error reading {input:?}: {e}");
            std::process::exit(1);
        }
    };
    info!(count = events.len(), "Loaded raw events");

    let mut writer: Box<dyn Write> = match output {
        Some(ref path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error creating {path:?}: {e}");
                std::process::exit(1);
            }
        },
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let ui = match UiThread::spawn() {
        Ok(ui) => ui,
        Err(e) => {
            eprintln!("Error starting UI thread: {e}");
            std::process::exit(1);
        }
    };

    let mut host = ReplayHost::new(UiDispatcher::Thread(ui)).with_root_surface(ROOT_SURFACE_NAME);
    if let Some(ref name) = render_surface {
        host = host.with_render_surface(name);
    }
    let host = Arc::new(host);
    let plugin = RawInputPlugin::from_config(host.clone(), config);

    for signal in [
        LifecycleSignal::MainCreate,
        LifecycleSignal::SetupCompleted,
        LifecycleSignal::MainResume,
    ] {
        plugin.on_lifecycle(signal);
    }
    host.sync_ui();
    eprintln!("Status: {}", plugin.get_status());

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let producer_done = Arc::new(AtomicBool::new(false));
    let producer = {
        let host = host.clone();
        let running = running.clone();
        let done = producer_done.clone();
        thread::spawn(move || {
            produce(&host, &events, &running, realtime);
            done.store(true, Ordering::SeqCst);
        })
    };

    // Consumer loop: poll until the producer finishes, then drain once more.
    let mut written: u64 = 0;
    loop {
        let finished = producer_done.load(Ordering::SeqCst) || !running.load(Ordering::SeqCst);
        let started = Instant::now();

        for sample in plugin.poll_events() {
            if let Err(e) = serde_json::to_writer(&mut writer, &sample)
                .map_err(io::Error::from)
                .and_then(|_| writer.write_all(b"\n"))
            {
                eprintln!("Error writing samples: {e}");
                std::process::exit(1);
            }
            written += 1;
        }

        if finished {
            break;
        }
        if let Some(rest) = config.poll_interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    if producer.join().is_err() {
        warn!("Producer thread panicked");
    }
    if let Err(e) = writer.flush() {
        eprintln!("Error flushing samples: {e}");
        std::process::exit(1);
    }

    eprintln!();
    eprintln!("Samples written: {written}");
    eprintln!("{}", plugin.stats().summary());
    eprintln!("Status: {}", plugin.get_status());
}

/// Feed events to the hooked surface, optionally paced by their timestamps.
fn produce(host: &ReplayHost, events: &[RawPointerEvent], running: &AtomicBool, realtime: bool) {
    let mut previous: Option<i64> = None;
    let mut lost: u64 = 0;

    for event in events {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if realtime {
            if let Some(prev) = previous {
                let gap = event.event_time_ms.saturating_sub(prev).max(0) as u64;
                thread::sleep(Duration::from_millis(gap));
            }
            previous = Some(event.event_time_ms);
        }
        if !host.dispatch(event) {
            lost += 1;
        }
    }

    if lost > 0 {
        warn!(lost, "Events arrived with no surface hooked");
    }
}

fn cmd_set_recording(mut config: Config, enabled: bool) {
    config.recording_enabled = enabled;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    if enabled {
        println!("Recording enabled.");
    } else {
        println!("Recording disabled. Use 'rawinput enable' to turn it back on.");
    }
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
