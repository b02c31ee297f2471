//! Demonstration of the raw input bridge.
//!
//! This example shows how to:
//! 1. Stand up a host with a UI thread and a render surface
//! 2. Hook the surface through the lifecycle signals
//! 3. Feed a two-finger pinch from a producer thread
//! 4. Poll samples from the consumer side
//! 5. Read the status string and capture statistics
//!
//! Run with: cargo run --example capture_demo

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rawinput_bridge::{
    collector::{
        MotionAction, PointerSlot, RawPointerEvent, ReplayHost, ToolType, UiDispatcher, UiThread,
    },
    LifecycleSignal, RawInputPlugin,
};

fn pinch_event(
    t_ms: i64,
    action: MotionAction,
    action_index: usize,
    spread: f32,
) -> RawPointerEvent {
    let mut first = PointerSlot::at(0, ToolType::Finger, 500.0 - spread, 800.0);
    let mut second = PointerSlot::at(1, ToolType::Finger, 500.0 + spread, 800.0);
    first.pressure = 0.6;
    second.pressure = 0.55;

    let pointers = if action == MotionAction::Down {
        vec![first]
    } else {
        vec![first, second]
    };

    RawPointerEvent {
        event_time_ms: t_ms,
        action,
        action_index,
        button_state: 0,
        meta_state: 0,
        edge_flags: 0,
        pointers,
    }
}

fn main() {
    println!("Raw Input Bridge - Capture Demo");
    println!("===============================");
    println!();

    let ui = match UiThread::spawn() {
        Ok(ui) => ui,
        Err(e) => {
            eprintln!("Could not start UI thread: {e}");
            return;
        }
    };

    let host = Arc::new(
        ReplayHost::new(UiDispatcher::Thread(ui))
            .with_render_surface("GodotRenderView")
            .with_root_surface("DecorView"),
    );
    let plugin = RawInputPlugin::new(host.clone());

    println!("Status before hooking: {}", plugin.get_status());
    plugin.on_lifecycle(LifecycleSignal::MainCreate);
    plugin.on_lifecycle(LifecycleSignal::SetupCompleted);
    host.sync_ui();
    println!("Status after hooking:  {}", plugin.get_status());
    println!();

    // Producer: one finger down, second finger down, spread apart, lift both.
    let producer_host = host.clone();
    let producer = thread::spawn(move || {
        let mut t = 1_000;
        producer_host.dispatch(&pinch_event(t, MotionAction::Down, 0, 50.0));
        t += 8;
        producer_host.dispatch(&pinch_event(t, MotionAction::PointerDown, 1, 50.0));
        for step in 1..=10 {
            t += 8;
            let spread = 50.0 + step as f32 * 20.0;
            producer_host.dispatch(&pinch_event(t, MotionAction::Move, 0, spread));
            thread::sleep(Duration::from_millis(5));
        }
        t += 8;
        producer_host.dispatch(&pinch_event(t, MotionAction::PointerUp, 1, 250.0));
    });

    // Consumer: poll at roughly frame rate until the producer is finished.
    let mut frame = 0;
    while !producer.is_finished() || plugin.buffered_len() > 0 {
        let samples = plugin.poll_events();
        if !samples.is_empty() {
            frame += 1;
            println!("Frame {frame}: {} sample(s)", samples.len());
            for sample in &samples {
                println!(
                    "  t={} action={} id={} idx={}{} x={:.1} y={:.1}",
                    sample.timestamp_ms,
                    sample.action.code(),
                    sample.pointer_id,
                    sample.pointer_index,
                    if sample.is_triggering_pointer { "*" } else { "" },
                    sample.x,
                    sample.y
                );
            }
        }
        thread::sleep(Duration::from_millis(16));
    }
    let _ = producer.join();

    println!();
    println!("{}", plugin.stats().summary());
    println!();
    println!("Final status: {}", plugin.get_status());
}
