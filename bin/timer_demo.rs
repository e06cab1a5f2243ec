//! Durable timer demo.
//!
//! First run starts a timer and saves its snapshot to the file.
//! Next runs restore the timer from the file, so its deadline survives restarts.

use std::{path::Path, sync::mpsc, time::Duration};

use durable_timer::{Timer, TimerRuntime, TimerSettings};
use log::info;

/// Accepts arguments from the command line.
/// * duration_ms
/// * snapshot_file
/// * settings_file (optional)
fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments.
    let args = std::env::args().collect::<Vec<String>>();
    if args.len() < 3 {
        println!(
            "Usage: {} <duration_ms> <snapshot_file> [settings_file]",
            args[0]
        );
        return;
    }

    let duration_ms = match args[1].parse::<u64>() {
        Ok(duration_ms) => duration_ms,
        Err(err) => {
            eprintln!("Can not parse duration: {}", err);
            return;
        }
    };
    let snapshot_path = Path::new(&args[2]);

    let settings = match args.get(3) {
        Some(path) => match TimerSettings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("{}", err);
                return;
            }
        },
        None => TimerSettings::default(),
    };

    let runtime = match TimerRuntime::threaded() {
        Ok(runtime) => runtime.with_settings(settings),
        Err(err) => {
            eprintln!("Can not start scheduler: {}", err);
            return;
        }
    };

    // Restore timer if snapshot is present, otherwise start the new one.
    let timer = match std::fs::read_to_string(snapshot_path) {
        Ok(text) => match Timer::from_text(&text, &runtime) {
            Ok(timer) => {
                info!("Restored timer: {:?}", timer);
                timer
            }
            Err(err) => {
                eprintln!("Can not decode {}: {}", snapshot_path.display(), err);
                return;
            }
        },
        Err(_) => {
            let timer = Timer::start(Duration::from_millis(duration_ms), &runtime);
            info!("Started timer: {:?}", timer);
            timer
        }
    };

    if let Err(err) = std::fs::write(snapshot_path, timer.encode()) {
        eprintln!("Can not save {}: {}", snapshot_path.display(), err);
        return;
    }

    // Callbacks are not persisted, attach it on every run.
    let (sender, receiver) = mpsc::channel();
    timer.attach_callback(move || {
        let _ = sender.send(());
    });

    info!("Timer {}, {:?} left", timer.state(), timer.left());

    let wait = timer.left() + Duration::from_millis(100);
    match receiver.recv_timeout(wait) {
        Ok(()) => info!("Timer fired after {:?}", timer.elapsed()),
        Err(_) => info!("Timer did not fire, state is {}", timer.state()),
    }

    let _ = std::fs::write(snapshot_path, timer.encode());
}
