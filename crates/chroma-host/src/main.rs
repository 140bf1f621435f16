//! Headless host for the grid simulation.
//!
//! Reads clicks from stdin, drives the simulation clock from wall time, and
//! writes one JSON snapshot line to stdout for every redraw.

mod input;
mod output;
mod telemetry;

use anyhow::{Context, Result};
use chroma_core::HostConfig;
use chroma_world::{deliver_events, Renderer, Simulation};
use parking_lot::Mutex;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = match std::env::args().nth(1) {
        Some(path) => HostConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => HostConfig::default(),
    };

    info!(
        width = config.sim.grid.width,
        height = config.sim.grid.height,
        frame_ms = config.frame_ms(),
        duration_ms = config.duration_ms,
        "Starting Chroma Colony host"
    );

    let sim = Arc::new(Mutex::new(Simulation::new(config.sim.clone())?));
    let mut renderer = output::JsonLinesRenderer::new(std::io::stdout());
    let mut tones = output::LogToneSink::default();

    renderer.redraw(&sim.lock().snapshot())?;

    // Blocking stdin reads cannot be cancelled; keep them off the runtime.
    {
        let sim = sim.clone();
        std::thread::spawn(move || {
            if let Err(e) = read_clicks(std::io::stdin().lock(), &sim) {
                error!("Click reader failed: {}", e);
            }
        });
    }

    let started = Instant::now();
    let mut frames = interval(Duration::from_millis(config.frame_ms()));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let deadline = run_deadline(config.duration_ms);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                // Writing to stdout can block; do it after the lock is released.
                let (fired, events) = {
                    let mut sim = sim.lock();
                    (sim.advance_to(now_ms)?, sim.drain_events())
                };
                let dispatched = deliver_events(events, &mut renderer, &mut tones)?;
                if fired > 0 {
                    debug!(now_ms, fired, dispatched, "Frame");
                }
            }
            _ = &mut shutdown => break,
            _ = &mut deadline => {
                info!("Run duration reached");
                break;
            }
        }
    }

    let (removed, events) = {
        let mut sim = sim.lock();
        (sim.teardown()?, sim.drain_events())
    };
    deliver_events(events, &mut renderer, &mut tones)?;
    info!(
        removed,
        frames = renderer.frames(),
        tones = tones.played(),
        "Simulation stopped"
    );

    telemetry::shutdown_telemetry();

    Ok(())
}

/// Feed each input line to the simulation as a click and return how many
/// were handled. Each click holds the lock for the whole placement, so it
/// never interleaves with a tick. Bad lines and failed clicks are logged and
/// skipped.
fn read_clicks<B: BufRead>(reader: B, sim: &Mutex<Simulation>) -> Result<u64> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        let point = match input::parse_click(&line) {
            Ok(Some(point)) => point,
            Ok(None) => continue,
            Err(e) => {
                warn!("Ignoring input line: {:#}", e);
                continue;
            }
        };

        match sim.lock().click(point) {
            Ok(placement) => {
                handled += 1;
                debug!(?placement, "Click handled");
            }
            Err(e) => error!(px = point.x, py = point.y, "Click failed: {}", e),
        }
    }

    info!(handled, "Input closed; simulation keeps running");
    Ok(handled)
}

async fn run_deadline(duration_ms: u64) {
    if duration_ms == 0 {
        std::future::pending::<()>().await;
    } else {
        sleep(Duration::from_millis(duration_ms)).await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{Position, SimConfig};
    use std::io::Cursor;

    fn sim() -> Mutex<Simulation> {
        let config = SimConfig {
            seed: Some(3),
            ..Default::default()
        };
        Mutex::new(Simulation::new(config).unwrap())
    }

    #[test]
    fn test_reader_survives_bad_lines() {
        let sim = sim();
        let input = Cursor::new("45 85\nNaN NaN\nnot a click\n# note\n\n5,5\n45 85\n");

        let handled = read_clicks(input, &sim).unwrap();
        assert_eq!(handled, 3);

        let sim = sim.lock();
        assert_eq!(sim.buildings().len(), 2);
        assert!(sim.occupant(Position::new(1, 2)).is_some());
        assert!(sim.occupant(Position::new(0, 0)).is_some());
        assert_eq!(sim.stats().placements_rejected, 1);
    }

    #[test]
    fn test_events_drain_before_delivery() {
        let sim = sim();
        read_clicks(Cursor::new("45 85\n"), &sim).unwrap();

        let events = sim.lock().drain_events();
        let mut renderer = output::JsonLinesRenderer::new(Vec::new());
        let mut tones = output::LogToneSink::default();
        // The lock is free while events are delivered.
        assert!(sim.try_lock().is_some());
        assert_eq!(deliver_events(events, &mut renderer, &mut tones).unwrap(), 1);
        assert_eq!(renderer.frames(), 1);
        assert_eq!(sim.lock().pending_events(), 0);
    }
}
