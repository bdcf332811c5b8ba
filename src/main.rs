//! Fftocean - offline FFT ocean surface synthesis
//!
//! Ticks the simulation at a fixed rate for the requested duration, logging
//! per-frame surface statistics and optionally exporting the maps as PNGs.

use clap::Parser;
use std::time::Instant;

use fftocean::cli::Args;
use fftocean::export::save_maps;
use fftocean::SimulationState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.ocean_config();
    let execution = args.execution_config();
    let run = args.run_config();

    let mut state = SimulationState::initialize(config, &execution)?;

    let total_frames = run.total_frames();
    if let Some(dir) = &run.export_dir {
        log::info!("Exporting {} frames to {}", total_frames, dir);
    }

    let start = Instant::now();
    for frame in 0..total_frames {
        let t = run.frame_time(frame);
        let maps = state.tick(t)?;

        let stats = maps.stats();
        log::debug!(
            "Frame {:5} t={:.3}s height [{:+.3}, {:+.3}] mean {:+.5} foam {:.1}%",
            frame,
            t,
            stats.min_height,
            stats.max_height,
            stats.mean_height,
            stats.foam_coverage * 100.0
        );

        if let Some(dir) = &run.export_dir {
            save_maps(maps, dir, frame)?;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let stats = state.maps().stats();
    log::info!(
        "{} ticks on {} in {:.2}s ({:.2}ms/tick)",
        state.ticks(),
        state.backend_name(),
        elapsed,
        elapsed * 1000.0 / total_frames.max(1) as f64
    );
    log::info!(
        "Final surface: height [{:+.3}, {:+.3}], foam {:.1}%",
        stats.min_height,
        stats.max_height,
        stats.foam_coverage * 100.0
    );

    Ok(())
}
