//! Command-line argument parsing.

use clap::Parser;
use glam::Vec2;

use crate::params::{BackendKind, ExecutionConfig, OceanConfig, RunConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "fftocean")]
#[command(about = "FFT ocean surface synthesis", long_about = None)]
pub struct Args {
    /// Grid resolution N (power of two, at least 2)
    #[arg(long, value_name = "N", default_value = "64")]
    pub resolution: usize,

    /// World-space side length of the patch (meters)
    #[arg(long, value_name = "METERS", default_value = "64")]
    pub grid_size: f32,

    /// Phillips spectrum amplitude constant
    #[arg(long, value_name = "A", default_value = "0.0002")]
    pub amplitude: f32,

    /// Wind direction, x component
    #[arg(long, value_name = "X", default_value = "1", allow_hyphen_values = true)]
    pub wind_x: f32,

    /// Wind direction, z component
    #[arg(long, value_name = "Z", default_value = "1", allow_hyphen_values = true)]
    pub wind_z: f32,

    /// Wind speed (m/s)
    #[arg(long, value_name = "M_PER_S", default_value = "32")]
    pub wind_speed: f32,

    /// Horizontal displacement multiplier
    #[arg(long, value_name = "SCALE", default_value = "1")]
    pub choppy: f32,

    /// Jacobian value below which texels fold (foam)
    #[arg(long, value_name = "J", default_value = "0", allow_hyphen_values = true)]
    pub fold_threshold: f32,

    /// Random seed for the initial spectrum
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Execution backend: serial, threads (default), gpu
    #[arg(long, value_name = "BACKEND", default_value = "threads")]
    pub backend: String,

    /// Worker threads for the threads backend (default: one per core)
    #[arg(long, value_name = "COUNT")]
    pub threads: Option<usize>,

    /// Simulated duration (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "1")]
    pub duration: f32,

    /// Ticks per simulated second
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Export maps of every tick as PNG images into this directory
    #[arg(long, value_name = "DIR")]
    pub export: Option<String>,
}

impl Args {
    /// Parse backend from command-line arguments
    pub fn parse_backend(&self) -> BackendKind {
        match self.backend.to_lowercase().as_str() {
            "serial" => BackendKind::Serial,
            "threads" => BackendKind::Threads,
            "gpu" => BackendKind::Gpu,
            other => {
                log::warn!("Unknown backend '{}', using threads", other);
                BackendKind::Threads
            }
        }
    }

    pub fn ocean_config(&self) -> OceanConfig {
        OceanConfig {
            resolution: self.resolution,
            grid_size_m: self.grid_size,
            wave_amplitude: self.amplitude,
            wind_direction: Vec2::new(self.wind_x, self.wind_z),
            wind_speed_m_per_s: self.wind_speed,
            choppy_scale: self.choppy,
            fold_threshold: self.fold_threshold,
            seed: self.seed,
        }
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            backend: self.parse_backend(),
            threads: self.threads,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            duration_secs: self.duration,
            fps: self.fps.max(1),
            export_dir: self.export.clone(),
        }
    }
}
