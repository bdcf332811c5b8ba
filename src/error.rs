//! Error types for configuration and per-tick failures.

use thiserror::Error;

/// Invalid simulation configuration. Fatal to the configuration attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid resolution {0} is below the minimum of 2")]
    TooSmall(usize),

    #[error("grid resolution {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("wind speed must be positive, got {0} m/s")]
    NonPositiveWindSpeed(f32),

    #[error("wind direction must be a non-zero vector")]
    ZeroWindDirection,

    #[error("grid size must be positive, got {0} m")]
    NonPositiveGridSize(f32),

    #[error("parameter `{0}` is not finite")]
    NonFinite(&'static str),

    #[error("butterfly plan is built for N={plan} but the field holds {cells} cells")]
    PlanSizeMismatch { plan: usize, cells: usize },

    #[error("{buffer} holds {cells} cells, expected {expected}")]
    BufferSizeMismatch {
        buffer: &'static str,
        cells: usize,
        expected: usize,
    },
}

/// Any failure surfaced by the simulation or its outer layers.
#[derive(Debug, Error)]
pub enum OceanError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// NaN/Inf appeared during a tick; the previous maps were kept.
    #[error("simulation degenerated at t={time}s: {count} non-finite values in {field}")]
    Degenerate {
        time: f32,
        field: &'static str,
        count: usize,
    },

    #[error("failed to write map image: {0}")]
    Export(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "gpu-compute")]
    #[error("gpu backend: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, OceanError>;
