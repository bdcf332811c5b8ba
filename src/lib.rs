//! Fftocean library - FFT ocean surface synthesis

pub mod cli;
pub mod error;
pub mod exec;
pub mod export;
pub mod ocean;
pub mod params;

pub use error::{ConfigError, OceanError};
pub use exec::Executor;
pub use ocean::{SimulationState, SurfaceMaps};
pub use params::{BackendKind, ExecutionConfig, OceanConfig, RunConfig};
