//! Execution backend and run/export configuration.

/// Which backend executes the per-tick kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Single-threaded, kernels run row by row on the caller's thread
    Serial,
    /// Rayon thread pool, rows of each kernel dispatched in parallel
    #[default]
    Threads,
    /// wgpu compute shaders (requires the `gpu-compute` feature)
    Gpu,
}

/// Execution configuration
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    pub backend: BackendKind,

    /// Worker threads for `BackendKind::Threads` (None = one per core)
    pub threads: Option<usize>,
}

/// Offline run configuration (fixed-step ticking and optional map export)
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Simulated duration (seconds)
    pub duration_secs: f32,

    /// Ticks per simulated second
    pub fps: u32,

    /// Directory receiving per-frame map images (None = no export)
    pub export_dir: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1.0,
            fps: 60,
            export_dir: None,
        }
    }
}

impl RunConfig {
    /// Total number of ticks to run
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Simulation time (seconds) of a frame
    pub fn frame_time(&self, frame: usize) -> f32 {
        frame as f32 / self.fps as f32
    }
}
