//! Simulation state: one-time setup and the per-tick pipeline.

use rustfft::num_complex::Complex32;
use std::time::Instant;

use super::butterfly::ButterflyPlan;
use super::dispersion::{evolve_into, ComplexPair, WaveField};
use super::ifft::inverse_fft_2d;
use super::spectrum::{PhillipsSpectrum, SpectralAmplitude};
use super::surface::{assemble_into, SurfaceMaps, SurfaceParams};
use crate::error::OceanError;
use crate::exec::Executor;
use crate::params::{BackendKind, ExecutionConfig, OceanConfig};

#[cfg(feature = "gpu-compute")]
use crate::exec::gpu::GpuPipeline;

/// Where the per-tick kernels run
enum Backend {
    Cpu(Executor),
    #[cfg(feature = "gpu-compute")]
    Gpu(Box<GpuPipeline>),
}

impl Backend {
    fn name(&self) -> String {
        match self {
            Backend::Cpu(Executor::Serial) => "serial".to_string(),
            Backend::Cpu(exec) => format!("thread pool ({} workers)", exec.parallelism()),
            #[cfg(feature = "gpu-compute")]
            Backend::Gpu(gpu) => format!("gpu ({})", gpu.adapter_name()),
        }
    }
}

/// Everything one ocean configuration needs, owned by the caller
///
/// The spectrum and butterfly plan are built once and never mutated. The
/// wave field and map buffers are rewritten in full every tick.
pub struct SimulationState {
    config: OceanConfig,
    execution: ExecutionConfig,
    spectrum: SpectralAmplitude,
    plan: ButterflyPlan,
    backend: Backend,
    field: WaveField,
    height_scratch: Vec<Complex32>,
    pair_scratch: Vec<ComplexPair>,
    /// Maps of the last successful tick
    maps: SurfaceMaps,
    /// Tick output under construction, swapped in on success
    staging: SurfaceMaps,
    ticks: u64,
}

impl SimulationState {
    /// Validate `config`, generate the spectrum and butterfly plan, allocate buffers
    pub fn initialize(
        config: OceanConfig,
        execution: &ExecutionConfig,
    ) -> Result<Self, OceanError> {
        config.validate()?;

        let start = Instant::now();
        let n = config.resolution;
        let spectrum = SpectralAmplitude::generate(
            n,
            config.seed,
            &PhillipsSpectrum::from_config(&config),
        )?;
        let plan = ButterflyPlan::build(n)?;
        let backend = Self::create_backend(&config, execution, &spectrum, &plan)?;

        log::info!(
            "Ocean initialized: N={} ({} passes), patch {}m, wind {:.1} m/s, seed {}, backend {} ({:.2}ms)",
            n,
            config.passes(),
            config.grid_size_m,
            config.wind_speed_m_per_s,
            config.seed,
            backend.name(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            field: WaveField::zeros(n),
            height_scratch: Vec::with_capacity(n * n),
            pair_scratch: Vec::with_capacity(n * n),
            maps: SurfaceMaps::flat(n),
            staging: SurfaceMaps::flat(n),
            ticks: 0,
            config,
            execution: execution.clone(),
            spectrum,
            plan,
            backend,
        })
    }

    #[cfg_attr(not(feature = "gpu-compute"), allow(unused_variables))]
    fn create_backend(
        config: &OceanConfig,
        execution: &ExecutionConfig,
        spectrum: &SpectralAmplitude,
        plan: &ButterflyPlan,
    ) -> Result<Backend, OceanError> {
        if execution.backend == BackendKind::Gpu {
            #[cfg(feature = "gpu-compute")]
            {
                let params = SurfaceParams::from_config(config);
                let gpu = GpuPipeline::new(spectrum, plan, &params)?;
                return Ok(Backend::Gpu(Box::new(gpu)));
            }
            #[cfg(not(feature = "gpu-compute"))]
            log::warn!("Built without the `gpu-compute` feature, using the thread pool");
        }
        Ok(Backend::Cpu(Executor::from_config(execution)))
    }

    /// Rebuild everything for a new configuration (no incremental update)
    ///
    /// On failure the current state is left untouched.
    pub fn reconfigure(&mut self, config: OceanConfig) -> Result<(), OceanError> {
        let execution = self.execution.clone();
        *self = Self::initialize(config, &execution)?;
        Ok(())
    }

    /// Advance the surface to time `t` (seconds) and return the new maps
    ///
    /// A tick is atomic: if any evolved or output value is NaN/Inf the tick
    /// is discarded with `OceanError::Degenerate` and `maps()` still returns
    /// the previous tick's surface.
    pub fn tick(&mut self, t: f32) -> Result<&SurfaceMaps, OceanError> {
        let start = Instant::now();
        let params = SurfaceParams::from_config(&self.config);

        let result = match &mut self.backend {
            Backend::Cpu(exec) => run_cpu_tick(
                exec,
                &self.spectrum,
                &self.plan,
                &params,
                t,
                &mut self.field,
                &mut self.height_scratch,
                &mut self.pair_scratch,
                &mut self.staging,
            ),
            #[cfg(feature = "gpu-compute")]
            Backend::Gpu(gpu) => gpu.tick(t, &mut self.staging),
        };

        if let Err(e) = result.and_then(|_| self.staging.check_finite(t)) {
            log::warn!("Discarding tick at t={:.3}s: {}", t, e);
            return Err(e);
        }

        std::mem::swap(&mut self.maps, &mut self.staging);
        self.ticks += 1;

        log::debug!(
            "Tick {} (t={:.3}s) in {:.2}ms",
            self.ticks,
            t,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(&self.maps)
    }

    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    pub fn spectrum(&self) -> &SpectralAmplitude {
        &self.spectrum
    }

    pub fn plan(&self) -> &ButterflyPlan {
        &self.plan
    }

    /// Maps of the last successful tick (flat before the first tick)
    pub fn maps(&self) -> &SurfaceMaps {
        &self.maps
    }

    /// Number of successful ticks since initialization
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn backend_name(&self) -> String {
        self.backend.name()
    }
}

/// Evolve → row IFFT → column IFFT → assemble, each stage a full barrier
#[allow(clippy::too_many_arguments)]
fn run_cpu_tick(
    exec: &Executor,
    spectrum: &SpectralAmplitude,
    plan: &ButterflyPlan,
    params: &SurfaceParams,
    t: f32,
    field: &mut WaveField,
    height_scratch: &mut Vec<Complex32>,
    pair_scratch: &mut Vec<ComplexPair>,
    out: &mut SurfaceMaps,
) -> Result<(), OceanError> {
    evolve_into(spectrum, t, exec, field)?;

    let bad = field.height.iter().filter(|h| !h.is_finite()).count();
    if bad > 0 {
        return Err(OceanError::Degenerate {
            time: t,
            field: "evolved height spectrum",
            count: bad,
        });
    }

    inverse_fft_2d(&mut field.height, height_scratch, plan, exec)?;
    inverse_fft_2d(&mut field.displacement, pair_scratch, plan, exec)?;
    inverse_fft_2d(&mut field.slope, pair_scratch, plan, exec)?;

    assemble_into(field, params, exec, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn serial() -> ExecutionConfig {
        ExecutionConfig {
            backend: BackendKind::Serial,
            threads: None,
        }
    }

    #[test]
    fn test_tick_replaces_flat_maps() {
        let mut state = SimulationState::initialize(OceanConfig::default(), &serial()).unwrap();
        assert!(state.maps().displacement.iter().all(|d| d.y == 0.0));

        let maps = state.tick(1.0).unwrap();
        assert!(maps.displacement.iter().any(|d| d.y != 0.0));
        assert_eq!(state.ticks(), 1);
    }

    #[test]
    fn test_degenerate_tick_keeps_previous_maps() {
        let config = OceanConfig {
            resolution: 16,
            ..Default::default()
        };
        let mut state = SimulationState::initialize(config, &serial()).unwrap();
        let previous = state.tick(0.5).unwrap().clone();

        match state.tick(f32::INFINITY) {
            Err(OceanError::Degenerate { .. }) => {}
            other => panic!("expected degenerate tick, got {:?}", other.map(|_| ())),
        }
        assert_eq!(state.maps(), &previous);
        assert_eq!(state.ticks(), 1);
    }

    #[test]
    fn test_reconfigure_rebuilds_or_keeps_state() {
        let mut state = SimulationState::initialize(OceanConfig::default(), &serial()).unwrap();

        let bad = OceanConfig {
            resolution: 100,
            ..Default::default()
        };
        assert!(matches!(
            state.reconfigure(bad),
            Err(OceanError::Config(ConfigError::NotPowerOfTwo(100)))
        ));
        assert_eq!(state.config().resolution, 64);

        let smaller = OceanConfig {
            resolution: 32,
            seed: 9,
            ..Default::default()
        };
        state.reconfigure(smaller).unwrap();
        assert_eq!(state.plan().size(), 32);
        assert_eq!(state.spectrum().resolution(), 32);
        assert_eq!(state.maps().resolution(), 32);
        assert_eq!(state.ticks(), 0);
    }
}
