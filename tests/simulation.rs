//! End-to-end properties of the public simulation API.

use fftocean::exec::Executor;
use fftocean::ocean::{
    dispersion, ifft, surface, ButterflyPlan, PhillipsSpectrum, SpectralAmplitude, SurfaceMaps,
    SurfaceParams, WaveField,
};
use fftocean::{
    BackendKind, ConfigError, ExecutionConfig, OceanConfig, OceanError, SimulationState,
};
use glam::Vec2;
use rustfft::num_complex::Complex32;
use std::f64::consts::PI;

fn serial() -> ExecutionConfig {
    ExecutionConfig {
        backend: BackendKind::Serial,
        threads: None,
    }
}

fn seeded(resolution: usize, seed: u64) -> OceanConfig {
    OceanConfig {
        resolution,
        seed,
        ..Default::default()
    }
}

fn max_abs_height(maps: &SurfaceMaps) -> f32 {
    maps.displacement
        .iter()
        .map(|d| d.y.abs())
        .fold(0.0, f32::max)
}

#[test]
fn test_initialize_is_deterministic() {
    let a = SimulationState::initialize(seeded(64, 42), &serial()).unwrap();
    let b = SimulationState::initialize(seeded(64, 42), &serial()).unwrap();
    assert_eq!(a.spectrum(), b.spectrum());

    let other = SimulationState::initialize(seeded(64, 43), &serial()).unwrap();
    assert_ne!(a.spectrum(), other.spectrum());
}

#[test]
fn test_invalid_configs_are_rejected() {
    match SimulationState::initialize(seeded(63, 0), &serial()) {
        Err(OceanError::Config(ConfigError::NotPowerOfTwo(63))) => {}
        other => panic!("expected NotPowerOfTwo, got {:?}", other.err()),
    }

    let calm = OceanConfig {
        wind_speed_m_per_s: 0.0,
        ..Default::default()
    };
    match SimulationState::initialize(calm, &serial()) {
        Err(OceanError::Config(ConfigError::NonPositiveWindSpeed(_))) => {}
        other => panic!("expected NonPositiveWindSpeed, got {:?}", other.err()),
    }
}

#[test]
fn test_height_has_zero_mean() {
    let mut state = SimulationState::initialize(seeded(64, 42), &serial()).unwrap();
    let maps = state.tick(0.0).unwrap();

    let stats = maps.stats();
    let peak = max_abs_height(maps);
    assert!(peak > 0.0);
    assert!(
        stats.mean_height.abs() <= 1e-3 * peak,
        "mean {} vs peak {}",
        stats.mean_height,
        peak
    );
}

#[test]
fn test_impulse_round_trip() {
    let n = 64;
    let plan = ButterflyPlan::build(n).unwrap();
    let (x0, y0) = (35, 30);

    let mut field = vec![Complex32::default(); n * n];
    field[y0 * n + x0] = Complex32::new(1.0, 0.0);
    let mut scratch = Vec::new();
    let exec = Executor::thread_pool(Some(3));
    ifft::inverse_fft_2d(&mut field, &mut scratch, &plan, &exec).unwrap();

    let (fx, fy) = (x0 as f64 - 32.0, y0 as f64 - 32.0);
    for y in 0..n {
        for x in 0..n {
            let phase = 2.0 * PI * (fx * x as f64 + fy * y as f64) / n as f64;
            let v = field[y * n + x];
            assert!((v.re as f64 - phase.cos()).abs() < 1e-4);
            assert!((v.im as f64 - phase.sin()).abs() < 1e-4);
        }
    }
}

/// Height at any integer (x, y), including outside the grid, from the evolved spectrum
fn naive_height(spectrum: &[Complex32], n: usize, x: i64, y: i64) -> f64 {
    let half = (n / 2) as i64;
    let mut sum = 0.0;
    for j in 0..n {
        for i in 0..n {
            let h = spectrum[j * n + i];
            let phase = 2.0 * PI * ((i as i64 + half) * x + (j as i64 + half) * y) as f64
                / n as f64;
            sum += h.re as f64 * phase.cos() - h.im as f64 * phase.sin();
        }
    }
    sum
}

#[test]
fn test_surface_tiles_seamlessly() {
    let n = 16;
    let t = 1.25;
    let config = OceanConfig {
        fold_threshold: 1.5,
        ..seeded(n, 7)
    };
    let texel = config.texel_size_m();
    let mut state = SimulationState::initialize(config, &serial()).unwrap();
    let maps = state.tick(t).unwrap().clone();
    let peak = max_abs_height(&maps) as f64;

    // The height just past either edge equals the texel on the opposite edge
    let evolved = dispersion::evolve(state.spectrum(), t, &Executor::Serial);
    for y in 0..n as i64 {
        let before_left = naive_height(&evolved.height, n, -1, y);
        let past_right = naive_height(&evolved.height, n, n as i64, y);
        let right_edge = maps.displacement_wrapped(n as isize - 1, y as isize).y as f64;
        let left_edge = maps.displacement_wrapped(0, y as isize).y as f64;
        assert!((before_left - right_edge).abs() < 1e-3 * peak);
        assert!((past_right - left_edge).abs() < 1e-3 * peak);
    }

    // Folds at the edges use the neighbors across the seam
    for y in 0..n {
        for x in [0, n - 1] {
            let j = surface::jacobian(&maps.displacement, n, x, y, texel);
            let (xi, yi) = (x as isize, y as isize);
            let left = maps.displacement_wrapped(xi - 1, yi);
            let right = maps.displacement_wrapped(xi + 1, yi);
            let up = maps.displacement_wrapped(xi, yi - 1);
            let down = maps.displacement_wrapped(xi, yi + 1);
            let inv = 1.0 / (2.0 * texel);
            let expected = (1.0 + (right.x - left.x) * inv) * (1.0 + (down.z - up.z) * inv)
                - (down.x - up.x) * inv * (right.z - left.z) * inv;
            assert!((j - expected).abs() < 1e-5);
            assert!((maps.fold_wrapped(xi, yi) - (1.5 - j).clamp(0.0, 1.0)).abs() < 1e-5);
        }
    }
}

#[test]
fn test_backends_agree() {
    let mut serial_state = SimulationState::initialize(seeded(32, 5), &serial()).unwrap();
    let threads = ExecutionConfig {
        backend: BackendKind::Threads,
        threads: Some(4),
    };
    let mut pooled_state = SimulationState::initialize(seeded(32, 5), &threads).unwrap();

    for t in [0.0, 0.5, 3.0] {
        let a = serial_state.tick(t).unwrap().clone();
        let b = pooled_state.tick(t).unwrap();
        assert_eq!(&a, b);
    }
    assert_eq!(serial_state.ticks(), 3);
}

#[test]
fn test_normals_are_unit_length() {
    let mut state = SimulationState::initialize(seeded(32, 1), &serial()).unwrap();
    let maps = state.tick(2.0).unwrap();
    assert!(maps
        .normal
        .iter()
        .all(|n| (n.length() - 1.0).abs() < 1e-5 && n.y > 0.0));
}

#[test]
fn test_stage_functions_reject_mismatched_resolutions() {
    let spectrum = SpectralAmplitude::generate(
        8,
        3,
        &PhillipsSpectrum::new(0.0002, Vec2::new(1.0, 1.0), 32.0),
    )
    .unwrap();

    let mut field = WaveField::zeros(16);
    let result = dispersion::evolve_into(&spectrum, 1.0, &Executor::Serial, &mut field);
    assert!(matches!(result, Err(ConfigError::BufferSizeMismatch { .. })));

    let params = SurfaceParams {
        choppy_scale: 1.0,
        texel_size_m: 1.0,
        fold_threshold: 0.0,
    };
    let mut maps = SurfaceMaps::flat(16);
    let field = WaveField::zeros(8);
    let result = surface::assemble_into(&field, &params, &Executor::Serial, &mut maps);
    assert!(matches!(result, Err(ConfigError::BufferSizeMismatch { .. })));
    assert_eq!(maps, SurfaceMaps::flat(16));
}
