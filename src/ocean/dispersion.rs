//! Time evolution of the initial spectrum via the deep-water dispersion relation.

use glam::Vec2;
use rustfft::num_complex::Complex32;

use super::spectrum::{AmplitudePair, SpectralAmplitude};
use super::{wave_vector, K_EPSILON};
use crate::error::ConfigError;
use crate::exec::Executor;
use crate::params::GRAVITY;

/// Two complex values evolving together (x and z components)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComplexPair {
    pub x: Complex32,
    pub z: Complex32,
}

/// The three coupled N×N buffers of one tick
///
/// Filled in the frequency domain by `evolve_into`; `inverse_fft_2d` turns
/// each buffer into its spatial counterpart in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveField {
    n: usize,
    /// Vertical displacement (height)
    pub height: Vec<Complex32>,
    /// Horizontal (choppy) displacement
    pub displacement: Vec<ComplexPair>,
    /// Height gradient
    pub slope: Vec<ComplexPair>,
}

impl WaveField {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            height: vec![Complex32::default(); n * n],
            displacement: vec![ComplexPair::default(); n * n],
            slope: vec![ComplexPair::default(); n * n],
        }
    }

    pub fn resolution(&self) -> usize {
        self.n
    }

    /// Fail unless every buffer holds exactly `n`×`n` cells
    pub fn check_size(&self, n: usize) -> Result<(), ConfigError> {
        let expected = n * n;
        let buffers = [
            ("height buffer", self.height.len()),
            ("displacement buffer", self.displacement.len()),
            ("slope buffer", self.slope.len()),
        ];
        match buffers.iter().find(|(_, cells)| *cells != expected) {
            Some(&(buffer, cells)) => Err(ConfigError::BufferSizeMismatch {
                buffer,
                cells,
                expected,
            }),
            None => Ok(()),
        }
    }
}

/// Angular frequency ω = sqrt(g·|k|)
pub fn angular_frequency(k_len: f32) -> f32 {
    (GRAVITY * k_len).sqrt()
}

/// h̃(k, t) = h0·e^{iωt} + conj(h0_conj)·e^{−iωt}
pub fn evolve_amplitude(pair: AmplitudePair, k: Vec2, t: f32) -> Complex32 {
    let omega_t = angular_frequency(k.length()) * t;
    let (sin, cos) = omega_t.sin_cos();

    let forward = Complex32::new(cos, sin);
    let backward = Complex32::new(cos, -sin);

    pair.h0 * forward + pair.h0_conj.conj() * backward
}

/// Choppy displacement term i·k̂·h̃/|k| (zero at k = 0)
pub fn displacement_term(hkt: Complex32, k: Vec2) -> ComplexPair {
    let k_len = k.length();
    if k_len < K_EPSILON {
        return ComplexPair::default();
    }

    let dir = k / k_len / k_len;
    let i_hkt = Complex32::new(-hkt.im, hkt.re);
    ComplexPair {
        x: i_hkt * dir.x,
        z: i_hkt * dir.y,
    }
}

/// Slope term i·k·h̃
pub fn slope_term(hkt: Complex32, k: Vec2) -> ComplexPair {
    let i_hkt = Complex32::new(-hkt.im, hkt.re);
    ComplexPair {
        x: i_hkt * k.x,
        z: i_hkt * k.y,
    }
}

/// Fill `out` with the spectrum evolved to time `t` (seconds)
///
/// Height is computed first; displacement and slope are derived from it in
/// two further dispatches. `out` must match the spectrum's resolution.
pub fn evolve_into(
    spectrum: &SpectralAmplitude,
    t: f32,
    exec: &Executor,
    out: &mut WaveField,
) -> Result<(), ConfigError> {
    out.check_size(spectrum.resolution())?;
    fill(spectrum, t, exec, out);
    Ok(())
}

fn fill(spectrum: &SpectralAmplitude, t: f32, exec: &Executor, out: &mut WaveField) {
    let n = spectrum.resolution();
    let cells = spectrum.cells();

    exec.dispatch_rows(&mut out.height, n, |y, row| {
        for (x, hkt) in row.iter_mut().enumerate() {
            *hkt = evolve_amplitude(cells[y * n + x], wave_vector(x, y, n), t);
        }
    });

    let height = &out.height;
    exec.dispatch_rows(&mut out.displacement, n, |y, row| {
        for (x, d) in row.iter_mut().enumerate() {
            *d = displacement_term(height[y * n + x], wave_vector(x, y, n));
        }
    });
    exec.dispatch_rows(&mut out.slope, n, |y, row| {
        for (x, s) in row.iter_mut().enumerate() {
            *s = slope_term(height[y * n + x], wave_vector(x, y, n));
        }
    });
}

/// Allocating form of `evolve_into`
pub fn evolve(spectrum: &SpectralAmplitude, t: f32, exec: &Executor) -> WaveField {
    let mut field = WaveField::zeros(spectrum.resolution());
    fill(spectrum, t, exec, &mut field);
    field
}
