//! Phillips wave spectrum and the initial frequency-domain amplitude field.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustfft::num_complex::Complex32;

use super::gaussian::GaussianSampler;
use super::{wave_vector, K_EPSILON};
use crate::error::ConfigError;
use crate::params::{validate_resolution, OceanConfig, GRAVITY};

/// Phillips spectrum for a wind blowing over deep water
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhillipsSpectrum {
    /// Amplitude scale A
    pub amplitude: f32,
    /// Unit wind direction
    pub wind_unit: Vec2,
    /// Wind speed (m/s)
    pub wind_speed: f32,
}

impl PhillipsSpectrum {
    /// Create spectrum; `wind_direction` is normalized here
    pub fn new(amplitude: f32, wind_direction: Vec2, wind_speed: f32) -> Self {
        Self {
            amplitude,
            wind_unit: wind_direction.normalize_or_zero(),
            wind_speed,
        }
    }

    pub fn from_config(config: &OceanConfig) -> Self {
        Self::new(
            config.wave_amplitude,
            config.wind_unit(),
            config.wind_speed_m_per_s,
        )
    }

    /// Largest wave arising from a continuous wind (L = V²/g, meters)
    pub fn largest_wave(&self) -> f32 {
        self.wind_speed * self.wind_speed / GRAVITY
    }

    /// Energy density P(k) = A·exp(−1/(k²L²))/k⁴·(k̂·ŵ)²
    ///
    /// Zero for |k| < `K_EPSILON`.
    pub fn density(&self, k: Vec2) -> f32 {
        let k_len = k.length();
        if k_len < K_EPSILON {
            return 0.0;
        }

        let k_len2 = k_len * k_len;
        let k_len4 = k_len2 * k_len2;

        let k_dot_w = (k / k_len).dot(self.wind_unit);
        let l = self.largest_wave();

        self.amplitude * (-1.0 / (k_len2 * l * l)).exp() / k_len4 * k_dot_w * k_dot_w
    }
}

/// Initial amplitudes for one grid cell: h0(k) and the independent draw for −k
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AmplitudePair {
    pub h0: Complex32,
    pub h0_conj: Complex32,
}

/// Immutable N×N initial spectrum, regenerated only by full re-initialization
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralAmplitude {
    n: usize,
    cells: Vec<AmplitudePair>,
}

impl SpectralAmplitude {
    /// Generate spectrum from a seed (bit-identical for identical inputs)
    pub fn generate(
        n: usize,
        seed: u64,
        spectrum: &PhillipsSpectrum,
    ) -> Result<Self, ConfigError> {
        validate_resolution(n)?;
        let field = Self::generate_with_rng(n, spectrum, ChaCha8Rng::seed_from_u64(seed));
        log::debug!("Generated {}x{} spectrum (seed {})", n, n, seed);
        Ok(field)
    }

    /// Generate spectrum drawing from a caller-supplied uniform source
    ///
    /// Cells are visited row by row; each cell draws its h0 pair before its h0_conj pair.
    pub fn generate_with_rng<R: Rng>(n: usize, spectrum: &PhillipsSpectrum, rng: R) -> Self {
        let mut sampler = GaussianSampler::new(rng);
        let mut cells = Vec::with_capacity(n * n);

        for y in 0..n {
            for x in 0..n {
                let p = spectrum.density(wave_vector(x, y, n));
                let scale = (p / 2.0).sqrt();

                let h0 = sampler.sample() * scale;
                let h0_conj = sampler.sample() * scale;
                cells.push(AmplitudePair { h0, h0_conj });
            }
        }

        Self { n, cells }
    }

    /// Grid resolution N
    pub fn resolution(&self) -> usize {
        self.n
    }

    /// Row-major cells (index y·N + x)
    pub fn cells(&self) -> &[AmplitudePair] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> AmplitudePair {
        self.cells[y * self.n + x]
    }
}
