//! Spectral ocean surface simulation.
//!
//! Pipeline per tick: `dispersion::evolve_into` → `ifft::inverse_fft_2d`
//! (rows, then columns) → `surface::assemble_into`. The spectrum and the
//! butterfly plan are built once per configuration.

pub mod butterfly;
pub mod dispersion;
pub mod gaussian;
pub mod ifft;
pub mod spectrum;
pub mod surface;
mod system;

use glam::Vec2;
use std::f32::consts::PI;

// Re-export public types
pub use butterfly::{bit_reverse, ButterflyEntry, ButterflyPlan};
pub use dispersion::{ComplexPair, WaveField};
pub use gaussian::GaussianSampler;
pub use ifft::Spectral;
pub use spectrum::{AmplitudePair, PhillipsSpectrum, SpectralAmplitude};
pub use surface::{SurfaceMaps, SurfaceParams, SurfaceStats};
pub use system::SimulationState;

/// Wavevectors shorter than this carry no energy and are never divided by
pub const K_EPSILON: f32 = 1e-6;

/// Wavevector for grid index (x, y): k = (2π/N)·(2x − N, 2y − N)
///
/// The center texel (N/2, N/2) is the zero wavevector.
pub fn wave_vector(x: usize, y: usize, n: usize) -> Vec2 {
    let scale = 2.0 * PI / n as f32;
    let nf = n as f32;
    Vec2::new(
        scale * (2.0 * x as f32 - nf),
        scale * (2.0 * y as f32 - nf),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_wave_vector_is_zero() {
        assert_eq!(wave_vector(32, 32, 64), Vec2::ZERO);
        assert_eq!(wave_vector(1, 1, 2), Vec2::ZERO);
    }

    #[test]
    fn test_wave_vector_spacing() {
        let n = 16;
        let step = wave_vector(9, 8, n) - wave_vector(8, 8, n);
        assert!((step.x - 4.0 * PI / n as f32).abs() < 1e-6);
        assert_eq!(step.y, 0.0);
    }
}
