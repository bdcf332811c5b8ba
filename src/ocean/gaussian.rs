//! Standard-normal complex draws from a uniform source.

use rand::Rng;
use rustfft::num_complex::Complex32;

/// Gaussian sampler using the polar form of the Box–Muller transform
pub struct GaussianSampler<R> {
    rng: R,
}

impl<R: Rng> GaussianSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw two independent N(0, 1) values as one complex number
    ///
    /// Points are drawn uniformly from [-1, 1)² and rejected until they land
    /// inside the unit disk. Acceptance is π/4 per attempt, so the expected
    /// number of attempts is about 1.27.
    pub fn sample(&mut self) -> Complex32 {
        loop {
            let x1 = 2.0 * self.rng.gen::<f32>() - 1.0;
            let x2 = 2.0 * self.rng.gen::<f32>() - 1.0;
            let w = x1 * x1 + x2 * x2;

            // w == 0 would give ln(0); that point has measure zero
            if w < 1.0 && w > 0.0 {
                let s = ((-2.0 * w.ln()) / w).sqrt();
                return Complex32::new(x1 * s, x2 * s);
            }
        }
    }
}
