//! Separable 2D inverse FFT driven by a precomputed butterfly plan.
//!
//! Each stage reads only the previous stage's buffer and writes the other
//! (ping-pong). Rows are transformed first, then columns, then every cell is
//! multiplied by (−1)^(x+y) to move the zero frequency to the grid center.

use rustfft::num_complex::Complex32;

use super::butterfly::{ButterflyEntry, ButterflyPlan};
use super::dispersion::ComplexPair;
use crate::error::ConfigError;
use crate::exec::Executor;

/// Values the butterfly can combine
pub trait Spectral: Copy + Default + Send + Sync {
    /// a + w·b
    fn butterfly(a: Self, b: Self, w: Complex32) -> Self;

    fn negate(self) -> Self;
}

impl Spectral for Complex32 {
    #[inline]
    fn butterfly(a: Self, b: Self, w: Complex32) -> Self {
        a + w * b
    }

    #[inline]
    fn negate(self) -> Self {
        -self
    }
}

impl Spectral for ComplexPair {
    #[inline]
    fn butterfly(a: Self, b: Self, w: Complex32) -> Self {
        ComplexPair {
            x: a.x + w * b.x,
            z: a.z + w * b.z,
        }
    }

    #[inline]
    fn negate(self) -> Self {
        ComplexPair {
            x: -self.x,
            z: -self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Rows,
    Columns,
}

/// Transform `field` (N×N, row-major) from frequency to spatial domain in place
///
/// `scratch` is the second ping-pong buffer; it is resized as needed and its
/// contents are garbage afterwards. The transform is unnormalized.
pub fn inverse_fft_2d<T: Spectral>(
    field: &mut Vec<T>,
    scratch: &mut Vec<T>,
    plan: &ButterflyPlan,
    exec: &Executor,
) -> Result<(), ConfigError> {
    let n = plan.size();
    if field.len() != n * n {
        return Err(ConfigError::PlanSizeMismatch {
            plan: n,
            cells: field.len(),
        });
    }
    if scratch.len() != field.len() {
        scratch.clear();
        scratch.resize(field.len(), T::default());
    }

    for axis in [Axis::Rows, Axis::Columns] {
        for pass in 0..plan.passes() {
            butterfly_stage(field, scratch, plan.stage(pass), n, axis, exec);
            std::mem::swap(field, scratch);
        }
    }

    recenter(field, n, exec);
    Ok(())
}

/// Run one stage: every output cell combines two cells of `src`
fn butterfly_stage<T: Spectral>(
    src: &[T],
    dst: &mut [T],
    stage: &[ButterflyEntry],
    n: usize,
    axis: Axis,
    exec: &Executor,
) {
    match axis {
        Axis::Rows => exec.dispatch_rows(dst, n, |y, row| {
            let src_row = &src[y * n..(y + 1) * n];
            for (out, entry) in row.iter_mut().zip(stage) {
                *out = T::butterfly(
                    src_row[entry.source_a as usize],
                    src_row[entry.source_b as usize],
                    entry.twiddle(),
                );
            }
        }),
        Axis::Columns => exec.dispatch_rows(dst, n, |y, row| {
            let entry = stage[y];
            let a = entry.source_a as usize * n;
            let b = entry.source_b as usize * n;
            let (row_a, row_b) = (&src[a..a + n], &src[b..b + n]);
            let w = entry.twiddle();
            for ((out, &va), &vb) in row.iter_mut().zip(row_a).zip(row_b) {
                *out = T::butterfly(va, vb, w);
            }
        }),
    }
}

/// Multiply cell (x, y) by (−1)^(x+y)
fn recenter<T: Spectral>(field: &mut [T], n: usize, exec: &Executor) {
    exec.dispatch_rows(field, n, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            if (x + y) & 1 == 1 {
                *v = v.negate();
            }
        }
    });
}
