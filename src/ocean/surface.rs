//! Displacement, normal and fold (foam) maps assembled from the spatial fields.

use glam::Vec3;

use super::dispersion::WaveField;
use crate::error::{ConfigError, OceanError};
use crate::exec::Executor;
use crate::params::OceanConfig;

/// Per-tick assembly parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    /// Horizontal displacement multiplier
    pub choppy_scale: f32,
    /// World-space distance between neighboring texels (meters)
    pub texel_size_m: f32,
    /// Jacobian value below which texels fold
    pub fold_threshold: f32,
}

impl SurfaceParams {
    pub fn from_config(config: &OceanConfig) -> Self {
        Self {
            choppy_scale: config.choppy_scale,
            texel_size_m: config.texel_size_m(),
            fold_threshold: config.fold_threshold,
        }
    }
}

/// Renderable maps for one tick, sampled by consumers with wrap-around addressing
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaps {
    n: usize,
    /// (Dx·choppy, height, Dz·choppy) per texel
    pub displacement: Vec<Vec3>,
    /// Unit surface normal per texel
    pub normal: Vec<Vec3>,
    /// Fold intensity in [0, 1]: clamp(threshold − J, 0, 1)
    pub fold: Vec<f32>,
}

/// Summary of one set of maps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStats {
    pub min_height: f32,
    pub max_height: f32,
    pub mean_height: f32,
    /// Fraction of texels with non-zero fold intensity
    pub foam_coverage: f32,
}

impl SurfaceMaps {
    /// Flat, still surface
    pub fn flat(n: usize) -> Self {
        Self {
            n,
            displacement: vec![Vec3::ZERO; n * n],
            normal: vec![Vec3::Y; n * n],
            fold: vec![0.0; n * n],
        }
    }

    pub fn resolution(&self) -> usize {
        self.n
    }

    /// Row-major index of (x, y) with toroidal wrapping (coordinate mod N)
    pub fn index_wrapped(&self, x: isize, y: isize) -> usize {
        let n = self.n as isize;
        (y.rem_euclid(n) * n + x.rem_euclid(n)) as usize
    }

    pub fn displacement_wrapped(&self, x: isize, y: isize) -> Vec3 {
        self.displacement[self.index_wrapped(x, y)]
    }

    pub fn fold_wrapped(&self, x: isize, y: isize) -> f32 {
        self.fold[self.index_wrapped(x, y)]
    }

    /// Bilinear displacement at a continuous texel coordinate, wrapping at the edges
    pub fn sample_displacement(&self, u: f32, v: f32) -> Vec3 {
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        let top = self
            .displacement_wrapped(x0, y0)
            .lerp(self.displacement_wrapped(x0 + 1, y0), fx);
        let bottom = self
            .displacement_wrapped(x0, y0 + 1)
            .lerp(self.displacement_wrapped(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Height range, mean and foam coverage
    pub fn stats(&self) -> SurfaceStats {
        let mut min_height = f32::INFINITY;
        let mut max_height = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for d in &self.displacement {
            min_height = min_height.min(d.y);
            max_height = max_height.max(d.y);
            sum += d.y as f64;
        }
        let count = self.displacement.len().max(1);
        let folded = self.fold.iter().filter(|&&f| f > 0.0).count();

        SurfaceStats {
            min_height,
            max_height,
            mean_height: (sum / count as f64) as f32,
            foam_coverage: folded as f32 / count as f32,
        }
    }

    /// Fail unless every map holds exactly N×N texels
    fn check_size(&self, n: usize) -> Result<(), ConfigError> {
        let expected = n * n;
        let maps = [
            ("displacement map", self.displacement.len()),
            ("normal map", self.normal.len()),
            ("fold map", self.fold.len()),
        ];
        if self.n != n {
            return Err(ConfigError::BufferSizeMismatch {
                buffer: "surface maps",
                cells: self.n * self.n,
                expected,
            });
        }
        match maps.iter().find(|(_, cells)| *cells != expected) {
            Some(&(buffer, cells)) => Err(ConfigError::BufferSizeMismatch {
                buffer,
                cells,
                expected,
            }),
            None => Ok(()),
        }
    }

    /// Fail with `Degenerate` if any map holds NaN or infinity
    pub fn check_finite(&self, time: f32) -> Result<(), OceanError> {
        let bad_vectors = |v: &[Vec3]| v.iter().filter(|d| !d.is_finite()).count();

        let checks = [
            ("displacement map", bad_vectors(&self.displacement[..])),
            ("normal map", bad_vectors(&self.normal[..])),
            ("fold map", self.fold.iter().filter(|f| !f.is_finite()).count()),
        ];
        match checks.iter().find(|(_, count)| *count > 0) {
            Some(&(field, count)) => Err(OceanError::Degenerate { time, field, count }),
            None => Ok(()),
        }
    }
}

/// Build the maps from spatial-domain `field` into `out`
///
/// Displacement is written first; normals and folds follow as separate
/// dispatches, the fold pass reading the finished displacement map. Nothing
/// is written if `field` and `out` differ in size.
pub fn assemble_into(
    field: &WaveField,
    params: &SurfaceParams,
    exec: &Executor,
    out: &mut SurfaceMaps,
) -> Result<(), ConfigError> {
    let n = field.resolution();
    field.check_size(n)?;
    out.check_size(n)?;
    let SurfaceMaps {
        displacement,
        normal,
        fold,
        ..
    } = out;

    let choppy = params.choppy_scale;
    exec.dispatch_rows(&mut displacement[..], n, |y, row| {
        for (x, d) in row.iter_mut().enumerate() {
            let i = y * n + x;
            let horizontal = field.displacement[i];
            *d = Vec3::new(
                horizontal.x.re * choppy,
                field.height[i].re,
                horizontal.z.re * choppy,
            );
        }
    });

    exec.dispatch_rows(&mut normal[..], n, |y, row| {
        for (x, nrm) in row.iter_mut().enumerate() {
            let slope = field.slope[y * n + x];
            *nrm = Vec3::new(-slope.x.re, 1.0, -slope.z.re).normalize();
        }
    });

    let displacement = &*displacement;
    exec.dispatch_rows(&mut fold[..], n, |y, row| {
        for (x, f) in row.iter_mut().enumerate() {
            let j = jacobian(displacement, n, x, y, params.texel_size_m);
            *f = (params.fold_threshold - j).clamp(0.0, 1.0);
        }
    });
    Ok(())
}

/// Jacobian determinant of the horizontal mapping (x, z) → (x + Dx, z + Dz)
///
/// `displacement` already carries the choppy scale. Central differences wrap
/// around the patch edges.
pub fn jacobian(displacement: &[Vec3], n: usize, x: usize, y: usize, texel_size: f32) -> f32 {
    let left = displacement[y * n + (x + n - 1) % n];
    let right = displacement[y * n + (x + 1) % n];
    let up = displacement[((y + n - 1) % n) * n + x];
    let down = displacement[((y + 1) % n) * n + x];

    let inv = 1.0 / (2.0 * texel_size);
    let dx_dx = (right.x - left.x) * inv;
    let dz_dx = (right.z - left.z) * inv;
    let dx_dz = (down.x - up.x) * inv;
    let dz_dz = (down.z - up.z) * inv;

    (1.0 + dx_dx) * (1.0 + dz_dz) - dx_dz * dz_dx
}
