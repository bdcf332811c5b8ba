//! Ocean wave-model parameters with physical units.

use glam::Vec2;

use crate::error::ConfigError;

/// Gravitational acceleration (m/s²) used by the spectrum and dispersion relation
pub const GRAVITY: f32 = 9.81;

/// Ocean simulation parameters
///
/// Changing any field requires a full re-initialization of the simulation
/// (spectrum and butterfly plan are rebuilt from scratch).
#[derive(Debug, Clone, PartialEq)]
pub struct OceanConfig {
    /// FFT resolution N (texels per side, power of two, >= 2)
    pub resolution: usize,

    /// World-space extent of one ocean patch per axis (meters)
    /// The patch tiles seamlessly; one texel spans `grid_size_m / resolution`.
    pub grid_size_m: f32,

    /// Phillips spectrum amplitude scale (dimensionless)
    pub wave_amplitude: f32,

    /// Wind direction in the XZ plane (normalized internally)
    pub wind_direction: Vec2,

    /// Wind speed (m/s), affects largest wave length L = V²/g
    pub wind_speed_m_per_s: f32,

    /// Horizontal displacement multiplier (0 = rolling swell, 1+ = sharp crests)
    pub choppy_scale: f32,

    /// Jacobian value below which a texel counts as folding (foam)
    pub fold_threshold: f32,

    /// Seed for the spectrum's random phases
    pub seed: u64,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            grid_size_m: 64.0,
            wave_amplitude: 0.0002,
            wind_direction: Vec2::new(1.0, 1.0),
            wind_speed_m_per_s: 32.0,
            choppy_scale: 1.0,
            fold_threshold: 0.0,
            seed: 0,
        }
    }
}

impl OceanConfig {
    /// Number of butterfly passes per axis (log2 N)
    pub fn passes(&self) -> u32 {
        self.resolution.trailing_zeros()
    }

    /// Texel spacing in world units (meters)
    pub fn texel_size_m(&self) -> f32 {
        self.grid_size_m / self.resolution as f32
    }

    /// Normalized wind direction; only meaningful after `validate`
    pub fn wind_unit(&self) -> Vec2 {
        self.wind_direction.normalize_or_zero()
    }

    /// Validate configuration (resolution must be a power of two, wind must blow, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_resolution(self.resolution)?;

        let finite = [
            ("grid_size_m", self.grid_size_m),
            ("wave_amplitude", self.wave_amplitude),
            ("wind_direction.x", self.wind_direction.x),
            ("wind_direction.y", self.wind_direction.y),
            ("wind_speed_m_per_s", self.wind_speed_m_per_s),
            ("choppy_scale", self.choppy_scale),
            ("fold_threshold", self.fold_threshold),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite(name));
        }

        if self.wind_speed_m_per_s <= 0.0 {
            return Err(ConfigError::NonPositiveWindSpeed(self.wind_speed_m_per_s));
        }
        if self.wind_direction.length_squared() == 0.0 {
            return Err(ConfigError::ZeroWindDirection);
        }
        if self.grid_size_m <= 0.0 {
            return Err(ConfigError::NonPositiveGridSize(self.grid_size_m));
        }

        Ok(())
    }
}

/// Check that `n` is a usable FFT resolution
pub fn validate_resolution(n: usize) -> Result<(), ConfigError> {
    if n < 2 {
        return Err(ConfigError::TooSmall(n));
    }
    if !n.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo(n));
    }
    Ok(())
}
