//! Precomputed radix-2 butterfly plan for the inverse FFT.

use bytemuck::{Pod, Zeroable};
use rustfft::num_complex::Complex32;
use std::f64::consts::PI;

use crate::error::ConfigError;
use crate::params::validate_resolution;

/// One butterfly row: output = source[a] + twiddle·source[b]
///
/// Layout matches the GPU storage buffer (16 bytes per entry).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ButterflyEntry {
    pub source_a: u32,
    pub source_b: u32,
    pub twiddle_re: f32,
    pub twiddle_im: f32,
}

impl ButterflyEntry {
    pub fn twiddle(&self) -> Complex32 {
        Complex32::new(self.twiddle_re, self.twiddle_im)
    }
}

/// log2(N) stages of N entries each, shared by both axes and all fields
#[derive(Debug, Clone, PartialEq)]
pub struct ButterflyPlan {
    n: usize,
    passes: u32,
    entries: Vec<ButterflyEntry>,
}

impl ButterflyPlan {
    /// Build plan for an N-point transform (N a power of two, N >= 2)
    pub fn build(n: usize) -> Result<Self, ConfigError> {
        validate_resolution(n)?;

        let passes = n.trailing_zeros();
        let mut entries = vec![ButterflyEntry::zeroed(); passes as usize * n];

        for pass in 0..passes {
            let n_blocks = 1usize << (passes - 1 - pass);
            let n_half = 1usize << pass;
            let stage = &mut entries[pass as usize * n..(pass as usize + 1) * n];

            for block in 0..n_blocks {
                for k in 0..n_half {
                    let i1 = 2 * block * n_half + k;
                    let i2 = i1 + n_half;

                    // First pass gathers from bit-reversed positions; later passes are in place
                    let (j1, j2) = if pass == 0 {
                        (bit_reverse(i1, passes), bit_reverse(i2, passes))
                    } else {
                        (i1, i2)
                    };

                    let theta = 2.0 * PI * (k * n_blocks) as f64 / n as f64;
                    let (wr, wi) = (theta.cos() as f32, theta.sin() as f32);

                    stage[i1] = ButterflyEntry {
                        source_a: j1 as u32,
                        source_b: j2 as u32,
                        twiddle_re: wr,
                        twiddle_im: wi,
                    };
                    stage[i2] = ButterflyEntry {
                        source_a: j1 as u32,
                        source_b: j2 as u32,
                        twiddle_re: -wr,
                        twiddle_im: -wi,
                    };
                }
            }
        }

        log::debug!("Built butterfly plan: N={}, {} passes", n, passes);

        Ok(Self { n, passes, entries })
    }

    /// Transform length N
    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of stages (log2 N)
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Entries of one stage, indexed by output position
    pub fn stage(&self, pass: u32) -> &[ButterflyEntry] {
        let start = pass as usize * self.n;
        &self.entries[start..start + self.n]
    }

    /// All stages back to back (stage-major), as uploaded to the GPU
    pub fn entries(&self) -> &[ButterflyEntry] {
        &self.entries
    }
}

/// Reverse the low `bits` bits of `i`
pub fn bit_reverse(i: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    i.reverse_bits() >> (usize::BITS - bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reverse() {
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(6, 3), 3);
        assert_eq!(bit_reverse(1, 1), 1);
        assert_eq!(bit_reverse(0b0011, 4), 0b1100);
    }

    #[test]
    fn test_first_pass_targets_are_bit_reversed() {
        let plan = ButterflyPlan::build(8).unwrap();
        assert_eq!(plan.passes(), 3);

        let stage = plan.stage(0);
        // Pass 0 pairs adjacent outputs (i1 = 2j, i2 = 2j + 1)
        let targets: Vec<u32> = (0..4)
            .flat_map(|j| [stage[2 * j].source_a, stage[2 * j].source_b])
            .collect();
        assert_eq!(targets, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_later_passes_are_in_place() {
        let plan = ButterflyPlan::build(16).unwrap();
        for pass in 1..plan.passes() {
            let half = 1usize << pass;
            for (i, entry) in plan.stage(pass).iter().enumerate() {
                let i1 = if (i / half) % 2 == 0 { i } else { i - half };
                assert_eq!(entry.source_a as usize, i1);
                assert_eq!(entry.source_b as usize, i1 + half);
            }
        }
    }

    #[test]
    fn test_paired_twiddles_are_negated() {
        let plan = ButterflyPlan::build(32).unwrap();
        for pass in 0..plan.passes() {
            let half = 1usize << pass;
            let stage = plan.stage(pass);
            for (i, entry) in stage.iter().enumerate() {
                if (i / half) % 2 == 0 {
                    let partner = stage[i + half];
                    assert_eq!(partner.twiddle(), -entry.twiddle());
                    assert!((entry.twiddle().norm() - 1.0).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(ButterflyPlan::build(1), Err(ConfigError::TooSmall(1)));
        assert_eq!(ButterflyPlan::build(48), Err(ConfigError::NotPowerOfTwo(48)));
        assert_eq!(ButterflyPlan::build(2).unwrap().entries().len(), 2);
    }
}
