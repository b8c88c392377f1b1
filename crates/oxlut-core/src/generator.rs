//! 3D LUT sampling
//!
//! A [`LutGenerator`] evaluates a [`ProfileChain`] at every node of a
//! `grid × grid × grid` lattice over the unit RGB cube and stores the
//! results as three planar 16-bit channels. Entries are ordered with blue
//! varying fastest:
//!
//! ```text
//! index = r·grid² + g·grid + b
//! ```
//!
//! Each red value owns one contiguous slab of `grid²` entries in every
//! channel, which is the unit of parallel work and of cancellation.

use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::chain::ProfileChain;
use crate::error::{Channel, Error, Result};
use crate::pipeline::GeneratorOptions;

/// Largest quantised value
pub const QUANT_MAX: u32 = 65535;

/// Map a channel value onto `0..=65535`, clamping out-of-gamut values
///
/// NaN quantises to 0.
#[inline]
pub fn quantize(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * QUANT_MAX as f64).round() as u32
}

#[inline]
pub fn lattice_index(r: usize, g: usize, b: usize, grid: usize) -> usize {
    r * grid * grid + g * grid + b
}

/// Inverse of [`lattice_index`], as `(r, g, b)`
#[inline]
pub fn lattice_coords(index: usize, grid: usize) -> (usize, usize, usize) {
    (index / (grid * grid), (index / grid) % grid, index % grid)
}

/// Number of lattice entries, rejecting grids below 2 and overflowing sizes
fn lattice_len(grid: usize) -> Result<usize> {
    if grid < 2 {
        return Err(Error::InvalidGrid(grid));
    }
    grid.checked_mul(grid)
        .and_then(|n| n.checked_mul(grid))
        .ok_or(Error::InvalidGrid(grid))
}

/// A generated table, one planar buffer per output channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut3d {
    pub grid: usize,
    pub r: Vec<u32>,
    pub g: Vec<u32>,
    pub b: Vec<u32>,
}

impl Lut3d {
    /// Entries per channel
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Output at a lattice node
    pub fn get(&self, r: usize, g: usize, b: usize) -> Option<[u32; 3]> {
        if r >= self.grid || g >= self.grid || b >= self.grid {
            return None;
        }
        let i = lattice_index(r, g, b, self.grid);
        Some([self.r[i], self.g[i], self.b[i]])
    }
}

/// Samples profile chains into 3D LUTs
#[derive(Debug, Clone, Default)]
pub struct LutGenerator {
    options: GeneratorOptions,
}

impl LutGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Sample `chain` into freshly allocated buffers
    pub fn generate(&self, chain: &ProfileChain<'_>, grid: usize) -> Result<Lut3d> {
        let len = lattice_len(grid)?;
        let mut lut = Lut3d {
            grid,
            r: vec![0; len],
            g: vec![0; len],
            b: vec![0; len],
        };
        self.generate_into(
            chain,
            grid,
            Some(&mut lut.r[..]),
            Some(&mut lut.g[..]),
            Some(&mut lut.b[..]),
        )?;
        Ok(lut)
    }

    /// Sample `chain` into caller-owned buffers of exactly `grid³` entries
    ///
    /// Buffers are left partially written when sampling fails.
    pub fn generate_into(
        &self,
        chain: &ProfileChain<'_>,
        grid: usize,
        r: Option<&mut [u32]>,
        g: Option<&mut [u32]>,
        b: Option<&mut [u32]>,
    ) -> Result<()> {
        let len = lattice_len(grid)?;
        let r = r.ok_or(Error::NullOutput(Channel::Red))?;
        let g = g.ok_or(Error::NullOutput(Channel::Green))?;
        let b = b.ok_or(Error::NullOutput(Channel::Blue))?;
        for buffer in [&*r, &*g, &*b] {
            if buffer.len() != len {
                return Err(Error::BufferSize {
                    expected: len,
                    actual: buffer.len(),
                });
            }
        }
        if let Some(outputs) = chain.output_dimension().filter(|&n| n != 3) {
            return Err(Error::DimensionMismatch {
                expected: 3,
                actual: outputs,
            });
        }

        let parallel = self.options.parallel;
        info!(grid, samples = len, parallel, "generating 3D LUT");
        let start = Instant::now();

        let slab = grid * grid;
        let sample = |(red, ((rs, gs), bs)): (usize, ((&mut [u32], &mut [u32]), &mut [u32]))| {
            if self.options.is_cancelled() {
                return Err(Error::Cancelled);
            }
            fill_slab(chain, grid, red, rs, gs, bs)
        };

        if parallel {
            r.par_chunks_mut(slab)
                .zip(g.par_chunks_mut(slab))
                .zip(b.par_chunks_mut(slab))
                .enumerate()
                .try_for_each(sample)?;
        } else {
            r.chunks_mut(slab)
                .zip(g.chunks_mut(slab))
                .zip(b.chunks_mut(slab))
                .enumerate()
                .try_for_each(sample)?;
        }

        info!(
            grid,
            samples = len,
            parallel,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "generated 3D LUT"
        );
        Ok(())
    }
}

fn fill_slab(
    chain: &ProfileChain<'_>,
    grid: usize,
    red: usize,
    r: &mut [u32],
    g: &mut [u32],
    b: &mut [u32],
) -> Result<()> {
    let step = (grid - 1) as f64;
    let x = red as f64 / step;
    for green in 0..grid {
        let y = green as f64 / step;
        for blue in 0..grid {
            let out = chain.transform(&[x, y, blue as f64 / step])?;
            let i = green * grid + blue;
            r[i] = quantize(out[0]);
            g[i] = quantize(out[1]);
            b[i] = quantize(out[2]);
        }
    }
    Ok(())
}
