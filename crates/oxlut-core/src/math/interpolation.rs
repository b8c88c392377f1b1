//! Interpolation for sampled curves and colour lookup tables
//!
//! Grids are stored with the last input dimension varying fastest and
//! `outputs` values per node. Inputs are clamped to `[0, 1]`.

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Position of `x` on an axis with `points` nodes: (lower node, fraction)
#[inline]
fn locate(x: f64, points: usize) -> (usize, f64) {
    let max = (points - 1) as f64;
    let pos = unit(x) * max;
    let lo = (pos.floor() as usize).min(points.saturating_sub(2));
    (lo, pos - lo as f64)
}

/// Piecewise-linear lookup in a uniformly spaced 1D table
pub fn lut1d_interp(table: &[f64], input: f64) -> f64 {
    match table.len() {
        0 => unit(input),
        1 => table[0],
        n => {
            let (lo, t) = locate(input, n);
            lerp(table[lo], table[lo + 1], t)
        }
    }
}

/// Tetrahedral interpolation in a 3-input grid with any number of outputs
///
/// `grid` holds the node count per input dimension.
pub fn tetrahedral(data: &[f64], grid: [usize; 3], outputs: usize, input: [f64; 3], out: &mut [f64]) {
    let (x0, rx) = locate(input[0], grid[0]);
    let (y0, ry) = locate(input[1], grid[1]);
    let (z0, rz) = locate(input[2], grid[2]);

    let sz = outputs;
    let sy = grid[2] * sz;
    let sx = grid[1] * sy;

    let base = x0 * sx + y0 * sy + z0 * sz;
    // Single-node axes have no neighbour to step to
    let dx = if grid[0] > 1 { sx } else { 0 };
    let dy = if grid[1] > 1 { sy } else { 0 };
    let dz = if grid[2] > 1 { sz } else { 0 };

    let at = |offset: usize, c: usize| data.get(base + offset + c).copied().unwrap_or(0.0);

    for (c, value) in out.iter_mut().enumerate().take(outputs) {
        let c000 = at(0, c);
        let c100 = at(dx, c);
        let c010 = at(dy, c);
        let c001 = at(dz, c);
        let c110 = at(dx + dy, c);
        let c101 = at(dx + dz, c);
        let c011 = at(dy + dz, c);
        let c111 = at(dx + dy + dz, c);

        let (c1, c2, c3) = if rx >= ry && ry >= rz {
            (c100 - c000, c110 - c100, c111 - c110)
        } else if rx >= rz && rz >= ry {
            (c100 - c000, c111 - c101, c101 - c100)
        } else if rz >= rx && rx >= ry {
            (c101 - c001, c111 - c101, c001 - c000)
        } else if ry >= rx && rx >= rz {
            (c110 - c010, c010 - c000, c111 - c110)
        } else if ry >= rz && rz >= rx {
            (c111 - c011, c010 - c000, c011 - c010)
        } else {
            (c111 - c011, c011 - c001, c001 - c000)
        };

        *value = c000 + c1 * rx + c2 * ry + c3 * rz;
    }
}

/// Multilinear interpolation over any number of inputs
pub fn multilinear(data: &[f64], grid: &[usize], outputs: usize, input: &[f64], out: &mut [f64]) {
    let dims = grid.len();
    let mut strides = vec![outputs; dims];
    for d in (0..dims.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * grid[d + 1];
    }

    let cells: Vec<(usize, f64)> = grid
        .iter()
        .zip(input)
        .map(|(&points, &x)| locate(x, points))
        .collect();
    let base: usize = cells.iter().zip(&strides).map(|((lo, _), s)| lo * s).sum();

    out.iter_mut().take(outputs).for_each(|v| *v = 0.0);
    for corner in 0..(1usize << dims) {
        let mut weight = 1.0;
        let mut offset = base;
        for d in 0..dims {
            let (_, t) = cells[d];
            if corner & (1 << (dims - 1 - d)) != 0 {
                weight *= t;
                if grid[d] > 1 {
                    offset += strides[d];
                }
            } else {
                weight *= 1.0 - t;
            }
        }
        if weight == 0.0 {
            continue;
        }
        for (c, value) in out.iter_mut().enumerate().take(outputs) {
            *value += weight * data.get(offset + c).copied().unwrap_or(0.0);
        }
    }
}
