//! Pipeline stages
//!
//! Tone curves, matrices and CLUTs, prebuilt from decoded tags.

use crate::icc::{CurveData, TagData};
use crate::icc::tags::{Clut, ElementCurve, LutMatrix};
use crate::math::interpolation::{lut1d_interp, multilinear, tetrahedral};
use crate::math::{Matrix3x3, ParametricCurve};

/// A single tone reproduction curve
///
/// Gamma and parametric curves extend past `[0, 1]` and mirror negative
/// input through the origin. Sampled tables clamp to their end points.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToneCurve {
    #[default]
    Identity,
    Gamma(f64),
    /// Samples normalised to `[0, 1]`, uniformly spaced over the input
    Table(Vec<f64>),
    Parametric(ParametricCurve),
}

impl ToneCurve {
    /// Curve from a `curv`/`para` tag, `None` for any other tag type
    pub fn from_tag(tag: &TagData) -> Option<Self> {
        match tag {
            TagData::Curve(curve) => Some(Self::from(curve)),
            TagData::ParametricCurve(para) => Some(Self::Parametric(para.curve)),
            _ => None,
        }
    }

    /// Encoded → linear
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Gamma(g) => x.signum() * x.abs().powf(*g),
            Self::Table(table) => lut1d_interp(table, x),
            Self::Parametric(curve) => curve.eval(x),
        }
    }

    /// Linear → encoded
    pub fn eval_inverse(&self, y: f64) -> f64 {
        match self {
            Self::Identity => y,
            Self::Gamma(g) if *g > 0.0 => y.signum() * y.abs().powf(1.0 / g),
            Self::Gamma(_) => y,
            Self::Table(table) => invert_table(table, y),
            Self::Parametric(curve) => curve.eval_inverse(y),
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Self::Identity => true,
            Self::Gamma(g) => (*g - 1.0).abs() < 1e-12,
            _ => false,
        }
    }

    /// Whether a sampled table never steps down
    pub fn is_non_decreasing(&self) -> bool {
        match self {
            Self::Table(table) => table.windows(2).all(|w| w[0] <= w[1]),
            _ => true,
        }
    }
}

impl From<&CurveData> for ToneCurve {
    fn from(curve: &CurveData) -> Self {
        match curve {
            CurveData::Identity => Self::Identity,
            CurveData::Gamma(g) => Self::Gamma(*g),
            CurveData::Table(table) => {
                Self::Table(table.iter().map(|&v| f64::from(v) / 65535.0).collect())
            }
        }
    }
}

impl From<&ElementCurve> for ToneCurve {
    fn from(curve: &ElementCurve) -> Self {
        match curve {
            ElementCurve::Sampled(data) => Self::from(data),
            ElementCurve::Parametric(para) => Self::Parametric(para.curve),
        }
    }
}

/// Position in `[0, 1]` at which a non-decreasing table reaches `y`
fn invert_table(table: &[f64], y: f64) -> f64 {
    let n = table.len();
    if n < 2 {
        return y.clamp(0.0, 1.0);
    }
    if y.is_nan() || y <= table[0] {
        return 0.0;
    }
    if y >= table[n - 1] {
        return 1.0;
    }

    // First sample at or above the target
    let (mut lo, mut hi) = (0, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if table[mid] < y {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let span = table[hi] - table[lo];
    let t = if span > 0.0 { (y - table[lo]) / span } else { 0.0 };
    (lo as f64 + t) / (n - 1) as f64
}

/// One curve per channel
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet(pub Vec<ToneCurve>);

impl CurveSet {
    pub fn from_elements(curves: &[ElementCurve]) -> Self {
        Self(curves.iter().map(ToneCurve::from).collect())
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().all(ToneCurve::is_identity)
    }

    pub fn apply(&self, values: &mut [f64]) {
        for (v, curve) in values.iter_mut().zip(&self.0) {
            *v = curve.eval(*v);
        }
    }

    pub fn apply_inverse(&self, values: &mut [f64]) {
        for (v, curve) in values.iter_mut().zip(&self.0) {
            *v = curve.eval_inverse(*v);
        }
    }
}

/// 3×3 matrix plus offset
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStage {
    pub matrix: Matrix3x3,
    pub offset: [f64; 3],
}

impl MatrixStage {
    pub fn new(matrix: Matrix3x3) -> Self {
        Self {
            matrix,
            offset: [0.0; 3],
        }
    }

    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let m = self.matrix.multiply_vec(v);
        [m[0] + self.offset[0], m[1] + self.offset[1], m[2] + self.offset[2]]
    }
}

impl From<&LutMatrix> for MatrixStage {
    fn from(lut: &LutMatrix) -> Self {
        Self {
            matrix: Matrix3x3::new(lut.matrix),
            offset: lut.offset,
        }
    }
}

/// Colour lookup table with normalised samples
#[derive(Debug, Clone, PartialEq)]
pub struct ClutStage {
    grid: Vec<usize>,
    outputs: usize,
    data: Vec<f64>,
}

impl ClutStage {
    pub fn inputs(&self) -> usize {
        self.grid.len()
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Tetrahedral for three inputs, multilinear otherwise
    pub fn eval(&self, input: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.outputs];
        if let ([g0, g1, g2], [x, y, z]) = (self.grid.as_slice(), input) {
            tetrahedral(&self.data, [*g0, *g1, *g2], self.outputs, [*x, *y, *z], &mut out);
        } else {
            multilinear(&self.data, &self.grid, self.outputs, input, &mut out);
        }
        out
    }
}

impl From<&Clut> for ClutStage {
    fn from(clut: &Clut) -> Self {
        Self {
            grid: clut.grid_points.iter().map(|&g| usize::from(g)).collect(),
            outputs: clut.output_channels,
            data: clut.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::ParametricCurveData;
    use crate::math::ParametricCurveType;

    #[test]
    fn test_gamma_round_trip() {
        let trc = ToneCurve::Gamma(2.2);
        assert!((trc.eval(0.5) - 0.5_f64.powf(2.2)).abs() < 1e-12);
        for i in 0..=255 {
            let x = f64::from(i) / 255.0;
            assert!((trc.eval_inverse(trc.eval(x)) - x).abs() < 1e-9, "{x}");
        }
    }

    #[test]
    fn test_gamma_extends_and_mirrors() {
        let trc = ToneCurve::Gamma(2.0);
        assert!((trc.eval(1.5) - 2.25).abs() < 1e-12);
        assert!((trc.eval(-0.5) + 0.25).abs() < 1e-12);
        assert!((trc.eval_inverse(-0.25) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_table_clamps() {
        let trc = ToneCurve::from(&CurveData::Table(vec![0, 32768, 65535]));
        assert!((trc.eval(0.25) - 0.25).abs() < 1e-4);
        assert_eq!(trc.eval(-1.0), 0.0);
        assert_eq!(trc.eval(3.0), 1.0);
        assert_eq!(trc.eval_inverse(2.0), 1.0);
        assert_eq!(trc.eval_inverse(-2.0), 0.0);
    }

    #[test]
    fn test_table_inverse() {
        let table: Vec<f64> = (0..=1024).map(|i| (f64::from(i) / 1024.0).powf(2.2)).collect();
        let trc = ToneCurve::Table(table);
        for x in [0.1, 0.37, 0.5, 0.92] {
            assert!((trc.eval_inverse(trc.eval(x)) - x).abs() < 1e-4, "{x}");
        }
    }

    #[test]
    fn test_flat_run_inverse() {
        let trc = ToneCurve::Table(vec![0.0, 0.5, 0.5, 1.0]);
        assert!(trc.is_non_decreasing());
        assert!((trc.eval_inverse(0.5) - 1.0 / 3.0).abs() < 1e-12);
        assert!((trc.eval_inverse(0.75) - 5.0 / 6.0).abs() < 1e-12);

        assert!(!ToneCurve::Table(vec![1.0, 0.5, 0.0]).is_non_decreasing());
        assert!(ToneCurve::Gamma(2.2).is_non_decreasing());
    }

    #[test]
    fn test_from_tag() {
        let curve = ParametricCurve::from_params(ParametricCurveType::Gamma, &[2.4]).unwrap();
        let tag = TagData::ParametricCurve(ParametricCurveData { curve });
        assert_eq!(ToneCurve::from_tag(&tag), Some(ToneCurve::Parametric(curve)));
        assert_eq!(
            ToneCurve::from_tag(&TagData::Curve(CurveData::Identity)),
            Some(ToneCurve::Identity)
        );
        assert_eq!(ToneCurve::from_tag(&TagData::ChromaticAdaptation([[0.0; 3]; 3])), None);
    }

    #[test]
    fn test_matrix_stage_offset() {
        let stage = MatrixStage {
            matrix: Matrix3x3::diagonal(2.0, 1.0, 0.5),
            offset: [0.1, 0.0, -0.1],
        };
        assert_eq!(stage.apply([1.0, 1.0, 1.0]), [2.1, 1.0, 0.4]);
    }

    #[test]
    fn test_clut_stage() {
        let clut = Clut {
            grid_points: vec![2, 2, 2],
            output_channels: 1,
            data: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        };
        let stage = ClutStage::from(&clut);
        assert_eq!(stage.inputs(), 3);
        assert_eq!(stage.eval(&[1.0, 1.0, 1.0]), vec![1.0]);
        assert_eq!(stage.eval(&[0.0, 0.0, 0.0]), vec![0.0]);
    }
}
