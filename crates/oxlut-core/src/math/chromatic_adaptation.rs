//! Chromatic adaptation transforms and black-point compensation
//!
//! An adaptation matrix maps XYZ measured under one white onto another white
//! by scaling in a cone response space:
//!
//! ```text
//! M = F⁻¹ · diag(ρ_dst/ρ_src, γ_dst/γ_src, β_dst/β_src) · F
//! ```
//!
//! References:
//! - ICC.1:2022 Annex E
//! - Lindbloom: http://www.brucelindbloom.com/index.html?Eqn_ChromAdapt.html

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::math::Matrix3x3;

/// Cone response model used to build adaptation matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromaticAdaptationMethod {
    /// Bradford (ICC default)
    #[default]
    Bradford,
    /// CIECAM02 CAT02
    Cat02,
    /// Von Kries (Hunt-Pointer-Estevez)
    VonKries,
}

const BRADFORD: Matrix3x3 = Matrix3x3::new([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

const BRADFORD_INV: Matrix3x3 = Matrix3x3::new([
    [0.9869929, -0.1470543, 0.1599627],
    [0.4323053, 0.5183603, 0.0492912],
    [-0.00852866, 0.0400428, 0.9684867],
]);

const CAT02: Matrix3x3 = Matrix3x3::new([
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
]);

const CAT02_INV: Matrix3x3 = Matrix3x3::new([
    [1.096123820835514, -0.278869000218287, 0.182745179382773],
    [0.454369041975359, 0.473533154307412, 0.072097803717229],
    [-0.009627608738429, -0.005698031216113, 1.015325639954543],
]);

const VON_KRIES: Matrix3x3 = Matrix3x3::new([
    [0.40024, 0.7076, -0.08081],
    [-0.2263, 1.16532, 0.0457],
    [0.0, 0.0, 0.91822],
]);

const VON_KRIES_INV: Matrix3x3 = Matrix3x3::new([
    [1.8599364, -1.1293816, 0.2198974],
    [0.3611914, 0.6388125, -0.0000064],
    [0.0, 0.0, 1.0890636],
]);

impl ChromaticAdaptationMethod {
    pub const ALL: [Self; 3] = [Self::Bradford, Self::Cat02, Self::VonKries];

    /// XYZ → cone response
    #[inline]
    pub const fn forward(self) -> Matrix3x3 {
        match self {
            Self::Bradford => BRADFORD,
            Self::Cat02 => CAT02,
            Self::VonKries => VON_KRIES,
        }
    }

    /// Cone response → XYZ
    #[inline]
    pub const fn inverse(self) -> Matrix3x3 {
        match self {
            Self::Bradford => BRADFORD_INV,
            Self::Cat02 => CAT02_INV,
            Self::VonKries => VON_KRIES_INV,
        }
    }
}

/// Matrix that maps colours measured under `src_white` onto `pcs_white`
///
/// Fails with [`Error::DegenerateWhitePoint`] when a cone component of the
/// source white is zero or a scale factor is not finite.
pub fn compute_adaptation_matrix(
    pcs_white: &Xyz,
    src_white: &Xyz,
    method: ChromaticAdaptationMethod,
) -> Result<Matrix3x3> {
    let forward = method.forward();
    let pcs = forward.multiply_vec(pcs_white.to_array());
    let src = forward.multiply_vec(src_white.to_array());

    let mut scale = [0.0; 3];
    for i in 0..3 {
        let factor = pcs[i] / src[i];
        if src[i] == 0.0 || !factor.is_finite() {
            return Err(Error::DegenerateWhitePoint(src_white.to_array()));
        }
        scale[i] = factor;
    }

    let diag = Matrix3x3::diagonal(scale[0], scale[1], scale[2]);
    Ok(method.inverse().multiply(&diag.multiply(&forward)))
}

#[inline]
pub fn apply_adaptation(matrix: &Matrix3x3, xyz: Xyz) -> Xyz {
    matrix.apply(xyz)
}

/// Scale a point so that zero lands on `black`, keeping `white` fixed
pub fn compensate(point: Xyz, white: &Xyz, black: &Xyz) -> Result<Xyz> {
    let ratio = black
        .div_components(white)
        .ok_or(Error::DegenerateWhitePoint(white.to_array()))?;
    Ok(Xyz::new(
        point.x * (1.0 - ratio.x) + black.x,
        point.y * (1.0 - ratio.y) + black.y,
        point.z * (1.0 - ratio.z) + black.z,
    ))
}

/// Inverse of [`compensate`]: `black` lands on zero
pub fn uncompensate(point: Xyz, white: &Xyz, black: &Xyz) -> Result<Xyz> {
    let ratio = black
        .div_components(white)
        .ok_or(Error::DegenerateWhitePoint(white.to_array()))?;
    let unscale = |p: f64, b: f64, r: f64| {
        let denom = 1.0 - r;
        if denom == 0.0 { 0.0 } else { (p - b) / denom }
    };
    Ok(Xyz::new(
        unscale(point.x, black.x, ratio.x),
        unscale(point.y, black.y, ratio.y),
        unscale(point.z, black.z, ratio.z),
    ))
}
