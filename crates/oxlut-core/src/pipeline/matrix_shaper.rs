//! Matrix/TRC profile models
//!
//! RGB matrix-shaper profiles carry three colorants and three TRCs:
//!
//! ```text
//! RGB → TRC decode → colorant matrix → PCS XYZ
//! PCS XYZ → inverse matrix → TRC encode → RGB
//! ```
//!
//! Monochrome profiles carry a single `kTRC` whose output is the PCS Y, with
//! X and Z following the PCS illuminant.

use crate::color::Xyz;
use crate::icc::{IccError, IccProfile, TagSignature};
use crate::math::Matrix3x3;

use super::stages::ToneCurve;

fn trc(profile: &IccProfile, sig: TagSignature) -> Result<Option<ToneCurve>, IccError> {
    match profile.get_tag(sig) {
        None => Ok(None),
        Some(tag) => {
            let curve = ToneCurve::from_tag(tag)
                .ok_or_else(|| IccError::CorruptedData(format!("{sig} is not a curve")))?;
            if !curve.is_non_decreasing() {
                return Err(IccError::CorruptedData(format!("{sig} steps down")));
            }
            Ok(Some(curve))
        }
    }
}

/// RGB matrix-shaper
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixShaper {
    trc: [ToneCurve; 3],
    matrix: Matrix3x3,
    inverse: Matrix3x3,
}

impl MatrixShaper {
    pub fn new(trc: [ToneCurve; 3], matrix: Matrix3x3) -> Result<Self, IccError> {
        let inverse = matrix
            .inverse()
            .ok_or_else(|| IccError::CorruptedData("colorant matrix is singular".to_string()))?;
        Ok(Self {
            trc,
            matrix,
            inverse,
        })
    }

    /// `None` when the profile lacks any colorant or TRC tag
    pub fn from_icc(profile: &IccProfile) -> Result<Option<Self>, IccError> {
        let colorants = (
            profile.xyz(TagSignature::RED_COLORANT),
            profile.xyz(TagSignature::GREEN_COLORANT),
            profile.xyz(TagSignature::BLUE_COLORANT),
        );
        let (Some(red), Some(green), Some(blue)) = colorants else {
            return Ok(None);
        };

        let curves = (
            trc(profile, TagSignature::RED_TRC)?,
            trc(profile, TagSignature::GREEN_TRC)?,
            trc(profile, TagSignature::BLUE_TRC)?,
        );
        let (Some(r), Some(g), Some(b)) = curves else {
            return Ok(None);
        };

        Self::new([r, g, b], Matrix3x3::from_columns(red, green, blue)).map(Some)
    }

    pub fn matrix(&self) -> &Matrix3x3 {
        &self.matrix
    }

    pub fn to_pcs(&self, rgb: [f64; 3]) -> Xyz {
        let linear = [
            self.trc[0].eval(rgb[0]),
            self.trc[1].eval(rgb[1]),
            self.trc[2].eval(rgb[2]),
        ];
        Xyz::from_array(self.matrix.multiply_vec(linear))
    }

    pub fn from_pcs(&self, xyz: Xyz) -> [f64; 3] {
        let linear = self.inverse.multiply_vec(xyz.to_array());
        [
            self.trc[0].eval_inverse(linear[0]),
            self.trc[1].eval_inverse(linear[1]),
            self.trc[2].eval_inverse(linear[2]),
        ]
    }
}

/// Monochrome `kTRC` model
#[derive(Debug, Clone, PartialEq)]
pub struct GrayShaper {
    trc: ToneCurve,
    white: Xyz,
}

impl GrayShaper {
    pub fn new(trc: ToneCurve, white: Xyz) -> Self {
        Self { trc, white }
    }

    pub fn from_icc(profile: &IccProfile, white: Xyz) -> Result<Option<Self>, IccError> {
        Ok(trc(profile, TagSignature::GRAY_TRC)?.map(|curve| Self::new(curve, white)))
    }

    pub fn to_pcs(&self, gray: f64) -> Xyz {
        self.white.scale(self.trc.eval(gray))
    }

    pub fn from_pcs(&self, xyz: Xyz) -> f64 {
        self.trc.eval_inverse(xyz.y)
    }
}
