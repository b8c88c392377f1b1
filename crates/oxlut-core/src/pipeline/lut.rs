//! LUT-based profile transforms (`mft1`, `mft2`, `mAB `, `mBA `)
//!
//! A [`LutPipeline`] is a flat list of curve, matrix and CLUT stages working on
//! normalised values. PCS values are decoded from (or encoded to) the
//! normalised LUT encoding at the pipeline boundary:
//!
//! | PCS            | normalised `v` → PCS                             |
//! |----------------|--------------------------------------------------|
//! | XYZ            | `v · 65535/32768`                                |
//! | Lab            | `L = v·100`, `a, b = v·255 − 128`                |
//! | Lab (legacy)   | as Lab after scaling `v` by `65535/65280`        |
//!
//! The legacy Lab encoding is the 16-bit one used by `mft2` tags.

use crate::icc::tags::{ElementCurve, MabData, MabDirection, MftData, MftPrecision};
use crate::icc::{ColorSpace, IccError, TagData};
use crate::math::Matrix3x3;

use super::Direction;
use super::stages::{ClutStage, CurveSet, MatrixStage, ToneCurve};

const XYZ_SCALE: f64 = 65535.0 / 32768.0;
const LEGACY_LAB_SCALE: f64 = 65535.0 / 65280.0;

/// How PCS values are carried through a LUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcsEncoding {
    Xyz,
    Lab,
    LabLegacy,
}

impl PcsEncoding {
    fn for_tag(pcs: ColorSpace, legacy: bool) -> Result<Self, IccError> {
        match pcs {
            ColorSpace::Xyz => Ok(Self::Xyz),
            ColorSpace::Lab if legacy => Ok(Self::LabLegacy),
            ColorSpace::Lab => Ok(Self::Lab),
            other => Err(IccError::Unsupported(format!("{other:?} as connection space"))),
        }
    }

    /// Normalised → PCS
    pub fn decode(self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Self::Xyz => v.map(|x| x * XYZ_SCALE),
            Self::Lab => [v[0] * 100.0, v[1] * 255.0 - 128.0, v[2] * 255.0 - 128.0],
            Self::LabLegacy => Self::Lab.decode(v.map(|x| x * LEGACY_LAB_SCALE)),
        }
    }

    /// PCS → normalised
    pub fn encode(self, p: [f64; 3]) -> [f64; 3] {
        match self {
            Self::Xyz => p.map(|x| x / XYZ_SCALE),
            Self::Lab => [p[0] / 100.0, (p[1] + 128.0) / 255.0, (p[2] + 128.0) / 255.0],
            Self::LabLegacy => Self::Lab.encode(p).map(|x| x / LEGACY_LAB_SCALE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LutStage {
    Curves(CurveSet),
    Matrix(MatrixStage),
    Clut(ClutStage),
}

/// A prebuilt A2B or B2A transform
#[derive(Debug, Clone, PartialEq)]
pub struct LutPipeline {
    direction: Direction,
    input_channels: usize,
    output_channels: usize,
    encoding: PcsEncoding,
    stages: Vec<LutStage>,
}

impl LutPipeline {
    /// Build from an `A2Bn`/`B2An` tag. `pcs` is the profile's connection space.
    pub fn from_tag(tag: &TagData, direction: Direction, pcs: ColorSpace) -> Result<Self, IccError> {
        match tag {
            TagData::Lut8(mft) | TagData::Lut16(mft) => Self::from_mft(mft, direction, pcs),
            TagData::LutAToB(mab) | TagData::LutBToA(mab) => {
                let expected = match direction {
                    Direction::DeviceToReference => MabDirection::AToB,
                    Direction::ReferenceToDevice => MabDirection::BToA,
                };
                if mab.direction != expected {
                    return Err(IccError::CorruptedData(format!(
                        "{:?} table used for {direction:?}",
                        mab.direction
                    )));
                }
                Self::from_mab(mab, pcs)
            }
            _ => Err(IccError::Unsupported("tag is not a lookup table".to_string())),
        }
    }

    pub fn from_mft(mft: &MftData, direction: Direction, pcs: ColorSpace) -> Result<Self, IccError> {
        let encoding = PcsEncoding::for_tag(pcs, mft.precision == MftPrecision::Lut16)?;
        check_pcs_side(direction, mft.input_channels, mft.output_channels)?;

        let mut stages = Vec::with_capacity(4);
        // The mft matrix only applies to XYZ input
        if direction == Direction::ReferenceToDevice && pcs == ColorSpace::Xyz && !mft.matrix_is_identity() {
            stages.push(LutStage::Matrix(MatrixStage::new(Matrix3x3::new(mft.matrix))));
        }
        stages.push(LutStage::Curves(tables(&mft.input_tables)));
        stages.push(LutStage::Clut(ClutStage::from(&mft.clut)));
        stages.push(LutStage::Curves(tables(&mft.output_tables)));

        Ok(Self {
            direction,
            input_channels: mft.input_channels,
            output_channels: mft.output_channels,
            encoding,
            stages,
        })
    }

    pub fn from_mab(mab: &MabData, pcs: ColorSpace) -> Result<Self, IccError> {
        let encoding = PcsEncoding::for_tag(pcs, false)?;
        let direction = match mab.direction {
            MabDirection::AToB => Direction::DeviceToReference,
            MabDirection::BToA => Direction::ReferenceToDevice,
        };
        check_pcs_side(direction, mab.input_channels, mab.output_channels)?;
        if mab.clut.is_none() && mab.input_channels != mab.output_channels {
            return Err(IccError::CorruptedData(
                "lut without CLUT changes channel count".to_string(),
            ));
        }

        let curves = |set: &Option<Vec<ElementCurve>>| {
            set.as_deref()
                .map(CurveSet::from_elements)
                .filter(|c| !c.is_identity())
                .map(LutStage::Curves)
        };
        let a = curves(&mab.a_curves);
        let clut = mab.clut.as_ref().map(|c| LutStage::Clut(ClutStage::from(c)));
        let m = curves(&mab.m_curves);
        let matrix = mab.matrix.as_ref().map(|m| LutStage::Matrix(MatrixStage::from(m)));
        let b = curves(&mab.b_curves);

        let ordered = match direction {
            Direction::DeviceToReference => [a, clut, m, matrix, b],
            Direction::ReferenceToDevice => [b, matrix, m, clut, a],
        };

        Ok(Self {
            direction,
            input_channels: mab.input_channels,
            output_channels: mab.output_channels,
            encoding,
            stages: ordered.into_iter().flatten().collect(),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn encoding(&self) -> PcsEncoding {
        self.encoding
    }

    /// Device values in, PCS out (or the reverse for B2A tables)
    pub fn eval(&self, input: &[f64]) -> Vec<f64> {
        let mut values = match (self.direction, input) {
            (Direction::ReferenceToDevice, [x, y, z]) => self.encoding.encode([*x, *y, *z]).to_vec(),
            _ => input.to_vec(),
        };

        for stage in &self.stages {
            match stage {
                LutStage::Curves(curves) => curves.apply(&mut values),
                LutStage::Matrix(matrix) => {
                    if let [x, y, z] = values[..] {
                        values = matrix.apply([x, y, z]).to_vec();
                    }
                }
                LutStage::Clut(clut) => values = clut.eval(&values),
            }
        }

        if self.direction == Direction::DeviceToReference {
            if let [x, y, z] = values[..] {
                return self.encoding.decode([x, y, z]).to_vec();
            }
        }
        values
    }
}

fn tables(tables: &[Vec<f64>]) -> CurveSet {
    CurveSet(tables.iter().map(|t| ToneCurve::Table(t.clone())).collect())
}

fn check_pcs_side(direction: Direction, inputs: usize, outputs: usize) -> Result<(), IccError> {
    let pcs_channels = match direction {
        Direction::DeviceToReference => outputs,
        Direction::ReferenceToDevice => inputs,
    };
    if pcs_channels != 3 {
        return Err(IccError::CorruptedData(format!(
            "lut has {pcs_channels} channels on the connection side"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::tags::{Clut, LutMatrix};
    use crate::icc::CurveData;

    /// 2-node CLUT whose outputs equal its inputs
    fn identity_clut() -> Clut {
        let mut data = Vec::new();
        for r in 0..2 {
            for g in 0..2 {
                for b in 0..2 {
                    data.extend([f64::from(r), f64::from(g), f64::from(b)]);
                }
            }
        }
        Clut {
            grid_points: vec![2, 2, 2],
            output_channels: 3,
            data,
        }
    }

    fn identity_mft(precision: MftPrecision) -> MftData {
        MftData {
            precision,
            input_channels: 3,
            output_channels: 3,
            matrix: Matrix3x3::identity().m,
            input_tables: vec![vec![0.0, 1.0]; 3],
            clut: identity_clut(),
            output_tables: vec![vec![0.0, 1.0]; 3],
        }
    }

    #[test]
    fn test_xyz_decoding() {
        let lut = LutPipeline::from_mft(
            &identity_mft(MftPrecision::Lut16),
            Direction::DeviceToReference,
            ColorSpace::Xyz,
        )
        .unwrap();
        let out = lut.eval(&[0.5, 0.25, 0.0]);
        assert!((out[0] - 0.5 * 65535.0 / 32768.0).abs() < 1e-12);
        assert!((out[1] - 0.25 * 65535.0 / 32768.0).abs() < 1e-12);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn test_legacy_lab_decoding() {
        let lut = LutPipeline::from_mft(
            &identity_mft(MftPrecision::Lut16),
            Direction::DeviceToReference,
            ColorSpace::Lab,
        )
        .unwrap();
        assert_eq!(lut.encoding(), PcsEncoding::LabLegacy);
        // 0xFF00 is L = 100, 0x8000 is a = b = 0
        let v = 65280.0 / 65535.0;
        let ab = 32768.0 / 65535.0;
        let lab = lut.eval(&[v, ab, ab]);
        assert!((lab[0] - 100.0).abs() < 1e-9);
        assert!(lab[1].abs() < 1e-9 && lab[2].abs() < 1e-9, "{lab:?}");
    }

    #[test]
    fn test_encoding_round_trip() {
        for encoding in [PcsEncoding::Xyz, PcsEncoding::Lab, PcsEncoding::LabLegacy] {
            let pcs = [50.0, -20.0, 35.5];
            let back = encoding.decode(encoding.encode(pcs));
            for c in 0..3 {
                assert!((back[c] - pcs[c]).abs() < 1e-9, "{encoding:?}");
            }
        }
    }

    #[test]
    fn test_b2a_applies_matrix_for_xyz() {
        let mut mft = identity_mft(MftPrecision::Lut16);
        mft.matrix = Matrix3x3::diagonal(0.5, 0.5, 0.5).m;
        let lut = LutPipeline::from_mft(&mft, Direction::ReferenceToDevice, ColorSpace::Xyz).unwrap();
        let device = lut.eval(&[1.0, 0.5, 0.0]);
        let expected = [0.5 * 32768.0 / 65535.0, 0.25 * 32768.0 / 65535.0, 0.0];
        for c in 0..3 {
            assert!((device[c] - expected[c]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mab_order() {
        // A curves square the input, M curves are identity, matrix halves
        let square = ElementCurve::Sampled(CurveData::Gamma(2.0));
        let mab = MabData {
            direction: MabDirection::AToB,
            input_channels: 3,
            output_channels: 3,
            a_curves: Some(vec![square.clone(), square.clone(), square]),
            clut: Some(identity_clut()),
            m_curves: Some(vec![ElementCurve::Sampled(CurveData::Identity); 3]),
            matrix: Some(LutMatrix {
                matrix: Matrix3x3::diagonal(0.5, 0.5, 0.5).m,
                offset: [0.0, 0.0, 0.1],
            }),
            b_curves: None,
        };
        let lut = LutPipeline::from_tag(&TagData::LutAToB(mab), Direction::DeviceToReference, ColorSpace::Xyz)
            .unwrap();
        let out = lut.eval(&[0.5, 1.0, 0.0]);
        let expected = [0.125, 0.5, 0.1].map(|v| v * 65535.0 / 32768.0);
        for c in 0..3 {
            assert!((out[c] - expected[c]).abs() < 1e-12, "{out:?}");
        }
    }

    #[test]
    fn test_wrong_direction_rejected() {
        let mab = MabData {
            direction: MabDirection::BToA,
            input_channels: 3,
            output_channels: 3,
            a_curves: None,
            clut: None,
            m_curves: None,
            matrix: None,
            b_curves: None,
        };
        assert!(
            LutPipeline::from_tag(&TagData::LutBToA(mab), Direction::DeviceToReference, ColorSpace::Lab)
                .is_err()
        );
    }

    #[test]
    fn test_cmyk_to_lab() {
        let mut data = Vec::new();
        for i in 0..16u32 {
            // Lab L falls with total ink
            let ink = f64::from(i.count_ones()) / 4.0;
            data.extend([1.0 - ink, 0.5, 0.5]);
        }
        let mft = MftData {
            precision: MftPrecision::Lut8,
            input_channels: 4,
            output_channels: 3,
            matrix: Matrix3x3::identity().m,
            input_tables: vec![vec![0.0, 1.0]; 4],
            clut: Clut {
                grid_points: vec![2; 4],
                output_channels: 3,
                data,
            },
            output_tables: vec![vec![0.0, 1.0]; 3],
        };
        let lut = LutPipeline::from_mft(&mft, Direction::DeviceToReference, ColorSpace::Lab).unwrap();
        let lab = lut.eval(&[0.0, 0.0, 0.0, 0.0]);
        assert!((lab[0] - 100.0).abs() < 1e-9);
        let lab = lut.eval(&[1.0, 1.0, 1.0, 1.0]);
        assert!(lab[0].abs() < 1e-9);
        assert!((lab[1] + 0.5).abs() < 1e-9);
    }
}
