//! Curve tag types: `curv` (ICC.1:2022 10.6) and `para` (10.18)
//!
//! Decoding only. Evaluation happens on [`crate::pipeline::ToneCurve`], which is
//! built from these once when a profile is loaded.

use crate::icc::error::IccError;
use crate::icc::types::{read_s15f16, read_u16, read_u32};
use crate::math::gamma::{ParametricCurve, ParametricCurveType};

/// Decoded `curv` tag
#[derive(Debug, Clone, PartialEq)]
pub enum CurveData {
    /// Zero entries
    Identity,
    /// One entry, a u8Fixed8 exponent
    Gamma(f64),
    /// Sampled table over [0, 1]
    Table(Vec<u16>),
}

impl CurveData {
    /// Parse the body of a `curv` tag (after type signature and reserved bytes).
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 4 {
            return Err(IccError::CorruptedData("curve tag too small".to_string()));
        }

        let count = read_u32(data, 0) as usize;
        match count {
            0 => Ok(CurveData::Identity),
            1 => {
                if data.len() < 6 {
                    return Err(IccError::CorruptedData("curve gamma value missing".to_string()));
                }
                Ok(CurveData::Gamma(f64::from(read_u16(data, 4)) / 256.0))
            }
            _ => {
                let required = count
                    .checked_mul(2)
                    .and_then(|n| n.checked_add(4))
                    .ok_or_else(|| IccError::CorruptedData("curve entry count overflow".to_string()))?;
                if data.len() < required {
                    return Err(IccError::CorruptedData(format!(
                        "curve table needs {} bytes, have {}",
                        required,
                        data.len()
                    )));
                }
                Ok(CurveData::Table(
                    (0..count).map(|i| read_u16(data, 4 + i * 2)).collect(),
                ))
            }
        }
    }

    /// Bytes consumed by this curve inside a curve set, before padding
    pub(crate) fn encoded_len(&self) -> usize {
        match self {
            CurveData::Identity => 4,
            CurveData::Gamma(_) => 6,
            CurveData::Table(t) => 4 + t.len() * 2,
        }
    }
}

/// Decoded `para` tag
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricCurveData {
    pub curve: ParametricCurve,
}

impl ParametricCurveData {
    /// Parse the body of a `para` tag (after type signature and reserved bytes).
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 4 {
            return Err(IccError::CorruptedData(
                "parametric curve too small".to_string(),
            ));
        }

        let function_type = read_u16(data, 0);
        let curve_type = ParametricCurveType::from_icc(function_type).ok_or_else(|| {
            IccError::CorruptedData(format!("unknown parametric curve type {function_type}"))
        })?;

        let count = curve_type.param_count();
        if data.len() < 4 + count * 4 {
            return Err(IccError::CorruptedData(format!(
                "parametric curve type {function_type} needs {count} parameters"
            )));
        }

        let params: Vec<f64> = (0..count).map(|i| read_s15f16(data, 4 + i * 4)).collect();
        let curve = ParametricCurve::from_params(curve_type, &params).ok_or_else(|| {
            IccError::CorruptedData("parametric curve parameters incomplete".to_string())
        })?;
        Ok(Self { curve })
    }

    pub(crate) fn encoded_len(&self) -> usize {
        4 + self.curve.curve_type.param_count() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_identity() {
        let curve = CurveData::parse(&[0, 0, 0, 0]).unwrap();
        assert_eq!(curve, CurveData::Identity);
    }

    #[test]
    fn test_curve_gamma() {
        // 2.2 as u8Fixed8 = 563 = 0x0233
        let curve = CurveData::parse(&[0, 0, 0, 1, 0x02, 0x33]).unwrap();
        match curve {
            CurveData::Gamma(g) => assert!((g - 2.199).abs() < 0.01),
            other => panic!("expected gamma, got {other:?}"),
        }
    }

    #[test]
    fn test_curve_table() {
        let data = [0, 0, 0, 3, 0x00, 0x00, 0x80, 0x00, 0xFF, 0xFF];
        let curve = CurveData::parse(&data).unwrap();
        assert_eq!(curve, CurveData::Table(vec![0, 0x8000, 0xFFFF]));
        assert_eq!(curve.encoded_len(), 10);
    }

    #[test]
    fn test_curve_table_truncated() {
        let data = [0, 0, 0, 3, 0x00, 0x00, 0x80];
        assert!(CurveData::parse(&data).is_err());
    }

    #[test]
    fn test_parametric_type0() {
        // g = 2.2 as s15Fixed16 = 0x00023333
        let data = [0, 0, 0, 0, 0x00, 0x02, 0x33, 0x33];
        let curve = ParametricCurveData::parse(&data).unwrap();
        assert_eq!(curve.curve.curve_type, ParametricCurveType::Gamma);
        assert!((curve.curve.g - 2.2).abs() < 0.001);
        assert!((curve.curve.eval(0.5) - 0.2176).abs() < 0.001);
    }

    #[test]
    fn test_parametric_missing_params() {
        // type 3 declares five parameters, only one present
        let data = [0, 3, 0, 0, 0x00, 0x02, 0x66, 0x66];
        assert!(ParametricCurveData::parse(&data).is_err());
    }
}
