//! ICC tag decoding
//!
//! Each tag starts with a 4-byte type signature and 4 reserved bytes. The type
//! signature selects one variant of [`TagData`]; unknown types are kept as raw
//! bytes. See ICC.1:2022 section 10.

mod curves;
mod lut;
mod text;
mod xyz;

pub use curves::{CurveData, ParametricCurveData};
pub use lut::{Clut, ElementCurve, LutMatrix, MabData, MabDirection, MftData, MftPrecision};
pub use text::TextData;
pub use xyz::XyzTagData;

use super::error::IccError;
use super::types::{TypeSignature, read_s15f16, read_u32};

/// Decoded tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagData {
    Xyz(XyzTagData),
    Curve(CurveData),
    ParametricCurve(ParametricCurveData),
    Text(TextData),
    MultiLocalizedUnicode(TextData),
    Lut8(MftData),
    Lut16(MftData),
    LutAToB(MabData),
    LutBToA(MabData),
    /// `sf32` matrix, row-major
    ChromaticAdaptation([[f64; 3]; 3]),
    Unknown { type_sig: u32, data: Vec<u8> },
}

impl TagData {
    /// Decode one tag from its bytes in the profile.
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 8 {
            return Err(IccError::CorruptedData("tag smaller than its header".to_string()));
        }

        let type_sig = TypeSignature(read_u32(data, 0));
        let body = &data[8..];

        let tag = match type_sig {
            TypeSignature::XYZ => TagData::Xyz(XyzTagData::parse(body)?),
            TypeSignature::CURVE => TagData::Curve(CurveData::parse(body)?),
            TypeSignature::PARA => TagData::ParametricCurve(ParametricCurveData::parse(body)?),
            TypeSignature::TEXT => TagData::Text(TextData::parse_text(body)?),
            TypeSignature::DESC => TagData::Text(TextData::parse_desc(body)?),
            TypeSignature::MLUC => TagData::MultiLocalizedUnicode(TextData::parse_mluc(data)?),
            TypeSignature::LUT8 => TagData::Lut8(MftData::parse(body, MftPrecision::Lut8)?),
            TypeSignature::LUT16 => TagData::Lut16(MftData::parse(body, MftPrecision::Lut16)?),
            TypeSignature::LUTA2B => TagData::LutAToB(MabData::parse(data, MabDirection::AToB)?),
            TypeSignature::LUTB2A => TagData::LutBToA(MabData::parse(data, MabDirection::BToA)?),
            TypeSignature::SF32 => TagData::ChromaticAdaptation(parse_sf32_matrix(body)?),
            _ => TagData::Unknown {
                type_sig: type_sig.0,
                data: data.to_vec(),
            },
        };
        Ok(tag)
    }

    pub fn as_xyz(&self) -> Option<&XyzTagData> {
        match self {
            TagData::Xyz(xyz) => Some(xyz),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            TagData::Text(text) | TagData::MultiLocalizedUnicode(text) => Some(text),
            _ => None,
        }
    }

    /// Any of the four multi-dimensional table types
    pub fn is_lut(&self) -> bool {
        matches!(
            self,
            TagData::Lut8(_) | TagData::Lut16(_) | TagData::LutAToB(_) | TagData::LutBToA(_)
        )
    }
}

fn parse_sf32_matrix(data: &[u8]) -> Result<[[f64; 3]; 3], IccError> {
    if data.len() < 36 {
        return Err(IccError::CorruptedData("sf32 matrix too small".to_string()));
    }

    let mut matrix = [[0.0; 3]; 3];
    for (row, values) in matrix.iter_mut().enumerate() {
        for (col, value) in values.iter_mut().enumerate() {
            *value = read_s15f16(data, (row * 3 + col) * 4);
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unknown_type() {
        let data = [b'u', b'n', b'k', b'n', 0, 0, 0, 0, 1, 2, 3, 4];
        match TagData::parse(&data).unwrap() {
            TagData::Unknown { type_sig, data } => {
                assert_eq!(type_sig, u32::from_be_bytes(*b"unkn"));
                assert_eq!(data.len(), 12);
            }
            other => panic!("expected unknown tag, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sf32() {
        let mut data = b"sf32\0\0\0\0".to_vec();
        for i in 0..9 {
            let v: i32 = if i % 4 == 0 { 0x0001_0000 } else { 0 };
            data.extend_from_slice(&v.to_be_bytes());
        }
        match TagData::parse(&data).unwrap() {
            TagData::ChromaticAdaptation(m) => {
                assert_eq!(m[0][0], 1.0);
                assert_eq!(m[1][1], 1.0);
                assert_eq!(m[0][1], 0.0);
            }
            other => panic!("expected chad matrix, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_short_tag() {
        assert!(TagData::parse(b"XYZ ").is_err());
    }
}
