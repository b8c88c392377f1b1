//! XYZType (ICC.1:2022 10.31): colorants, white and black points, luminance

use crate::color::Xyz;
use crate::icc::error::IccError;
use crate::icc::types::XyzNumber;

#[derive(Debug, Clone, PartialEq)]
pub struct XyzTagData {
    pub values: Vec<XyzNumber>,
}

impl XyzTagData {
    /// Body of an `XYZ ` tag (after type signature and reserved bytes)
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        let values: Vec<XyzNumber> = data
            .chunks_exact(12)
            .filter_map(XyzNumber::from_bytes)
            .collect();

        if values.is_empty() {
            return Err(IccError::CorruptedData("XYZ tag has no values".to_string()));
        }
        Ok(Self { values })
    }

    pub fn single(xyz: Xyz) -> Self {
        Self {
            values: vec![XyzNumber::from_xyz(xyz.x, xyz.y, xyz.z)],
        }
    }

    /// First value, the only one for every tag this crate reads
    pub fn to_xyz(&self) -> Option<Xyz> {
        self.values.first().map(XyzNumber::to_xyz)
    }
}
