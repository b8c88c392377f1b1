//! Profile container: header, tag directory and decoded tags

use std::collections::HashMap;

use tracing::trace;

use super::error::IccError;
use super::header::{HEADER_SIZE, IccHeader};
use super::tags::{TagData, XyzTagData};
use super::types::{TagSignature, read_u32};
use crate::color::Xyz;

/// A decoded ICC profile
#[derive(Debug, Clone, PartialEq)]
pub struct IccProfile {
    pub header: IccHeader,
    pub tags: HashMap<TagSignature, TagData>,
}

#[derive(Debug, Clone, Copy)]
struct TagEntry {
    signature: u32,
    offset: u32,
    size: u32,
}

impl IccProfile {
    /// An in-memory profile with no tags
    pub fn new(header: IccHeader) -> Self {
        Self {
            header,
            tags: HashMap::new(),
        }
    }

    /// Builder-style tag insertion for in-memory profiles
    pub fn with_tag(mut self, sig: TagSignature, data: TagData) -> Self {
        self.tags.insert(sig, data);
        self
    }

    /// Decode a profile from its bytes.
    ///
    /// Tags whose body fails to decode are kept as [`TagData::Unknown`]; a
    /// consumer that needs them reports the problem instead.
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        let header = IccHeader::parse(data)?;
        header.validate(data.len())?;

        let mut tags = HashMap::new();
        for entry in Self::read_directory(data)? {
            let start = entry.offset as usize;
            let end = start
                .checked_add(entry.size as usize)
                .filter(|&end| end <= data.len())
                .ok_or(IccError::TagOutOfBounds {
                    tag: entry.signature,
                    offset: entry.offset,
                    size: entry.size,
                    profile_size: data.len(),
                })?;

            let bytes = &data[start..end];
            let sig = TagSignature(entry.signature);
            let tag = TagData::parse(bytes).unwrap_or_else(|err| {
                trace!(tag = %sig, %err, "keeping undecodable tag as raw bytes");
                TagData::Unknown {
                    type_sig: if bytes.len() >= 4 { read_u32(bytes, 0) } else { 0 },
                    data: bytes.to_vec(),
                }
            });
            tags.insert(sig, tag);
        }

        Ok(Self { header, tags })
    }

    fn read_directory(data: &[u8]) -> Result<Vec<TagEntry>, IccError> {
        if data.len() < HEADER_SIZE + 4 {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE + 4,
                actual: data.len(),
            });
        }

        let count = read_u32(data, HEADER_SIZE) as usize;
        let required = count
            .checked_mul(12)
            .and_then(|n| n.checked_add(HEADER_SIZE + 4))
            .unwrap_or(usize::MAX);
        if data.len() < required {
            return Err(IccError::TooSmall {
                expected: required,
                actual: data.len(),
            });
        }

        Ok((0..count)
            .map(|i| {
                let at = HEADER_SIZE + 4 + i * 12;
                TagEntry {
                    signature: read_u32(data, at),
                    offset: read_u32(data, at + 4),
                    size: read_u32(data, at + 8),
                }
            })
            .collect())
    }

    pub fn get_tag(&self, sig: TagSignature) -> Option<&TagData> {
        self.tags.get(&sig)
    }

    pub fn has_tag(&self, sig: TagSignature) -> bool {
        self.tags.contains_key(&sig)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// First XYZ value of an `XYZ ` tag
    pub fn xyz(&self, sig: TagSignature) -> Option<Xyz> {
        self.get_tag(sig)
            .and_then(TagData::as_xyz)
            .and_then(XyzTagData::to_xyz)
    }

    pub fn description(&self) -> Option<String> {
        self.get_tag(TagSignature::DESC)
            .and_then(TagData::as_text)
            .map(|t| t.text.clone())
    }

    pub fn copyright(&self) -> Option<String> {
        self.get_tag(TagSignature::COPYRIGHT)
            .and_then(TagData::as_text)
            .map(|t| t.text.clone())
    }

    pub fn media_white_point(&self) -> Option<Xyz> {
        self.xyz(TagSignature::MEDIA_WHITE)
    }

    pub fn media_black_point(&self) -> Option<Xyz> {
        self.xyz(TagSignature::MEDIA_BLACK)
    }

    /// Absolute luminance in cd/m² (Y of the `lumi` tag)
    pub fn luminance(&self) -> Option<f64> {
        self.xyz(TagSignature::LUMINANCE).map(|xyz| xyz.y)
    }

    /// `chad` tag, row-major
    pub fn chromatic_adaptation_matrix(&self) -> Option<[[f64; 3]; 3]> {
        match self.get_tag(TagSignature::CHAD)? {
            TagData::ChromaticAdaptation(matrix) => Some(*matrix),
            _ => None,
        }
    }

    /// Colorant tags plus one TRC per colorant
    pub fn is_matrix_shaper(&self) -> bool {
        let rgb = [
            TagSignature::RED_COLORANT,
            TagSignature::GREEN_COLORANT,
            TagSignature::BLUE_COLORANT,
            TagSignature::RED_TRC,
            TagSignature::GREEN_TRC,
            TagSignature::BLUE_TRC,
        ];
        rgb.iter().all(|&sig| self.has_tag(sig)) || self.has_tag(TagSignature::GRAY_TRC)
    }

    /// Any A2Bx or B2Ax table present
    pub fn is_lut_based(&self) -> bool {
        [
            TagSignature::A2B0,
            TagSignature::A2B1,
            TagSignature::A2B2,
            TagSignature::B2A0,
            TagSignature::B2A1,
            TagSignature::B2A2,
        ]
        .iter()
        .any(|&sig| self.get_tag(sig).is_some_and(TagData::is_lut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::header::{ColorSpace, PROFILE_SIGNATURE, ProfileClass};

    fn minimal_profile() -> Vec<u8> {
        let mut data = vec![0u8; 132];
        data[0..4].copy_from_slice(&132u32.to_be_bytes());
        data[8] = 4;
        data[9] = 0x30;
        data[12..16].copy_from_slice(b"mntr");
        data[16..20].copy_from_slice(b"RGB ");
        data[20..24].copy_from_slice(b"XYZ ");
        data[36..40].copy_from_slice(&PROFILE_SIGNATURE.to_be_bytes());
        data
    }

    #[test]
    fn test_parse_minimal_profile() {
        let profile = IccProfile::parse(&minimal_profile()).unwrap();
        assert_eq!(profile.header.version.major, 4);
        assert_eq!(profile.header.device_class, ProfileClass::Display);
        assert_eq!(profile.header.color_space, ColorSpace::Rgb);
        assert_eq!(profile.tag_count(), 0);
    }

    #[test]
    fn test_profile_too_small() {
        assert!(IccProfile::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_lumi_and_text_tags() {
        let mut data = minimal_profile();
        data[128..132].copy_from_slice(&2u32.to_be_bytes());

        let lumi_at = 132 + 24;
        let text_at = lumi_at + 20;
        data.extend_from_slice(b"lumi");
        data.extend_from_slice(&(lumi_at as u32).to_be_bytes());
        data.extend_from_slice(&20u32.to_be_bytes());
        data.extend_from_slice(b"cprt");
        data.extend_from_slice(&(text_at as u32).to_be_bytes());
        data.extend_from_slice(&16u32.to_be_bytes());

        data.extend_from_slice(b"XYZ \0\0\0\0");
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&(120i32 << 16).to_be_bytes());
        data.extend_from_slice(&[0u8; 4]);

        data.extend_from_slice(b"text\0\0\0\0Test\0\0\0\0");

        let size = data.len() as u32;
        data[0..4].copy_from_slice(&size.to_be_bytes());

        let profile = IccProfile::parse(&data).unwrap();
        assert_eq!(profile.tag_count(), 2);
        assert_eq!(profile.luminance(), Some(120.0));
        assert_eq!(profile.copyright().as_deref(), Some("Test"));
    }

    #[test]
    fn test_tag_out_of_bounds() {
        let mut data = minimal_profile();
        data[128..132].copy_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"wtpt");
        data.extend_from_slice(&500u32.to_be_bytes());
        data.extend_from_slice(&20u32.to_be_bytes());
        let size = data.len() as u32;
        data[0..4].copy_from_slice(&size.to_be_bytes());

        assert!(matches!(
            IccProfile::parse(&data),
            Err(IccError::TagOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_in_memory_builder() {
        let header = IccHeader::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
        let profile = IccProfile::new(header).with_tag(
            TagSignature::MEDIA_WHITE,
            TagData::Xyz(XyzTagData::single(Xyz::new(0.9642, 1.0, 0.8249))),
        );
        let white = profile.media_white_point().unwrap();
        assert!((white.x - 0.9642).abs() < 1e-4);
        assert!(profile.media_black_point().is_none());
    }
}
