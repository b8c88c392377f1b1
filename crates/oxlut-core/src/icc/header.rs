//! ICC profile header
//!
//! The header is the first 128 bytes of every profile (ICC.1:2022 section 7.2).
//! Only the fields a profile chain needs are decoded; the rest are skipped.

use super::error::IccError;
use super::types::{XyzNumber, read_u32};

/// Profile file signature, 'acsp'
pub const PROFILE_SIGNATURE: u32 = 0x61637370;

/// Size of the fixed header
pub const HEADER_SIZE: usize = 128;

/// Decoded ICC header
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    /// Declared profile size in bytes
    pub size: u32,
    pub version: ProfileVersion,
    pub device_class: ProfileClass,
    /// Data (device) colour space
    pub color_space: ColorSpace,
    /// Profile connection space
    pub pcs: ColorSpace,
    /// Default rendering intent stored by the profile creator (0..=3)
    pub rendering_intent: u32,
    /// PCS illuminant, D50 for conforming profiles
    pub illuminant: XyzNumber,
}

impl IccHeader {
    /// Header for an in-memory profile: version 4.3, D50 illuminant.
    pub fn new(device_class: ProfileClass, color_space: ColorSpace, pcs: ColorSpace) -> Self {
        Self {
            size: 0,
            version: ProfileVersion {
                major: 4,
                minor: 3,
                patch: 0,
            },
            device_class,
            color_space,
            pcs,
            rendering_intent: 0,
            illuminant: XyzNumber::from_xyz(0.9642, 1.0, 0.8249),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < HEADER_SIZE {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let signature = read_u32(data, 36);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature(signature));
        }

        let version = ProfileVersion {
            major: data[8],
            minor: data[9] >> 4,
            patch: data[9] & 0x0F,
        };
        if !(2..=5).contains(&version.major) {
            return Err(IccError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        let rendering_intent = read_u32(data, 64);
        if rendering_intent > 3 {
            return Err(IccError::InvalidRenderingIntent(rendering_intent));
        }

        Ok(Self {
            size: read_u32(data, 0),
            version,
            device_class: ProfileClass::from_u32(read_u32(data, 12))?,
            color_space: ColorSpace::from_u32(read_u32(data, 16))?,
            pcs: ColorSpace::from_u32(read_u32(data, 20))?,
            rendering_intent,
            illuminant: XyzNumber::from_bytes(&data[68..80]).unwrap_or_default(),
        })
    }

    /// The declared size must not exceed the buffer.
    pub fn validate(&self, data_len: usize) -> Result<(), IccError> {
        if self.size as usize > data_len {
            return Err(IccError::SizeMismatch {
                header_size: self.size,
                actual_size: data_len,
            });
        }
        if !self.pcs.is_pcs() {
            return Err(IccError::InvalidColorSpace(self.pcs.to_u32()));
        }
        Ok(())
    }
}

/// ICC profile version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl ProfileVersion {
    pub fn at_least(&self, major: u8, minor: u8) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }

    pub fn is_v4(&self) -> bool {
        self.major >= 4
    }

    pub fn is_v2(&self) -> bool {
        self.major == 2
    }
}

impl std::fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// ICC device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileClass {
    Input,
    Display,
    Output,
    DeviceLink,
    ColorSpace,
    Abstract,
    NamedColor,
}

impl ProfileClass {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        match &val.to_be_bytes() {
            b"scnr" => Ok(Self::Input),
            b"mntr" => Ok(Self::Display),
            b"prtr" => Ok(Self::Output),
            b"link" => Ok(Self::DeviceLink),
            b"spac" => Ok(Self::ColorSpace),
            b"abst" => Ok(Self::Abstract),
            b"nmcl" => Ok(Self::NamedColor),
            _ => Err(IccError::InvalidProfileClass(val)),
        }
    }

    pub fn to_u32(&self) -> u32 {
        let sig = match self {
            Self::Input => b"scnr",
            Self::Display => b"mntr",
            Self::Output => b"prtr",
            Self::DeviceLink => b"link",
            Self::ColorSpace => b"spac",
            Self::Abstract => b"abst",
            Self::NamedColor => b"nmcl",
        };
        u32::from_be_bytes(*sig)
    }

    /// Classes whose device side can take part in a device↔PCS chain
    pub fn is_device_to_pcs(&self) -> bool {
        matches!(
            self,
            Self::Input | Self::Display | Self::Output | Self::ColorSpace
        )
    }
}

/// ICC colour space signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Hls,
    Cmyk,
    Cmy,
    /// `2CLR` .. `FCLR`, holding the channel count
    Multi(u8),
}

impl ColorSpace {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        let bytes = val.to_be_bytes();
        let space = match &bytes {
            b"XYZ " => Self::Xyz,
            b"Lab " => Self::Lab,
            b"Luv " => Self::Luv,
            b"YCbr" => Self::YCbCr,
            b"Yxy " => Self::Yxy,
            b"RGB " => Self::Rgb,
            b"GRAY" => Self::Gray,
            b"HSV " => Self::Hsv,
            b"HLS " => Self::Hls,
            b"CMYK" => Self::Cmyk,
            b"CMY " => Self::Cmy,
            [n, b'C', b'L', b'R'] => {
                let count = char::from(*n)
                    .to_digit(16)
                    .ok_or(IccError::InvalidColorSpace(val))?;
                if !(2..=15).contains(&count) {
                    return Err(IccError::InvalidColorSpace(val));
                }
                Self::Multi(count as u8)
            }
            _ => return Err(IccError::InvalidColorSpace(val)),
        };
        Ok(space)
    }

    pub fn to_u32(&self) -> u32 {
        let sig = match self {
            Self::Xyz => *b"XYZ ",
            Self::Lab => *b"Lab ",
            Self::Luv => *b"Luv ",
            Self::YCbCr => *b"YCbr",
            Self::Yxy => *b"Yxy ",
            Self::Rgb => *b"RGB ",
            Self::Gray => *b"GRAY",
            Self::Hsv => *b"HSV ",
            Self::Hls => *b"HLS ",
            Self::Cmyk => *b"CMYK",
            Self::Cmy => *b"CMY ",
            Self::Multi(n) => {
                let digit = char::from_digit(u32::from(*n), 16)
                    .map(|c| c.to_ascii_uppercase() as u8)
                    .unwrap_or(b'0');
                [digit, b'C', b'L', b'R']
            }
        };
        u32::from_be_bytes(sig)
    }

    /// Number of channels, always in `1..=15`
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Cmyk => 4,
            Self::Multi(n) => usize::from(*n),
            _ => 3,
        }
    }

    /// Whether this space can serve as a profile connection space
    pub fn is_pcs(&self) -> bool {
        matches!(self, Self::Xyz | Self::Lab)
    }
}
