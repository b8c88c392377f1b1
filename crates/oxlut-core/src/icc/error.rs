//! Decoder errors

use std::fmt;

use super::types::TagSignature;

/// Errors raised while decoding an ICC profile
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// Buffer shorter than the structure being read
    TooSmall { expected: usize, actual: usize },
    /// Header signature is not 'acsp'
    InvalidSignature(u32),
    /// Header declares more bytes than were supplied
    SizeMismatch { header_size: u32, actual_size: usize },
    /// Tag directory entry points outside the profile
    TagOutOfBounds {
        tag: u32,
        offset: u32,
        size: u32,
        profile_size: usize,
    },
    InvalidColorSpace(u32),
    InvalidProfileClass(u32),
    InvalidRenderingIntent(u32),
    UnsupportedVersion { major: u8, minor: u8 },
    /// Tag body inconsistent with its own counts or offsets
    CorruptedData(String),
    /// Valid ICC data this crate cannot evaluate
    Unsupported(String),
}

impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { expected, actual } => {
                write!(f, "profile too small: need {expected} bytes, got {actual}")
            }
            Self::InvalidSignature(sig) => {
                write!(f, "invalid profile signature 0x{sig:08X}, expected 'acsp'")
            }
            Self::SizeMismatch {
                header_size,
                actual_size,
            } => write!(
                f,
                "header declares {header_size} bytes but only {actual_size} are available"
            ),
            Self::TagOutOfBounds {
                tag,
                offset,
                size,
                profile_size,
            } => write!(
                f,
                "tag '{}' at {offset}+{size} exceeds profile size {profile_size}",
                TagSignature(*tag)
            ),
            Self::InvalidColorSpace(cs) => write!(f, "invalid colour space 0x{cs:08X}"),
            Self::InvalidProfileClass(class) => write!(f, "invalid profile class 0x{class:08X}"),
            Self::InvalidRenderingIntent(intent) => write!(f, "invalid rendering intent {intent}"),
            Self::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported profile version {major}.{minor}")
            }
            Self::CorruptedData(msg) => write!(f, "corrupted data: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for IccError {}
