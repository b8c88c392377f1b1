//! Error types for oxlut

use std::fmt;

use thiserror::Error;

use crate::icc::IccError;
use crate::pipeline::RenderingIntent;

/// Result type for oxlut operations
pub type Result<T> = std::result::Result<T, Error>;

/// Output channel of a generated LUT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        })
    }
}

/// Which profile of a LUT request failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileRole {
    /// The gamut-adjustment (source) profile
    GamutAdjustment,
    /// The display (destination) profile
    Display,
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GamutAdjustment => "gamut adjustment",
            Self::Display => "display",
        })
    }
}

/// Errors that can occur while building chains or generating LUTs
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Grid size below 2
    #[error("Invalid grid size {0}, need at least 2")]
    InvalidGrid(usize),

    /// Missing output buffer
    #[error("No output buffer for the {0} channel")]
    NullOutput(Channel),

    #[error("Cannot load {which} profile: {reason}")]
    ProfileLoadFailure { which: ProfileRole, reason: String },

    /// Adjacent nodes do not share a colour space, or the chain does not end
    /// where it was declared to
    #[error("Incompatible chain: {0}")]
    IncompatibleChain(String),

    #[error("Dimension mismatch: expected {expected} channels, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The profile has no transform data for this intent
    #[error("Unsupported rendering intent: {0:?}")]
    UnsupportedIntent(RenderingIntent),

    #[error("Profile has no {0}")]
    MissingAttribute(&'static str),

    /// A white point whose cone response has a zero or non-finite component
    #[error("Degenerate white point {0:?}")]
    DegenerateWhitePoint([f64; 3]),

    /// Input outside the encodable domain under [`DomainPolicy::Reject`](crate::DomainPolicy::Reject)
    #[error("Channel {channel} value {value} is outside the valid domain")]
    OutOfDomain { channel: usize, value: f64 },

    /// Output buffer size mismatch
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("ICC error: {0}")]
    Icc(#[from] IccError),

    /// I/O error, kept as text so the error stays `Clone`
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Status codes returned by [`generate_3d_lut`](crate::generate_3d_lut)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    CantOpenGa = 1,
    CantOpenDisplay = 2,
    WrongGridValue = 3,
    NullPointerForOutput = 4,
    Other = 5,
}

impl Status {
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for Status {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidGrid(_) => Self::WrongGridValue,
            Error::NullOutput(_) => Self::NullPointerForOutput,
            Error::ProfileLoadFailure {
                which: ProfileRole::GamutAdjustment,
                ..
            } => Self::CantOpenGa,
            Error::ProfileLoadFailure {
                which: ProfileRole::Display,
                ..
            } => Self::CantOpenDisplay,
            _ => Self::Other,
        }
    }
}
