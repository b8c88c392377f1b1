//! ICC profile decoding
//!
//! Reads the 128-byte header, the tag directory and the tag bodies into the
//! closed [`TagData`] union. Nothing downstream touches raw tag bytes.
//!
//! ```ignore
//! use oxlut_core::icc::IccProfile;
//!
//! let profile = IccProfile::parse(&bytes)?;
//! println!("{:?} -> {:?}", profile.header.color_space, profile.header.pcs);
//! ```

pub mod header;
pub mod tags;

mod error;
mod parser;
mod types;

pub use error::IccError;
pub use header::{ColorSpace, IccHeader, ProfileClass, ProfileVersion};
pub use parser::IccProfile;
pub use tags::{CurveData, ParametricCurveData, TagData};
pub use types::{S15Fixed16, TagSignature, XyzNumber};
