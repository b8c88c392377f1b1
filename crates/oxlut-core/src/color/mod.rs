//! Colour coordinates used at the profile connection space
//!
//! - CIE XYZ
//! - CIELAB
//! - Standard illuminants

pub mod lab;
pub mod white_point;
pub mod xyz;

pub use lab::Lab;
pub use white_point::{D50, D65};
pub use xyz::Xyz;
