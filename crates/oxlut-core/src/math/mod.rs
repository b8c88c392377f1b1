//! Numeric building blocks
//!
//! - 3x3 matrices
//! - Tone curve evaluation
//! - Chromatic adaptation and black-point compensation
//! - Curve and CLUT interpolation

pub mod chromatic_adaptation;
pub mod gamma;
pub mod interpolation;
pub mod matrix;

pub use chromatic_adaptation::{
    ChromaticAdaptationMethod, apply_adaptation, compensate, compute_adaptation_matrix,
    uncompensate,
};
pub use gamma::{ParametricCurve, ParametricCurveType};
pub use matrix::Matrix3x3;
