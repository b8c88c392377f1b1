//! Per-profile transform elements
//!
//! Every device↔PCS transform a profile can perform is decoded once, at load
//! time, into a [`ProfileElement`]:
//!
//! - RGB matrix-shaper: TRC → colorant matrix → XYZ
//! - Gray: `kTRC` → Y, scaled by the PCS illuminant
//! - LUT: `mft1`/`mft2`/`mAB `/`mBA ` stages, in the profile's declared PCS

mod context;
mod lut;
mod matrix_shaper;
mod stages;

pub use context::{CancelFlag, ChainOptions, DomainPolicy, GeneratorOptions, RenderingIntent};
pub use lut::{LutPipeline, PcsEncoding};
pub use matrix_shaper::{GrayShaper, MatrixShaper};
pub use stages::{ClutStage, CurveSet, MatrixStage, ToneCurve};

/// Which way a chain node converts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    DeviceToReference,
    ReferenceToDevice,
}

/// A prebuilt device↔PCS transform
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileElement {
    /// Produces PCS XYZ regardless of the declared PCS
    MatrixShaper(MatrixShaper),
    /// Produces PCS XYZ regardless of the declared PCS
    Gray(GrayShaper),
    /// Produces values in the declared PCS
    Lut(LutPipeline),
}

impl ProfileElement {
    pub fn is_lut(&self) -> bool {
        matches!(self, Self::Lut(_))
    }
}
