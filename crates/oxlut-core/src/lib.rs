//! # oxlut - ICC profile chains and 3D LUT generation
//!
//! Composes the device↔PCS transforms of two or more ICC profiles into one
//! function and samples it on a regular lattice, producing the 3D LUT a
//! display pipeline uses to map one device's RGB into another's.
//!
//! ## Pieces
//!
//! - [`icc`]: read-only ICC decoder (header, tag directory, tag bodies)
//! - [`ColorProfile`]: per-profile transforms prebuilt at load time
//! - [`ProfileChain`]: alternating A2B/B2A composition with chromatic
//!   adaptation between differing PCS illuminants
//! - [`LutGenerator`]: parallel grid sampling into planar 16-bit buffers
//!
//! ## Quick Start
//!
//! ```no_run
//! use oxlut_core::{ColorProfile, LutGenerator, ProfileChain, RenderingIntent, SpaceType};
//!
//! let ga = ColorProfile::from_file("gamut_adjustment.icc").unwrap();
//! let display = ColorProfile::from_file("display.icc").unwrap();
//!
//! let mut chain = ProfileChain::new(
//!     SpaceType::DeviceSpecific,
//!     SpaceType::DeviceSpecific,
//!     RenderingIntent::RealisticColorimetricWithLuminance,
//! );
//! chain.add_profile(&ga).unwrap();
//! chain.add_profile(&display).unwrap();
//!
//! let lut = LutGenerator::default().generate(&chain, 33).unwrap();
//! assert_eq!(lut.r.len(), 33 * 33 * 33);
//! ```
//!
//! Or in one call, with status codes:
//!
//! ```no_run
//! use oxlut_core::{Status, generate_3d_lut};
//!
//! let grid = 17;
//! let (mut r, mut g, mut b) = (vec![0; 4913], vec![0; 4913], vec![0; 4913]);
//! let status = generate_3d_lut("ga.icc", "display.icc", grid, Some(&mut r[..]), Some(&mut g[..]), Some(&mut b[..]));
//! assert_eq!(status, Status::Ok);
//! ```

pub mod chain;
pub mod color;
pub mod error;
pub mod generator;
pub mod icc;
pub mod math;
pub mod pipeline;
pub mod profile;

#[cfg(feature = "capi")]
mod ffi;

use std::path::Path;

use tracing::debug;

pub use chain::{ProfileChain, SpaceType};
pub use error::{Channel, Error, ProfileRole, Result, Status};
pub use generator::{Lut3d, LutGenerator, lattice_coords, lattice_index, quantize};
pub use math::ChromaticAdaptationMethod;
pub use pipeline::{CancelFlag, ChainOptions, Direction, DomainPolicy, GeneratorOptions, RenderingIntent};
pub use profile::ColorProfile;

/// Version of oxlut
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generate a display LUT from a gamut-adjustment profile and a display profile
///
/// Buffers must hold `grid³` entries each and receive 16-bit values laid out
/// as `r·grid² + g·grid + b`. Inputs are checked in order: grid, buffers,
/// gamut-adjustment profile, display profile.
pub fn generate_3d_lut(
    ga_path: impl AsRef<Path>,
    display_path: impl AsRef<Path>,
    grid: usize,
    r: Option<&mut [u32]>,
    g: Option<&mut [u32]>,
    b: Option<&mut [u32]>,
) -> Status {
    generate_3d_lut_with(
        ga_path,
        display_path,
        grid,
        r,
        g,
        b,
        ChainOptions::default(),
        &GeneratorOptions::default(),
    )
}

/// [`generate_3d_lut`] with explicit chain and sampling options
#[allow(clippy::too_many_arguments)]
pub fn generate_3d_lut_with(
    ga_path: impl AsRef<Path>,
    display_path: impl AsRef<Path>,
    grid: usize,
    r: Option<&mut [u32]>,
    g: Option<&mut [u32]>,
    b: Option<&mut [u32]>,
    chain_options: ChainOptions,
    generator_options: &GeneratorOptions,
) -> Status {
    let result = build_lut(
        ga_path.as_ref(),
        display_path.as_ref(),
        grid,
        [r, g, b],
        chain_options,
        generator_options,
    );
    match result {
        Ok(()) => Status::Ok,
        Err(err) => {
            debug!(%err, "3D LUT generation failed");
            Status::from(&err)
        }
    }
}

fn build_lut(
    ga_path: &Path,
    display_path: &Path,
    grid: usize,
    [r, g, b]: [Option<&mut [u32]>; 3],
    chain_options: ChainOptions,
    generator_options: &GeneratorOptions,
) -> Result<()> {
    if grid < 2 {
        return Err(Error::InvalidGrid(grid));
    }
    let r = r.ok_or(Error::NullOutput(Channel::Red))?;
    let g = g.ok_or(Error::NullOutput(Channel::Green))?;
    let b = b.ok_or(Error::NullOutput(Channel::Blue))?;

    let load = |path: &Path, which| {
        ColorProfile::from_file(path).map_err(|err| Error::ProfileLoadFailure {
            which,
            reason: err.to_string(),
        })
    };
    let ga = load(ga_path, ProfileRole::GamutAdjustment)?;
    let display = load(display_path, ProfileRole::Display)?;

    let mut chain = ProfileChain::with_options(
        SpaceType::DeviceSpecific,
        SpaceType::DeviceSpecific,
        chain_options,
    );
    chain.add_profile(&ga)?;
    chain.add_profile(&display)?;

    LutGenerator::new(generator_options.clone()).generate_into(&chain, grid, Some(r), Some(g), Some(b))
}
