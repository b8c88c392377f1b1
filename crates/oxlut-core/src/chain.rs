//! Profile chains
//!
//! A [`ProfileChain`] composes device↔PCS transforms of successive profiles
//! into one function. Directions alternate: the chain tracks which side it is
//! on after each profile and picks the next node's direction from that.
//!
//! ```text
//! device ─A2B─▶ PCS ─[adapt]─▶ PCS ─B2A─▶ device ─A2B─▶ …
//! ```
//!
//! Between nodes PCS values travel as XYZ. Lab PCS values are converted
//! relative to the illuminant of the node producing or consuming them.

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::icc::ColorSpace;
use crate::math::{Matrix3x3, compensate, compute_adaptation_matrix, uncompensate};
use crate::pipeline::{ChainOptions, Direction, RenderingIntent};
use crate::profile::ColorProfile;

/// Kind of space at either end of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpaceType {
    DeviceSpecific,
    ProfileConnectionSpace,
}

/// Where the chain currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Device side; `None` until a profile fixes the colour space
    Device(Option<ColorSpace>),
    Reference,
}

impl Position {
    fn space_type(self) -> SpaceType {
        match self {
            Self::Device(_) => SpaceType::DeviceSpecific,
            Self::Reference => SpaceType::ProfileConnectionSpace,
        }
    }
}

#[derive(Debug, Clone)]
struct ChainNode<'a> {
    profile: &'a ColorProfile,
    direction: Direction,
    /// Adapts XYZ under the previous node's illuminant to this node's
    bridge: Option<Matrix3x3>,
}

/// Value carried between nodes
enum Carried {
    Device(Vec<f64>),
    Pcs(Xyz),
}

/// An ordered composition of profiles between two declared space types
#[derive(Debug)]
pub struct ProfileChain<'a> {
    source: SpaceType,
    target: SpaceType,
    options: ChainOptions,
    nodes: Vec<ChainNode<'a>>,
    position: Position,
    luminance_factor: OnceLock<f64>,
}

impl<'a> ProfileChain<'a> {
    pub fn new(source: SpaceType, target: SpaceType, intent: RenderingIntent) -> Self {
        Self::with_options(source, target, ChainOptions::default().with_intent(intent))
    }

    pub fn with_options(source: SpaceType, target: SpaceType, options: ChainOptions) -> Self {
        let position = match source {
            SpaceType::DeviceSpecific => Position::Device(None),
            SpaceType::ProfileConnectionSpace => Position::Reference,
        };
        Self {
            source,
            target,
            options,
            nodes: Vec::new(),
            position,
            luminance_factor: OnceLock::new(),
        }
    }

    pub fn source(&self) -> SpaceType {
        self.source
    }

    pub fn target(&self) -> SpaceType {
        self.target
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    pub fn intent(&self) -> RenderingIntent {
        self.options.intent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direction of each node in order
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.nodes.iter().map(|n| n.direction)
    }

    /// Space type the chain currently ends in
    pub fn current(&self) -> SpaceType {
        self.position.space_type()
    }

    /// Channel count `transform` expects, `None` for an empty chain
    pub fn input_dimension(&self) -> Option<usize> {
        let first = self.nodes.first()?;
        Some(match first.direction {
            Direction::DeviceToReference => first.profile.device_dimension(),
            Direction::ReferenceToDevice => 3,
        })
    }

    /// Channel count `transform` produces, `None` for an empty chain
    pub fn output_dimension(&self) -> Option<usize> {
        let last = self.nodes.last()?;
        Some(match last.direction {
            Direction::DeviceToReference => 3,
            Direction::ReferenceToDevice => last.profile.device_dimension(),
        })
    }

    /// Append a profile, converting away from the side the chain is on
    pub fn add_profile(&mut self, profile: &'a ColorProfile) -> Result<()> {
        let (direction, next, bridge) = match self.position {
            Position::Device(expected) => {
                if let Some(space) = expected.filter(|&s| s != profile.device_space()) {
                    return Err(Error::IncompatibleChain(format!(
                        "device space {:?} cannot feed a {:?} profile",
                        space,
                        profile.device_space()
                    )));
                }
                (Direction::DeviceToReference, Position::Reference, None)
            }
            Position::Reference => {
                if !profile.reference_space().is_pcs() {
                    return Err(Error::IncompatibleChain(format!(
                        "{:?} is not a connection space",
                        profile.reference_space()
                    )));
                }
                let bridge = match self.nodes.last() {
                    Some(prev) => self.bridge(prev.profile, profile)?,
                    None => None,
                };
                (
                    Direction::ReferenceToDevice,
                    Position::Device(Some(profile.device_space())),
                    bridge,
                )
            }
        };

        debug!(
            node = self.nodes.len(),
            ?direction,
            device = ?profile.device_space(),
            pcs = ?profile.reference_space(),
            bridge = bridge.is_some(),
            lab_conversion = profile.reference_space() == ColorSpace::Lab,
            "added profile to chain"
        );

        self.nodes.push(ChainNode {
            profile,
            direction,
            bridge,
        });
        self.position = next;
        self.luminance_factor = OnceLock::new();
        Ok(())
    }

    fn bridge(&self, prev: &ColorProfile, next: &ColorProfile) -> Result<Option<Matrix3x3>> {
        let (from, to) = (prev.illuminant(), next.illuminant());
        if from.approx_eq(&to, 1e-6) {
            return Ok(None);
        }
        compute_adaptation_matrix(&to, &from, self.options.adaptation_method).map(Some)
    }

    /// Uniform PCS scale for the luminance-preserving intent
    ///
    /// Ratio of the first and last profiles' absolute luminance, or 1.0 when
    /// either is unknown.
    pub fn luminance_factor(&self) -> f64 {
        *self.luminance_factor.get_or_init(|| {
            let first = self.nodes.first().and_then(|n| n.profile.luminance());
            let last = self.nodes.last().and_then(|n| n.profile.luminance());
            match (first, last) {
                (Some(first), Some(last)) if last > 0.0 && (first / last).is_finite() => first / last,
                _ => {
                    warn!(?first, ?last, "luminance unavailable, using a ratio of 1.0");
                    1.0
                }
            }
        })
    }

    fn uses_black_point_compensation(&self) -> bool {
        self.options.black_point_compensation && self.options.intent.allows_black_point_compensation()
    }

    /// Run `input` through every node
    ///
    /// Input and output are device values at device ends and PCS values (in
    /// the end node's own PCS encoding) at PCS ends. Nothing is clamped.
    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        let (Some(first), Some(last)) = (self.nodes.first(), self.nodes.last()) else {
            return Err(Error::IncompatibleChain("chain has no profiles".to_string()));
        };
        if self.current() != self.target {
            return Err(Error::IncompatibleChain(format!(
                "chain ends in {:?}, declared {:?}",
                self.current(),
                self.target
            )));
        }

        let expected = self.input_dimension().unwrap_or(0);
        if input.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: input.len(),
            });
        }

        let intent = self.options.intent;
        let policy = self.options.domain_policy;
        let bpc = self.uses_black_point_compensation();
        let mut scale_pending = intent == RenderingIntent::RealisticColorimetricWithLuminance;

        let mut carried = match first.direction {
            Direction::DeviceToReference => Carried::Device(input.to_vec()),
            Direction::ReferenceToDevice => {
                Carried::Pcs(first.profile.reference_to_xyz([input[0], input[1], input[2]]))
            }
        };

        for node in &self.nodes {
            let profile = node.profile;
            carried = match (node.direction, carried) {
                (Direction::DeviceToReference, Carried::Device(device)) => {
                    let reference = profile.evaluate_device_to_reference_with(intent, &device, policy)?;
                    let mut xyz = profile.reference_to_xyz(reference);
                    if bpc {
                        if let Ok(black) = profile.black_point() {
                            xyz = uncompensate(xyz, &profile.illuminant(), &black)?;
                        }
                    }
                    Carried::Pcs(xyz)
                }
                (Direction::ReferenceToDevice, Carried::Pcs(mut xyz)) => {
                    if let Some(bridge) = &node.bridge {
                        xyz = bridge.apply(xyz);
                    }
                    if scale_pending {
                        xyz = xyz.scale(self.luminance_factor());
                        scale_pending = false;
                    }
                    if bpc {
                        if let Ok(black) = profile.black_point() {
                            xyz = compensate(xyz, &profile.illuminant(), &black)?;
                        }
                    }
                    let reference = profile.xyz_to_reference(xyz);
                    Carried::Device(profile.evaluate_reference_to_device_with(intent, reference, policy)?)
                }
                _ => {
                    return Err(Error::IncompatibleChain(
                        "node direction does not match the carried value".to_string(),
                    ));
                }
            };
        }

        Ok(match carried {
            Carried::Device(device) => device,
            Carried::Pcs(mut xyz) => {
                if scale_pending {
                    xyz = xyz.scale(self.luminance_factor());
                }
                last.profile.xyz_to_reference(xyz).to_vec()
            }
        })
    }
}
