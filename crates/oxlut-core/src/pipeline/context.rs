//! Chain and generator options

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::icc::TagSignature;
use crate::math::ChromaticAdaptationMethod;

/// Rendering intent applied uniformly across a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
    /// Relative colorimetric data, with PCS XYZ scaled by the ratio of the
    /// endpoint profiles' absolute luminance
    #[default]
    RealisticColorimetricWithLuminance,
}

impl RenderingIntent {
    pub const ALL: [Self; 5] = [
        Self::Perceptual,
        Self::RelativeColorimetric,
        Self::Saturation,
        Self::AbsoluteColorimetric,
        Self::RealisticColorimetricWithLuminance,
    ];

    /// Intent from the ICC header field
    pub fn from_icc(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Perceptual),
            1 => Some(Self::RelativeColorimetric),
            2 => Some(Self::Saturation),
            3 => Some(Self::AbsoluteColorimetric),
            _ => None,
        }
    }

    /// Index of the `A2Bn`/`B2An` tags holding this intent's data
    pub fn tag_index(self) -> usize {
        match self {
            Self::Perceptual => 0,
            Self::RelativeColorimetric
            | Self::AbsoluteColorimetric
            | Self::RealisticColorimetricWithLuminance => 1,
            Self::Saturation => 2,
        }
    }

    pub fn a2b_tag(self) -> TagSignature {
        [TagSignature::A2B0, TagSignature::A2B1, TagSignature::A2B2][self.tag_index()]
    }

    pub fn b2a_tag(self) -> TagSignature {
        [TagSignature::B2A0, TagSignature::B2A1, TagSignature::B2A2][self.tag_index()]
    }

    /// Whether black-point compensation may apply under this intent
    pub fn allows_black_point_compensation(self) -> bool {
        matches!(
            self,
            Self::Perceptual | Self::RelativeColorimetric | Self::Saturation
        )
    }
}

/// Handling of inputs outside the encodable range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DomainPolicy {
    /// Evaluate anyway. Analytic curves extend, tables clamp.
    #[default]
    Extrapolate,
    /// Fail with [`Error::OutOfDomain`](crate::Error::OutOfDomain)
    Reject,
}

/// Options for building a [`ProfileChain`](crate::ProfileChain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChainOptions {
    pub intent: RenderingIntent,
    pub adaptation_method: ChromaticAdaptationMethod,
    pub black_point_compensation: bool,
    pub domain_policy: DomainPolicy,
}

impl ChainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = intent;
        self
    }

    pub fn with_adaptation_method(mut self, method: ChromaticAdaptationMethod) -> Self {
        self.adaptation_method = method;
        self
    }

    pub fn with_black_point_compensation(mut self, enabled: bool) -> Self {
        self.black_point_compensation = enabled;
        self
    }

    pub fn with_domain_policy(mut self, policy: DomainPolicy) -> Self {
        self.domain_policy = policy;
        self
    }
}

/// Shared cooperative cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for [`LutGenerator`](crate::LutGenerator)
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Sample slabs on the rayon thread pool
    pub parallel: bool,
    pub cancel: Option<CancelFlag>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}
