//! Device colour profiles as chain nodes
//!
//! A [`ColorProfile`] is the read-only view the chain works with. Every
//! transform element is decoded from the ICC tags once, when the profile is
//! loaded. Only the chromatic adaptation pair is computed lazily.

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::color::{D50, Lab, Xyz};
use crate::error::{Error, Result};
use crate::icc::{ColorSpace, IccError, IccProfile, ProfileClass, ProfileVersion, TagSignature};
use crate::math::{ChromaticAdaptationMethod, Matrix3x3, compute_adaptation_matrix};
use crate::pipeline::{
    Direction, DomainPolicy, GrayShaper, LutPipeline, MatrixShaper, ProfileElement, RenderingIntent,
};

/// Slack allowed on domain checks under [`DomainPolicy::Reject`]
const DOMAIN_TOLERANCE: f64 = 1e-9;

/// Largest XYZ component the PCS encoding can carry
const XYZ_MAX: f64 = 1.0 + 32767.0 / 32768.0;

/// One intent per `A2Bn`/`B2An` tag slot
const TABLE_INTENTS: [RenderingIntent; 3] = [
    RenderingIntent::Perceptual,
    RenderingIntent::RelativeColorimetric,
    RenderingIntent::Saturation,
];

/// A loaded device profile
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct ColorProfile {
    icc: IccProfile,
    illuminant: Xyz,
    a2b: [Option<ProfileElement>; 3],
    b2a: [Option<ProfileElement>; 3],
    shaper: Option<ProfileElement>,
    adaptation: OnceLock<Result<(Matrix3x3, Matrix3x3)>>,
}

impl ColorProfile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_icc(IccProfile::parse(data)?)
    }

    /// Build the transform elements of a decoded profile
    pub fn from_icc(icc: IccProfile) -> Result<Self> {
        let header = &icc.header;
        if !header.device_class.is_device_to_pcs() {
            return Err(IccError::Unsupported(format!(
                "{:?} profiles cannot be chained",
                header.device_class
            ))
            .into());
        }
        if !header.pcs.is_pcs() {
            return Err(IccError::InvalidColorSpace(header.pcs.to_u32()).into());
        }

        let illuminant = if header.illuminant.is_zero() {
            D50
        } else {
            header.illuminant.to_xyz()
        };

        let device_channels = header.color_space.channels();
        let lut = |sig: TagSignature, direction: Direction| -> Result<Option<ProfileElement>> {
            let Some(tag) = icc.get_tag(sig).filter(|t| t.is_lut()) else {
                return Ok(None);
            };
            let pipeline = LutPipeline::from_tag(tag, direction, header.pcs)?;
            let device_side = match direction {
                Direction::DeviceToReference => pipeline.input_channels(),
                Direction::ReferenceToDevice => pipeline.output_channels(),
            };
            if device_side != device_channels {
                return Err(IccError::CorruptedData(format!(
                    "{sig} has {device_side} device channels, expected {device_channels}"
                ))
                .into());
            }
            Ok(Some(ProfileElement::Lut(pipeline)))
        };

        let mut a2b = [None, None, None];
        let mut b2a = [None, None, None];
        for intent in TABLE_INTENTS {
            a2b[intent.tag_index()] = lut(intent.a2b_tag(), Direction::DeviceToReference)?;
            b2a[intent.tag_index()] = lut(intent.b2a_tag(), Direction::ReferenceToDevice)?;
        }

        let shaper = match header.color_space {
            ColorSpace::Rgb => MatrixShaper::from_icc(&icc)?.map(ProfileElement::MatrixShaper),
            ColorSpace::Gray => GrayShaper::from_icc(&icc, illuminant)?.map(ProfileElement::Gray),
            _ => None,
        };

        debug!(
            class = ?header.device_class,
            device = ?header.color_space,
            pcs = ?header.pcs,
            version = %header.version,
            intent = ?RenderingIntent::from_icc(header.rendering_intent),
            a2b = ?a2b.iter().map(Option::is_some).collect::<Vec<_>>(),
            b2a = ?b2a.iter().map(Option::is_some).collect::<Vec<_>>(),
            matrix_shaper = shaper.is_some(),
            "loaded profile"
        );

        Ok(Self {
            icc,
            illuminant,
            a2b,
            b2a,
            shaper,
            adaptation: OnceLock::new(),
        })
    }

    /// The decoded ICC container
    pub fn icc(&self) -> &IccProfile {
        &self.icc
    }

    pub fn device_space(&self) -> ColorSpace {
        self.icc.header.color_space
    }

    pub fn reference_space(&self) -> ColorSpace {
        self.icc.header.pcs
    }

    pub fn device_dimension(&self) -> usize {
        self.device_space().channels()
    }

    pub fn class(&self) -> ProfileClass {
        self.icc.header.device_class
    }

    pub fn version(&self) -> ProfileVersion {
        self.icc.header.version
    }

    pub fn is_v4(&self) -> bool {
        self.version().is_v4()
    }

    pub fn description(&self) -> Option<String> {
        self.icc.description()
    }

    /// PCS illuminant from the header, D50 when the field is empty
    pub fn illuminant(&self) -> Xyz {
        self.illuminant
    }

    /// The `wtpt` tag
    pub fn white_point(&self) -> Result<Xyz> {
        self.icc
            .media_white_point()
            .ok_or(Error::MissingAttribute("white point"))
    }

    /// The `bkpt` tag
    pub fn black_point(&self) -> Result<Xyz> {
        self.icc
            .media_black_point()
            .ok_or(Error::MissingAttribute("black point"))
    }

    /// Absolute luminance in cd/m²
    pub fn luminance(&self) -> Option<f64> {
        self.icc.luminance()
    }

    /// White point as measured, before any adaptation to the PCS illuminant
    ///
    /// Profiles with a `chad` tag store an adapted `wtpt`, which is undone here.
    pub fn media_white(&self) -> Result<Xyz> {
        let white = self.white_point()?;
        match self.icc.chromatic_adaptation_matrix() {
            Some(_) => Ok(self.inverse_chromatic_adaptation_matrix()?.apply(white)),
            None => Ok(white),
        }
    }

    /// Matrix adapting colours under the media white to the PCS illuminant
    pub fn chromatic_adaptation_matrix(&self) -> Result<Matrix3x3> {
        self.adaptation_pair().map(|(forward, _)| forward)
    }

    pub fn inverse_chromatic_adaptation_matrix(&self) -> Result<Matrix3x3> {
        self.adaptation_pair().map(|(_, inverse)| inverse)
    }

    fn adaptation_pair(&self) -> Result<(Matrix3x3, Matrix3x3)> {
        self.adaptation
            .get_or_init(|| {
                let forward = match self.icc.chromatic_adaptation_matrix() {
                    Some(chad) => Matrix3x3::new(chad),
                    None => {
                        let white = self.white_point().map_err(|_| {
                            Error::MissingAttribute("chromatic adaptation matrix")
                        })?;
                        compute_adaptation_matrix(
                            &self.illuminant,
                            &white,
                            ChromaticAdaptationMethod::Bradford,
                        )?
                    }
                };
                let inverse = forward.inverse().ok_or_else(|| {
                    IccError::CorruptedData("chromatic adaptation matrix is singular".to_string())
                })?;
                Ok((forward, inverse))
            })
            .clone()
    }

    pub fn is_matrix_shaper(&self) -> bool {
        self.shaper.is_some()
    }

    pub fn is_lut_based(&self) -> bool {
        self.a2b.iter().chain(&self.b2a).any(Option::is_some)
    }

    /// Transform element used for `intent` in `direction`
    ///
    /// Falls back to the perceptual table, then to the matrix/TRC model.
    pub fn element(&self, intent: RenderingIntent, direction: Direction) -> Result<&ProfileElement> {
        let tables = match direction {
            Direction::DeviceToReference => &self.a2b,
            Direction::ReferenceToDevice => &self.b2a,
        };
        tables[intent.tag_index()]
            .as_ref()
            .or(tables[0].as_ref())
            .or(self.shaper.as_ref())
            .ok_or(Error::UnsupportedIntent(intent))
    }

    /// Intents this profile can evaluate in `direction`
    pub fn supported_intents(&self, direction: Direction) -> Vec<RenderingIntent> {
        RenderingIntent::ALL
            .into_iter()
            .filter(|&intent| self.element(intent, direction).is_ok())
            .collect()
    }

    pub fn evaluate_device_to_reference(
        &self,
        intent: RenderingIntent,
        device: &[f64],
    ) -> Result<[f64; 3]> {
        self.evaluate_device_to_reference_with(intent, device, DomainPolicy::default())
    }

    /// Device values to the profile's PCS (XYZ or Lab)
    pub fn evaluate_device_to_reference_with(
        &self,
        intent: RenderingIntent,
        device: &[f64],
        policy: DomainPolicy,
    ) -> Result<[f64; 3]> {
        let expected = self.device_dimension();
        if device.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: device.len(),
            });
        }
        if policy == DomainPolicy::Reject {
            check_domain(device, |_| (0.0, 1.0))?;
        }

        let reference = match self.element(intent, Direction::DeviceToReference)? {
            ProfileElement::MatrixShaper(shaper) => {
                let rgb = [device[0], device[1], device[2]];
                self.xyz_to_reference(shaper.to_pcs(rgb))
            }
            ProfileElement::Gray(gray) => self.xyz_to_reference(gray.to_pcs(device[0])),
            ProfileElement::Lut(lut) => pcs_triple(&lut.eval(device))?,
        };

        if intent == RenderingIntent::AbsoluteColorimetric {
            if let Some(scale) = self.absolute_scale()? {
                let xyz = self.reference_to_xyz(reference).mul_components(&scale);
                return Ok(self.xyz_to_reference(xyz));
            }
        }
        Ok(reference)
    }

    pub fn evaluate_reference_to_device(
        &self,
        intent: RenderingIntent,
        reference: [f64; 3],
    ) -> Result<Vec<f64>> {
        self.evaluate_reference_to_device_with(intent, reference, DomainPolicy::default())
    }

    /// PCS values (in the profile's own PCS) to device values
    pub fn evaluate_reference_to_device_with(
        &self,
        intent: RenderingIntent,
        reference: [f64; 3],
        policy: DomainPolicy,
    ) -> Result<Vec<f64>> {
        if policy == DomainPolicy::Reject {
            check_domain(&reference, |channel| self.reference_range(channel))?;
        }

        let mut reference = reference;
        if intent == RenderingIntent::AbsoluteColorimetric {
            if let Some(scale) = self.absolute_scale()? {
                let relative = self
                    .reference_to_xyz(reference)
                    .div_components(&scale)
                    .ok_or(Error::DegenerateWhitePoint(scale.to_array()))?;
                reference = self.xyz_to_reference(relative);
            }
        }

        let device = match self.element(intent, Direction::ReferenceToDevice)? {
            ProfileElement::MatrixShaper(shaper) => {
                shaper.from_pcs(self.reference_to_xyz(reference)).to_vec()
            }
            ProfileElement::Gray(gray) => vec![gray.from_pcs(self.reference_to_xyz(reference))],
            ProfileElement::Lut(lut) => lut.eval(&reference),
        };
        Ok(device)
    }

    /// PCS value in this profile's encoding → XYZ
    pub fn reference_to_xyz(&self, reference: [f64; 3]) -> Xyz {
        match self.reference_space() {
            ColorSpace::Lab => Lab::from_array(reference).to_xyz_with_white(&self.illuminant),
            _ => Xyz::from_array(reference),
        }
    }

    /// XYZ → PCS value in this profile's encoding
    pub fn xyz_to_reference(&self, xyz: Xyz) -> [f64; 3] {
        match self.reference_space() {
            ColorSpace::Lab => Lab::from_xyz_with_white(xyz, &self.illuminant).to_array(),
            _ => xyz.to_array(),
        }
    }

    /// Per-channel media white / illuminant, `None` without a white point
    ///
    /// Zero or non-finite components are a degenerate white.
    fn absolute_scale(&self) -> Result<Option<Xyz>> {
        let white = match self.media_white() {
            Ok(white) => white,
            Err(Error::MissingAttribute(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let scale = white
            .div_components(&self.illuminant)
            .ok_or(Error::DegenerateWhitePoint(self.illuminant.to_array()))?;
        let usable = |v: f64| v.is_finite() && v != 0.0;
        if !(usable(scale.x) && usable(scale.y) && usable(scale.z)) {
            return Err(Error::DegenerateWhitePoint(white.to_array()));
        }
        Ok(Some(scale))
    }

    fn reference_range(&self, channel: usize) -> (f64, f64) {
        match (self.reference_space(), channel) {
            (ColorSpace::Lab, 0) => (0.0, 100.0),
            (ColorSpace::Lab, _) => (-128.0, 127.0),
            _ => (0.0, XYZ_MAX),
        }
    }
}

fn check_domain(values: &[f64], range: impl Fn(usize) -> (f64, f64)) -> Result<()> {
    for (channel, &value) in values.iter().enumerate() {
        let (lo, hi) = range(channel);
        if !value.is_finite() || value < lo - DOMAIN_TOLERANCE || value > hi + DOMAIN_TOLERANCE {
            return Err(Error::OutOfDomain { channel, value });
        }
    }
    Ok(())
}

fn pcs_triple(values: &[f64]) -> Result<[f64; 3]> {
    match values {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(Error::DimensionMismatch {
            expected: 3,
            actual: values.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::white_point::D65;
    use crate::icc::tags::XyzTagData;
    use crate::icc::{CurveData, IccHeader, TagData, XyzNumber};

    const RED: Xyz = Xyz::new(0.4361, 0.2225, 0.0139);
    const GREEN: Xyz = Xyz::new(0.3851, 0.7169, 0.0971);
    const BLUE: Xyz = Xyz::new(0.1431, 0.0606, 0.7141);

    fn xyz_tag(xyz: Xyz) -> TagData {
        TagData::Xyz(XyzTagData::single(xyz))
    }

    /// `xyz` after the s15Fixed16 round trip every XYZ tag goes through
    fn stored(xyz: Xyz) -> Xyz {
        XyzNumber::from_xyz(xyz.x, xyz.y, xyz.z).to_xyz()
    }

    fn display(pcs: ColorSpace) -> IccProfile {
        let header = IccHeader::new(ProfileClass::Display, ColorSpace::Rgb, pcs);
        let curve = TagData::Curve(CurveData::Gamma(2.2));
        IccProfile::new(header)
            .with_tag(TagSignature::RED_COLORANT, xyz_tag(RED))
            .with_tag(TagSignature::GREEN_COLORANT, xyz_tag(GREEN))
            .with_tag(TagSignature::BLUE_COLORANT, xyz_tag(BLUE))
            .with_tag(TagSignature::RED_TRC, curve.clone())
            .with_tag(TagSignature::GREEN_TRC, curve.clone())
            .with_tag(TagSignature::BLUE_TRC, curve)
            .with_tag(TagSignature::MEDIA_WHITE, xyz_tag(D50))
    }

    #[test]
    fn test_accessors() {
        let profile = ColorProfile::from_icc(display(ColorSpace::Xyz)).unwrap();
        assert_eq!(profile.device_space(), ColorSpace::Rgb);
        assert_eq!(profile.reference_space(), ColorSpace::Xyz);
        assert_eq!(profile.device_dimension(), 3);
        assert_eq!(profile.class(), ProfileClass::Display);
        assert!(profile.is_v4());
        assert!(profile.is_matrix_shaper());
        assert!(!profile.is_lut_based());
        assert_eq!(profile.illuminant(), stored(D50));
        assert_eq!(profile.white_point().unwrap(), stored(D50));
        assert!(profile.illuminant().approx_eq(&D50, 1e-4));
        assert_eq!(profile.black_point(), Err(Error::MissingAttribute("black point")));
        assert_eq!(profile.luminance(), None);
    }

    #[test]
    fn test_matrix_shaper_supports_every_intent() {
        let profile = ColorProfile::from_icc(display(ColorSpace::Xyz)).unwrap();
        assert_eq!(
            profile.supported_intents(Direction::ReferenceToDevice),
            RenderingIntent::ALL.to_vec()
        );
    }

    #[test]
    fn test_no_transform_data() {
        let header = IccHeader::new(ProfileClass::Output, ColorSpace::Cmyk, ColorSpace::Lab);
        let profile = ColorProfile::from_icc(IccProfile::new(header)).unwrap();
        assert!(profile.supported_intents(Direction::DeviceToReference).is_empty());
        assert_eq!(
            profile.evaluate_device_to_reference(RenderingIntent::Perceptual, &[0.0; 4]),
            Err(Error::UnsupportedIntent(RenderingIntent::Perceptual))
        );
    }

    #[test]
    fn test_rejects_device_link() {
        let header = IccHeader::new(ProfileClass::DeviceLink, ColorSpace::Rgb, ColorSpace::Xyz);
        assert!(matches!(
            ColorProfile::from_icc(IccProfile::new(header)),
            Err(Error::Icc(IccError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_round_trip_through_lab_pcs() {
        let profile = ColorProfile::from_icc(display(ColorSpace::Lab)).unwrap();
        let intent = RenderingIntent::RelativeColorimetric;
        let lab = profile.evaluate_device_to_reference(intent, &[1.0, 1.0, 1.0]).unwrap();
        assert!((lab[0] - 100.0).abs() < 0.1, "{lab:?}");

        let rgb = [0.25, 0.5, 0.75];
        let reference = profile.evaluate_device_to_reference(intent, &rgb).unwrap();
        let back = profile.evaluate_reference_to_device(intent, reference).unwrap();
        for c in 0..3 {
            assert!((back[c] - rgb[c]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let profile = ColorProfile::from_icc(display(ColorSpace::Xyz)).unwrap();
        assert_eq!(
            profile.evaluate_device_to_reference(RenderingIntent::Perceptual, &[0.5, 0.5]),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_reject_policy() {
        let profile = ColorProfile::from_icc(display(ColorSpace::Xyz)).unwrap();
        let intent = RenderingIntent::RelativeColorimetric;
        let err = profile
            .evaluate_device_to_reference_with(intent, &[0.5, 1.2, 0.5], DomainPolicy::Reject)
            .unwrap_err();
        assert_eq!(err, Error::OutOfDomain { channel: 1, value: 1.2 });

        assert!(profile
            .evaluate_device_to_reference_with(intent, &[0.0, 1.0 + 1e-12, 0.5], DomainPolicy::Reject)
            .is_ok());
        assert!(matches!(
            profile.evaluate_reference_to_device_with(intent, [0.5, -0.1, 0.5], DomainPolicy::Reject),
            Err(Error::OutOfDomain { channel: 1, .. })
        ));
        assert!(profile
            .evaluate_reference_to_device_with(intent, [1.5, 1.0, 0.5], DomainPolicy::Reject)
            .is_ok());

        // Extrapolation evaluates the same input without complaint
        let out = profile
            .evaluate_device_to_reference(intent, &[0.5, 1.2, 0.5])
            .unwrap();
        assert!(out[1] > profile.evaluate_device_to_reference(intent, &[0.5, 1.0, 0.5]).unwrap()[1]);
    }

    #[test]
    fn test_adaptation_derived_from_white_point() {
        let icc = display(ColorSpace::Xyz).with_tag(TagSignature::MEDIA_WHITE, xyz_tag(D65));
        let profile = ColorProfile::from_icc(icc).unwrap();
        let forward = profile.chromatic_adaptation_matrix().unwrap();
        let inverse = profile.inverse_chromatic_adaptation_matrix().unwrap();
        assert!(forward.multiply(&inverse).is_identity(1e-4));
        assert!(forward.apply(D65).approx_eq(&D50, 1e-4));
        // No chad tag, so the media white is the tag itself
        assert_eq!(profile.media_white().unwrap(), stored(D65));
    }

    #[test]
    fn test_media_white_undoes_chad() {
        let chad = compute_adaptation_matrix(&D50, &D65, ChromaticAdaptationMethod::Bradford).unwrap();
        let icc = display(ColorSpace::Xyz).with_tag(TagSignature::CHAD, TagData::ChromaticAdaptation(chad.m));
        let profile = ColorProfile::from_icc(icc).unwrap();
        assert_eq!(profile.chromatic_adaptation_matrix().unwrap(), chad);
        assert!(profile.media_white().unwrap().approx_eq(&D65, 1e-4));
    }

    #[test]
    fn test_missing_adaptation() {
        let mut icc = display(ColorSpace::Xyz);
        icc.tags.remove(&TagSignature::MEDIA_WHITE);
        let profile = ColorProfile::from_icc(icc).unwrap();
        assert_eq!(
            profile.chromatic_adaptation_matrix(),
            Err(Error::MissingAttribute("chromatic adaptation matrix"))
        );
    }

    #[test]
    fn test_absolute_colorimetric_scales_by_media_white() {
        let paper = Xyz::new(0.9, 0.95, 0.7);
        let icc = display(ColorSpace::Xyz).with_tag(TagSignature::MEDIA_WHITE, xyz_tag(paper));
        let profile = ColorProfile::from_icc(icc).unwrap();

        let white = [1.0, 1.0, 1.0];
        let relative = profile
            .evaluate_device_to_reference(RenderingIntent::RelativeColorimetric, &white)
            .unwrap();
        let absolute = profile
            .evaluate_device_to_reference(RenderingIntent::AbsoluteColorimetric, &white)
            .unwrap();
        let ratio = stored(paper).y / stored(D50).y;
        assert!((absolute[1] - relative[1] * ratio).abs() < 1e-12);
        assert!((absolute[1] - relative[1] * 0.95).abs() < 1e-4);

        let back = profile
            .evaluate_reference_to_device(RenderingIntent::AbsoluteColorimetric, absolute)
            .unwrap();
        for c in 0..3 {
            assert!((back[c] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_absolute_colorimetric_rejects_zero_media_white() {
        let icc = display(ColorSpace::Xyz)
            .with_tag(TagSignature::MEDIA_WHITE, xyz_tag(Xyz::new(0.9642, 0.0, 0.8249)));
        let profile = ColorProfile::from_icc(icc).unwrap();
        let intent = RenderingIntent::AbsoluteColorimetric;

        assert!(matches!(
            profile.evaluate_device_to_reference(intent, &[0.5, 0.5, 0.5]),
            Err(Error::DegenerateWhitePoint(_))
        ));
        assert!(matches!(
            profile.evaluate_reference_to_device(intent, [0.4, 0.4, 0.3]),
            Err(Error::DegenerateWhitePoint(_))
        ));

        // Relative data never looks at the media white
        assert!(profile
            .evaluate_device_to_reference(RenderingIntent::RelativeColorimetric, &[0.5, 0.5, 0.5])
            .is_ok());
    }

    #[test]
    fn test_absolute_colorimetric_without_white_point_is_relative() {
        let mut icc = display(ColorSpace::Xyz);
        icc.tags.remove(&TagSignature::MEDIA_WHITE);
        let profile = ColorProfile::from_icc(icc).unwrap();
        let rgb = [0.2, 0.4, 0.6];
        assert_eq!(
            profile.evaluate_device_to_reference(RenderingIntent::AbsoluteColorimetric, &rgb),
            profile.evaluate_device_to_reference(RenderingIntent::RelativeColorimetric, &rgb)
        );
    }
}
