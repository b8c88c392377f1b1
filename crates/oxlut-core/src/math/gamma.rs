//! Transfer functions
//!
//! ICC parametric curves (types 0-4, ICC.1:2022 section 10.18) with closed-form
//! inverses. Curves are evaluated on the whole real line: the formula is used
//! as-is above 1.0 and mirrored through the origin below 0.0, so out-of-gamut
//! values survive a round trip instead of being clipped.

/// sRGB decode (encoded → linear), IEC 61966-2-1
#[inline]
pub fn srgb_gamma_decode(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB encode (linear → encoded), IEC 61966-2-1
#[inline]
pub fn srgb_gamma_encode(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// ICC parametric curve function type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricCurveType {
    /// Type 0: Y = X^g
    Gamma,
    /// Type 1: Y = (aX + b)^g  if X >= -b/a, else 0
    CIE122,
    /// Type 2: Y = (aX + b)^g + c  if X >= -b/a, else c
    IEC61966_3,
    /// Type 3: Y = (aX + b)^g  if X >= d, else cX
    IEC61966_2_1,
    /// Type 4: Y = (aX + b)^g + e  if X >= d, else cX + f
    Full,
}

impl ParametricCurveType {
    pub fn from_icc(function_type: u16) -> Option<Self> {
        match function_type {
            0 => Some(Self::Gamma),
            1 => Some(Self::CIE122),
            2 => Some(Self::IEC61966_3),
            3 => Some(Self::IEC61966_2_1),
            4 => Some(Self::Full),
            _ => None,
        }
    }

    pub fn to_icc(self) -> u16 {
        match self {
            Self::Gamma => 0,
            Self::CIE122 => 1,
            Self::IEC61966_3 => 2,
            Self::IEC61966_2_1 => 3,
            Self::Full => 4,
        }
    }

    /// Number of stored parameters for this function type
    pub fn param_count(&self) -> usize {
        match self {
            Self::Gamma => 1,
            Self::CIE122 => 3,
            Self::IEC61966_3 => 4,
            Self::IEC61966_2_1 => 5,
            Self::Full => 7,
        }
    }
}

/// ICC parametric curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub curve_type: ParametricCurveType,
    pub g: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ParametricCurve {
    /// Pure power law (type 0)
    pub fn gamma(g: f64) -> Self {
        Self {
            curve_type: ParametricCurveType::Gamma,
            g,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// sRGB transfer function (type 3)
    pub fn srgb() -> Self {
        Self {
            curve_type: ParametricCurveType::IEC61966_2_1,
            g: 2.4,
            a: 1.0 / 1.055,
            b: 0.055 / 1.055,
            c: 1.0 / 12.92,
            d: 0.04045,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Build from the parameter list stored in a `para` tag or `mAB` curve.
    pub fn from_params(curve_type: ParametricCurveType, params: &[f64]) -> Option<Self> {
        if params.len() < curve_type.param_count() {
            return None;
        }

        let mut curve = Self::gamma(params[0]);
        curve.curve_type = curve_type;

        match curve_type {
            ParametricCurveType::Gamma => {}
            ParametricCurveType::CIE122 => {
                curve.a = params[1];
                curve.b = params[2];
            }
            ParametricCurveType::IEC61966_3 => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
            }
            ParametricCurveType::IEC61966_2_1 => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
                curve.d = params[4];
            }
            ParametricCurveType::Full => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
                curve.d = params[4];
                curve.e = params[5];
                curve.f = params[6];
            }
        }

        Some(curve)
    }

    /// Parameters in ICC storage order
    pub fn params(&self) -> Vec<f64> {
        let all = [self.g, self.a, self.b, self.c, self.d, self.e, self.f];
        all[..self.curve_type.param_count()].to_vec()
    }

    /// Forward evaluation (encoded → linear)
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        if x < 0.0 {
            -self.eval_positive(-x)
        } else {
            self.eval_positive(x)
        }
    }

    /// Inverse evaluation (linear → encoded)
    #[inline]
    pub fn eval_inverse(&self, y: f64) -> f64 {
        if y < 0.0 {
            -self.inverse_positive(-y)
        } else {
            self.inverse_positive(y)
        }
    }

    fn power(&self, x: f64) -> f64 {
        (self.a * x + self.b).max(0.0).powf(self.g)
    }

    fn power_inverse(&self, y: f64) -> f64 {
        if self.a.abs() < 1e-12 || self.g.abs() < 1e-12 {
            return 0.0;
        }
        ((y.max(0.0).powf(1.0 / self.g) - self.b) / self.a).max(0.0)
    }

    fn break_point(&self) -> f64 {
        if self.a.abs() > 1e-12 {
            -self.b / self.a
        } else {
            0.0
        }
    }

    fn eval_positive(&self, x: f64) -> f64 {
        match self.curve_type {
            ParametricCurveType::Gamma => x.powf(self.g),
            ParametricCurveType::CIE122 => {
                if x >= self.break_point() {
                    self.power(x)
                } else {
                    0.0
                }
            }
            ParametricCurveType::IEC61966_3 => {
                if x >= self.break_point() {
                    self.power(x) + self.c
                } else {
                    self.c
                }
            }
            ParametricCurveType::IEC61966_2_1 => {
                if x >= self.d {
                    self.power(x)
                } else {
                    self.c * x
                }
            }
            ParametricCurveType::Full => {
                if x >= self.d {
                    self.power(x) + self.e
                } else {
                    self.c * x + self.f
                }
            }
        }
    }

    fn inverse_positive(&self, y: f64) -> f64 {
        match self.curve_type {
            ParametricCurveType::Gamma => {
                if self.g.abs() < 1e-12 {
                    y
                } else {
                    y.powf(1.0 / self.g)
                }
            }
            ParametricCurveType::CIE122 => {
                if y <= 0.0 {
                    self.break_point().max(0.0)
                } else {
                    self.power_inverse(y)
                }
            }
            ParametricCurveType::IEC61966_3 => {
                if y <= self.c {
                    self.break_point().max(0.0)
                } else {
                    self.power_inverse(y - self.c)
                }
            }
            ParametricCurveType::IEC61966_2_1 => {
                if y >= self.power(self.d) {
                    self.power_inverse(y)
                } else if self.c.abs() > 1e-12 {
                    y / self.c
                } else {
                    0.0
                }
            }
            ParametricCurveType::Full => {
                if y >= self.power(self.d) + self.e {
                    self.power_inverse(y - self.e)
                } else if self.c.abs() > 1e-12 {
                    ((y - self.f) / self.c).max(0.0)
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_srgb_gamma_roundtrip() {
        for i in 0..=255 {
            let encoded = i as f64 / 255.0;
            let roundtrip = srgb_gamma_encode(srgb_gamma_decode(encoded));
            assert!((roundtrip - encoded).abs() < 1e-10, "sRGB roundtrip failed at {i}");
        }
    }

    #[test]
    fn test_parametric_srgb_matches_reference() {
        let curve = ParametricCurve::srgb();
        for i in 0..=255 {
            let x = i as f64 / 255.0;
            assert!(
                (curve.eval(x) - srgb_gamma_decode(x)).abs() < 1e-9,
                "sRGB parametric mismatch at {i}"
            );
        }
    }

    #[test]
    fn test_inverse_roundtrip_all_types() {
        let curves = [
            ParametricCurve::gamma(2.2),
            ParametricCurve::from_params(ParametricCurveType::CIE122, &[2.4, 1.0, 0.0]).unwrap(),
            ParametricCurve::from_params(ParametricCurveType::IEC61966_3, &[2.0, 1.0, 0.0, 0.0])
                .unwrap(),
            ParametricCurve::srgb(),
            ParametricCurve::from_params(
                ParametricCurveType::Full,
                &[2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045, 0.0, 0.0],
            )
            .unwrap(),
        ];

        for curve in curves {
            for i in 1..=100 {
                let x = i as f64 / 100.0;
                let back = curve.eval_inverse(curve.eval(x));
                assert!(
                    (back - x).abs() < 1e-8,
                    "{:?}: {x} -> {back}",
                    curve.curve_type
                );
            }
        }
    }

    #[test]
    fn test_extension_outside_unit_range() {
        let curve = ParametricCurve::gamma(2.0);
        assert!((curve.eval(2.0) - 4.0).abs() < EPSILON);
        assert!((curve.eval(-0.5) + 0.25).abs() < EPSILON);
        assert!((curve.eval_inverse(-0.25) + 0.5).abs() < EPSILON);
        assert!((curve.eval_inverse(4.0) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_params_roundtrip_through_from_params() {
        let srgb = ParametricCurve::srgb();
        let rebuilt = ParametricCurve::from_params(srgb.curve_type, &srgb.params()).unwrap();
        assert_eq!(srgb, rebuilt);
        assert!(ParametricCurve::from_params(ParametricCurveType::Full, &[1.0, 2.0]).is_none());
    }
}
