//! CIE standard illuminants as XYZ with Y = 1

use crate::color::Xyz;

/// D50, the ICC profile connection space illuminant (ICC.1:2022 7.2.16)
pub const D50: Xyz = Xyz::new(0.9642, 1.0, 0.8249);

/// D55, mid-morning daylight
pub const D55: Xyz = Xyz::new(0.9568, 1.0, 0.9214);

/// D65, sRGB and most display white points
pub const D65: Xyz = Xyz::new(0.9505, 1.0, 1.0890);

/// D93, the "9300K" white of older broadcast monitors
pub const D93: Xyz = Xyz::new(0.9531, 1.0, 1.4127);

/// Illuminant A, incandescent
pub const A: Xyz = Xyz::new(1.0985, 1.0, 0.3558);

/// Equal-energy illuminant
pub const E: Xyz = Xyz::new(1.0, 1.0, 1.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d65_chromaticity() {
        let (x, y, _) = D65.to_xyy();
        assert!((x - 0.3127).abs() < 0.001);
        assert!((y - 0.3290).abs() < 0.001);
    }
}
