//! Accuracy measurement
//!
//! PCS results are compared with CIEDE2000 under D50; LUT buffers are
//! compared in 16-bit code values.

use oxlut_core::Lut3d;

/// Statistics from a ΔE comparison
#[derive(Debug, Clone, Default)]
pub struct DeltaEStats {
    pub mean: f64,
    pub max: f64,
    pub p95: f64,
    pub count: usize,
}

impl DeltaEStats {
    pub fn from_deltas(mut deltas: Vec<f64>) -> Self {
        if deltas.is_empty() {
            return Self::default();
        }
        deltas.sort_by(f64::total_cmp);
        let count = deltas.len();
        Self {
            mean: deltas.iter().sum::<f64>() / count as f64,
            max: deltas[count - 1],
            p95: deltas[((count as f64 * 0.95) as usize).min(count - 1)],
            count,
        }
    }

    /// Imperceptible everywhere
    pub fn is_excellent(&self) -> bool {
        self.max < 1.0
    }

    pub fn is_acceptable(&self) -> bool {
        self.max < 3.5
    }
}

/// CIEDE2000 between two Lab colours, unit weighting factors
pub fn delta_e_2000(lab1: [f64; 3], lab2: [f64; 3]) -> f64 {
    let [l1, a1, b1] = lab1;
    let [l2, a2, b2] = lab2;
    const POW25_7: f64 = 6_103_515_625.0;

    let c_avg = ((a1 * a1 + b1 * b1).sqrt() + (a2 * a2 + b2 * b2).sqrt()) / 2.0;
    let g = 0.5 * (1.0 - (c_avg.powi(7) / (c_avg.powi(7) + POW25_7)).sqrt());

    let (a1p, a2p) = (a1 * (1.0 + g), a2 * (1.0 + g));
    let (c1p, c2p) = ((a1p * a1p + b1 * b1).sqrt(), (a2p * a2p + b2 * b2).sqrt());

    let hue = |b: f64, a: f64| {
        if a == 0.0 && b == 0.0 {
            0.0
        } else {
            b.atan2(a).to_degrees().rem_euclid(360.0)
        }
    };
    let (h1p, h2p) = (hue(b1, a1p), hue(b2, a2p));
    let chroma_product = c1p * c2p;

    let dh = if chroma_product == 0.0 {
        0.0
    } else {
        match h2p - h1p {
            d if d > 180.0 => d - 360.0,
            d if d < -180.0 => d + 360.0,
            d => d,
        }
    };
    let dl = l2 - l1;
    let dc = c2p - c1p;
    let dh_big = 2.0 * chroma_product.sqrt() * (dh.to_radians() / 2.0).sin();

    let l_avg = (l1 + l2) / 2.0;
    let c_avg_p = (c1p + c2p) / 2.0;
    let h_avg = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_avg - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_avg).to_radians().cos()
        + 0.32 * (3.0 * h_avg + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_avg - 63.0).to_radians().cos();

    let l50 = (l_avg - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l50 / (20.0 + l50).sqrt();
    let s_c = 1.0 + 0.045 * c_avg_p;
    let s_h = 1.0 + 0.015 * c_avg_p * t;

    let theta = 30.0 * (-((h_avg - 275.0) / 25.0).powi(2)).exp();
    let r_c = 2.0 * (c_avg_p.powi(7) / (c_avg_p.powi(7) + POW25_7)).sqrt();
    let r_t = -r_c * (2.0 * theta).to_radians().sin();

    let (tl, tc, th) = (dl / s_l, dc / s_c, dh_big / s_h);
    (tl * tl + tc * tc + th * th + r_t * tc * th).sqrt()
}

/// PCS XYZ → Lab relative to the ICC D50 white
pub fn xyz_to_lab_d50(xyz: [f64; 3]) -> [f64; 3] {
    const WHITE: [f64; 3] = [0.9642, 1.0, 0.8249];
    let f = |t: f64| {
        const DELTA: f64 = 6.0 / 29.0;
        if t > DELTA * DELTA * DELTA {
            t.cbrt()
        } else {
            t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
        }
    };
    let [fx, fy, fz] = [0, 1, 2].map(|i| f(xyz[i] / WHITE[i]));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// ΔE2000 statistics between two sets of PCS XYZ values
pub fn compare_xyz(reference: &[[f64; 3]], result: &[[f64; 3]]) -> DeltaEStats {
    assert_eq!(reference.len(), result.len());
    DeltaEStats::from_deltas(
        reference
            .iter()
            .zip(result)
            .map(|(r, o)| delta_e_2000(xyz_to_lab_d50(*r), xyz_to_lab_d50(*o)))
            .collect(),
    )
}

/// Largest absolute code-value difference across all three channels
pub fn max_code_diff(a: &Lut3d, b: &Lut3d) -> u32 {
    assert_eq!(a.grid, b.grid);
    [(&a.r, &b.r), (&a.g, &b.g), (&a.b, &b.b)]
        .into_iter()
        .flat_map(|(x, y)| x.iter().zip(y.iter()).map(|(p, q)| p.abs_diff(*q)))
        .max()
        .unwrap_or(0)
}
