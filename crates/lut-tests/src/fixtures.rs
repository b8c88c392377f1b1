//! Synthetic ICC profiles
//!
//! A minimal ICC v4 writer, enough to build matrix-shaper, gray and LUT
//! profiles with the optional tags the chain reads (`lumi`, `bkpt`, `chad`).
//! The output parses with lcms2 and moxcms as well as with `oxlut-core`.

use std::io::Write;
use std::path::Path;

use oxlut_core::color::{Lab, Xyz};

/// ICC D50 as stored in headers
pub const D50: [f64; 3] = [0.9642, 1.0, 0.8249];

/// sRGB primaries adapted to D50, columns of the colorant matrix
pub const SRGB_COLORANTS: [[f64; 3]; 3] = [
    [0.436_074_7, 0.222_504_5, 0.013_932_2],
    [0.385_064_9, 0.716_878_6, 0.097_104_5],
    [0.143_080_4, 0.060_616_9, 0.714_173_3],
];

/// Display P3 primaries adapted to D50
pub const P3_COLORANTS: [[f64; 3]; 3] = [
    [0.515_102, 0.241_182, -0.001_049],
    [0.291_965, 0.692_236, 0.041_882],
    [0.157_153, 0.066_582, 0.784_378],
];

/// Bradford D65 → D50
pub const BRADFORD_D65_TO_D50: [[f64; 3]; 3] = [
    [1.047_811, 0.022_887, -0.050_127],
    [0.029_542, 0.990_484, -0.017_049],
    [-0.009_234, 0.015_044, 0.752_132],
];

fn s15f16(v: f64) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_be_bytes()
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn type_header(sig: &[u8; 4]) -> Vec<u8> {
    let mut buf = sig.to_vec();
    buf.extend_from_slice(&[0; 4]);
    buf
}

/// `XYZ ` tag body
pub fn xyz_type(xyz: [f64; 3]) -> Vec<u8> {
    let mut buf = type_header(b"XYZ ");
    for v in xyz {
        buf.extend_from_slice(&s15f16(v));
    }
    buf
}

/// `curv` with a single u8Fixed8 gamma
pub fn curv_gamma(gamma: f64) -> Vec<u8> {
    let mut buf = type_header(b"curv");
    buf.extend_from_slice(&1u32.to_be_bytes());
    buf.extend_from_slice(&((gamma * 256.0).round() as u16).to_be_bytes());
    buf
}

/// `curv` sampled table
pub fn curv_table(table: &[u16]) -> Vec<u8> {
    let mut buf = type_header(b"curv");
    buf.extend_from_slice(&(table.len() as u32).to_be_bytes());
    for v in table {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    buf
}

/// `para` tag of the given ICC function type
pub fn para(function_type: u16, params: &[f64]) -> Vec<u8> {
    let mut buf = type_header(b"para");
    buf.extend_from_slice(&function_type.to_be_bytes());
    buf.extend_from_slice(&[0; 2]);
    for &p in params {
        buf.extend_from_slice(&s15f16(p));
    }
    buf
}

/// The IEC 61966-2-1 transfer function as `para` type 3
pub fn srgb_trc() -> Vec<u8> {
    para(3, &[2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045])
}

/// Single-record `mluc` (en-US)
pub fn mluc(text: &str) -> Vec<u8> {
    let utf16: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut buf = type_header(b"mluc");
    buf.extend_from_slice(&1u32.to_be_bytes());
    buf.extend_from_slice(&12u32.to_be_bytes());
    buf.extend_from_slice(b"enUS");
    buf.extend_from_slice(&(utf16.len() as u32).to_be_bytes());
    buf.extend_from_slice(&28u32.to_be_bytes());
    buf.extend_from_slice(&utf16);
    buf
}

/// `sf32` 3×3 matrix, row-major
pub fn sf32(matrix: [[f64; 3]; 3]) -> Vec<u8> {
    let mut buf = type_header(b"sf32");
    for v in matrix.iter().flatten() {
        buf.extend_from_slice(&s15f16(*v));
    }
    buf
}

/// `mft2` with the identity matrix and two-entry (linear) shaper tables
///
/// `clut` holds `grid^inputs × outputs` samples, last input fastest.
pub fn mft2(inputs: u8, outputs: u8, grid: u8, clut: &[u16]) -> Vec<u8> {
    let mut buf = type_header(b"mft2");
    buf.extend_from_slice(&[inputs, outputs, grid, 0]);
    for row in 0..3 {
        for col in 0..3 {
            buf.extend_from_slice(&s15f16(if row == col { 1.0 } else { 0.0 }));
        }
    }
    buf.extend_from_slice(&2u16.to_be_bytes());
    buf.extend_from_slice(&2u16.to_be_bytes());
    let linear = |buf: &mut Vec<u8>| {
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&u16::MAX.to_be_bytes());
    };
    for _ in 0..inputs {
        linear(&mut buf);
    }
    for v in clut {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    for _ in 0..outputs {
        linear(&mut buf);
    }
    buf
}

/// `mAB `/`mBA ` element layout for a three-channel matrix/curve pipeline
///
/// `device_curves` are the A curves, `matrix` is applied with a zero offset
/// and M/B curves are identity.
pub fn mab_matrix(a_to_b: bool, device_curves: &[Vec<u8>; 3], matrix: [[f64; 3]; 3]) -> Vec<u8> {
    let mut buf = type_header(if a_to_b { b"mAB " } else { b"mBA " });
    buf.extend_from_slice(&[3, 3, 0, 0]);
    // Offsets patched below: B, matrix, M, CLUT, A
    buf.extend_from_slice(&[0; 20]);

    let identity_set = |buf: &mut Vec<u8>| -> u32 {
        let at = buf.len() as u32;
        for _ in 0..3 {
            buf.extend_from_slice(&type_header(b"curv")[..]);
            buf.extend_from_slice(&0u32.to_be_bytes());
        }
        at
    };

    let b_off = identity_set(&mut buf);

    let matrix_off = buf.len() as u32;
    for v in matrix.iter().flatten() {
        buf.extend_from_slice(&s15f16(*v));
    }
    buf.extend_from_slice(&[0; 12]);

    let m_off = identity_set(&mut buf);

    let a_off = buf.len() as u32;
    for curve in device_curves {
        buf.extend_from_slice(curve);
        pad4(&mut buf);
    }

    for (slot, off) in [b_off, matrix_off, m_off, 0, a_off].into_iter().enumerate() {
        buf[12 + slot * 4..16 + slot * 4].copy_from_slice(&off.to_be_bytes());
    }
    buf
}

/// ICC profile byte builder
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    class: [u8; 4],
    color_space: [u8; 4],
    pcs: [u8; 4],
    version: (u8, u8),
    illuminant: [f64; 3],
    tags: Vec<([u8; 4], Vec<u8>)>,
}

impl ProfileBuilder {
    pub fn new(class: &[u8; 4], color_space: &[u8; 4], pcs: &[u8; 4]) -> Self {
        Self {
            class: *class,
            color_space: *color_space,
            pcs: *pcs,
            version: (4, 3),
            illuminant: D50,
            tags: Vec::new(),
        }
    }

    pub fn version(mut self, major: u8, minor: u8) -> Self {
        self.version = (major, minor);
        self
    }

    pub fn illuminant(mut self, xyz: [f64; 3]) -> Self {
        self.illuminant = xyz;
        self
    }

    /// Add or replace a tag
    pub fn tag(mut self, sig: &[u8; 4], body: Vec<u8>) -> Self {
        self.tags.retain(|(s, _)| s != sig);
        self.tags.push((*sig, body));
        self
    }

    pub fn without_tag(mut self, sig: &[u8; 4]) -> Self {
        self.tags.retain(|(s, _)| s != sig);
        self
    }

    pub fn description(self, text: &str) -> Self {
        self.tag(b"desc", mluc(text))
    }

    pub fn white_point(self, xyz: [f64; 3]) -> Self {
        self.tag(b"wtpt", xyz_type(xyz))
    }

    pub fn black_point(self, xyz: [f64; 3]) -> Self {
        self.tag(b"bkpt", xyz_type(xyz))
    }

    /// Absolute luminance in cd/m²
    pub fn luminance(self, nits: f64) -> Self {
        self.tag(b"lumi", xyz_type([0.0, nits, 0.0]))
    }

    pub fn chad(self, matrix: [[f64; 3]; 3]) -> Self {
        self.tag(b"chad", sf32(matrix))
    }

    pub fn build(&self) -> Vec<u8> {
        let dir_len = 4 + self.tags.len() * 12;
        let mut body = Vec::new();
        let mut directory = Vec::with_capacity(dir_len);
        directory.extend_from_slice(&(self.tags.len() as u32).to_be_bytes());

        for (sig, data) in &self.tags {
            let offset = 128 + dir_len + body.len();
            directory.extend_from_slice(sig);
            directory.extend_from_slice(&(offset as u32).to_be_bytes());
            directory.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(data);
            pad4(&mut body);
        }

        let size = 128 + dir_len + body.len();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&(size as u32).to_be_bytes());
        out.extend_from_slice(b"lcms");
        out.extend_from_slice(&[self.version.0, self.version.1 << 4, 0, 0]);
        out.extend_from_slice(&self.class);
        out.extend_from_slice(&self.color_space);
        out.extend_from_slice(&self.pcs);
        // 2024-01-01 00:00:00
        for v in [2024u16, 1, 1, 0, 0, 0] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(b"acsp");
        out.extend_from_slice(b"APPL");
        out.extend_from_slice(&[0; 4 + 4 + 4 + 8]);
        out.extend_from_slice(&0u32.to_be_bytes());
        for v in self.illuminant {
            out.extend_from_slice(&s15f16(v));
        }
        out.extend_from_slice(b"oxlt");
        out.resize(128, 0);

        out.extend_from_slice(&directory);
        out.extend_from_slice(&body);
        out
    }

    /// Write to a named temporary file that lives as long as the handle
    pub fn write_temp(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".icc").tempfile()?;
        file.write_all(&self.build())?;
        file.flush()?;
        Ok(file)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// RGB display profile from colorants and one TRC body shared by all channels
pub fn matrix_shaper(colorants: [[f64; 3]; 3], trc: Vec<u8>) -> ProfileBuilder {
    ProfileBuilder::new(b"mntr", b"RGB ", b"XYZ ")
        .description("oxlut matrix/TRC fixture")
        .white_point(D50)
        .tag(b"rXYZ", xyz_type(colorants[0]))
        .tag(b"gXYZ", xyz_type(colorants[1]))
        .tag(b"bXYZ", xyz_type(colorants[2]))
        .tag(b"rTRC", trc.clone())
        .tag(b"gTRC", trc.clone())
        .tag(b"bTRC", trc)
}

/// sRGB with the piecewise TRC and an 80 cd/m² luminance
pub fn srgb() -> ProfileBuilder {
    matrix_shaper(SRGB_COLORANTS, srgb_trc())
        .description("sRGB (oxlut fixture)")
        .luminance(80.0)
}

pub fn gamma_rgb(gamma: f64) -> ProfileBuilder {
    matrix_shaper(SRGB_COLORANTS, curv_gamma(gamma))
}

/// Display P3 with a measured D65 white, stored D50-adapted behind a `chad`
pub fn display_p3(nits: f64) -> ProfileBuilder {
    matrix_shaper(P3_COLORANTS, srgb_trc())
        .description("Display P3 (oxlut fixture)")
        .chad(BRADFORD_D65_TO_D50)
        .luminance(nits)
}

pub fn gray(gamma: f64) -> ProfileBuilder {
    ProfileBuilder::new(b"mntr", b"GRAY", b"XYZ ")
        .description("oxlut gray fixture")
        .white_point(D50)
        .tag(b"kTRC", curv_gamma(gamma))
}

/// sRGB as `mAB `/`mBA ` tables on an XYZ PCS
pub fn srgb_mab() -> ProfileBuilder {
    // mAB matrix output is PCS XYZ normalised by 1 + 32767/32768
    let xyz_scale = 65535.0 / 32768.0;
    let forward = rows_from_columns(SRGB_COLORANTS).map(|row| row.map(|v| v / xyz_scale));
    let inverse = invert(rows_from_columns(SRGB_COLORANTS)).map(|row| row.map(|v| v * xyz_scale));

    let decode = [srgb_trc(), srgb_trc(), srgb_trc()];
    let encode = para(
        4,
        &[1.0 / 2.4, 1.055f64.powf(2.4), 0.0, 12.92, 0.003_130_8, -0.055, 0.0],
    );
    let encode = [encode.clone(), encode.clone(), encode];

    ProfileBuilder::new(b"mntr", b"RGB ", b"XYZ ")
        .description("sRGB mAB (oxlut fixture)")
        .white_point(D50)
        .tag(b"A2B0", mab_matrix(true, &decode, forward))
        .tag(b"B2A0", mab_matrix(false, &encode, inverse))
}

/// sRGB sampled into `mft2` tables on a Lab PCS
pub fn srgb_lab_lut(grid: u8) -> ProfileBuilder {
    let g = usize::from(grid);
    let white = Xyz::from_array(D50);
    let matrix = rows_from_columns(SRGB_COLORANTS);
    let inverse = invert(matrix);
    let step = (g - 1) as f64;

    let mut a2b = Vec::with_capacity(g * g * g * 3);
    let mut b2a = Vec::with_capacity(g * g * g * 3);
    for i in 0..g {
        for j in 0..g {
            for k in 0..g {
                let node = [i, j, k].map(|n| n as f64 / step);

                let linear = node.map(srgb_decode);
                let xyz = Xyz::from_array(mul(&matrix, linear));
                let lab = Lab::from_xyz_with_white(xyz, &white).to_array();
                a2b.extend(encode_lab_legacy(lab));

                let lab = decode_lab_legacy(node);
                let xyz = Lab::from_array(lab).to_xyz_with_white(&white);
                let rgb = mul(&inverse, xyz.to_array()).map(|v| srgb_encode(v.clamp(0.0, 1.0)));
                b2a.extend(rgb.map(|v| (v * 65535.0).round() as u16));
            }
        }
    }

    ProfileBuilder::new(b"mntr", b"RGB ", b"Lab ")
        .description("sRGB Lab LUT (oxlut fixture)")
        .white_point(D50)
        .tag(b"A2B0", mft2(3, 3, grid, &a2b))
        .tag(b"B2A0", mft2(3, 3, grid, &b2a))
}

pub fn srgb_decode(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

pub fn srgb_encode(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Lab → 16-bit v2 (`mft2`) encoding
fn encode_lab_legacy(lab: [f64; 3]) -> [u16; 3] {
    let l = (lab[0] / 100.0 * 65280.0).clamp(0.0, 65535.0);
    let a = ((lab[1] + 128.0) * 256.0).clamp(0.0, 65535.0);
    let b = ((lab[2] + 128.0) * 256.0).clamp(0.0, 65535.0);
    [l, a, b].map(|v| v.round() as u16)
}

/// Normalised v2 encoding → Lab
fn decode_lab_legacy(v: [f64; 3]) -> [f64; 3] {
    let raw = v.map(|x| x * 65535.0);
    [raw[0] / 65280.0 * 100.0, raw[1] / 256.0 - 128.0, raw[2] / 256.0 - 128.0]
}

fn rows_from_columns(columns: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut rows = [[0.0; 3]; 3];
    for (c, column) in columns.iter().enumerate() {
        for (r, &v) in column.iter().enumerate() {
            rows[r][c] = v;
        }
    }
    rows
}

fn mul(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    m.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

fn invert(m: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0];
    [
        [cof(1, 2, 1, 2) / det, -cof(0, 2, 1, 2) / det, cof(0, 1, 1, 2) / det],
        [-cof(1, 2, 0, 2) / det, cof(0, 2, 0, 2) / det, -cof(0, 1, 0, 2) / det],
        [cof(1, 2, 0, 1) / det, -cof(0, 2, 0, 1) / det, cof(0, 1, 0, 1) / det],
    ]
}
