//! Multi-dimensional table tags
//!
//! - `mft1` / `mft2` (lut8Type, lut16Type): matrix, input tables, CLUT, output tables
//! - `mAB ` / `mBA ` (lutAToBType, lutBToAType): optional A, CLUT, M, matrix and B elements
//!
//! Table and CLUT samples are normalised to `[0, 1]` at decode time so the
//! pipeline never deals with the storage precision. See ICC.1:2022 10.10-10.13.

use crate::icc::error::IccError;
use crate::icc::types::{read_s15f16, read_u16, read_u32};

use super::curves::{CurveData, ParametricCurveData};

/// Precision of an `mft` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MftPrecision {
    Lut8,
    Lut16,
}

/// Decoded `mft1` or `mft2` tag
#[derive(Debug, Clone, PartialEq)]
pub struct MftData {
    pub precision: MftPrecision,
    pub input_channels: usize,
    pub output_channels: usize,
    /// Row-major 3×3 matrix, only meaningful for XYZ input
    pub matrix: [[f64; 3]; 3],
    /// One normalised table per input channel
    pub input_tables: Vec<Vec<f64>>,
    pub clut: Clut,
    /// One normalised table per output channel
    pub output_tables: Vec<Vec<f64>>,
}

impl MftData {
    /// Parse the body of an `mft1`/`mft2` tag (after type signature and reserved bytes).
    pub fn parse(data: &[u8], precision: MftPrecision) -> Result<Self, IccError> {
        let header_len = match precision {
            MftPrecision::Lut8 => 40,
            MftPrecision::Lut16 => 44,
        };
        if data.len() < header_len {
            return Err(IccError::CorruptedData("lut tag too small".to_string()));
        }

        let input_channels = usize::from(data[0]);
        let output_channels = usize::from(data[1]);
        let grid = data[2];
        if input_channels == 0 || output_channels == 0 || input_channels > 15 {
            return Err(IccError::CorruptedData(format!(
                "lut tag with {input_channels} inputs and {output_channels} outputs"
            )));
        }

        let mut matrix = [[0.0; 3]; 3];
        for (row, values) in matrix.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = read_s15f16(data, 4 + (row * 3 + col) * 4);
            }
        }

        let (input_entries, output_entries, sample_size) = match precision {
            MftPrecision::Lut8 => (256, 256, 1),
            MftPrecision::Lut16 => (
                usize::from(read_u16(data, 40)),
                usize::from(read_u16(data, 42)),
                2,
            ),
        };

        let mut reader = SampleReader {
            data,
            pos: header_len,
            sample_size,
        };

        let input_tables = (0..input_channels)
            .map(|_| reader.samples(input_entries))
            .collect::<Result<Vec<_>, _>>()?;

        let clut_len = clut_entries(&vec![grid; input_channels], output_channels)?;
        let clut = Clut {
            grid_points: vec![grid; input_channels],
            output_channels,
            data: reader.samples(clut_len)?,
        };

        let output_tables = (0..output_channels)
            .map(|_| reader.samples(output_entries))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            precision,
            input_channels,
            output_channels,
            matrix,
            input_tables,
            clut,
            output_tables,
        })
    }

    pub fn matrix_is_identity(&self) -> bool {
        self.matrix.iter().enumerate().all(|(row, values)| {
            values.iter().enumerate().all(|(col, &v)| {
                let expected = if row == col { 1.0 } else { 0.0 };
                (v - expected).abs() < 1e-6
            })
        })
    }
}

/// Sequential big-endian sample reader normalising to `[0, 1]`
struct SampleReader<'a> {
    data: &'a [u8],
    pos: usize,
    sample_size: usize,
}

impl SampleReader<'_> {
    fn samples(&mut self, count: usize) -> Result<Vec<f64>, IccError> {
        let end = count
            .checked_mul(self.sample_size)
            .and_then(|n| n.checked_add(self.pos))
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| IccError::CorruptedData("lut tables truncated".to_string()))?;

        let values = self.data[self.pos..end]
            .chunks_exact(self.sample_size)
            .map(|chunk| match chunk {
                [v] => f64::from(*v) / 255.0,
                [hi, lo] => f64::from(u16::from_be_bytes([*hi, *lo])) / 65535.0,
                _ => 0.0,
            })
            .collect();
        self.pos = end;
        Ok(values)
    }
}

fn clut_entries(grid_points: &[u8], output_channels: usize) -> Result<usize, IccError> {
    grid_points
        .iter()
        .try_fold(output_channels, |acc, &g| acc.checked_mul(usize::from(g)))
        .ok_or_else(|| IccError::CorruptedData("clut size overflow".to_string()))
}

/// Direction of an `mAB`/`mBA` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MabDirection {
    /// Device → PCS: A, CLUT, M, matrix, B
    AToB,
    /// PCS → device: B, matrix, M, CLUT, A
    BToA,
}

/// Decoded `mAB ` or `mBA ` tag
#[derive(Debug, Clone, PartialEq)]
pub struct MabData {
    pub direction: MabDirection,
    pub input_channels: usize,
    pub output_channels: usize,
    pub a_curves: Option<Vec<ElementCurve>>,
    pub clut: Option<Clut>,
    pub m_curves: Option<Vec<ElementCurve>>,
    pub matrix: Option<LutMatrix>,
    pub b_curves: Option<Vec<ElementCurve>>,
}

impl MabData {
    /// Parse a whole `mAB`/`mBA` tag. Element offsets are relative to the tag
    /// start, so this takes the complete tag including its type signature.
    pub fn parse(tag: &[u8], direction: MabDirection) -> Result<Self, IccError> {
        if tag.len() < 32 {
            return Err(IccError::CorruptedData("lutAToB/lutBToA tag too small".to_string()));
        }

        let input_channels = usize::from(tag[8]);
        let output_channels = usize::from(tag[9]);
        if input_channels == 0 || output_channels == 0 {
            return Err(IccError::CorruptedData("lut tag without channels".to_string()));
        }

        let offset = |at: usize| read_u32(tag, at) as usize;
        let (b_off, matrix_off, m_off, clut_off, a_off) =
            (offset(12), offset(16), offset(20), offset(24), offset(28));

        // B and M sit on the PCS side, A on the device side.
        let (a_count, pcs_count) = match direction {
            MabDirection::AToB => (input_channels, output_channels),
            MabDirection::BToA => (output_channels, input_channels),
        };

        let curves = |off: usize, count: usize| -> Result<Option<Vec<ElementCurve>>, IccError> {
            if off == 0 {
                Ok(None)
            } else {
                parse_curve_set(tag, off, count).map(Some)
            }
        };

        let matrix = if matrix_off == 0 {
            None
        } else {
            let body = tag
                .get(matrix_off..)
                .ok_or_else(|| IccError::CorruptedData("lut matrix offset out of range".to_string()))?;
            Some(LutMatrix::parse(body)?)
        };

        let clut = if clut_off == 0 {
            None
        } else {
            let body = tag
                .get(clut_off..)
                .ok_or_else(|| IccError::CorruptedData("clut offset out of range".to_string()))?;
            Some(Clut::parse(body, input_channels, output_channels)?)
        };

        Ok(Self {
            direction,
            input_channels,
            output_channels,
            a_curves: curves(a_off, a_count)?,
            clut,
            m_curves: curves(m_off, pcs_count)?,
            matrix,
            b_curves: curves(b_off, pcs_count)?,
        })
    }
}

/// Matrix element of an `mAB`/`mBA` tag: 3×3 plus offset
#[derive(Debug, Clone, PartialEq)]
pub struct LutMatrix {
    pub matrix: [[f64; 3]; 3],
    pub offset: [f64; 3],
}

impl LutMatrix {
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 48 {
            return Err(IccError::CorruptedData("lut matrix too small".to_string()));
        }

        let mut matrix = [[0.0; 3]; 3];
        for (row, values) in matrix.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = read_s15f16(data, (row * 3 + col) * 4);
            }
        }
        let offset = [
            read_s15f16(data, 36),
            read_s15f16(data, 40),
            read_s15f16(data, 44),
        ];

        Ok(Self { matrix, offset })
    }
}

/// Colour lookup table with normalised samples
///
/// Samples are stored with the last input dimension varying fastest and
/// `output_channels` values per grid node.
#[derive(Debug, Clone, PartialEq)]
pub struct Clut {
    pub grid_points: Vec<u8>,
    pub output_channels: usize,
    pub data: Vec<f64>,
}

impl Clut {
    /// Parse the CLUT element of an `mAB`/`mBA` tag.
    pub fn parse(data: &[u8], input_channels: usize, output_channels: usize) -> Result<Self, IccError> {
        if data.len() < 20 || input_channels > 16 {
            return Err(IccError::CorruptedData("clut too small".to_string()));
        }

        let grid_points = data[..input_channels].to_vec();
        if grid_points.iter().any(|&g| g < 2) {
            return Err(IccError::CorruptedData("clut grid needs at least two points".to_string()));
        }

        let sample_size = usize::from(data[16]);
        if sample_size != 1 && sample_size != 2 {
            return Err(IccError::CorruptedData(format!(
                "clut precision {sample_size} not supported"
            )));
        }

        let count = clut_entries(&grid_points, output_channels)?;
        let mut reader = SampleReader {
            data,
            pos: 20,
            sample_size,
        };

        Ok(Self {
            grid_points,
            output_channels,
            data: reader.samples(count)?,
        })
    }
}

/// One curve of an `mAB`/`mBA` curve set
#[derive(Debug, Clone, PartialEq)]
pub enum ElementCurve {
    Sampled(CurveData),
    Parametric(ParametricCurveData),
}

/// Parse `count` consecutive `curv`/`para` elements starting at `offset`,
/// each padded to a 4-byte boundary.
fn parse_curve_set(tag: &[u8], offset: usize, count: usize) -> Result<Vec<ElementCurve>, IccError> {
    let mut curves = Vec::with_capacity(count);
    let mut pos = offset;

    for _ in 0..count {
        let element = tag
            .get(pos..)
            .filter(|rest| rest.len() >= 8)
            .ok_or_else(|| IccError::CorruptedData("curve set truncated".to_string()))?;

        let body = &element[8..];
        let (curve, len) = match &element[..4] {
            b"curv" => {
                let curve = CurveData::parse(body)?;
                let len = curve.encoded_len();
                (ElementCurve::Sampled(curve), len)
            }
            b"para" => {
                let curve = ParametricCurveData::parse(body)?;
                let len = curve.encoded_len();
                (ElementCurve::Parametric(curve), len)
            }
            other => {
                return Err(IccError::CorruptedData(format!(
                    "unexpected curve type {:08X} in curve set",
                    u32::from_be_bytes([other[0], other[1], other[2], other[3]])
                )));
            }
        };

        curves.push(curve);
        pos = (pos + 8 + len + 3) & !3;
    }

    Ok(curves)
}
