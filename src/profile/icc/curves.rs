//! Tone reproduction curves (`curv`, `para`) and the video card gamma
//! table (`vcgt`).

use byteorder::{BigEndian, ByteOrder};

use super::reader::signature_at;
use super::tags::{TYPE_HEADER_LEN, s15_fixed16};
use crate::profile::clut::{Clut, ClutEntry, sample_position};

// =============================================================================
// TRC
// =============================================================================

/// A decoded tone reproduction curve.
#[derive(Debug, Clone, PartialEq)]
pub enum Trc {
    Identity,
    Gamma(f64),
    /// Sampled curve, values normalized to `[0, 1]`.
    Table(Vec<f64>),
    /// Parametric curve: function type and its parameters.
    Parametric { function: u16, params: Vec<f64> },
}

impl Trc {
    pub fn parse(tag: &[u8]) -> Option<Self> {
        if tag.len() < TYPE_HEADER_LEN + 4 {
            return None;
        }
        let body = &tag[TYPE_HEADER_LEN..];
        match &signature_at(tag, 0) {
            b"curv" => {
                let count = BigEndian::read_u32(&body[0..4]) as usize;
                match count {
                    0 => Some(Trc::Identity),
                    1 => {
                        let gamma = body.get(4..6)?;
                        Some(Trc::Gamma(BigEndian::read_u16(gamma) as f64 / 256.0))
                    }
                    _ => {
                        let table = body.get(4..4 + count.checked_mul(2)?)?;
                        Some(Trc::Table(
                            table
                                .chunks_exact(2)
                                .map(|v| BigEndian::read_u16(v) as f64 / 65535.0)
                                .collect(),
                        ))
                    }
                }
            }
            b"para" => {
                let function = BigEndian::read_u16(&body[0..2]);
                let param_count = match function {
                    0 => 1,
                    1 => 3,
                    2 => 4,
                    3 => 5,
                    4 => 7,
                    _ => return None,
                };
                let params = body.get(4..4 + param_count * 4)?;
                Some(Trc::Parametric {
                    function,
                    params: params.chunks_exact(4).map(s15_fixed16).collect(),
                })
            }
            _ => None,
        }
    }

    /// Evaluate the curve at `x` in `[0, 1]`.
    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Trc::Identity => x,
            Trc::Gamma(g) => x.powf(*g),
            Trc::Table(table) => interpolate(table, x),
            Trc::Parametric { function, params } => eval_parametric(*function, params, x),
        }
    }
}

fn interpolate(table: &[f64], x: f64) -> f64 {
    match table.len() {
        0 => x,
        1 => table[0],
        len => {
            let pos = x * (len - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(len - 1);
            let frac = pos - lo as f64;
            table[lo] + (table[hi] - table[lo]) * frac
        }
    }
}

fn eval_parametric(function: u16, p: &[f64], x: f64) -> f64 {
    let pow = |base: f64, g: f64| base.max(0.0).powf(g);
    let y = match (function, p) {
        (0, [g]) => pow(x, *g),
        (1, [g, a, b]) => {
            if x >= -b / a {
                pow(a * x + b, *g)
            } else {
                0.0
            }
        }
        (2, [g, a, b, c]) => {
            if x >= -b / a {
                pow(a * x + b, *g) + c
            } else {
                *c
            }
        }
        (3, [g, a, b, c, d]) => {
            if x >= *d {
                pow(a * x + b, *g)
            } else {
                c * x
            }
        }
        (4, [g, a, b, c, d, e, f]) => {
            if x >= *d {
                pow(a * x + b, *g) + e
            } else {
                c * x + f
            }
        }
        _ => x,
    };
    y.clamp(0.0, 1.0)
}

// =============================================================================
// VCGT
// =============================================================================

const VCGT_TYPE_TABLE: u32 = 0;
const VCGT_TYPE_FORMULA: u32 = 1;

fn read_u8_entry(buf: &[u8]) -> f64 {
    buf[0] as f64
}

fn read_u16_entry(buf: &[u8]) -> f64 {
    BigEndian::read_u16(buf) as f64
}

/// Per-channel gamma formula: `min + (max - min) * x^gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcgtFormula {
    pub gamma: f64,
    pub min: f64,
    pub max: f64,
}

impl VcgtFormula {
    fn eval(&self, x: f64) -> f64 {
        self.min + (self.max - self.min) * x.powf(self.gamma)
    }
}

/// Decoded video card gamma table.
#[derive(Debug, Clone, PartialEq)]
pub enum Vcgt {
    /// One table per channel (a single table applies to all three),
    /// values normalized to `[0, 1]`.
    Table(Vec<Vec<f64>>),
    Formula([VcgtFormula; 3]),
}

impl Vcgt {
    pub fn parse(tag: &[u8]) -> Option<Self> {
        if tag.len() < TYPE_HEADER_LEN + 4 || &signature_at(tag, 0) != b"vcgt" {
            return None;
        }
        let body = &tag[TYPE_HEADER_LEN..];
        match BigEndian::read_u32(&body[0..4]) {
            VCGT_TYPE_TABLE => {
                let dims = body.get(4..10)?;
                let channels = BigEndian::read_u16(&dims[0..2]) as usize;
                let count = BigEndian::read_u16(&dims[2..4]) as usize;
                let entry_size = BigEndian::read_u16(&dims[4..6]) as usize;
                if !(channels == 1 || channels == 3) || count == 0 {
                    return None;
                }

                let (max, read): (f64, fn(&[u8]) -> f64) = match entry_size {
                    1 => (255.0, read_u8_entry),
                    2 => (65535.0, read_u16_entry),
                    _ => return None,
                };
                let total = channels * count * entry_size;
                let data = body.get(10..10 + total)?;
                let tables = data
                    .chunks_exact(count * entry_size)
                    .map(|channel| {
                        channel
                            .chunks_exact(entry_size)
                            .map(|v| read(v) / max)
                            .collect()
                    })
                    .collect();
                Some(Vcgt::Table(tables))
            }
            VCGT_TYPE_FORMULA => {
                let params = body.get(4..40)?;
                let channel = |i: usize| VcgtFormula {
                    gamma: s15_fixed16(&params[i * 12..i * 12 + 4]),
                    min: s15_fixed16(&params[i * 12 + 4..i * 12 + 8]),
                    max: s15_fixed16(&params[i * 12 + 8..i * 12 + 12]),
                };
                Some(Vcgt::Formula([channel(0), channel(1), channel(2)]))
            }
            _ => None,
        }
    }

    /// Resample to `size` entries.
    pub fn to_clut(&self, size: usize) -> Clut {
        match self {
            Vcgt::Table(tables) => {
                let table = |c: usize| &tables[c.min(tables.len() - 1)];
                Clut::new(
                    (0..size)
                        .map(|i| {
                            let x = sample_position(i, size);
                            let sample = |c| (interpolate(table(c), x) * 65535.0).round() as u16;
                            ClutEntry {
                                red: sample(0),
                                green: sample(1),
                                blue: sample(2),
                            }
                        })
                        .collect(),
                )
            }
            Vcgt::Formula([r, g, b]) => {
                Clut::from_fn(size, |x| r.eval(x), |x| g.eval(x), |x| b.eval(x))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(type_sig: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut data = type_sig.to_vec();
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_curv_identity() {
        let trc = Trc::parse(&tag(b"curv", &0u32.to_be_bytes())).unwrap();
        assert_eq!(trc, Trc::Identity);
        assert_eq!(trc.eval(0.25), 0.25);
    }

    #[test]
    fn test_curv_gamma() {
        let mut body = 1u32.to_be_bytes().to_vec();
        body.extend_from_slice(&0x0233u16.to_be_bytes()); // 2.19921875
        let trc = Trc::parse(&tag(b"curv", &body)).unwrap();
        let expected = 0.5f64.powf(2.19921875);
        assert!((trc.eval(0.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_curv_table() {
        let mut body = 3u32.to_be_bytes().to_vec();
        for v in [0u16, 16384, 65535] {
            body.extend_from_slice(&v.to_be_bytes());
        }
        let trc = Trc::parse(&tag(b"curv", &body)).unwrap();
        assert_eq!(trc.eval(0.0), 0.0);
        assert!((trc.eval(0.5) - 16384.0 / 65535.0).abs() < 1e-9);
        assert_eq!(trc.eval(1.0), 1.0);
    }

    #[test]
    fn test_para_srgb() {
        // sRGB: g=2.4, a=1/1.055, b=0.055/1.055, c=1/12.92, d=0.04045
        let params: [f64; 5] = [2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045];
        let mut body = 3u16.to_be_bytes().to_vec();
        body.extend_from_slice(&[0, 0]);
        for p in params {
            body.extend_from_slice(&((p * 65536.0).round() as i32).to_be_bytes());
        }
        let trc = Trc::parse(&tag(b"para", &body)).unwrap();
        assert!(trc.eval(0.0).abs() < 1e-6);
        assert!((trc.eval(0.5) - 0.214).abs() < 1e-3);
        assert!((trc.eval(1.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_para_unknown_function() {
        let body = [0, 9, 0, 0, 0, 1, 0, 0];
        assert!(Trc::parse(&tag(b"para", &body)).is_none());
    }

    #[test]
    fn test_vcgt_table_single_channel() {
        let mut body = VCGT_TYPE_TABLE.to_be_bytes().to_vec();
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0, 255]);
        let vcgt = Vcgt::parse(&tag(b"vcgt", &body)).unwrap();
        let clut = vcgt.to_clut(3);
        assert_eq!(clut.len(), 3);
        assert_eq!(clut.entries()[1].red, 32768);
        assert_eq!(clut.entries()[1].blue, 32768);
        assert_eq!(clut.entries()[2].green, 65535);
    }

    #[test]
    fn test_vcgt_formula() {
        let mut body = VCGT_TYPE_FORMULA.to_be_bytes().to_vec();
        for _ in 0..3 {
            body.extend_from_slice(&0x0001_0000i32.to_be_bytes()); // gamma 1.0
            body.extend_from_slice(&0i32.to_be_bytes());
            body.extend_from_slice(&0x0000_8000i32.to_be_bytes()); // max 0.5
        }
        let vcgt = Vcgt::parse(&tag(b"vcgt", &body)).unwrap();
        let clut = vcgt.to_clut(2);
        assert_eq!(clut.entries()[0].red, 0);
        assert_eq!(clut.entries()[1].red, 32768);
    }

    #[test]
    fn test_vcgt_truncated() {
        let mut body = VCGT_TYPE_TABLE.to_be_bytes().to_vec();
        body.extend_from_slice(&3u16.to_be_bytes());
        body.extend_from_slice(&256u16.to_be_bytes());
        body.extend_from_slice(&2u16.to_be_bytes());
        assert!(Vcgt::parse(&tag(b"vcgt", &body)).is_none());
    }
}
