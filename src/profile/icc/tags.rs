//! Decoders for the text and XYZ tag types.
//!
//! Each function takes the full tag payload, type header included, and
//! returns `None` when the type is not one it understands or the payload
//! is truncated. A bad text tag should not sink the whole profile.

use byteorder::{BigEndian, ByteOrder};

use super::reader::signature_at;
use crate::profile::types::Xyz;

/// Type header: 4-byte type signature + 4 reserved bytes.
pub const TYPE_HEADER_LEN: usize = 8;

/// s15Fixed16Number to f64.
pub fn s15_fixed16(buf: &[u8]) -> f64 {
    BigEndian::read_i32(buf) as f64 / 65536.0
}

/// Decode a `desc`, `mluc` or `text` tag to a string.
pub fn read_text(tag: &[u8]) -> Option<String> {
    if tag.len() < TYPE_HEADER_LEN {
        return None;
    }
    match &signature_at(tag, 0) {
        b"desc" => read_desc(tag),
        b"mluc" => read_mluc(tag),
        b"text" => Some(ascii_until_nul(&tag[TYPE_HEADER_LEN..])),
        _ => None,
    }
}

/// textDescriptionType: only the ASCII part is used.
fn read_desc(tag: &[u8]) -> Option<String> {
    let body = &tag[TYPE_HEADER_LEN..];
    if body.len() < 4 {
        return None;
    }
    let count = BigEndian::read_u32(&body[0..4]) as usize;
    let ascii = body.get(4..4usize.checked_add(count)?)?;
    Some(ascii_until_nul(ascii))
}

/// multiLocalizedUnicodeType: the first record wins, which by
/// convention is en-US.
fn read_mluc(tag: &[u8]) -> Option<String> {
    let body = &tag[TYPE_HEADER_LEN..];
    if body.len() < 8 {
        return None;
    }
    let records = BigEndian::read_u32(&body[0..4]);
    let record_size = BigEndian::read_u32(&body[4..8]) as usize;
    if records == 0 || record_size < 12 {
        return None;
    }

    let record = body.get(8..20)?;
    let len = BigEndian::read_u32(&record[4..8]) as usize;
    // string offsets are relative to the start of the tag
    let offset = BigEndian::read_u32(&record[8..12]) as usize;
    let utf16 = tag.get(offset..offset.checked_add(len)?)?;

    let units: Vec<u16> = utf16
        .chunks_exact(2)
        .map(BigEndian::read_u16)
        .take_while(|&u| u != 0)
        .collect();
    Some(String::from_utf16_lossy(&units))
}

fn ascii_until_nul(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Decode the first value of an `XYZ ` tag.
pub fn read_xyz(tag: &[u8]) -> Option<Xyz> {
    if tag.len() < TYPE_HEADER_LEN + 12 || &signature_at(tag, 0) != b"XYZ " {
        return None;
    }
    let body = &tag[TYPE_HEADER_LEN..];
    Some(Xyz::new(
        s15_fixed16(&body[0..4]),
        s15_fixed16(&body[4..8]),
        s15_fixed16(&body[8..12]),
    ))
}
