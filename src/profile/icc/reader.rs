//! ICC container reader: 128-byte header plus the tag table.
//!
//! All fields are big-endian. Tag payloads are handed out as slices
//! borrowed from the input; nothing is copied until a tag is decoded.

use byteorder::{BigEndian, ByteOrder};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{ParseError, ParseResult};

/// Header size; the tag count follows immediately.
pub const HEADER_LEN: usize = 128;

/// Profile file signature `acsp`.
pub const PROFILE_SIGNATURE: [u8; 4] = *b"acsp";

const OFFSET_SIZE: usize = 0;
const OFFSET_DEVICE_CLASS: usize = 12;
const OFFSET_COLORSPACE: usize = 16;
const OFFSET_DATETIME: usize = 24;
const OFFSET_SIGNATURE: usize = 36;
const OFFSET_TAG_COUNT: usize = HEADER_LEN;
const TAG_TABLE_START: usize = HEADER_LEN + 4;
const TAG_ENTRY_LEN: usize = 12;

/// Four-character tag signature.
pub type Signature = [u8; 4];

pub(crate) fn signature_at(data: &[u8], offset: usize) -> Signature {
    [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
}

/// Creation date as stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeNumber {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
}

impl DateTimeNumber {
    fn parse(buf: &[u8]) -> Self {
        let field = |i: usize| BigEndian::read_u16(&buf[i * 2..i * 2 + 2]);
        Self {
            year: field(0),
            month: field(1),
            day: field(2),
            hours: field(3),
            minutes: field(4),
            seconds: field(5),
        }
    }

    /// Render as `9 February 1998, 06:49:00`. Invalid dates give `None`.
    pub fn to_text(&self) -> Option<String> {
        let date =
            NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?;
        let datetime = date
            .and_hms_opt(self.hours as u32, self.minutes as u32, self.seconds as u32)?;
        Some(datetime.format("%-d %B %Y, %H:%M:%S").to_string())
    }
}

/// Decoded header fields used by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    pub size: u32,
    pub device_class: Signature,
    pub colorspace: Signature,
    pub created: DateTimeNumber,
}

#[derive(Debug, Clone, Copy)]
struct TagEntry {
    signature: Signature,
    offset: usize,
    size: usize,
}

/// A validated view over a profile buffer.
#[derive(Debug)]
pub struct IccReader<'a> {
    data: &'a [u8],
    header: IccHeader,
    tags: Vec<TagEntry>,
}

impl<'a> IccReader<'a> {
    /// Validate the header and tag table.
    ///
    /// # Errors
    /// Returns `Malformed` if the buffer is too short, lacks the `acsp`
    /// signature, or has a tag pointing outside the buffer.
    pub fn new(data: &'a [u8]) -> ParseResult<Self> {
        if data.len() < TAG_TABLE_START {
            return Err(ParseError::malformed(format!(
                "profile too small: {} bytes, expected at least {}",
                data.len(),
                TAG_TABLE_START
            )));
        }

        let signature = signature_at(data, OFFSET_SIGNATURE);
        if signature != PROFILE_SIGNATURE {
            return Err(ParseError::malformed(format!(
                "invalid profile signature {:02x?}, expected 'acsp'",
                signature
            )));
        }

        let header = IccHeader {
            size: BigEndian::read_u32(&data[OFFSET_SIZE..OFFSET_SIZE + 4]),
            device_class: signature_at(data, OFFSET_DEVICE_CLASS),
            colorspace: signature_at(data, OFFSET_COLORSPACE),
            created: DateTimeNumber::parse(&data[OFFSET_DATETIME..OFFSET_DATETIME + 12]),
        };
        if header.size as usize != data.len() {
            warn!(
                header_size = header.size,
                actual = data.len(),
                "profile size in header does not match data"
            );
        }

        let tags = Self::parse_tag_table(data)?;
        debug!(tags = tags.len(), "parsed ICC tag table");

        Ok(Self { data, header, tags })
    }

    fn parse_tag_table(data: &[u8]) -> ParseResult<Vec<TagEntry>> {
        let count = BigEndian::read_u32(&data[OFFSET_TAG_COUNT..OFFSET_TAG_COUNT + 4]) as usize;
        let table_end = count
            .checked_mul(TAG_ENTRY_LEN)
            .and_then(|len| len.checked_add(TAG_TABLE_START))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                ParseError::malformed(format!("tag table with {} entries is truncated", count))
            })?;

        data[TAG_TABLE_START..table_end]
            .chunks_exact(TAG_ENTRY_LEN)
            .map(|entry| {
                let tag = TagEntry {
                    signature: signature_at(entry, 0),
                    offset: BigEndian::read_u32(&entry[4..8]) as usize,
                    size: BigEndian::read_u32(&entry[8..12]) as usize,
                };
                match tag.offset.checked_add(tag.size) {
                    Some(end) if end <= data.len() => Ok(tag),
                    _ => Err(ParseError::malformed(format!(
                        "tag '{}' out of bounds: offset {} + size {} > {}",
                        String::from_utf8_lossy(&tag.signature),
                        tag.offset,
                        tag.size,
                        data.len()
                    ))),
                }
            })
            .collect()
    }

    pub fn header(&self) -> &IccHeader {
        &self.header
    }

    /// Payload of a tag, including its 8-byte type header.
    pub fn tag(&self, signature: Signature) -> Option<&'a [u8]> {
        self.tags
            .iter()
            .find(|t| t.signature == signature)
            .map(|t| &self.data[t.offset..t.offset + t.size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header(tag_count: u32) -> Vec<u8> {
        let mut data = vec![0u8; TAG_TABLE_START];
        data[12..16].copy_from_slice(b"mntr");
        data[16..20].copy_from_slice(b"RGB ");
        data[36..40].copy_from_slice(b"acsp");
        data[128..132].copy_from_slice(&tag_count.to_be_bytes());
        let len = data.len() as u32;
        data[0..4].copy_from_slice(&len.to_be_bytes());
        data
    }

    #[test]
    fn test_minimal_profile() {
        let data = minimal_header(0);
        let reader = IccReader::new(&data).unwrap();
        assert_eq!(&reader.header().device_class, b"mntr");
        assert!(reader.tag(*b"desc").is_none());
    }

    #[test]
    fn test_bad_signature() {
        let mut data = minimal_header(0);
        data[36..40].copy_from_slice(b"xxxx");
        assert!(matches!(
            IccReader::new(&data),
            Err(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_truncated_table() {
        let data = minimal_header(1000);
        assert!(IccReader::new(&data).is_err());
    }

    #[test]
    fn test_tag_out_of_bounds() {
        let mut data = minimal_header(1);
        data.extend_from_slice(b"desc");
        data.extend_from_slice(&200u32.to_be_bytes());
        data.extend_from_slice(&50u32.to_be_bytes());
        assert!(IccReader::new(&data).is_err());
    }

    #[test]
    fn test_datetime_text() {
        let date = DateTimeNumber {
            year: 1998,
            month: 2,
            day: 9,
            hours: 6,
            minutes: 49,
            seconds: 0,
        };
        assert_eq!(date.to_text().unwrap(), "9 February 1998, 06:49:00");
        assert!(DateTimeNumber::default().to_text().is_none());
    }
}
