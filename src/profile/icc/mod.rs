//! Native ICC binary reader.
//!
//! Reads version 2 and version 4 profiles directly from the byte buffer:
//! header fields, text tags, colorant and media-point XYZ values, tone
//! curves and the `vcgt` extension tag.

pub mod curves;
pub mod reader;
pub mod tags;

pub use curves::{Trc, Vcgt, VcgtFormula};
pub use reader::{DateTimeNumber, IccHeader, IccReader, Signature};

use tracing::{debug, warn};

use crate::error::ParseResult;
use crate::profile::backend::{ProfileBackend, ProfileFields};
use crate::profile::clut::Clut;
use crate::profile::types::{Colorspace, ProfileType, Xyz};

// =============================================================================
// Tag Signatures
// =============================================================================

pub const TAG_DESCRIPTION: Signature = *b"desc";
pub const TAG_COPYRIGHT: Signature = *b"cprt";
pub const TAG_MANUFACTURER: Signature = *b"dmnd";
pub const TAG_MODEL: Signature = *b"dmdd";
pub const TAG_WHITE_POINT: Signature = *b"wtpt";
pub const TAG_BLACK_POINT: Signature = *b"bkpt";
pub const TAG_RED_COLORANT: Signature = *b"rXYZ";
pub const TAG_GREEN_COLORANT: Signature = *b"gXYZ";
pub const TAG_BLUE_COLORANT: Signature = *b"bXYZ";
pub const TAG_RED_TRC: Signature = *b"rTRC";
pub const TAG_GREEN_TRC: Signature = *b"gTRC";
pub const TAG_BLUE_TRC: Signature = *b"bTRC";
pub const TAG_GRAY_TRC: Signature = *b"kTRC";
pub const TAG_VCGT: Signature = *b"vcgt";

/// Backend reading the ICC container format itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct IccBackend;

impl IccBackend {
    pub fn new() -> Self {
        Self
    }
}

fn text_tag(reader: &IccReader<'_>, signature: Signature) -> Option<String> {
    let tag = reader.tag(signature)?;
    let text = tags::read_text(tag);
    if text.is_none() {
        warn!(
            tag = %String::from_utf8_lossy(&signature),
            "unsupported or truncated text tag"
        );
    }
    text
}

fn xyz_tag(reader: &IccReader<'_>, signature: Signature) -> Option<Xyz> {
    reader.tag(signature).and_then(tags::read_xyz)
}

fn trc_tag(reader: &IccReader<'_>, signature: Signature) -> Option<Trc> {
    reader.tag(signature).and_then(Trc::parse)
}

impl ProfileBackend for IccBackend {
    fn name(&self) -> &'static str {
        "icc"
    }

    fn parse_data(&self, data: &[u8]) -> ParseResult<ProfileFields> {
        let reader = IccReader::new(data)?;
        let header = reader.header();

        let colorant = |sig| xyz_tag(&reader, sig).map(Xyz::to_xyy).unwrap_or_default();
        let fields = ProfileFields {
            profile_type: ProfileType::from_signature(header.device_class),
            colorspace: Colorspace::from_signature(header.colorspace),
            description: text_tag(&reader, TAG_DESCRIPTION),
            copyright: text_tag(&reader, TAG_COPYRIGHT),
            manufacturer: text_tag(&reader, TAG_MANUFACTURER),
            model: text_tag(&reader, TAG_MODEL),
            datetime: header.created.to_text(),
            white_point: xyz_tag(&reader, TAG_WHITE_POINT).unwrap_or_default(),
            black_point: xyz_tag(&reader, TAG_BLACK_POINT).unwrap_or_default(),
            luminance_red: colorant(TAG_RED_COLORANT),
            luminance_green: colorant(TAG_GREEN_COLORANT),
            luminance_blue: colorant(TAG_BLUE_COLORANT),
        };
        debug!(
            profile_type = %fields.profile_type,
            colorspace = %fields.colorspace,
            "decoded ICC header"
        );
        Ok(fields)
    }

    fn generate_vcgt(&self, data: &[u8], size: usize) -> Option<Clut> {
        if size == 0 {
            return None;
        }
        let reader = IccReader::new(data).ok()?;
        let vcgt = Vcgt::parse(reader.tag(TAG_VCGT)?)?;
        Some(vcgt.to_clut(size))
    }

    fn generate_curve(&self, data: &[u8], size: usize) -> Option<Clut> {
        if size == 0 {
            return None;
        }
        let reader = IccReader::new(data).ok()?;

        if Colorspace::from_signature(reader.header().colorspace) == Colorspace::Gray {
            let gray = trc_tag(&reader, TAG_GRAY_TRC)?;
            return Some(Clut::from_fn(
                size,
                |x| gray.eval(x),
                |x| gray.eval(x),
                |x| gray.eval(x),
            ));
        }

        let red = trc_tag(&reader, TAG_RED_TRC)?;
        let green = trc_tag(&reader, TAG_GREEN_TRC)?;
        let blue = trc_tag(&reader, TAG_BLUE_TRC)?;
        Some(Clut::from_fn(
            size,
            |x| red.eval(x),
            |x| green.eval(x),
            |x| blue.eval(x),
        ))
    }
}
