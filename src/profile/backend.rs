//! Decoding backend abstraction.
//!
//! A [`ProfileDecoder`](super::ProfileDecoder) only talks to this trait.
//! The crate ships one implementation, [`IccBackend`](super::icc::IccBackend);
//! a build without a backend reports `NoSupport` from every parse.

use crate::error::ParseResult;
use crate::profile::clut::Clut;
use crate::profile::types::{Colorspace, ProfileType, Xyz};

/// Raw fields extracted by a backend, before sanitization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub profile_type: ProfileType,
    pub colorspace: Colorspace,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub datetime: Option<String>,
    pub white_point: Xyz,
    pub black_point: Xyz,
    pub luminance_red: Xyz,
    pub luminance_green: Xyz,
    pub luminance_blue: Xyz,
}

/// A profile decoding library.
pub trait ProfileBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract the metadata fields from a complete profile buffer.
    fn parse_data(&self, data: &[u8]) -> ParseResult<ProfileFields>;

    /// Resample the embedded video card gamma table to `size` entries.
    fn generate_vcgt(&self, _data: &[u8], _size: usize) -> Option<Clut> {
        None
    }

    /// Synthesize a `size`-entry ramp from the tone reproduction curves.
    fn generate_curve(&self, _data: &[u8], _size: usize) -> Option<Clut> {
        None
    }
}
