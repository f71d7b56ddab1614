//! ICC profile decoding.
//!
//! A [`ProfileDecoder`] turns a byte buffer (or a file) into an immutable
//! [`Profile`]. The binary work is delegated to a [`ProfileBackend`]; the
//! decoder owns the policy on top of it: size bookkeeping, text
//! sanitization and the description fallback chain.
//!
//! # Example
//! ```no_run
//! use colorcal::profile::Profile;
//!
//! let profile = Profile::from_path("/usr/share/color/icc/sRGB.icc")?;
//! println!("{} ({})", profile.description(), profile.colorspace());
//! # Ok::<(), colorcal::error::ParseError>(())
//! ```

pub mod backend;
pub mod clut;
pub mod icc;
pub mod store;
pub mod types;

pub use backend::{ProfileBackend, ProfileFields};
pub use clut::{Clut, ClutEntry};
pub use icc::IccBackend;
pub use store::{ScanReport, scan_profiles};
pub use types::{Colorspace, ProfileType, Xyz};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::ProfileConfig;
use crate::error::{ParseError, ParseResult};
use crate::utils::text::{ensure_printable, sanitize_description};

/// Description used when neither the profile nor its filename has one.
pub const MISSING_DESCRIPTION: &str = "Missing description";

// =============================================================================
// Profile
// =============================================================================

/// A parsed color profile.
///
/// Immutable once built. The raw bytes are kept so that ramps can be
/// generated on demand.
#[derive(Clone)]
pub struct Profile {
    profile_type: ProfileType,
    colorspace: Colorspace,
    size: usize,
    description: String,
    copyright: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    datetime: Option<String>,
    white_point: Xyz,
    black_point: Xyz,
    luminance_red: Xyz,
    luminance_green: Xyz,
    luminance_blue: Xyz,
    filename: Option<PathBuf>,
    data: Arc<[u8]>,
    backend: Arc<dyn ProfileBackend>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("profile_type", &self.profile_type)
            .field("colorspace", &self.colorspace)
            .field("size", &self.size)
            .field("description", &self.description)
            .field("filename", &self.filename)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl Profile {
    /// Parse a profile buffer with the default decoder.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        ProfileDecoder::new().parse(data)
    }

    /// Read and parse a profile file with the default decoder.
    pub fn from_path(path: impl AsRef<Path>) -> ParseResult<Self> {
        ProfileDecoder::new().parse_from_path(path)
    }

    pub fn profile_type(&self) -> ProfileType {
        self.profile_type
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Size of the parsed buffer in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Never empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn copyright(&self) -> Option<&str> {
        self.copyright.as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Creation date, e.g. `9 February 1998, 06:49:00`.
    pub fn datetime(&self) -> Option<&str> {
        self.datetime.as_deref()
    }

    pub fn white_point(&self) -> Xyz {
        self.white_point
    }

    pub fn black_point(&self) -> Xyz {
        self.black_point
    }

    /// Red colorant as xyY.
    pub fn luminance_red(&self) -> Xyz {
        self.luminance_red
    }

    /// Green colorant as xyY.
    pub fn luminance_green(&self) -> Xyz {
        self.luminance_green
    }

    /// Blue colorant as xyY.
    pub fn luminance_blue(&self) -> Xyz {
        self.luminance_blue
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The embedded video card gamma table resampled to `size` entries.
    ///
    /// `None` when the profile has no usable `vcgt` tag or the backend
    /// cannot decode one.
    pub fn generate_vcgt(&self, size: usize) -> Option<Clut> {
        self.backend.generate_vcgt(&self.data, size)
    }

    /// A `size`-entry ramp sampled from the profile's tone curves.
    pub fn generate_curve(&self, size: usize) -> Option<Clut> {
        self.backend.generate_curve(&self.data, size)
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Builds [`Profile`]s through a backend.
#[derive(Clone)]
pub struct ProfileDecoder {
    backend: Option<Arc<dyn ProfileBackend>>,
    config: ProfileConfig,
}

impl Default for ProfileDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDecoder {
    /// Decoder using the native ICC reader.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(IccBackend::new()))
    }

    /// Decoder with a custom backend.
    pub fn with_backend(backend: Arc<dyn ProfileBackend>) -> Self {
        Self {
            backend: Some(backend),
            config: ProfileConfig::default(),
        }
    }

    /// Decoder with no backend; every parse fails with `NoSupport`.
    pub fn without_backend() -> Self {
        Self {
            backend: None,
            config: ProfileConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProfileConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Parse a complete profile buffer.
    ///
    /// # Errors
    /// `NoSupport` without a backend, `Malformed` if the backend rejects
    /// the data.
    pub fn parse(&self, data: &[u8]) -> ParseResult<Profile> {
        self.build(data, None)
    }

    /// Read a file and parse it. The path is kept as the profile's filename
    /// and used for the description fallback.
    ///
    /// # Errors
    /// `Io` (carrying the path) if the file cannot be read, otherwise as
    /// [`parse`](Self::parse) with the path prefixed to `Malformed` messages.
    pub fn parse_from_path(&self, path: impl AsRef<Path>) -> ParseResult<Profile> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = data.len(), "read profile");

        self.build(&data, Some(path.clone()))
            .map_err(|err| match err {
                ParseError::Malformed { message } => {
                    ParseError::malformed(format!("{}: {}", path.display(), message))
                }
                other => other,
            })
    }

    fn build(&self, data: &[u8], filename: Option<PathBuf>) -> ParseResult<Profile> {
        let backend = self.backend.as_ref().ok_or(ParseError::NoSupport)?;
        let fields = backend.parse_data(data)?;

        let description =
            self.resolve_description(fields.description.as_deref(), filename.as_deref());
        let printable = |text: Option<String>| {
            text.map(|t| ensure_printable(&t)).filter(|t| !t.is_empty())
        };

        Ok(Profile {
            profile_type: fields.profile_type,
            colorspace: fields.colorspace,
            size: data.len(),
            description,
            copyright: printable(fields.copyright),
            manufacturer: printable(fields.manufacturer),
            model: printable(fields.model),
            datetime: fields.datetime,
            white_point: fields.white_point,
            black_point: fields.black_point,
            luminance_red: fields.luminance_red,
            luminance_green: fields.luminance_green,
            luminance_blue: fields.luminance_blue,
            filename,
            data: Arc::from(data),
            backend: Arc::clone(backend),
        })
    }

    /// Sanitized tag text, else the file's base name, else the placeholder.
    fn resolve_description(&self, tag: Option<&str>, filename: Option<&Path>) -> String {
        let max_len = self.config.description_max_len;
        if let Some(text) = tag.map(|t| sanitize_description(t, max_len)) {
            if !text.is_empty() {
                return text;
            }
        }
        filename
            .and_then(Path::file_name)
            .map(|name| sanitize_description(&name.to_string_lossy(), max_len))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string())
    }
}
