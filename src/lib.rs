//! colorcal
//!
//! ICC profile decoding and a USB driver for the X-Rite ColorMunki, the
//! two hardware-facing pieces of a display calibration tool.
//!
//! # Features
//!
//! - Parse `.icc`/`.icm` profiles into an immutable [`Profile`]
//! - Generate gamma ramps from the `vcgt` tag or the tone curves
//! - Scan profile directories, collecting per-file failures
//! - Drive the ColorMunki: startup queries, button and dial events,
//!   ambient readings
//!
//! # Example
//!
//! ```no_run
//! use colorcal::profile::Profile;
//! use colorcal::device::{ColorMunki, Sensor};
//! use colorcal::config::DriverConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let profile = Profile::from_path("/usr/share/color/icc/sRGB.icc")?;
//!     println!("{} [{}]", profile.description(), profile.profile_type());
//!
//!     if let Some(vcgt) = profile.generate_vcgt(256) {
//!         println!("vcgt with {} entries", vcgt.len());
//!     }
//!
//!     let mut munki = ColorMunki::open(DriverConfig::default())?;
//!     munki.startup()?;
//!     print!("{}", munki.dump()?);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use device::{ColorMunki, Sensor};
pub use error::{ParseError, Result, SensorError};
pub use profile::{Profile, ProfileDecoder};
