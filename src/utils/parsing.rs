//! Parsing utilities for CLI arguments.
//!
//! The functions return `String` errors so they can be used directly as
//! clap value parsers.

/// Largest ramp the CLI will generate.
pub const MAX_RAMP_SIZE: usize = 65536;

// =============================================================================
// USB IDs
// =============================================================================

/// Parse a `VID:PID` pair written in hex.
///
/// # Example
/// ```
/// use colorcal::utils::parsing::parse_usb_id;
///
/// assert_eq!(parse_usb_id("0971:2007").unwrap(), (0x0971, 0x2007));
/// assert_eq!(parse_usb_id("0x0971:0x2007").unwrap(), (0x0971, 0x2007));
/// ```
pub fn parse_usb_id(text: &str) -> Result<(u16, u16), String> {
    let (vid, pid) = text
        .split_once(':')
        .ok_or_else(|| format!("Invalid USB id '{}', expected VID:PID", text))?;

    let parse = |part: &str| {
        let digits = part.trim().trim_start_matches("0x");
        u16::from_str_radix(digits, 16).map_err(|e| format!("Invalid USB id '{}': {}", text, e))
    };
    Ok((parse(vid)?, parse(pid)?))
}

// =============================================================================
// Ramp Size
// =============================================================================

/// Parse a ramp size, accepting 1 to [`MAX_RAMP_SIZE`] entries.
pub fn parse_ramp_size(text: &str) -> Result<usize, String> {
    let size: usize = text
        .trim()
        .parse()
        .map_err(|e| format!("Invalid ramp size '{}': {}", text, e))?;
    if size == 0 || size > MAX_RAMP_SIZE {
        return Err(format!(
            "Ramp size must be between 1 and {}, got {}",
            MAX_RAMP_SIZE, size
        ));
    }
    Ok(size)
}
