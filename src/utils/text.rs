//! Text sanitizers for strings read out of device-supplied data.
//!
//! Vendor strings in ICC profiles are frequently padded with NULs, carry
//! stray control bytes, or run to several hundred characters.

/// Replacement for characters that cannot be displayed.
const UNPRINTABLE: char = ' ';

/// Replace control characters with spaces and trim the result.
///
/// # Example
/// ```
/// use colorcal::utils::text::ensure_printable;
///
/// assert_eq!(ensure_printable("sRGB\u{0}\u{0}"), "sRGB");
/// assert_eq!(ensure_printable("a\tb"), "a b");
/// ```
pub fn ensure_printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { UNPRINTABLE } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Truncate to at most `max_len` characters, never splitting a character.
pub fn ensure_sane_length(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Full description policy: printable, length-capped.
pub fn sanitize_description(text: &str, max_len: usize) -> String {
    ensure_sane_length(&ensure_printable(text), max_len)
}

/// Space-separated lowercase hex, as used in transfer trace logs.
///
/// ```
/// use colorcal::utils::text::hex_dump;
///
/// assert_eq!(hex_dump(&[0x00, 0xb7, 0x3e]), "00 b7 3e");
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
