pub mod parsing;
pub mod text;

// Re-export commonly used items
pub use text::{ensure_printable, ensure_sane_length, hex_dump};
