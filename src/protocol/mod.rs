//! USB protocol implementation for the X-Rite ColorMunki.
//!
//! This module contains the request constants, payload builders and
//! reply decoders. Nothing here touches the bus.

pub mod commands;
pub mod status;

pub use commands::*;
pub use status::*;
