//! Runtime configuration for the sensor driver and the profile decoder.
//!
//! Both structs are serde-friendly so they can be persisted through
//! [`crate::storage`]; every field has a default matching the hardware.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::{COLORMUNKI_INTERFACE, COLORMUNKI_PID, COLORMUNKI_VID, EVENT_PACKET_LEN};

// =============================================================================
// Driver
// =============================================================================

/// What the running loop does when a transfer completes with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Drop the buffer and stop that transfer chain. The driver becomes `Faulted`.
    #[default]
    Halt,
    /// Submit a fresh interrupt transfer and keep running.
    Resubmit,
}

/// Sensor driver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Deadline for each synchronous control transfer.
    pub control_timeout_ms: u64,
    /// Size of the interrupt event packet.
    pub interrupt_length: usize,
    pub failure_policy: FailurePolicy,
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
}

impl DriverConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            control_timeout_ms: 2000,
            interrupt_length: EVENT_PACKET_LEN,
            failure_policy: FailurePolicy::Halt,
            vendor_id: COLORMUNKI_VID,
            product_id: COLORMUNKI_PID,
            interface: COLORMUNKI_INTERFACE,
        }
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Longest description that is shown without truncation.
pub const DESCRIPTION_MAX_LEN: usize = 80;

/// Profile decoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub description_max_len: usize,
    /// Directories walked by [`crate::profile::scan_profiles`].
    pub search_dirs: Vec<PathBuf>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let mut search_dirs = vec![PathBuf::from("/usr/share/color/icc")];
        if let Some(data) = dirs::data_dir() {
            search_dirs.push(data.join("icc"));
        }
        Self {
            description_max_len: DESCRIPTION_MAX_LEN,
            search_dirs,
        }
    }
}
