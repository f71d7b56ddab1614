//! USB request definitions for the X-Rite ColorMunki.
//!
//! Request codes and layouts come from USB captures of the vendor
//! software; everything is a vendor-class request addressed to the device.

// =============================================================================
// Constants
// =============================================================================

/// X-Rite vendor ID.
pub const COLORMUNKI_VID: u16 = 0x0971;

/// ColorMunki Design / Photo product ID.
pub const COLORMUNKI_PID: u16 = 0x2007;

/// Interface claimed for all transfers.
pub const COLORMUNKI_INTERFACE: u8 = 0x00;

/// Interrupt IN endpoint carrying unsolicited button/dial events.
pub const EP_EVENTS: u8 = 0x83;

/// Bulk IN endpoint carrying spectral readings.
pub const EP_MEASUREMENT: u8 = 0x81;

/// Size of an event packet from [`EP_EVENTS`].
pub const EVENT_PACKET_LEN: usize = 8;

// =============================================================================
// Vendor Requests
// =============================================================================

/// Trigger a measurement (OUT, 12 byte payload).
pub const REQ_TRIGGER_MEASURE: u8 = 0x80;

/// Read the version string (IN, 36 bytes).
pub const REQ_VERSION_STRING: u8 = 0x85;

/// Read firmware parameters (IN, 24 bytes).
pub const REQ_FIRMWARE_PARAMS: u8 = 0x86;

/// Read dial position and button state (IN, 2 bytes).
pub const REQ_GET_STATUS: u8 = 0x87;

/// Read the chip ID (IN, 8 bytes).
pub const REQ_CHIP_ID: u8 = 0x8A;

pub const VERSION_STRING_LEN: usize = 36;
pub const FIRMWARE_PARAMS_LEN: usize = 24;
pub const STATUS_LEN: usize = 2;
pub const CHIP_ID_LEN: usize = 8;

// =============================================================================
// Event Commands (byte 0 of an event packet)
// =============================================================================

pub const CMD_DIAL_ROTATE: u8 = 0x00;
pub const CMD_BUTTON_PRESSED: u8 = 0x01;
pub const CMD_BUTTON_RELEASED: u8 = 0x02;

// =============================================================================
// Status Reply Codes
// =============================================================================

pub const DIAL_PROJECTOR: u8 = 0x00;
pub const DIAL_SURFACE: u8 = 0x01;
pub const DIAL_CALIBRATION: u8 = 0x02;
pub const DIAL_AMBIENT: u8 = 0x03;

pub const BUTTON_STATE_RELEASED: u8 = 0x00;
pub const BUTTON_STATE_PRESSED: u8 = 0x01;

// =============================================================================
// Measurement
// =============================================================================

/// Number of raw sensor values in one reading.
pub const SENSOR_VALUES: usize = 137;

/// Bytes in one reading (little-endian u16 per value).
pub const READING_LEN: usize = SENSOR_VALUES * 2;

/// Integration clocks used for ambient readings.
pub const AMBIENT_INT_CLOCKS: u32 = 0x3EB7;

/// Readings taken per ambient measurement.
pub const AMBIENT_READINGS: u32 = 2;

/// Trigger-measure request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureParams {
    pub lamp: bool,
    pub scan: bool,
    pub high_gain: bool,
    pub hold_temperature: bool,
    pub int_clocks: u32,
    pub readings: u32,
}

impl MeasureParams {
    /// Parameters for an ambient light reading: lamp off, high gain.
    pub const AMBIENT: Self = Self {
        lamp: false,
        scan: false,
        high_gain: true,
        hold_temperature: false,
        int_clocks: AMBIENT_INT_CLOCKS,
        readings: AMBIENT_READINGS,
    };

    /// Number of bytes the bulk endpoint returns for these parameters.
    pub fn reply_len(&self) -> usize {
        self.readings as usize * READING_LEN
    }
}

/// Build the 12-byte trigger-measure payload.
///
/// Format: `[lamp, scan, high_gain, hold_temp, int_clocks (LE u32), readings (LE u32)]`
pub fn build_trigger_measure(params: &MeasureParams) -> [u8; 12] {
    let mut buf = [0u8; 12];
    buf[0] = params.lamp as u8;
    buf[1] = params.scan as u8;
    buf[2] = params.high_gain as u8;
    buf[3] = params.hold_temperature as u8;
    buf[4..8].copy_from_slice(&params.int_clocks.to_le_bytes());
    buf[8..12].copy_from_slice(&params.readings.to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_payload_matches_capture() {
        let payload = build_trigger_measure(&MeasureParams::AMBIENT);
        assert_eq!(
            payload,
            [0x00, 0x00, 0x01, 0x00, 0xb7, 0x3e, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_ambient_reply_len() {
        assert_eq!(MeasureParams::AMBIENT.reply_len(), 548);
    }
}
