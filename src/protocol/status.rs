//! Response parsing for the ColorMunki.
//!
//! Decodes startup query replies, interrupt event packets and status
//! replies into structured data. All multi-byte fields are little-endian.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, SensorError};
use crate::protocol::commands::{
    BUTTON_STATE_PRESSED, BUTTON_STATE_RELEASED, CHIP_ID_LEN, CMD_BUTTON_PRESSED,
    CMD_BUTTON_RELEASED, CMD_DIAL_ROTATE, DIAL_AMBIENT, DIAL_CALIBRATION, DIAL_PROJECTOR,
    DIAL_SURFACE, EVENT_PACKET_LEN, FIRMWARE_PARAMS_LEN, READING_LEN, SENSOR_VALUES,
    STATUS_LEN,
};

// =============================================================================
// Firmware Parameter Offsets (REQ_FIRMWARE_PARAMS reply)
// =============================================================================

const OFFSET_FW_MAJOR: usize = 0x00;
const OFFSET_FW_MINOR: usize = 0x04;
const OFFSET_TICK_DURATION: usize = 0x08;
const OFFSET_MIN_INT: usize = 0x0c;
const OFFSET_EEPROM_BLOCKS: usize = 0x10;
const OFFSET_EEPROM_BLOCKSIZE: usize = 0x14;

/// Offset of the event timestamp in an event packet.
const OFFSET_EVENT_TIMESTAMP: usize = 4;

fn ensure_len(buf: &[u8], expected: usize, what: &str) -> Result<()> {
    if buf.len() < expected {
        return Err(SensorError::InvalidResponse {
            message: format!(
                "{} too short: {} bytes, expected at least {}",
                what,
                buf.len(),
                expected
            ),
        });
    }
    Ok(())
}

// =============================================================================
// Startup Replies
// =============================================================================

/// Firmware parameters read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareParams {
    pub major: u16,
    pub minor: u16,
    pub tick_duration: u32,
    pub min_int: u32,
    pub eeprom_blocks: u32,
    pub eeprom_blocksize: u32,
}

impl FirmwareParams {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, FIRMWARE_PARAMS_LEN, "Firmware parameters")?;
        let read = |offset: usize| LittleEndian::read_u16(&buf[offset..offset + 2]);

        Ok(FirmwareParams {
            major: read(OFFSET_FW_MAJOR),
            minor: read(OFFSET_FW_MINOR),
            tick_duration: read(OFFSET_TICK_DURATION) as u32,
            min_int: read(OFFSET_MIN_INT) as u32,
            eeprom_blocks: read(OFFSET_EEPROM_BLOCKS) as u32,
            eeprom_blocksize: read(OFFSET_EEPROM_BLOCKSIZE) as u32,
        })
    }

    /// Firmware revision as shown to users, e.g. `1.11`.
    pub fn revision(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

/// Format the 8-byte chip ID as `xx-xxxxxxxxxxxxxx`.
pub fn parse_chip_id(buf: &[u8]) -> Result<String> {
    ensure_len(buf, CHIP_ID_LEN, "Chip ID")?;
    let tail: String = buf[1..CHIP_ID_LEN]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    Ok(format!("{:02x}-{}", buf[0], tail))
}

/// Decode the NUL-padded version string.
pub fn parse_version_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim().to_string()
}

// =============================================================================
// Dial / Button State
// =============================================================================

/// Physical dial position selecting the measurement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialPosition {
    #[default]
    Unknown,
    Projector,
    Surface,
    Calibration,
    Ambient,
}

impl DialPosition {
    /// Map a status reply byte. Total: every code not defined maps to `Unknown`.
    pub const fn from_code(code: u8) -> Self {
        match code {
            DIAL_PROJECTOR => DialPosition::Projector,
            DIAL_SURFACE => DialPosition::Surface,
            DIAL_CALIBRATION => DialPosition::Calibration,
            DIAL_AMBIENT => DialPosition::Ambient,
            _ => DialPosition::Unknown,
        }
    }
}

impl std::fmt::Display for DialPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DialPosition::Unknown => "unknown",
            DialPosition::Projector => "projector",
            DialPosition::Surface => "surface",
            DialPosition::Calibration => "calibration",
            DialPosition::Ambient => "ambient",
        };
        f.write_str(name)
    }
}

/// Button state reported alongside the dial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
    Unknown(u8),
}

impl ButtonState {
    pub const fn from_code(code: u8) -> Self {
        match code {
            BUTTON_STATE_RELEASED => ButtonState::Released,
            BUTTON_STATE_PRESSED => ButtonState::Pressed,
            other => ButtonState::Unknown(other),
        }
    }
}

/// Decoded `REQ_GET_STATUS` reply.
///
/// ```text
/// 00 00
/// |  \--- button state
/// \------ dial position
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReply {
    pub dial_code: u8,
    pub dial: DialPosition,
    pub button: ButtonState,
}

impl StatusReply {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, STATUS_LEN, "Status reply")?;
        Ok(StatusReply {
            dial_code: buf[0],
            dial: DialPosition::from_code(buf[0]),
            button: ButtonState::from_code(buf[1]),
        })
    }
}

// =============================================================================
// Interrupt Events
// =============================================================================

/// Command byte of an unsolicited event packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DialRotate,
    ButtonPressed,
    ButtonReleased,
    Unknown(u8),
}

impl EventKind {
    pub const fn from_code(code: u8) -> Self {
        match code {
            CMD_DIAL_ROTATE => EventKind::DialRotate,
            CMD_BUTTON_PRESSED => EventKind::ButtonPressed,
            CMD_BUTTON_RELEASED => EventKind::ButtonReleased,
            other => EventKind::Unknown(other),
        }
    }
}

/// Event packet from the interrupt endpoint.
///
/// ```text
///   cmd  subcmd        32 bit event time (ms)
///    |    |            |
///   02   00   00 00   ac 62 07 00
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEvent {
    pub kind: EventKind,
    pub timestamp_ms: u32,
}

impl DeviceEvent {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, EVENT_PACKET_LEN, "Event packet")?;
        Ok(DeviceEvent {
            kind: EventKind::from_code(buf[0]),
            timestamp_ms: LittleEndian::read_u32(
                &buf[OFFSET_EVENT_TIMESTAMP..OFFSET_EVENT_TIMESTAMP + 4],
            ),
        })
    }
}

// =============================================================================
// Measurements
// =============================================================================

/// Split a bulk measurement reply into readings of raw sensor values.
pub fn parse_readings(buf: &[u8]) -> Result<Vec<[u16; SENSOR_VALUES]>> {
    if buf.is_empty() || buf.len() % READING_LEN != 0 {
        return Err(SensorError::InvalidResponse {
            message: format!(
                "Measurement length {} is not a multiple of {}",
                buf.len(),
                READING_LEN
            ),
        });
    }

    Ok(buf
        .chunks_exact(READING_LEN)
        .map(|chunk| {
            let mut values = [0u16; SENSOR_VALUES];
            LittleEndian::read_u16_into(chunk, &mut values);
            values
        })
        .collect())
}

/// Mean raw sensor count across all readings.
pub fn mean_sensor_value(readings: &[[u16; SENSOR_VALUES]]) -> f64 {
    let count = readings.len() * SENSOR_VALUES;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = readings
        .iter()
        .flat_map(|r| r.iter())
        .map(|&v| v as u64)
        .sum();
    total as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_firmware_params() {
        let mut buf = [0u8; 24];
        buf[0x00] = 1;
        buf[0x04] = 11;
        buf[0x08] = 0x59; // 0x0159 = 345
        buf[0x09] = 0x01;
        buf[0x0c] = 0x18;
        buf[0x10] = 0x00;
        buf[0x11] = 0x02; // 512
        buf[0x14] = 0x00;
        buf[0x15] = 0x08; // 2048

        let params = FirmwareParams::parse(&buf).unwrap();
        assert_eq!(params.revision(), "1.11");
        assert_eq!(params.tick_duration, 345);
        assert_eq!(params.min_int, 0x18);
        assert_eq!(params.eeprom_blocks, 512);
        assert_eq!(params.eeprom_blocksize, 2048);
    }

    #[test]
    fn test_firmware_params_short() {
        assert!(FirmwareParams::parse(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_chip_id() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0xab, 0xcd, 0xef, 0x10];
        assert_eq!(parse_chip_id(&buf).unwrap(), "01-020304abcdef10");
    }

    #[test]
    fn test_version_string() {
        let mut buf = [0u8; 36];
        buf[..24].copy_from_slice(b"ColorMunki Photo Rev 1.0");
        assert_eq!(parse_version_string(&buf), "ColorMunki Photo Rev 1.0");
    }

    #[test]
    fn test_event_from_capture() {
        let event = DeviceEvent::parse(&[0x02, 0x00, 0x00, 0x00, 0xac, 0x62, 0x07, 0x00]).unwrap();
        assert_eq!(event.kind, EventKind::ButtonReleased);
        assert_eq!(event.timestamp_ms, 0x0007_62ac);
    }

    #[test]
    fn test_event_short_packet() {
        assert!(DeviceEvent::parse(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn test_status_reply() {
        let reply = StatusReply::parse(&[0x03, 0x01]).unwrap();
        assert_eq!(reply.dial, DialPosition::Ambient);
        assert_eq!(reply.button, ButtonState::Pressed);
    }

    #[test]
    fn test_dial_mapping_total() {
        let mut defined = 0;
        for code in 0..=u8::MAX {
            if DialPosition::from_code(code) != DialPosition::Unknown {
                defined += 1;
                assert!(code <= 3);
            }
        }
        assert_eq!(defined, 4);
    }

    #[test]
    fn test_readings() {
        let mut buf = vec![0u8; READING_LEN * 2];
        buf[0] = 0x10;
        buf[READING_LEN] = 0x30;
        let readings = parse_readings(&buf).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0][0], 0x10);
        assert_eq!(readings[1][0], 0x30);
        let mean = mean_sensor_value(&readings);
        assert!((mean - (0x40 as f64 / 274.0)).abs() < 1e-9);
    }

    #[test]
    fn test_readings_bad_length() {
        assert!(parse_readings(&[0u8; 100]).is_err());
        assert!(parse_readings(&[]).is_err());
    }

    proptest! {
        #[test]
        fn status_decode_never_fails(dial in any::<u8>(), button in any::<u8>()) {
            let reply = StatusReply::parse(&[dial, button]).unwrap();
            prop_assert_eq!(reply.dial_code, dial);
            prop_assert_eq!(reply.dial == DialPosition::Unknown, dial > 3);
        }
    }
}
