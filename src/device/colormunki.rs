//! X-Rite ColorMunki driver.
//!
//! The device reports button presses and dial rotations on an interrupt
//! endpoint. The driver keeps exactly one interrupt transfer queued while
//! running and, after each relevant event, asks the device for the dial
//! position with an asynchronous control transfer.
//!
//! The driver owns no thread. The embedding application calls
//! [`ColorMunki::pump`] to collect completions; all state changes happen on
//! that thread.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::config::{DriverConfig, FailurePolicy};
use crate::device::sensor::{ButtonPress, EventSink, Sensor, SensorKind};
use crate::device::transport::{
    Completion, NusbTransport, TransferFailure, TransferKind, UsbTransport,
};
use crate::error::{Result, SensorError};
use crate::protocol::{
    ButtonState, CHIP_ID_LEN, DeviceEvent, DialPosition, EP_EVENTS, EP_MEASUREMENT, EventKind,
    FIRMWARE_PARAMS_LEN, FirmwareParams, MeasureParams, REQ_CHIP_ID, REQ_FIRMWARE_PARAMS,
    REQ_GET_STATUS, REQ_TRIGGER_MEASURE, REQ_VERSION_STRING, STATUS_LEN, StatusReply,
    VERSION_STRING_LEN, build_trigger_measure, mean_sensor_value, parse_chip_id,
    parse_readings, parse_version_string,
};
use crate::utils::text::hex_dump;

/// Version of the [`ColorMunki::dump`] format.
pub const DUMP_VERSION: u32 = 1;

const EVENTS: TransferKind = TransferKind::Interrupt(EP_EVENTS);
const STATUS: TransferKind = TransferKind::ControlIn(REQ_GET_STATUS);

// =============================================================================
// State
// =============================================================================

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    /// No transfers in flight; the handle may be gone.
    #[default]
    Disconnected,
    /// Device opened, startup queries not yet done.
    Connecting,
    /// Startup queries succeeded.
    Ready,
    /// Interrupt transfer queued, events are being processed.
    Running,
    /// Startup or the event transfer failed; no more events are read.
    Faulted,
}

/// Identity and timing read once during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    pub firmware_revision: String,
    pub chip_id: String,
    pub version_string: String,
    pub tick_duration: u32,
    pub min_int: u32,
    pub eeprom_blocks: u32,
    pub eeprom_blocksize: u32,
}

/// Everything the driver knows about the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorState {
    /// Changed only by a completed status refresh.
    pub dial_position: DialPosition,
    /// `None` until startup succeeds.
    pub info: Option<SensorInfo>,
}

// =============================================================================
// Driver
// =============================================================================

/// ColorMunki driver over any [`UsbTransport`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use colorcal::config::DriverConfig;
/// use colorcal::device::{ColorMunki, Sensor};
///
/// let mut munki = ColorMunki::open(DriverConfig::default())?;
/// munki.set_event_sink(|press: colorcal::device::ButtonPress| {
///     println!("pressed at {} ms", press.timestamp_ms);
/// });
/// munki.startup()?;
/// loop {
///     munki.pump(Duration::from_millis(100))?;
/// }
/// # Ok::<(), colorcal::error::SensorError>(())
/// ```
pub struct ColorMunki<T: UsbTransport> {
    transport: T,
    config: DriverConfig,
    state: DriverState,
    sensor: SensorState,
    sink: Option<Box<dyn EventSink>>,
    status_in_flight: bool,
}

impl ColorMunki<NusbTransport> {
    /// Open the first connected ColorMunki.
    ///
    /// # Errors
    /// `DeviceNotFound` if no device matches, `NoSupport` if it cannot be
    /// opened or its interface claimed.
    pub fn open(config: DriverConfig) -> Result<Self> {
        let transport = NusbTransport::open(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: UsbTransport> ColorMunki<T> {
    /// Wrap an already opened transport. The driver starts in `Connecting`.
    pub fn with_transport(transport: T, config: DriverConfig) -> Self {
        Self {
            transport,
            config,
            state: DriverState::Connecting,
            sensor: SensorState::default(),
            sink: None,
            status_in_flight: false,
        }
    }

    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sensor_state(&self) -> &SensorState {
        &self.sensor
    }

    pub fn dial_position(&self) -> DialPosition {
        self.sensor.dial_position
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn fault(&mut self, err: SensorError) -> SensorError {
        self.state = DriverState::Faulted;
        match err {
            SensorError::NoSupport(_) => err,
            other => SensorError::NoSupport(other.to_string()),
        }
    }

    fn query(&mut self, request: u8, length: usize) -> Result<Vec<u8>> {
        let timeout = self.config.control_timeout();
        let data = self.transport.control_in(request, length, timeout)?;
        trace!(request = %format!("{request:#04x}"), data = %hex_dump(&data), "startup reply");
        Ok(data)
    }

    fn read_info(&mut self) -> Result<SensorInfo> {
        let params = self.query(REQ_FIRMWARE_PARAMS, FIRMWARE_PARAMS_LEN)?;
        let params = FirmwareParams::parse(&params)?;
        let chip_id = parse_chip_id(&self.query(REQ_CHIP_ID, CHIP_ID_LEN)?)?;
        let version = self.query(REQ_VERSION_STRING, VERSION_STRING_LEN)?;
        let version_string = parse_version_string(&version);

        Ok(SensorInfo {
            firmware_revision: params.revision(),
            chip_id,
            version_string,
            tick_duration: params.tick_duration,
            min_int: params.min_int,
            eeprom_blocks: params.eeprom_blocks,
            eeprom_blocksize: params.eeprom_blocksize,
        })
    }

    fn submit_events(&mut self) -> Result<()> {
        self.transport
            .submit_interrupt(EP_EVENTS, self.config.interrupt_length)
    }

    /// Ask the device for the dial position unless a request is already out.
    /// Only issued while the event chain is running.
    fn refresh_state(&mut self) {
        if self.state != DriverState::Running {
            trace!(state = ?self.state, "skipping state refresh");
            return;
        }
        if self.status_in_flight {
            debug!("state refresh already in flight");
            return;
        }
        match self.transport.submit_control_in(REQ_GET_STATUS, STATUS_LEN) {
            Ok(()) => self.status_in_flight = true,
            Err(err) => warn!(error = %err, "failed to submit state refresh"),
        }
    }

    /// Collect and handle completions.
    ///
    /// Waits up to `timeout` for the first completion, then handles any
    /// others that are already done. Returns how many were handled.
    ///
    /// # Errors
    /// `Internal` if the driver has not been started.
    pub fn pump(&mut self, timeout: Duration) -> Result<usize> {
        if !matches!(self.state, DriverState::Running | DriverState::Faulted) {
            return Err(SensorError::Internal(format!(
                "cannot pump events in state {:?}",
                self.state
            )));
        }

        let mut handled = 0;
        let mut wait = timeout;
        while let Some(completion) = self.transport.poll_completion(wait) {
            self.handle_completion(completion);
            handled += 1;
            wait = Duration::ZERO;
        }
        Ok(handled)
    }

    /// Dispatch one finished transfer. The buffer is consumed here.
    pub fn handle_completion(&mut self, completion: Completion) {
        match completion.kind {
            EVENTS => self.handle_event(completion.status),
            STATUS => self.handle_status(completion.status),
            other => warn!(kind = ?other, "completion for unknown transfer"),
        }
    }

    fn handle_event(&mut self, status: std::result::Result<Vec<u8>, TransferFailure>) {
        let data = match status {
            Ok(data) => data,
            Err(TransferFailure::Cancelled) => {
                trace!("event transfer cancelled");
                return;
            }
            Err(TransferFailure::Failed(message)) => {
                warn!(error = %message, "event transfer failed");
                match self.config.failure_policy {
                    FailurePolicy::Halt => self.state = DriverState::Faulted,
                    FailurePolicy::Resubmit if self.state == DriverState::Running => {
                        if let Err(err) = self.submit_events() {
                            warn!(error = %err, "failed to resubmit event transfer");
                            self.state = DriverState::Faulted;
                        }
                    }
                    FailurePolicy::Resubmit => {}
                }
                return;
            }
        };

        trace!(data = %hex_dump(&data), "event");
        match DeviceEvent::parse(&data) {
            Ok(event) => match event.kind {
                EventKind::DialRotate => {
                    debug!(timestamp_ms = event.timestamp_ms, "dial rotated");
                    self.refresh_state();
                }
                EventKind::ButtonPressed => {
                    debug!(timestamp_ms = event.timestamp_ms, "button pressed");
                    if let Some(sink) = self.sink.as_mut() {
                        sink.on_button_pressed(ButtonPress {
                            timestamp_ms: event.timestamp_ms,
                        });
                    }
                    self.refresh_state();
                }
                EventKind::ButtonReleased => {
                    debug!(timestamp_ms = event.timestamp_ms, "button released");
                }
                EventKind::Unknown(code) => {
                    warn!(code, "unhandled event command");
                }
            },
            Err(err) => warn!(error = %err, "ignoring malformed event"),
        }

        if self.state == DriverState::Running {
            if let Err(err) = self.submit_events() {
                warn!(error = %err, "failed to resubmit event transfer");
                self.state = DriverState::Faulted;
            }
        }
    }

    fn handle_status(&mut self, status: std::result::Result<Vec<u8>, TransferFailure>) {
        self.status_in_flight = false;
        let data = match status {
            Ok(data) => data,
            Err(TransferFailure::Cancelled) => {
                trace!("state refresh cancelled");
                return;
            }
            Err(TransferFailure::Failed(message)) => {
                // the next event issues a fresh refresh; the event chain is unaffected
                warn!(error = %message, "state refresh failed");
                return;
            }
        };

        trace!(data = %hex_dump(&data), "state");
        match StatusReply::parse(&data) {
            Ok(reply) => {
                if reply.dial == DialPosition::Unknown {
                    warn!(code = reply.dial_code, "dial position unknown");
                }
                if reply.dial != self.sensor.dial_position {
                    debug!(from = %self.sensor.dial_position, to = %reply.dial, "dial moved");
                }
                self.sensor.dial_position = reply.dial;
                match reply.button {
                    ButtonState::Unknown(code) => warn!(code, "button state unknown"),
                    button => debug!(?button, "button state"),
                }
            }
            Err(err) => warn!(error = %err, "ignoring malformed state reply"),
        }
    }

    /// Cancel every in-flight transfer and wait for their completions.
    ///
    /// Safe to call more than once. The device handle itself is released
    /// when the driver is dropped.
    pub fn shutdown(&mut self) {
        if self.state == DriverState::Disconnected {
            return;
        }
        self.state = DriverState::Disconnected;

        self.transport.cancel_all();
        let timeout = self.config.control_timeout();
        while self.transport.pending() > 0 {
            match self.transport.poll_completion(timeout) {
                Some(completion) => self.handle_completion(completion),
                None => {
                    warn!(
                        pending = self.transport.pending(),
                        "transfers still pending after cancel"
                    );
                    break;
                }
            }
        }
        self.status_in_flight = false;
        debug!("ColorMunki shut down");
    }
}

impl<T: UsbTransport> Sensor for ColorMunki<T> {
    fn kind(&self) -> SensorKind {
        SensorKind::ColorMunki
    }

    /// Query firmware parameters, chip ID and version string, then queue
    /// the event transfer and a first state refresh.
    ///
    /// # Errors
    /// Any failure moves the driver to `Faulted` and is reported as
    /// `NoSupport` carrying the USB error.
    fn startup(&mut self) -> Result<()> {
        if self.state != DriverState::Connecting {
            return Err(SensorError::Internal(format!(
                "cannot start up in state {:?}",
                self.state
            )));
        }

        let info = match self.read_info() {
            Ok(info) => info,
            Err(err) => return Err(self.fault(err)),
        };
        debug!(
            chip_id = %info.chip_id,
            version = %info.version_string,
            firmware = %info.firmware_revision,
            "ColorMunki ready"
        );
        self.sensor.info = Some(info);
        self.state = DriverState::Ready;

        if let Err(err) = self.submit_events() {
            return Err(self.fault(err));
        }
        self.state = DriverState::Running;
        self.refresh_state();
        Ok(())
    }

    /// Mean raw sensor count with the lamp off.
    ///
    /// # Errors
    /// `NoSupport` unless the dial is at the ambient position.
    fn get_ambient(&mut self) -> Result<f64> {
        if self.sensor.dial_position != DialPosition::Ambient {
            return Err(SensorError::NoSupport(format!(
                "dial is at {}, turn it to the ambient position",
                self.sensor.dial_position
            )));
        }
        if !matches!(self.state, DriverState::Ready | DriverState::Running) {
            return Err(SensorError::Internal(format!(
                "cannot measure in state {:?}",
                self.state
            )));
        }

        let params = MeasureParams::AMBIENT;
        let timeout = self.config.control_timeout();
        self.transport
            .control_out(REQ_TRIGGER_MEASURE, &build_trigger_measure(&params), timeout)?;
        let data = self
            .transport
            .bulk_in(EP_MEASUREMENT, params.reply_len(), timeout)?;
        let readings = parse_readings(&data)?;
        let value = mean_sensor_value(&readings);
        debug!(readings = readings.len(), value, "ambient reading");
        Ok(value)
    }

    fn dump(&self) -> Result<String> {
        let info = self
            .sensor
            .info
            .as_ref()
            .ok_or_else(|| SensorError::Internal("sensor has not been started".to_string()))?;

        let mut out = String::new();
        out.push_str(&format!("colormunki-dump-version:{}\n", DUMP_VERSION));
        out.push_str(&format!("chip-id:{}\n", info.chip_id));
        out.push_str(&format!("version:{}\n", info.version_string));
        out.push_str(&format!("firmware-revision:{}\n", info.firmware_revision));
        out.push_str(&format!("tick-duration:{}\n", info.tick_duration));
        out.push_str(&format!("min-int:{}\n", info.min_int));
        out.push_str(&format!("eeprom-blocks:{}\n", info.eeprom_blocks));
        out.push_str(&format!("eeprom-blocksize:{}\n", info.eeprom_blocksize));
        Ok(out)
    }
}

impl<T: UsbTransport> Drop for ColorMunki<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
