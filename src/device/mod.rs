//! Device abstraction layer for colorimeters.
//!
//! Provides the generic [`Sensor`] interface, the USB transport seam and
//! the ColorMunki driver.

pub mod colormunki;
pub mod sensor;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use colormunki::{ColorMunki, DriverState, SensorInfo, SensorState};
pub use sensor::{ButtonPress, EventSink, Sensor, SensorKind};
pub use transport::{Completion, NusbTransport, TransferFailure, TransferKind, UsbTransport};
