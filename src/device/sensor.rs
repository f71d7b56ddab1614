//! Generic colorimeter interface and the button event sink.

use std::sync::mpsc::Sender;

use crate::error::{Result, SensorError};

/// Sensor families known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    ColorMunki,
    Unknown,
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::ColorMunki => f.write_str("colormunki"),
            SensorKind::Unknown => f.write_str("unknown"),
        }
    }
}

/// Operations every sensor driver exposes.
///
/// Drivers implement what their hardware supports; everything else keeps
/// the default, which fails with `NoSupport`.
pub trait Sensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Unknown
    }

    /// Bring the device up and start listening for events.
    fn startup(&mut self) -> Result<()> {
        Err(SensorError::NoSupport(format!("{} cannot start up", self.kind())))
    }

    /// Take an ambient light reading.
    fn get_ambient(&mut self) -> Result<f64> {
        Err(SensorError::NoSupport(format!(
            "{} cannot measure ambient light",
            self.kind()
        )))
    }

    /// Diagnostics as newline-delimited `key:value` lines.
    fn dump(&self) -> Result<String> {
        Err(SensorError::NoSupport(format!("{} cannot dump state", self.kind())))
    }
}

/// The physical button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress {
    /// Device clock in milliseconds.
    pub timestamp_ms: u32,
}

/// Receiver of user-facing sensor events.
pub trait EventSink {
    fn on_button_pressed(&mut self, press: ButtonPress);
}

impl<F> EventSink for F
where
    F: FnMut(ButtonPress),
{
    fn on_button_pressed(&mut self, press: ButtonPress) {
        self(press)
    }
}

impl EventSink for Sender<ButtonPress> {
    fn on_button_pressed(&mut self, press: ButtonPress) {
        // a dropped receiver only means nobody is listening any more
        let _ = self.send(press);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl Sensor for Bare {}

    #[test]
    fn test_defaults_are_no_support() {
        let mut sensor = Bare;
        assert!(matches!(sensor.startup(), Err(SensorError::NoSupport(_))));
        assert!(matches!(sensor.get_ambient(), Err(SensorError::NoSupport(_))));
        assert!(matches!(sensor.dump(), Err(SensorError::NoSupport(_))));
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut sink = tx;
        sink.on_button_pressed(ButtonPress { timestamp_ms: 42 });
        assert_eq!(rx.recv().unwrap().timestamp_ms, 42);
    }
}
