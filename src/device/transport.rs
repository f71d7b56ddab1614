//! USB transport seam for the sensor driver.
//!
//! [`UsbTransport`] is everything the driver needs from the bus: blocking
//! vendor control requests for startup and measurement, plus asynchronous
//! interrupt and control-IN transfers whose completions are collected by
//! polling. [`NusbTransport`] implements it on top of `nusb`.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures_lite::future::{block_on, poll_once};
use nusb::transfer::{
    Control, ControlIn, ControlType, Queue, Recipient, RequestBuffer, TransferError,
    TransferFuture,
};
use tracing::{debug, trace};

use crate::config::DriverConfig;
use crate::error::{Result, SensorError};
use crate::utils::text::hex_dump;

/// Sleep between polls while waiting on asynchronous transfers.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

// =============================================================================
// Transfer Completions
// =============================================================================

/// Which asynchronous transfer completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    /// Interrupt IN on the given endpoint.
    Interrupt(u8),
    /// Vendor control IN with the given request code.
    ControlIn(u8),
}

/// Why an asynchronous transfer did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFailure {
    /// Cancelled by [`UsbTransport::cancel_all`].
    Cancelled,
    Failed(String),
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferFailure::Cancelled => f.write_str("cancelled"),
            TransferFailure::Failed(message) => f.write_str(message),
        }
    }
}

/// A finished asynchronous transfer. The buffer moves to the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub kind: TransferKind,
    pub status: std::result::Result<Vec<u8>, TransferFailure>,
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Bus operations used by the driver.
pub trait UsbTransport {
    /// Blocking vendor control IN; returns the bytes actually received.
    fn control_in(&mut self, request: u8, length: usize, timeout: Duration) -> Result<Vec<u8>>;

    /// Blocking vendor control OUT.
    fn control_out(&mut self, request: u8, data: &[u8], timeout: Duration) -> Result<()>;

    /// Blocking bulk IN read of up to `length` bytes.
    fn bulk_in(&mut self, endpoint: u8, length: usize, timeout: Duration) -> Result<Vec<u8>>;

    /// Queue an interrupt IN transfer with a fresh `length`-byte buffer.
    fn submit_interrupt(&mut self, endpoint: u8, length: usize) -> Result<()>;

    /// Queue an asynchronous vendor control IN.
    fn submit_control_in(&mut self, request: u8, length: usize) -> Result<()>;

    /// Wait up to `timeout` for the next completion.
    fn poll_completion(&mut self, timeout: Duration) -> Option<Completion>;

    /// Request cancellation of every in-flight transfer. Each one still
    /// produces a completion, normally `Cancelled`.
    fn cancel_all(&mut self);

    /// Number of submitted transfers whose completion has not been returned.
    fn pending(&self) -> usize;
}

// =============================================================================
// nusb Transport
// =============================================================================

type ControlFuture = Pin<Box<TransferFuture<ControlIn>>>;

/// [`UsbTransport`] backed by a claimed `nusb` interface.
pub struct NusbTransport {
    interface: nusb::Interface,
    interface_number: u8,
    interrupts: Vec<(u8, Queue<RequestBuffer>)>,
    controls: Vec<(u8, ControlFuture)>,
    cancelled: VecDeque<Completion>,
}

fn vendor_control(request: u8, index: u16) -> Control {
    Control {
        control_type: ControlType::Vendor,
        recipient: Recipient::Device,
        request,
        value: 0,
        index,
    }
}

fn transfer_status(err: TransferError) -> TransferFailure {
    match err {
        TransferError::Cancelled => TransferFailure::Cancelled,
        other => TransferFailure::Failed(other.to_string()),
    }
}

fn request_error(request: u8, err: TransferError) -> SensorError {
    match err {
        TransferError::Cancelled => SensorError::Timeout { request },
        other => SensorError::Io {
            request,
            message: other.to_string(),
        },
    }
}

impl NusbTransport {
    /// Find the sensor, open it and claim its interface.
    ///
    /// # Errors
    /// `DeviceNotFound` if nothing matches the configured IDs, `NoSupport`
    /// carrying the USB error if the device cannot be opened or claimed.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        let device_info = nusb::list_devices()
            .map_err(|e| SensorError::NoSupport(format!("failed to enumerate USB devices: {e}")))?
            .find(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .ok_or(SensorError::DeviceNotFound)?;

        debug!(
            bus = device_info.bus_number(),
            address = device_info.device_address(),
            "opening ColorMunki"
        );
        let device = device_info
            .open()
            .map_err(|e| SensorError::NoSupport(format!("failed to open device: {e}")))?;
        let interface = device.claim_interface(config.interface).map_err(|e| {
            SensorError::NoSupport(format!(
                "failed to claim interface {}: {e}",
                config.interface
            ))
        })?;

        Ok(Self {
            interface,
            interface_number: config.interface,
            interrupts: Vec::new(),
            controls: Vec::new(),
            cancelled: VecDeque::new(),
        })
    }

    fn index(&self) -> u16 {
        self.interface_number as u16
    }

    fn try_complete(&mut self) -> Option<Completion> {
        if let Some(completion) = self.cancelled.pop_front() {
            return Some(completion);
        }

        for (endpoint, queue) in &mut self.interrupts {
            if queue.pending() == 0 {
                continue;
            }
            if let Some(done) = block_on(poll_once(queue.next_complete())) {
                return Some(Completion {
                    kind: TransferKind::Interrupt(*endpoint),
                    status: done.status.map(|()| done.data).map_err(transfer_status),
                });
            }
        }

        let ready = self
            .controls
            .iter_mut()
            .enumerate()
            .find_map(|(i, (_, future))| {
                block_on(poll_once(future.as_mut())).map(|done| (i, done))
            });
        if let Some((i, done)) = ready {
            let (request, _) = self.controls.swap_remove(i);
            return Some(Completion {
                kind: TransferKind::ControlIn(request),
                status: done.status.map(|()| done.data).map_err(transfer_status),
            });
        }

        None
    }
}

impl UsbTransport for NusbTransport {
    fn control_in(&mut self, request: u8, length: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length];
        let n = self
            .interface
            .control_in_blocking(vendor_control(request, self.index()), &mut buf, timeout)
            .map_err(|e| request_error(request, e))?;
        buf.truncate(n);
        trace!(request = %format!("{request:#04x}"), data = %hex_dump(&buf), "control in");
        Ok(buf)
    }

    fn control_out(&mut self, request: u8, data: &[u8], timeout: Duration) -> Result<()> {
        trace!(request = %format!("{request:#04x}"), data = %hex_dump(data), "control out");
        self.interface
            .control_out_blocking(vendor_control(request, self.index()), data, timeout)
            .map_err(|e| request_error(request, e))?;
        Ok(())
    }

    fn bulk_in(&mut self, endpoint: u8, length: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut future = Box::pin(self.interface.bulk_in(endpoint, RequestBuffer::new(length)));
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(done) = block_on(poll_once(future.as_mut())) {
                let data = done
                    .into_result()
                    .map_err(|e| SensorError::Io {
                        request: endpoint,
                        message: e.to_string(),
                    })?;
                trace!(endpoint = %format!("{endpoint:#04x}"), bytes = data.len(), "bulk in");
                return Ok(data);
            }
            if Instant::now() >= deadline {
                // dropping the future cancels the transfer
                return Err(SensorError::Timeout { request: endpoint });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn submit_interrupt(&mut self, endpoint: u8, length: usize) -> Result<()> {
        let position = match self.interrupts.iter().position(|(ep, _)| *ep == endpoint) {
            Some(i) => i,
            None => {
                let queue = self.interface.interrupt_in_queue(endpoint);
                self.interrupts.push((endpoint, queue));
                self.interrupts.len() - 1
            }
        };
        self.interrupts[position].1.submit(RequestBuffer::new(length));
        Ok(())
    }

    fn submit_control_in(&mut self, request: u8, length: usize) -> Result<()> {
        let length = u16::try_from(length).map_err(|_| {
            SensorError::Internal(format!("control transfer of {length} bytes is too long"))
        })?;
        let future = self.interface.control_in(ControlIn {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request,
            value: 0,
            index: self.index(),
            length,
        });
        self.controls.push((request, Box::pin(future)));
        Ok(())
    }

    fn poll_completion(&mut self, timeout: Duration) -> Option<Completion> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(completion) = self.try_complete() {
                return Some(completion);
            }
            if Instant::now() >= deadline || self.pending() == 0 {
                return None;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn cancel_all(&mut self) {
        for (_, queue) in &mut self.interrupts {
            queue.cancel_all();
        }
        // dropping a control future cancels it; report it like the queue would
        for (request, _) in self.controls.drain(..) {
            self.cancelled.push_back(Completion {
                kind: TransferKind::ControlIn(request),
                status: Err(TransferFailure::Cancelled),
            });
        }
    }

    fn pending(&self) -> usize {
        self.interrupts.iter().map(|(_, q)| q.pending()).sum::<usize>()
            + self.controls.len()
            + self.cancelled.len()
    }
}
