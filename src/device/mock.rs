//! Scripted [`UsbTransport`] for driver tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::device::transport::{Completion, TransferFailure, TransferKind, UsbTransport};
use crate::error::{Result, SensorError};

#[derive(Debug, Default)]
pub struct MockTransport {
    /// Replies for blocking control IN, by request.
    pub control_replies: HashMap<u8, Result<Vec<u8>>>,
    /// Reply for blocking bulk IN.
    pub bulk_reply: Option<Vec<u8>>,
    /// Blocking control OUT requests seen, with payload.
    pub control_out_log: Vec<(u8, Vec<u8>)>,
    /// Blocking control IN requests seen, in order.
    pub control_in_log: Vec<u8>,
    /// Every asynchronous submission, in order.
    pub submissions: Vec<TransferKind>,
    /// Submissions not yet completed.
    pub in_flight: Vec<TransferKind>,
    /// Completed transfers not yet collected by `poll_completion`.
    pub completions: VecDeque<Completion>,
    pub cancel_calls: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers the startup queries.
    pub fn with_startup_replies() -> Self {
        let mut mock = Self::new();
        let mut params = vec![0u8; 24];
        params[0] = 1;
        params[4] = 11;
        params[8] = 0x59;
        params[9] = 0x01;
        params[0x0c] = 0x18;
        params[0x11] = 0x02;
        params[0x15] = 0x08;
        mock.control_replies.insert(0x86, Ok(params));
        mock.control_replies
            .insert(0x8a, Ok(vec![0x01, 0x02, 0x03, 0x04, 0xab, 0xcd, 0xef, 0x10]));
        let mut version = b"ColorMunki Photo Rev 1.0".to_vec();
        version.resize(36, 0);
        mock.control_replies.insert(0x85, Ok(version));
        mock
    }

    /// Complete the oldest in-flight transfer of `kind`.
    ///
    /// Panics if no such transfer was submitted.
    pub fn complete(
        &mut self,
        kind: TransferKind,
        status: std::result::Result<Vec<u8>, TransferFailure>,
    ) {
        let Some(i) = self.in_flight.iter().position(|k| *k == kind) else {
            panic!("no {kind:?} transfer in flight");
        };
        self.in_flight.remove(i);
        self.completions.push_back(Completion { kind, status });
    }

    pub fn in_flight_of(&self, kind: TransferKind) -> usize {
        self.in_flight.iter().filter(|k| **k == kind).count()
    }

    pub fn submissions_of(&self, kind: TransferKind) -> usize {
        self.submissions.iter().filter(|k| **k == kind).count()
    }
}

impl UsbTransport for MockTransport {
    fn control_in(&mut self, request: u8, length: usize, _timeout: Duration) -> Result<Vec<u8>> {
        self.control_in_log.push(request);
        match self.control_replies.get(&request) {
            Some(Ok(data)) => Ok(data.iter().copied().take(length).collect()),
            Some(Err(err)) => Err(SensorError::Io {
                request,
                message: err.to_string(),
            }),
            None => Err(SensorError::Timeout { request }),
        }
    }

    fn control_out(&mut self, request: u8, data: &[u8], _timeout: Duration) -> Result<()> {
        self.control_out_log.push((request, data.to_vec()));
        Ok(())
    }

    fn bulk_in(&mut self, endpoint: u8, _length: usize, _timeout: Duration) -> Result<Vec<u8>> {
        self.bulk_reply
            .clone()
            .ok_or(SensorError::Timeout { request: endpoint })
    }

    fn submit_interrupt(&mut self, endpoint: u8, _length: usize) -> Result<()> {
        self.submissions.push(TransferKind::Interrupt(endpoint));
        self.in_flight.push(TransferKind::Interrupt(endpoint));
        Ok(())
    }

    fn submit_control_in(&mut self, request: u8, _length: usize) -> Result<()> {
        self.submissions.push(TransferKind::ControlIn(request));
        self.in_flight.push(TransferKind::ControlIn(request));
        Ok(())
    }

    fn poll_completion(&mut self, _timeout: Duration) -> Option<Completion> {
        self.completions.pop_front()
    }

    /// Transfers already completed keep their status.
    fn cancel_all(&mut self) {
        self.cancel_calls += 1;
        for kind in self.in_flight.drain(..) {
            self.completions.push_back(Completion {
                kind,
                status: Err(TransferFailure::Cancelled),
            });
        }
    }

    fn pending(&self) -> usize {
        self.in_flight.len() + self.completions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "in flight")]
    fn test_complete_requires_submission() {
        let mut mock = MockTransport::new();
        mock.complete(TransferKind::ControlIn(0x87), Ok(vec![0, 0]));
    }

    #[test]
    fn test_cancel_keeps_finished_status() {
        let mut mock = MockTransport::new();
        mock.submit_interrupt(0x83, 8).unwrap();
        mock.submit_control_in(0x87, 2).unwrap();
        mock.complete(TransferKind::Interrupt(0x83), Ok(vec![1; 8]));
        mock.cancel_all();

        assert_eq!(mock.pending(), 2);
        let first = mock.poll_completion(Duration::ZERO).unwrap();
        assert_eq!(first.status, Ok(vec![1; 8]));
        let second = mock.poll_completion(Duration::ZERO).unwrap();
        assert_eq!(second.status, Err(TransferFailure::Cancelled));
        assert_eq!(mock.pending(), 0);
    }
}
