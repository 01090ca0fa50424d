//! Mock transport for testing

use super::Transport;
use crate::error::Result;
use crate::protocol::constants::SYNC_BYTE;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory transport for unit tests
///
/// Clonable; clones share the same buffers, so a test can hold one end while
/// the code under test owns the other.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
            })),
        }
    }

    /// Inject raw bytes to be read
    pub fn inject_read(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(data);
    }

    /// Inject a payload wrapped in SYNC|LEN framing
    pub fn inject_frame(&self, payload: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.push_back(SYNC_BYTE);
        inner.read_buffer.push_back(payload.len() as u8);
        inner.read_buffer.extend(payload);
    }

    /// All bytes written so far
    pub fn get_written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().write_buffer.clone()
    }

    /// Written bytes split back into frame payloads
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        let written = self.get_written();
        let mut frames = Vec::new();
        let mut rest = &written[..];
        while rest.len() >= 2 && rest[0] == SYNC_BYTE {
            let len = usize::from(rest[1]);
            if rest.len() < 2 + len {
                break;
            }
            frames.push(rest[2..2 + len].to_vec());
            rest = &rest[2 + len..];
        }
        frames
    }

}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let available = inner.read_buffer.len().min(buffer.len());
        for slot in buffer.iter_mut().take(available) {
            *slot = inner.read_buffer.pop_front().unwrap();
        }
        Ok(available)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner.lock().unwrap().write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
