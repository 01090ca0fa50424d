//! SYNC|LEN framing on top of a byte transport
//!
//! Every frame on the serial link is `SYNC (0x80) | LEN | payload`. The
//! protocol engine only ever sees the de-framed payload. The reader
//! accumulates bytes, discards junk ahead of a sync byte, and yields one
//! complete payload at a time.

use super::Transport;
use crate::error::Result;
use crate::protocol::constants::SYNC_BYTE;

/// Largest frame payload the node ever sends
const MAX_FRAME_LEN: usize = 256;

/// Prefix a payload with SYNC and LEN and write it out
pub fn write_frame<T: Transport + ?Sized>(transport: &mut T, payload: &[u8]) -> Result<()> {
    debug_assert!(payload.len() <= u8::MAX as usize);
    let header = [SYNC_BYTE, payload.len() as u8];
    transport.write_all(&header)?;
    transport.write_all(payload)?;
    transport.flush()
}

/// Incremental frame reader
///
/// Keeps a rolling buffer of received bytes; each `read_frame` call pulls
/// whatever the transport has and returns at most one complete payload.
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        FrameReader { buffer: Vec::with_capacity(2 * MAX_FRAME_LEN) }
    }

    /// Read from the transport and try to extract one complete frame payload
    ///
    /// Returns `Ok(None)` when no complete frame is available yet.
    pub fn read_frame<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<Vec<u8>>> {
        let mut chunk = [0u8; 256];
        let n = transport.read(&mut chunk)?;
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(self.next_frame())
    }

    /// Extract the next complete payload from the buffered bytes
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        // Resync: drop anything ahead of the first sync byte
        if let Some(sync_idx) = self.buffer.iter().position(|&b| b == SYNC_BYTE) {
            if sync_idx > 0 {
                log::debug!("Dropping {} byte(s) before frame sync", sync_idx);
                self.buffer.drain(..sync_idx);
            }
        } else {
            self.buffer.clear();
            return None;
        }

        let len = usize::from(*self.buffer.get(1)?);
        if self.buffer.len() < 2 + len {
            return None;
        }

        let payload = self.buffer[2..2 + len].to_vec();
        self.buffer.drain(..2 + len);
        Some(payload)
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_write_frame_prefixes_header() {
        let mut transport = MockTransport::new();
        write_frame(&mut transport, &[0x72]).unwrap();
        assert_eq!(transport.get_written(), vec![SYNC_BYTE, 1, 0x72]);
    }

    #[test]
    fn test_read_single_frame() {
        let mut transport = MockTransport::new();
        transport.inject_frame(&[0xFA, 0x72, 0x0A]);

        let mut reader = FrameReader::new();
        let frame = reader.read_frame(&mut transport).unwrap().unwrap();
        assert_eq!(frame, vec![0xFA, 0x72, 0x0A]);
        assert!(reader.read_frame(&mut transport).unwrap().is_none());
    }

    #[test]
    fn test_resync_on_junk() {
        let mut transport = MockTransport::new();
        transport.inject_read(&[0x11, 0x22, SYNC_BYTE, 2, 0xAB, 0xCD]);

        let mut reader = FrameReader::new();
        let frame = reader.read_frame(&mut transport).unwrap().unwrap();
        assert_eq!(frame, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut transport = MockTransport::new();
        transport.inject_read(&[SYNC_BYTE, 4, 0x01]);

        let mut reader = FrameReader::new();
        assert!(reader.read_frame(&mut transport).unwrap().is_none());

        transport.inject_read(&[0x02, 0x03, 0x04]);
        let frame = reader.read_frame(&mut transport).unwrap().unwrap();
        assert_eq!(frame, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut transport = MockTransport::new();
        transport.inject_read(&[SYNC_BYTE, 1, 0xAA, SYNC_BYTE, 1, 0xBB]);

        let mut reader = FrameReader::new();
        assert_eq!(reader.read_frame(&mut transport).unwrap().unwrap(), vec![0xAA]);
        // Second frame is already buffered
        assert_eq!(reader.next_frame().unwrap(), vec![0xBB]);
    }
}
