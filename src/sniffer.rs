//! ZEP-like encapsulation of sniffed radio frames
//!
//! Sniffed 802.15.4 frames are wrapped in a fixed 32-byte ZEP v2 data header
//! and forwarded to a packet-capture consumer. The two trailing bytes stand
//! in for a checksum that is never computed; downstream consumers rely on
//! the exact 0xFF 0xFF pattern, so this stays as-is.

use crate::error::Result;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicU32, Ordering};

/// ZEP v2 header length, preamble through the length byte
pub const ZEP_HEADER_LEN: usize = 32;

const ZEP_PREAMBLE: [u8; 2] = *b"EX";
const ZEP_VERSION: u8 = b'2';
const ZEP_TYPE_DATA: u8 = 1;
const ZEP_MODE_LQI: u8 = 0;
/// Device id placeholder, always zero
const ZEP_DEVICE_ID: u16 = 0;

/// One sniffed frame's capture metadata
#[derive(Debug, Clone, Copy)]
pub struct CaptureMeta {
    pub timestamp_s: u32,
    pub timestamp_us: u32,
    pub channel: u8,
    pub lqi: u8,
}

/// Wraps sniffed frames into ZEP capture packets
///
/// The sequence number is owned here: strictly increasing, one step per
/// packet, wrapping at u32 range, never reset during the process lifetime.
/// Atomic so multiple capture sources may share one encapsulator.
pub struct ZepEncapsulator {
    seqno: AtomicU32,
}

impl ZepEncapsulator {
    pub fn new() -> Self {
        ZepEncapsulator { seqno: AtomicU32::new(0) }
    }

    /// Build the capture packet for one sniffed frame
    ///
    /// Layout: preamble "EX", version '2', type 1, channel, device id (2,
    /// zero), LQI mode, LQI, BE seconds, BE microseconds, BE sequence,
    /// 10 reserved zero bytes, length (payload + 2), payload, 0xFF 0xFF.
    pub fn encapsulate(&self, meta: CaptureMeta, payload: &[u8]) -> Vec<u8> {
        let seqno = self.seqno.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let mut pkt = Vec::with_capacity(ZEP_HEADER_LEN + payload.len() + 2);
        pkt.extend_from_slice(&ZEP_PREAMBLE);
        pkt.push(ZEP_VERSION);
        pkt.push(ZEP_TYPE_DATA);
        pkt.push(meta.channel);
        pkt.extend_from_slice(&ZEP_DEVICE_ID.to_be_bytes());
        pkt.push(ZEP_MODE_LQI);
        pkt.push(meta.lqi);
        pkt.extend_from_slice(&meta.timestamp_s.to_be_bytes());
        pkt.extend_from_slice(&meta.timestamp_us.to_be_bytes());
        pkt.extend_from_slice(&seqno.to_be_bytes());
        pkt.extend_from_slice(&[0u8; 10]);
        pkt.push((payload.len() as u8).wrapping_add(2));
        pkt.extend_from_slice(payload);
        // Fake checksum, see module docs
        pkt.extend_from_slice(&[0xFF, 0xFF]);

        debug_assert_eq!(pkt.len(), ZEP_HEADER_LEN + payload.len() + 2);
        pkt
    }
}

impl Default for ZepEncapsulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends capture packets to a packet-capture consumer over UDP
pub struct SnifferForwarder {
    socket: UdpSocket,
    target: String,
    zep: ZepEncapsulator,
}

impl SnifferForwarder {
    /// Bind a local socket; `target` is the consumer address, e.g.
    /// "127.0.0.1:17754"
    pub fn new(target: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        log::info!("Sniffer capture forwarding to {}", target);
        Ok(SnifferForwarder {
            socket,
            target: target.to_string(),
            zep: ZepEncapsulator::new(),
        })
    }

    /// Encapsulate one sniffed frame and send it to the consumer
    pub fn forward(&self, meta: CaptureMeta, payload: &[u8]) -> Result<()> {
        let pkt = self.zep.encapsulate(meta, payload);
        self.socket.send_to(&pkt, &self.target)?;
        Ok(())
    }
}
