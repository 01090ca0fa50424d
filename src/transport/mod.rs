//! Transport layer: byte delivery between the gateway and the control node

use crate::error::Result;

pub mod framing;
mod serial;
pub use serial::SerialTransport;

pub mod mock;
pub use mock::MockTransport;

/// Byte transport to the control node
///
/// Implementations deliver raw bytes only; framing lives in
/// [`framing`]. A read returning 0 means no data right now, not
/// end-of-stream.
pub trait Transport: Send {
    /// Read available bytes into `buffer`, returns the number of bytes read
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write all of `data`
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush pending writes, blocking until complete
    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        (**self).read(buffer)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
