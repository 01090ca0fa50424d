//! Text command loop
//!
//! Reads command lines from a text stream, encodes each valid one as a
//! binary frame and sends it to the control node. Invalid lines are logged
//! and skipped; only end-of-stream terminates the loop.

use crate::error::Result;
use crate::protocol::command::parse_cmd;
use crate::transport::framing::write_frame;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::io::BufRead;

/// Consume command lines until EOF
///
/// Exactly one frame goes out per valid line, written under the transport
/// lock so it never interleaves with frames from other threads. A line that
/// fails to parse is logged and dropped; it never writes a partial frame and
/// never terminates the loop.
pub fn read_commands<R: BufRead, T: Transport + ?Sized>(
    input: R,
    transport: &Mutex<T>,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_cmd(line) {
            Ok(command) => command,
            Err(e) => {
                log::error!("Invalid command '{}': {}", line, e);
                continue;
            }
        };

        log::debug!("Sending command: {}", line);
        let payload = command.encode();
        write_frame(&mut *transport.lock(), &payload)?;
    }

    log::info!("Command input closed");
    Ok(())
}
