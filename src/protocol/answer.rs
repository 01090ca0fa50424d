//! Reply frame formatting
//!
//! Turns the node's 2-byte command replies ({command type, status}) into the
//! text lines the upper layer prints: `"<name> ACK\n"`, `"<name> NACK\n"`, or
//! `"error <code>\n"` for ERROR_FRAME replies.

use crate::error::{Error, Result};
use crate::protocol::constants::{command_name, ACK, ERROR_FRAME, NACK};
use std::io::Write;

/// Format a reply frame into its text line
pub fn format_answer(data: &[u8]) -> Result<String> {
    if data.len() < 2 {
        return Err(Error::TooShort(data.len()));
    }
    let (cmd_type, status) = (data[0], data[1]);

    // Error frames carry a numeric code in the status byte, whatever it is
    if cmd_type == ERROR_FRAME {
        return Ok(format!("error {}\n", status));
    }

    let name = command_name(cmd_type)
        .ok_or_else(|| Error::UnknownCommand(format!("0x{:02X}", cmd_type)))?;

    match status {
        ACK => Ok(format!("{} ACK\n", name)),
        NACK => Ok(format!("{} NACK\n", name)),
        other => Err(Error::InvalidStatus(other)),
    }
}

/// Format a reply frame and write the line to the answer sink
pub fn write_answer<W: Write>(out: &mut W, data: &[u8]) -> Result<()> {
    let line = format_answer(data)?;
    out.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::*;

    #[test]
    fn test_valid_answers() {
        assert_eq!(format_answer(&[ERROR_FRAME, 42]).unwrap(), "error 42\n");
        assert_eq!(format_answer(&[RESET_TIME, ACK]).unwrap(), "reset_time ACK\n");
        assert_eq!(
            format_answer(&[CONFIG_CONSUMPTION, NACK]).unwrap(),
            "config_consumption_measure NACK\n"
        );
        assert_eq!(
            format_answer(&[CONFIG_RADIO_STOP, ACK]).unwrap(),
            "config_radio_stop ACK\n"
        );
        assert_eq!(
            format_answer(&[CONFIG_RADIO_MEAS, ACK]).unwrap(),
            "config_radio_measure ACK\n"
        );
        assert_eq!(format_answer(&[GREEN_LED_ON, ACK]).unwrap(), "green_led_on ACK\n");
        assert_eq!(
            format_answer(&[GREEN_LED_BLINK, ACK]).unwrap(),
            "green_led_blink ACK\n"
        );
        assert_eq!(
            format_answer(&[TEST_RADIO_PING_PONG, ACK]).unwrap(),
            "test_radio_ping_pong ACK\n"
        );
        assert_eq!(format_answer(&[TEST_GPIO, ACK]).unwrap(), "test_gpio ACK\n");
        assert_eq!(format_answer(&[TEST_I2C2, ACK]).unwrap(), "test_i2c ACK\n");
        assert_eq!(format_answer(&[TEST_PPS, ACK]).unwrap(), "test_pps ACK\n");
        assert_eq!(format_answer(&[TEST_GOT_PPS, ACK]).unwrap(), "test_got_pps ACK\n");
    }

    #[test]
    fn test_invalid_answers() {
        // Too short is distinct from invalid status
        assert!(matches!(format_answer(&[RESET_TIME]), Err(Error::TooShort(1))));
        assert!(matches!(
            format_answer(&[CONFIG_CONSUMPTION, 42]),
            Err(Error::InvalidStatus(42))
        ));
        // Unknown command type byte
        assert!(matches!(
            format_answer(&[0x00, ACK]),
            Err(Error::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_write_answer_sink() {
        let mut sink = Vec::new();
        write_answer(&mut sink, &[RESET_TIME, ACK]).unwrap();
        assert_eq!(sink, b"reset_time ACK\n");
    }
}
