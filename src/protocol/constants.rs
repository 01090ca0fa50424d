//! Protocol constants for the control node serial link
//!
//! Frame format on the wire: [SYNC] [LEN] [PAYLOAD...]. Everything in this
//! module describes the de-framed payload.

/// Frame sync byte prefixing every frame in both directions
pub const SYNC_BYTE: u8 = 0x80;

/// Control node tick rate: ticks per wall-clock second
pub const TICKS_PER_SECOND: u32 = 32768;

// ============================================================================
// Command type bytes (payload byte 0 of a command frame)
// ============================================================================

pub const OPEN_NODE_START: u8 = 0x70;
pub const OPEN_NODE_STOP: u8 = 0x71;
pub const RESET_TIME: u8 = 0x72;
pub const GREEN_LED_ON: u8 = 0x74;
pub const GREEN_LED_BLINK: u8 = 0x75;
/// Consumption measure configuration; doubles as the CONFIG_POWER_POLL
/// acknowledgement subtype
pub const CONFIG_CONSUMPTION: u8 = 0x79;
pub const CONFIG_RADIO: u8 = 0x7A;
pub const CONFIG_RADIO_POLL: u8 = 0x7B;
pub const CONFIG_RADIO_STOP: u8 = 0x7C;
pub const CONFIG_RADIO_MEAS: u8 = 0x7D;
pub const TEST_RADIO_PING_PONG: u8 = 0x90;
pub const TEST_GPIO: u8 = 0x91;
pub const TEST_I2C2: u8 = 0x92;
pub const TEST_PPS: u8 = 0x93;
pub const TEST_GOT_PPS: u8 = 0x94;

/// CONFIG_POWER_POLL is the ACK-side name of the consumption config byte
pub const CONFIG_POWER_POLL: u8 = CONFIG_CONSUMPTION;

// ============================================================================
// Frame type bytes (byte 0 of frames received from the node)
// ============================================================================

pub const ACK_FRAME: u8 = 0xFA;
pub const RADIO_POLL_FRAME: u8 = 0xFE;
pub const PW_POLL_FRAME: u8 = 0xFF;
pub const ERROR_FRAME: u8 = 0xEE;

// ============================================================================
// Status and argument literals
// ============================================================================

pub const ACK: u8 = 0x0A;
pub const NACK: u8 = 0x02;

pub const START: u8 = 0x01;
pub const STOP: u8 = 0x00;

pub const DC: u8 = 0x01;
pub const BATT: u8 = 0x00;

// ============================================================================
// Consumption config bitmask (one byte)
// ============================================================================

pub const MEASURE_POWER: u8 = 1 << 0;
pub const MEASURE_VOLTAGE: u8 = 1 << 1;
pub const MEASURE_CURRENT: u8 = 1 << 2;
// bit 3 unused
pub const SOURCE_3_3V: u8 = 1 << 4;
pub const SOURCE_5V: u8 = 1 << 5;
pub const SOURCE_BATT: u8 = 1 << 6;
// bit 7 unused

/// All three source selector bits
pub const SOURCE_MASK: u8 = SOURCE_3_3V | SOURCE_5V | SOURCE_BATT;

// ============================================================================
// INA226 sampling byte: period_code | average_code << 4 | INA226_ENABLE
// ============================================================================

pub const INA226_ENABLE: u8 = 1 << 7;

/// Conversion periods in microseconds, indexed by period code
pub const INA226_PERIODS_US: [u32; 8] = [140, 204, 332, 588, 1100, 2116, 4156, 8244];

/// Hardware averaging counts, indexed by average code
pub const INA226_AVERAGES: [u32; 8] = [1, 4, 16, 64, 128, 256, 512, 1024];

/// Quantise a requested value against a code table: largest entry <= value.
/// Values below the table floor map to code 0.
pub fn ina226_code(table: &[u32; 8], value: u32) -> u8 {
    table
        .iter()
        .rposition(|&entry| entry <= value)
        .unwrap_or(0) as u8
}

// ============================================================================
// Command table
// ============================================================================

/// Command type byte -> canonical command name, shared by the encoder and the
/// answer formatter
pub const COMMAND_TABLE: &[(u8, &str)] = &[
    (OPEN_NODE_START, "start"),
    (OPEN_NODE_STOP, "stop"),
    (RESET_TIME, "reset_time"),
    (GREEN_LED_ON, "green_led_on"),
    (GREEN_LED_BLINK, "green_led_blink"),
    (CONFIG_CONSUMPTION, "config_consumption_measure"),
    (CONFIG_RADIO_STOP, "config_radio_stop"),
    (CONFIG_RADIO_MEAS, "config_radio_measure"),
    (TEST_RADIO_PING_PONG, "test_radio_ping_pong"),
    (TEST_GPIO, "test_gpio"),
    (TEST_I2C2, "test_i2c"),
    (TEST_PPS, "test_pps"),
    (TEST_GOT_PPS, "test_got_pps"),
];

/// Look up the canonical name for a command type byte
pub fn command_name(code: u8) -> Option<&'static str> {
    COMMAND_TABLE
        .iter()
        .find(|(byte, _)| *byte == code)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_table_codes_unique() {
        for (i, (code, _)) in COMMAND_TABLE.iter().enumerate() {
            for (other, _) in &COMMAND_TABLE[i + 1..] {
                assert_ne!(code, other);
            }
        }
    }

    #[test]
    fn test_ina226_quantisation() {
        assert_eq!(ina226_code(&INA226_PERIODS_US, 140), 0);
        assert_eq!(ina226_code(&INA226_PERIODS_US, 8244), 7);
        assert_eq!(ina226_code(&INA226_PERIODS_US, 9000), 7);
        assert_eq!(ina226_code(&INA226_PERIODS_US, 1), 0);
        assert_eq!(ina226_code(&INA226_AVERAGES, 1024), 7);
        assert_eq!(ina226_code(&INA226_AVERAGES, 1), 0);
        assert_eq!(ina226_code(&INA226_AVERAGES, 100), 3);
    }

    #[test]
    fn test_command_name_lookup() {
        assert_eq!(command_name(RESET_TIME), Some("reset_time"));
        assert_eq!(command_name(TEST_I2C2), Some("test_i2c"));
        assert_eq!(command_name(0x00), None);
    }
}
