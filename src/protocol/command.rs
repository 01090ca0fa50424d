//! Command parsing and frame encoding
//!
//! Text line -> `Command` -> fixed-length binary frame. Every variant maps to
//! exactly one payload layout whose first byte is its command type code; the
//! frame length is fully determined by the variant (no variable-length
//! fields).

use crate::error::{Error, Result};
use crate::protocol::constants::*;

/// Node supply selector for `start`/`stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAlim {
    Dc,
    Battery,
}

impl PowerAlim {
    fn to_byte(self) -> u8 {
        match self {
            PowerAlim::Dc => DC,
            PowerAlim::Battery => BATT,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            DC => Ok(PowerAlim::Dc),
            BATT => Ok(PowerAlim::Battery),
            _ => Err(Error::Arg(format!("invalid alim byte 0x{:02X}", byte))),
        }
    }
}

/// Consumption measure power source, one of three mutually exclusive rails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSource {
    Rail3_3V,
    Rail5V,
    Battery,
}

impl PowerSource {
    fn to_bit(self) -> u8 {
        match self {
            PowerSource::Rail3_3V => SOURCE_3_3V,
            PowerSource::Rail5V => SOURCE_5V,
            PowerSource::Battery => SOURCE_BATT,
        }
    }

    fn from_bits(bits: u8) -> Result<Self> {
        match bits & SOURCE_MASK {
            SOURCE_3_3V => Ok(PowerSource::Rail3_3V),
            SOURCE_5V => Ok(PowerSource::Rail5V),
            SOURCE_BATT => Ok(PowerSource::Battery),
            other => Err(Error::Arg(format!("invalid source bits 0x{:02X}", other))),
        }
    }
}

/// A fully parsed command, one variant per entry in the command table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ResetTime,
    NodeStart(PowerAlim),
    NodeStop(PowerAlim),
    GreenLedOn,
    GreenLedBlink,
    ConsumptionStop,
    ConsumptionStart {
        source: PowerSource,
        power: bool,
        voltage: bool,
        current: bool,
        period_code: u8,
        average_code: u8,
    },
    ConfigRadioStop,
    ConfigRadioMeasure {
        /// Bit (channel - 11) set for each polled channel in [11, 26]
        channels: u16,
        period: u16,
        num_measures: u8,
    },
    PingPongStart {
        channel: u8,
        tx_power_dbm: i8,
    },
    PingPongStop,
    TestGpio(bool),
    TestI2c(bool),
    TestPps(bool),
    TestGotPps,
}

impl Command {
    /// Command type code, byte 0 of the encoded frame
    pub fn type_byte(&self) -> u8 {
        match self {
            Command::ResetTime => RESET_TIME,
            Command::NodeStart(_) => OPEN_NODE_START,
            Command::NodeStop(_) => OPEN_NODE_STOP,
            Command::GreenLedOn => GREEN_LED_ON,
            Command::GreenLedBlink => GREEN_LED_BLINK,
            Command::ConsumptionStop | Command::ConsumptionStart { .. } => CONFIG_CONSUMPTION,
            Command::ConfigRadioStop => CONFIG_RADIO_STOP,
            Command::ConfigRadioMeasure { .. } => CONFIG_RADIO_MEAS,
            Command::PingPongStart { .. } | Command::PingPongStop => TEST_RADIO_PING_PONG,
            Command::TestGpio(_) => TEST_GPIO,
            Command::TestI2c(_) => TEST_I2C2,
            Command::TestPps(_) => TEST_PPS,
            Command::TestGotPps => TEST_GOT_PPS,
        }
    }

    /// Fixed encoded frame length for this variant
    pub fn frame_len(&self) -> usize {
        match self {
            Command::ResetTime
            | Command::GreenLedOn
            | Command::GreenLedBlink
            | Command::ConfigRadioStop
            | Command::TestGotPps => 1,
            Command::NodeStart(_)
            | Command::NodeStop(_)
            | Command::TestGpio(_)
            | Command::TestI2c(_)
            | Command::TestPps(_) => 2,
            Command::ConsumptionStop
            | Command::ConsumptionStart { .. }
            | Command::PingPongStart { .. }
            | Command::PingPongStop => 4,
            Command::ConfigRadioMeasure { .. } => 8,
        }
    }

    /// Encode into the fixed binary command frame
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.frame_len());
        frame.push(self.type_byte());

        match *self {
            Command::ResetTime
            | Command::GreenLedOn
            | Command::GreenLedBlink
            | Command::ConfigRadioStop
            | Command::TestGotPps => {}
            Command::NodeStart(alim) | Command::NodeStop(alim) => {
                frame.push(alim.to_byte());
            }
            Command::TestGpio(start) | Command::TestI2c(start) | Command::TestPps(start) => {
                frame.push(if start { START } else { STOP });
            }
            Command::ConsumptionStop => {
                frame.extend_from_slice(&[STOP, 0, 0]);
            }
            Command::ConsumptionStart {
                source,
                power,
                voltage,
                current,
                period_code,
                average_code,
            } => {
                let mut measures = source.to_bit();
                if power {
                    measures |= MEASURE_POWER;
                }
                if voltage {
                    measures |= MEASURE_VOLTAGE;
                }
                if current {
                    measures |= MEASURE_CURRENT;
                }
                let sampling = (period_code & 0x0F) | (average_code << 4) | INA226_ENABLE;
                frame.extend_from_slice(&[START, measures, sampling]);
            }
            Command::ConfigRadioMeasure {
                channels,
                period,
                num_measures,
            } => {
                // 16-bit channel mask, low byte first; wire reserves 4 bytes
                frame.extend_from_slice(&channels.to_le_bytes());
                frame.extend_from_slice(&[0, 0]);
                frame.extend_from_slice(&period.to_le_bytes());
                frame.push(num_measures);
            }
            Command::PingPongStart {
                channel,
                tx_power_dbm,
            } => {
                frame.extend_from_slice(&[START, channel, tx_power_dbm as u8]);
            }
            Command::PingPongStop => {
                frame.extend_from_slice(&[STOP, 0, 0]);
            }
        }

        debug_assert_eq!(frame.len(), self.frame_len());
        frame
    }

    /// Decode a command frame back into its variant
    pub fn decode(frame: &[u8]) -> Result<Command> {
        if frame.is_empty() {
            return Err(Error::TooShort(0));
        }
        let arg = |idx: usize| -> Result<u8> {
            frame
                .get(idx)
                .copied()
                .ok_or(Error::TooShort(frame.len()))
        };

        let cmd = match frame[0] {
            RESET_TIME => Command::ResetTime,
            OPEN_NODE_START => Command::NodeStart(PowerAlim::from_byte(arg(1)?)?),
            OPEN_NODE_STOP => Command::NodeStop(PowerAlim::from_byte(arg(1)?)?),
            GREEN_LED_ON => Command::GreenLedOn,
            GREEN_LED_BLINK => Command::GreenLedBlink,
            CONFIG_CONSUMPTION => match arg(1)? {
                STOP => Command::ConsumptionStop,
                START => {
                    let measures = arg(2)?;
                    let sampling = arg(3)?;
                    Command::ConsumptionStart {
                        source: PowerSource::from_bits(measures)?,
                        power: measures & MEASURE_POWER != 0,
                        voltage: measures & MEASURE_VOLTAGE != 0,
                        current: measures & MEASURE_CURRENT != 0,
                        period_code: sampling & 0x0F,
                        average_code: (sampling >> 4) & 0x07,
                    }
                }
                other => return Err(Error::Arg(format!("invalid start/stop byte 0x{:02X}", other))),
            },
            CONFIG_RADIO_STOP => Command::ConfigRadioStop,
            CONFIG_RADIO_MEAS => Command::ConfigRadioMeasure {
                channels: u16::from_le_bytes([arg(1)?, arg(2)?]),
                period: u16::from_le_bytes([arg(5)?, arg(6)?]),
                num_measures: arg(7)?,
            },
            TEST_RADIO_PING_PONG => match arg(1)? {
                STOP => Command::PingPongStop,
                START => Command::PingPongStart {
                    channel: arg(2)?,
                    tx_power_dbm: arg(3)? as i8,
                },
                other => return Err(Error::Arg(format!("invalid start/stop byte 0x{:02X}", other))),
            },
            TEST_GPIO => Command::TestGpio(arg(1)? == START),
            TEST_I2C2 => Command::TestI2c(arg(1)? == START),
            TEST_PPS => Command::TestPps(arg(1)? == START),
            TEST_GOT_PPS => Command::TestGotPps,
            other => return Err(Error::UnknownCommand(format!("0x{:02X}", other))),
        };
        Ok(cmd)
    }
}

/// Parse one trimmed text line into a command
///
/// Tokenizes on whitespace; the first token must match the command table
/// exactly (case-sensitive). Remaining tokens are validated per command.
pub fn parse_cmd(line: &str) -> Result<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&word) = tokens.first() else {
        return Err(Error::UnknownCommand(String::new()));
    };
    let args = &tokens[1..];

    match word {
        "reset_time" => expect_no_args("reset_time", args, Command::ResetTime),
        "start" => Ok(Command::NodeStart(parse_alim("start", args)?)),
        "stop" => Ok(Command::NodeStop(parse_alim("stop", args)?)),
        "green_led_on" => expect_no_args("green_led_on", args, Command::GreenLedOn),
        "green_led_blink" => expect_no_args("green_led_blink", args, Command::GreenLedBlink),
        "config_consumption_measure" => parse_consumption(args),
        "config_radio_stop" => expect_no_args("config_radio_stop", args, Command::ConfigRadioStop),
        "config_radio_measure" => parse_radio_measure(args),
        "test_radio_ping_pong" => parse_ping_pong(args),
        "test_gpio" => Ok(Command::TestGpio(parse_start_stop("test_gpio", args)?)),
        "test_i2c" => Ok(Command::TestI2c(parse_start_stop("test_i2c", args)?)),
        "test_pps" => Ok(Command::TestPps(parse_start_stop("test_pps", args)?)),
        "test_got_pps" => expect_no_args("test_got_pps", args, Command::TestGotPps),
        other => Err(Error::UnknownCommand(other.to_string())),
    }
}

fn expect_no_args(name: &'static str, args: &[&str], cmd: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(Error::Arity(name))
    }
}

fn parse_alim(name: &'static str, args: &[&str]) -> Result<PowerAlim> {
    let [alim] = args else {
        return Err(Error::Arity(name));
    };
    match *alim {
        "dc" => Ok(PowerAlim::Dc),
        "battery" => Ok(PowerAlim::Battery),
        other => Err(Error::Arg(format!("unknown alim '{}'", other))),
    }
}

fn parse_start_stop(name: &'static str, args: &[&str]) -> Result<bool> {
    let [state] = args else {
        return Err(Error::Arity(name));
    };
    match *state {
        "start" => Ok(true),
        "stop" => Ok(false),
        other => Err(Error::Arg(format!("expected start|stop, got '{}'", other))),
    }
}

/// `stop` | `start <source> p <0|1> v <0|1> c <0|1> -p <period> -a <count>`
fn parse_consumption(args: &[&str]) -> Result<Command> {
    match args.first() {
        Some(&"stop") if args.len() == 1 => Ok(Command::ConsumptionStop),
        Some(&"start") => {
            if args.len() != 12 {
                return Err(Error::Arity("config_consumption_measure"));
            }
            let source = match args[1] {
                "3.3V" => PowerSource::Rail3_3V,
                "5V" => PowerSource::Rail5V,
                "BATT" => PowerSource::Battery,
                other => return Err(Error::Arg(format!("unknown source '{}'", other))),
            };
            let power = parse_measure_flag(args, 2, "p")?;
            let voltage = parse_measure_flag(args, 4, "v")?;
            let current = parse_measure_flag(args, 6, "c")?;
            // Period and average are presence-validated only: any parseable
            // number is accepted and quantised to its INA226 code.
            let period = parse_marked_number(args, 8, "-p")?;
            let average = parse_marked_number(args, 10, "-a")?;
            Ok(Command::ConsumptionStart {
                source,
                power,
                voltage,
                current,
                period_code: ina226_code(&INA226_PERIODS_US, period),
                average_code: ina226_code(&INA226_AVERAGES, average),
            })
        }
        _ => Err(Error::Arg(
            "config_consumption_measure expects start|stop".to_string(),
        )),
    }
}

fn parse_measure_flag(args: &[&str], idx: usize, marker: &str) -> Result<bool> {
    if args[idx] != marker {
        return Err(Error::Arg(format!("expected flag marker '{}'", marker)));
    }
    match args[idx + 1] {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(Error::Arg(format!("flag '{}' must be 0|1, got '{}'", marker, other))),
    }
}

fn parse_marked_number(args: &[&str], idx: usize, marker: &str) -> Result<u32> {
    if args[idx] != marker {
        return Err(Error::Arg(format!("expected marker '{}'", marker)));
    }
    args[idx + 1]
        .parse()
        .map_err(|_| Error::Arg(format!("'{}' value '{}' not a number", marker, args[idx + 1])))
}

/// `<channel-list> <period> <num_measures>`
fn parse_radio_measure(args: &[&str]) -> Result<Command> {
    let [channels, period, num] = args else {
        return Err(Error::Arity("config_radio_measure"));
    };

    let mut mask: u16 = 0;
    for entry in channels.split(',') {
        let channel: u8 = entry
            .parse()
            .map_err(|_| Error::Arg(format!("channel '{}' not a number", entry)))?;
        if !(11..=26).contains(&channel) {
            return Err(Error::Range(format!("channel {} not in [11, 26]", channel)));
        }
        mask |= 1 << (channel - 11);
    }

    let period: u32 = period
        .parse()
        .map_err(|_| Error::Arg(format!("period '{}' not a number", period)))?;
    if period == 0 || period >= 65536 {
        return Err(Error::Range(format!("period {} not in [1, 65535]", period)));
    }

    let num_measures: u8 = num
        .parse()
        .map_err(|_| Error::Arg(format!("num_measures '{}' not a byte", num)))?;

    Ok(Command::ConfigRadioMeasure {
        channels: mask,
        period: period as u16,
        num_measures,
    })
}

/// `start <channel> <tx_power_dbm>` | `stop`
fn parse_ping_pong(args: &[&str]) -> Result<Command> {
    match args.first() {
        Some(&"stop") if args.len() == 1 => Ok(Command::PingPongStop),
        Some(&"start") => {
            let ["start", channel, power] = args else {
                return Err(Error::Arity("test_radio_ping_pong"));
            };
            let channel: u8 = channel
                .parse()
                .map_err(|_| Error::Arg(format!("channel '{}' not a number", channel)))?;
            if !(11..=26).contains(&channel) {
                return Err(Error::Range(format!("channel {} not in [11, 26]", channel)));
            }
            let power: f32 = power
                .parse()
                .map_err(|_| Error::Arg(format!("tx power '{}' not a number", power)))?;
            Ok(Command::PingPongStart {
                channel,
                tx_power_dbm: power.round() as i8,
            })
        }
        _ => Err(Error::Arity("test_radio_ping_pong")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        let cmd = parse_cmd("reset_time").unwrap();
        assert_eq!(cmd.encode(), vec![RESET_TIME]);

        let cmd = parse_cmd("start dc").unwrap();
        assert_eq!(cmd.encode(), vec![OPEN_NODE_START, DC]);

        let cmd = parse_cmd("stop battery").unwrap();
        assert_eq!(cmd.encode(), vec![OPEN_NODE_STOP, BATT]);

        let cmd = parse_cmd("green_led_on").unwrap();
        assert_eq!(cmd.encode(), vec![GREEN_LED_ON]);

        let cmd = parse_cmd("green_led_blink").unwrap();
        assert_eq!(cmd.encode(), vec![GREEN_LED_BLINK]);
    }

    #[test]
    fn test_consumption_stop() {
        let frame = parse_cmd("config_consumption_measure stop").unwrap().encode();
        assert_eq!(frame, vec![CONFIG_CONSUMPTION, STOP, 0, 0]);
    }

    #[test]
    fn test_consumption_start_distinct_payloads() {
        let encode = |line: &str| parse_cmd(line).unwrap().encode();

        let reference = encode("config_consumption_measure start 3.3V p 1 v 1 c 1 -p 140 -a 1");
        assert_eq!(reference.len(), 4);
        assert_eq!(reference[0], CONFIG_CONSUMPTION);
        assert_eq!(reference[1], START);

        // Differ in source
        let other = encode("config_consumption_measure start BATT p 1 v 1 c 1 -p 140 -a 1");
        assert_ne!(reference[2..], other[2..]);

        // Differ in enabled measures
        let other = encode("config_consumption_measure start 3.3V p 0 v 1 c 0 -p 140 -a 1");
        assert_ne!(reference[2..], other[2..]);
        let other = encode("config_consumption_measure start 3.3V p 1 v 0 c 1 -p 140 -a 1");
        assert_ne!(reference[2..], other[2..]);

        // Differ in period/average
        let other = encode("config_consumption_measure start 3.3V p 1 v 1 c 1 -p 8244 -a 1024");
        assert_ne!(reference[2..], other[2..]);
    }

    #[test]
    fn test_consumption_start_bitmask() {
        let frame = parse_cmd("config_consumption_measure start 5V p 1 v 0 c 1 -p 140 -a 1")
            .unwrap()
            .encode();
        assert_eq!(frame[2], SOURCE_5V | MEASURE_POWER | MEASURE_CURRENT);
        assert_eq!(frame[3], INA226_ENABLE); // period code 0, average code 0
    }

    #[test]
    fn test_radio_measure_channel_11() {
        let frame = parse_cmd("config_radio_measure 11 100 0").unwrap().encode();
        assert_eq!(frame.len(), 8);
        assert_eq!(frame[0], CONFIG_RADIO_MEAS);
        // channel 11 -> bit 0 of the low mask byte
        assert_eq!(frame[1], 1);
        assert_eq!(frame[2], 0);
        // reserved
        assert_eq!(frame[3], 0);
        assert_eq!(frame[4], 0);
        // period 100 little-endian
        assert_eq!(frame[5], 100);
        assert_eq!(frame[6], 0);
        // num measures
        assert_eq!(frame[7], 0);
    }

    #[test]
    fn test_radio_measure_channel_group() {
        let frame = parse_cmd("config_radio_measure 16,17,18 256 10").unwrap().encode();
        // channels 16,17,18 -> bits 5,6,7 of the low mask byte
        assert_eq!(frame[1], (1 << 5) | (1 << 6) | (1 << 7));
        assert_eq!(frame[2], 0);
        // period 256
        assert_eq!(frame[5], 0);
        assert_eq!(frame[6], 1);
        assert_eq!(frame[7], 10);
    }

    #[test]
    fn test_radio_measure_high_channels() {
        let frame = parse_cmd("config_radio_measure 26 1 1").unwrap().encode();
        // channel 26 -> bit 15 -> high mask byte bit 7
        assert_eq!(frame[1], 0);
        assert_eq!(frame[2], 1 << 7);
    }

    #[test]
    fn test_radio_measure_rejections() {
        assert!(matches!(
            parse_cmd("config_radio_measure invalid"),
            Err(Error::Arity(_))
        ));
        assert!(matches!(
            parse_cmd("config_radio_measure lal 100 0"),
            Err(Error::Arg(_))
        ));
        assert!(matches!(
            parse_cmd("config_radio_measure 15 0 1"),
            Err(Error::Range(_))
        ));
        assert!(matches!(
            parse_cmd("config_radio_measure 15 65536 1"),
            Err(Error::Range(_))
        ));
        assert!(matches!(
            parse_cmd("config_radio_measure 27 100 0"),
            Err(Error::Range(_))
        ));
    }

    #[test]
    fn test_test_commands() {
        let frame = parse_cmd("test_radio_ping_pong start 15 3.0").unwrap().encode();
        assert_eq!(frame, vec![TEST_RADIO_PING_PONG, START, 15, 3]);

        let frame = parse_cmd("test_radio_ping_pong stop").unwrap().encode();
        assert_eq!(frame, vec![TEST_RADIO_PING_PONG, STOP, 0, 0]);

        let frame = parse_cmd("test_gpio start").unwrap().encode();
        assert_eq!(frame, vec![TEST_GPIO, START]);
        let frame = parse_cmd("test_gpio stop").unwrap().encode();
        assert_eq!(frame, vec![TEST_GPIO, STOP]);

        let frame = parse_cmd("test_i2c start").unwrap().encode();
        assert_eq!(frame, vec![TEST_I2C2, START]);

        let frame = parse_cmd("test_pps stop").unwrap().encode();
        assert_eq!(frame, vec![TEST_PPS, STOP]);

        let frame = parse_cmd("test_got_pps").unwrap().encode();
        assert_eq!(frame, vec![TEST_GOT_PPS]);
    }

    #[test]
    fn test_invalid_commands() {
        assert!(parse_cmd("").is_err());
        assert!(matches!(
            parse_cmd("unkown_cmd with arg"),
            Err(Error::UnknownCommand(_))
        ));
        assert!(parse_cmd("config_consumption_measure blabla").is_err());
        // ping pong with no start/stop literal
        assert!(parse_cmd("test_radio_ping_pong").is_err());
        // arity on fixed commands
        assert!(matches!(parse_cmd("reset_time now"), Err(Error::Arity(_))));
        assert!(matches!(parse_cmd("start"), Err(Error::Arity(_))));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let lines = [
            "reset_time",
            "start dc",
            "stop battery",
            "green_led_on",
            "green_led_blink",
            "config_consumption_measure stop",
            "config_consumption_measure start 3.3V p 1 v 0 c 1 -p 2116 -a 64",
            "config_radio_stop",
            "config_radio_measure 11,14,26 1000 5",
            "test_radio_ping_pong start 20 -7.0",
            "test_radio_ping_pong stop",
            "test_gpio start",
            "test_i2c stop",
            "test_pps start",
            "test_got_pps",
        ];
        for line in lines {
            let cmd = parse_cmd(line).unwrap();
            let frame = cmd.encode();
            assert_eq!(frame.len(), cmd.frame_len(), "length for '{}'", line);
            assert_eq!(Command::decode(&frame).unwrap(), cmd, "round trip for '{}'", line);
        }
    }
}
