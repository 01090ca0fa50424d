//! Error types for cn-serial-io

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// cn-serial-io error types
///
/// Parse errors (`UnknownCommand`, `Arity`, `Arg`, `Range`) and frame errors
/// (`UnknownFrameType`, `LengthMismatch`, `NotConfigured`, `TooShort`,
/// `InvalidStatus`, `UnknownAck`) are recoverable: they are logged and the
/// offending line or frame is dropped. Io/Serial/Config errors are fatal only
/// during startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Command word not in the command table
    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    /// Wrong number of arguments for a command
    #[error("Wrong argument count for '{0}'")]
    Arity(&'static str),

    /// Missing or unparseable command argument
    #[error("Invalid argument: {0}")]
    Arg(String),

    /// Argument parsed but out of its allowed range
    #[error("Argument out of range: {0}")]
    Range(String),

    /// Reply frame shorter than the 2-byte header
    #[error("Answer too short: {0} byte(s)")]
    TooShort(usize),

    /// Reply status byte is neither ACK nor NACK
    #[error("Invalid answer status: 0x{0:02X}")]
    InvalidStatus(u8),

    /// Leading frame byte matches no known frame type
    #[error("Unknown frame type: 0x{0:02X}")]
    UnknownFrameType(u8),

    /// Measure frame length does not match the configured record layout
    #[error("Invalid measure pkt len: {actual} != expected {expected}")]
    LengthMismatch { actual: usize, expected: usize },

    /// Power measure received before any CONFIG_POWER_POLL acknowledgement
    #[error("Got PW measure without being configured")]
    NotConfigured,

    /// Acknowledgement frame with an unrecognized command family byte
    #[error("Unknown ACK frame 0x{0:02X}")]
    UnknownAck(u8),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors that only discard one line or frame
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Serial(_) | Error::Io(_) | Error::Config(_))
    }
}
