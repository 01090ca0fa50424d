//! Gateway-side engine for the control node serial protocol
//!
//! The control node is the microcontroller supervising an open experiment
//! node: power supply switching, consumption and radio measurements, time
//! keeping. This crate implements the host side of its serial protocol:
//!
//! - [`protocol`]: text command parsing, binary frame encoding, reply
//!   formatting
//! - [`transport`]: serial link and SYNC|LEN framing
//! - [`measures`]: dispatching and decoding of streamed measurement frames
//! - [`command_loop`]: the blocking stdin command loop
//! - [`sniffer`]: ZEP encapsulation of sniffed radio frames
//! - [`oml`]: measurement output sinks
//!
//! The daemon entry point lives in `main.rs`, orchestrated by [`app`].

pub mod app;
pub mod command_loop;
pub mod config;
pub mod error;
pub mod measures;
pub mod oml;
pub mod protocol;
pub mod sniffer;
pub mod transport;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use measures::MeasuresHandler;
pub use protocol::command::{parse_cmd, Command};
