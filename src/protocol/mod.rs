//! Control node wire protocol: command encoding and reply formatting

pub mod answer;
pub mod command;
pub mod constants;

pub use answer::{format_answer, write_answer};
pub use command::{parse_cmd, Command, PowerAlim, PowerSource};
