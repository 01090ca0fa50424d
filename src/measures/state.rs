//! Shared measurement state
//!
//! The ACK handler writes this state, the sample decoders read it, and the
//! two may be driven by interleaved frames. Both pieces are therefore held
//! behind one mutex and replaced wholesale under the lock; readers observe
//! either the old or the fully-updated value, never a partial one.

use crate::measures::time::TimeRef;
use crate::protocol::constants::{
    MEASURE_CURRENT, MEASURE_POWER, MEASURE_VOLTAGE, SOURCE_MASK,
};

/// Power-sample record layout, as acknowledged by the node
///
/// Built from the raw configuration bitmask of a CONFIG_POWER_POLL
/// acknowledgement. Existence of this struct is the validity flag: the
/// surrounding state holds `Option<PowerConfig>`, `None` until the first
/// acknowledgement arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    /// Raw configuration byte as received
    pub conf: u8,
    /// Masked source selector bits
    pub power_source: u8,
    pub power: bool,
    pub voltage: bool,
    pub current: bool,
    /// Bytes per raw record: 4 (tick count) + 4 per enabled value
    pub raw_values_len: usize,
}

impl PowerConfig {
    /// Derive the record layout from the acknowledged configuration byte
    pub fn from_conf(conf: u8) -> Self {
        let power = conf & MEASURE_POWER != 0;
        let voltage = conf & MEASURE_VOLTAGE != 0;
        let current = conf & MEASURE_CURRENT != 0;
        let enabled = [power, voltage, current].iter().filter(|&&f| f).count();
        PowerConfig {
            conf,
            power_source: conf & SOURCE_MASK,
            power,
            voltage,
            current,
            raw_values_len: 4 + 4 * enabled,
        }
    }
}

/// Mutable decoder state: time anchor + power record layout
#[derive(Debug, Default)]
pub struct MeasureState {
    pub time_ref: TimeRef,
    pub power: Option<PowerConfig>,
}

impl MeasureState {
    /// Reset to startup state: zero time reference, invalid configuration
    pub fn clear(&mut self) {
        *self = MeasureState::default();
    }
}
