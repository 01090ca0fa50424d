//! Measure frame dispatching and decoding
//!
//! Frames received from the control node carry acknowledgements and sample
//! batches. The leading byte selects the handler; acknowledgements mutate the
//! shared [`MeasureState`], sample batches are decoded against it and
//! forwarded to the measure sink.
//!
//! Decode behavior depends on configuration received asynchronously on an
//! earlier acknowledgement: power records have no self-describing layout, so
//! a strict length check (`record_len * count + 2`) guards against silently
//! mis-split records.

pub mod state;
pub mod time;

use crate::error::{Error, Result};
use crate::oml::MeasureSink;
use crate::protocol::constants::{
    ACK_FRAME, CONFIG_POWER_POLL, CONFIG_RADIO, CONFIG_RADIO_POLL, PW_POLL_FRAME,
    RADIO_POLL_FRAME, RESET_TIME,
};
use parking_lot::Mutex;
use state::{MeasureState, PowerConfig};
use time::TimeRef;

/// Fixed radio sample record: u32 ticks + i8 RSSI + u8 LQI
const RADIO_RECORD_LEN: usize = 6;

/// Frame kinds handled by the dispatcher, one variant per leading byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Ack,
    PowerPoll,
    RadioPoll,
}

impl FrameKind {
    /// Decode the leading frame byte; `None` for anything unrecognized
    pub fn from_byte(byte: u8) -> Option<FrameKind> {
        match byte {
            ACK_FRAME => Some(FrameKind::Ack),
            PW_POLL_FRAME => Some(FrameKind::PowerPoll),
            RADIO_POLL_FRAME => Some(FrameKind::RadioPoll),
            _ => None,
        }
    }
}

/// Dispatcher and decoders for frames streamed by the control node
///
/// Owns the measurement state exclusively; the acknowledgement path writes
/// it, the sample decoders read it, always under the mutex.
pub struct MeasuresHandler<S: MeasureSink> {
    state: Mutex<MeasureState>,
    sink: Option<S>,
    print_measures: bool,
}

impl<S: MeasureSink> MeasuresHandler<S> {
    /// Start the handler with a cleared state
    ///
    /// `sink` is `None` when no measure output was configured: decoding still
    /// happens, forwarding does not.
    pub fn new(sink: Option<S>, print_measures: bool) -> Self {
        MeasuresHandler {
            state: Mutex::new(MeasureState::default()),
            sink,
            print_measures,
        }
    }

    /// Flush the sink and reset the decoder state
    pub fn stop(&mut self) -> Result<()> {
        self.state.lock().clear();
        if let Some(sink) = self.sink.as_mut() {
            sink.stop()?;
        }
        Ok(())
    }

    /// Route one de-framed packet by its leading type byte
    ///
    /// Unknown leading bytes yield `UnknownFrameType`; the frame is dropped,
    /// nothing panics, the caller decides whether to log.
    pub fn handle_measure_pkt(&mut self, data: &[u8]) -> Result<()> {
        let Some(&frame_type) = data.first() else {
            return Err(Error::LengthMismatch { actual: 0, expected: 1 });
        };
        match FrameKind::from_byte(frame_type) {
            Some(FrameKind::Ack) => {
                self.handle_ack_pkt(data);
                Ok(())
            }
            Some(FrameKind::PowerPoll) => self.handle_pw_pkt(data),
            Some(FrameKind::RadioPoll) => self.handle_radio_measure_pkt(data),
            None => Err(Error::UnknownFrameType(frame_type)),
        }
    }

    /// Acknowledgement frame: [ACK_FRAME, ack type, config byte, ...]
    ///
    /// Unrecognized acknowledgement subtypes are logged with the offending
    /// byte in hex and change no state.
    fn handle_ack_pkt(&mut self, data: &[u8]) {
        let Some(&ack_type) = data.get(1) else {
            log::error!("ACK frame without subtype byte");
            return;
        };

        match ack_type {
            RESET_TIME => {
                log::info!("reset_time ACK frame");
                self.state.lock().time_ref = TimeRef::now();
            }
            CONFIG_POWER_POLL => {
                log::info!("config_consumption_measure ACK frame");
                let Some(&conf) = data.get(2) else {
                    log::error!("CONFIG_POWER_POLL ACK without config byte");
                    return;
                };
                // Replaced wholesale: readers see the old or the new layout,
                // never a mix.
                self.state.lock().power = Some(PowerConfig::from_conf(conf));
            }
            CONFIG_RADIO => log::info!("config_ack config_radio_signal"),
            CONFIG_RADIO_POLL => log::info!("config_ack config_radio_measure"),
            other => log::error!("Unknown ACK frame 0x{:02X}", other),
        }
    }

    /// Power sample batch: [PW_POLL_FRAME, count, records...]
    fn handle_pw_pkt(&mut self, data: &[u8]) -> Result<()> {
        let state = self.state.lock();
        let Some(config) = state.power else {
            return Err(Error::NotConfigured);
        };

        let num_measures = usize::from(*data.get(1).unwrap_or(&0));
        let expected = config.raw_values_len * num_measures + 2;
        if data.len() != expected {
            return Err(Error::LengthMismatch { actual: data.len(), expected });
        }

        let time_ref = state.time_ref;
        drop(state);

        for record in data[2..].chunks_exact(config.raw_values_len) {
            let ticks = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let (t_s, t_us) = time::absolute(&time_ref, ticks);

            // Values arrive in fixed order power, voltage, current, only for
            // enabled channels. Disabled channels are NaN, never zero: zero
            // is a valid reading.
            let mut values = record[4..]
                .chunks_exact(4)
                .map(|v| f64::from(f32::from_le_bytes([v[0], v[1], v[2], v[3]])));
            let power = if config.power { values.next().unwrap_or(f64::NAN) } else { f64::NAN };
            let voltage = if config.voltage { values.next().unwrap_or(f64::NAN) } else { f64::NAN };
            let current = if config.current { values.next().unwrap_or(f64::NAN) } else { f64::NAN };

            if self.print_measures {
                log::info!(
                    "consumption {}.{:06}: {} {} {}",
                    t_s, t_us, power, voltage, current
                );
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.record_consumption(t_s, t_us, power, voltage, current);
            }
        }
        Ok(())
    }

    /// Radio sample batch: [RADIO_POLL_FRAME, count, records...]
    ///
    /// Records are always fully present, no configuration dependency.
    fn handle_radio_measure_pkt(&mut self, data: &[u8]) -> Result<()> {
        let num_measures = usize::from(*data.get(1).unwrap_or(&0));
        let expected = RADIO_RECORD_LEN * num_measures + 2;
        if data.len() != expected {
            return Err(Error::LengthMismatch { actual: data.len(), expected });
        }

        let time_ref = self.state.lock().time_ref;

        for record in data[2..].chunks_exact(RADIO_RECORD_LEN) {
            let ticks = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let (t_s, t_us) = time::absolute(&time_ref, ticks);
            let rssi = i32::from(record[4] as i8);
            let lqi = u32::from(record[5]);

            if self.print_measures {
                log::info!("radio {}.{:06}: {} {}", t_s, t_us, rssi, lqi);
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.record_radio(t_s, t_us, rssi, lqi);
            }
        }
        Ok(())
    }

    /// Current time reference (startup default until a reset_time ACK)
    pub fn time_ref(&self) -> TimeRef {
        self.state.lock().time_ref
    }

    /// Current power record layout, `None` before the first CONFIG_POWER_POLL ACK
    pub fn power_config(&self) -> Option<PowerConfig> {
        self.state.lock().power
    }
}
