//! Application orchestration for the cn-serial-io daemon
//!
//! Wires the serial transport, the command reader thread and the frame
//! dispatch loop together, and handles graceful shutdown.
//!
//! Two threads touch the serial link: the command reader writes frames, the
//! dispatch loop reads them. Both go through one mutex-guarded transport so
//! outgoing frames never interleave.

use crate::command_loop::read_commands;
use crate::config::AppConfig;
use crate::error::Result;
use crate::measures::{FrameKind, MeasuresHandler};
use crate::oml::{MeasureSink, OmlMeasures};
use crate::protocol::answer::write_answer;
use crate::transport::framing::FrameReader;
use crate::transport::{SerialTransport, Transport};
use log::{debug, error, info};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io::{BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Main application structure
pub struct App {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    handler: MeasuresHandler<Box<dyn MeasureSink>>,
    shutdown: Arc<AtomicBool>,
}

impl App {
    /// Open the serial link and assemble all components
    pub fn new(config: &AppConfig) -> Result<Self> {
        let transport = SerialTransport::open(&config.serial.port, config.serial.baud_rate)?;

        let sink: Option<Box<dyn MeasureSink>> = match &config.measures.output_dir {
            Some(dir) => Some(Box::new(OmlMeasures::start(dir)?)),
            None => None,
        };

        Ok(Self::assemble(
            Box::new(transport),
            sink,
            config.measures.print_measures,
        ))
    }

    fn assemble(
        transport: Box<dyn Transport>,
        sink: Option<Box<dyn MeasureSink>>,
        print_measures: bool,
    ) -> Self {
        App {
            transport: Arc::new(Mutex::new(transport)),
            handler: MeasuresHandler::new(sink, print_measures),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until stdin closes or a termination signal arrives
    pub fn run(&mut self) -> Result<()> {
        self.setup_signal_handler();
        self.start_command_reader_thread()?;

        info!("Gateway running, reading commands from stdin");
        self.dispatch_loop()?;

        info!("Shutting down, flushing measure sink");
        self.handler.stop()?;
        Ok(())
    }

    /// Spawn the thread feeding text commands from stdin to the node
    ///
    /// End-of-input is the loop's only clean exit; either way the shutdown
    /// flag flips so the dispatch loop stops too.
    fn start_command_reader_thread(&self) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        let shutdown = Arc::clone(&self.shutdown);

        std::thread::Builder::new()
            .name("command-reader".to_string())
            .spawn(move || {
                let input = BufReader::new(std::io::stdin());
                if let Err(e) = read_commands(input, &transport) {
                    error!("Command loop failed: {}", e);
                }
                shutdown.store(true, Ordering::Relaxed);
            })?;

        Ok(())
    }

    /// Read frames from the node and route them until shutdown
    ///
    /// The transport lock is held only for the bounded read; the command
    /// thread gets the link between reads.
    fn dispatch_loop(&mut self) -> Result<()> {
        let mut reader = FrameReader::new();
        let stdout = std::io::stdout();

        while !self.shutdown.load(Ordering::Relaxed) {
            let frame = {
                let mut transport = self.transport.lock();
                match reader.read_frame(&mut *transport) {
                    Ok(frame) => frame,
                    Err(e) if e.is_recoverable() => {
                        error!("Frame read error: {}", e);
                        None
                    }
                    Err(e) => return Err(e),
                }
            };

            if let Some(frame) = frame {
                self.dispatch_frame(&frame, &mut stdout.lock());
            }
            // Frames already buffered need no further reads
            while let Some(frame) = reader.next_frame() {
                self.dispatch_frame(&frame, &mut stdout.lock());
            }
        }
        Ok(())
    }

    /// Route one de-framed payload
    ///
    /// Measure frame types go to the handler, everything else is formatted
    /// as a command reply. Protocol errors are logged and the frame dropped.
    fn dispatch_frame<W: Write>(&mut self, frame: &[u8], answers: &mut W) {
        let Some(&frame_type) = frame.first() else {
            debug!("Empty frame dropped");
            return;
        };

        if FrameKind::from_byte(frame_type).is_some() {
            if let Err(e) = self.handler.handle_measure_pkt(frame) {
                error!("Measure frame dropped: {}", e);
            }
        } else if let Err(e) = write_answer(answers, frame) {
            error!("Reply frame dropped: {}", e);
        }
    }

    /// Flip the shutdown flag on SIGINT/SIGTERM
    fn setup_signal_handler(&self) {
        let shutdown = Arc::clone(&self.shutdown);

        std::thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut signals =
                    Signals::new([SIGINT, SIGTERM]).expect("Failed to register signal handlers");

                if let Some(sig) = signals.forever().next() {
                    info!("Received signal {:?}, initiating shutdown...", sig);
                    shutdown.store(true, Ordering::Relaxed);
                }
            })
            .expect("Failed to spawn signal handler thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{
        ACK, ACK_FRAME, CONFIG_POWER_POLL, MEASURE_POWER, RESET_TIME, SOURCE_3_3V,
    };
    use crate::transport::MockTransport;

    fn app() -> App {
        App::assemble(Box::new(MockTransport::new()), None, false)
    }

    #[test]
    fn test_reply_frames_go_to_answer_sink() {
        let mut app = app();
        let mut answers = Vec::new();
        app.dispatch_frame(&[RESET_TIME, ACK], &mut answers);
        assert_eq!(answers, b"reset_time ACK\n");
    }

    #[test]
    fn test_measure_frames_go_to_handler() {
        let mut app = app();
        let mut answers = Vec::new();
        let conf = SOURCE_3_3V | MEASURE_POWER;
        app.dispatch_frame(&[ACK_FRAME, CONFIG_POWER_POLL, conf], &mut answers);

        // Consumed by the handler, not printed as a reply
        assert!(answers.is_empty());
        assert!(app.handler.power_config().is_some());
    }

    #[test]
    fn test_bad_frames_are_dropped_quietly() {
        let mut app = app();
        let mut answers = Vec::new();
        app.dispatch_frame(&[], &mut answers);
        app.dispatch_frame(&[0x42, 0x42], &mut answers);
        assert!(answers.is_empty());
    }
}
