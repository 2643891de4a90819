//! Device side implementation of the Firmata protocol (2.6) and its micro:bit extension.
//!
//! Official Firmata documentation: https://github.com/firmata/protocol

pub mod codec;
pub mod constants;
mod diagnostics;
mod dispatch;
mod display;
pub mod framer;
mod streaming;

use std::fmt::{Debug, Formatter};

use log::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::errors::Error;
use crate::hardware::Hardware;
use crate::io::firmata::codec::WireWrite;
use crate::io::firmata::constants::{
    END_SYSEX, MAX_INPUT_BUFFER, MB_DEBUG_STRING, MB_REPORT_EVENT, START_SYSEX,
};
use crate::io::{Pin, PinTable, Transport};
pub use diagnostics::Diagnostic;
pub use display::DisplayState;
pub use framer::{Frame, Framer};
pub use streaming::{SamplingClock, StreamFlags};

/// Hook receiving every [`Diagnostic`] raised by the engine.
pub type DiagnosticHook = Box<dyn FnMut(&Diagnostic) + Send>;

/// Maximum number of bytes requested from the transport per read.
const READ_CHUNK: usize = 64;

/// Everything the dispatcher and the scheduler act upon.
pub(crate) struct Controller<H, T> {
    config: EngineConfig,
    hardware: H,
    transport: T,
    pins: PinTable,
    streams: StreamFlags,
    clock: SamplingClock,
    display: DisplayState,
    hook: Option<DiagnosticHook>,
}

impl<H: Hardware, T: Transport> Controller<H, T> {
    /// Puts pins, streaming flags and sampling clock back to their startup state.
    ///
    /// The display is left as is: its state lives in the hardware.
    pub(crate) fn reset(&mut self) {
        trace!("System reset");
        self.pins.reset();
        self.streams.reset();
        self.clock = SamplingClock::new(
            self.config.default_sampling_interval,
            self.hardware.now(),
        );
    }

    pub(crate) fn diagnose(&mut self, diagnostic: Diagnostic) {
        debug!("{}", diagnostic);
        if let Some(hook) = self.hook.as_mut() {
            hook(&diagnostic);
        }
    }
}

/// The protocol engine: owns every protocol table and drives the board on behalf of the host.
///
/// The surrounding firmware loop calls [`Engine::step`] repeatedly. A step never blocks
/// (except for [`Transport::flush`]) and never allocates.
///
/// # Example
/// ```
/// # #[cfg(feature = "mocks")]
/// # fn main() {
/// use mbfirmata::config::EngineConfig;
/// use mbfirmata::io::Engine;
/// use mbfirmata::mocks::hardware::MockHardware;
/// use mbfirmata::mocks::transport_layer::MockTransport;
///
/// let transport = MockTransport::new(&[0xF9]);
/// let mut engine = Engine::new(EngineConfig::default(), MockHardware::default(), transport.clone())
///     .expect("default configuration is valid");
/// engine.step().expect("mock transport does not fail");
/// assert_eq!(transport.output(), vec![0xF9, 0x02, 0x06]);
/// # }
/// # #[cfg(not(feature = "mocks"))]
/// # fn main() {}
/// ```
pub struct Engine<H, T> {
    framer: Framer,
    controller: Controller<H, T>,
}

impl<H: Hardware, T: Transport> Engine<H, T> {
    /// Creates an engine for the given board.
    ///
    /// # Errors
    /// `ConfigError` if the configuration is not valid.
    pub fn new(config: EngineConfig, hardware: H, transport: T) -> Result<Self, Error> {
        config.validate()?;
        let clock = SamplingClock::new(config.default_sampling_interval, hardware.now());
        Ok(Self {
            framer: Framer::default(),
            controller: Controller {
                config,
                hardware,
                transport,
                pins: PinTable::default(),
                streams: StreamFlags::default(),
                clock,
                display: DisplayState::default(),
                hook: None,
            },
        })
    }

    /// Startup sequence: resets the engine and announces the protocol version to the host.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.controller.reset();
        self.controller.report_protocol_version()?;
        self.controller.transport.flush()
    }

    /// Runs one iteration: reads the pending input (at most one input buffer worth), dispatches
    /// every complete frame, reports the digital ports and analog channels due, then waits for
    /// the output to drain.
    ///
    /// Bytes left in the transport are read by the next step.
    ///
    /// # Errors
    /// Only transport failures.
    pub fn step(&mut self) -> Result<(), Error> {
        self.process_input()?;

        let mut chunk = [0u8; READ_CHUNK];
        let mut budget = MAX_INPUT_BUFFER;
        while budget > 0 {
            let free = self.framer.free_space().min(READ_CHUNK).min(budget);
            let count = self.controller.transport.read(&mut chunk[..free])?;
            if count == 0 {
                break;
            }
            budget -= count;
            self.framer.feed(&chunk[..count]);
            self.process_input()?;
        }

        self.controller.stream_digital_ports()?;
        self.controller.stream_analog_channels()?;
        self.controller.transport.flush()
    }

    /// Pushes received bytes into the input buffer, for firmwares receiving bytes outside of
    /// the transport (interrupt handler, radio...). They are processed by the next step.
    ///
    /// # Returns
    /// The number of bytes dropped because the input buffer was full.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let dropped = self.framer.feed(bytes);
        if dropped > 0 {
            warn!("Input buffer full: {} bytes dropped", dropped);
            self.controller
                .diagnose(Diagnostic::BufferOverflow { dropped });
        }
        dropped
    }

    /// Dispatches the complete frames of the input buffer.
    ///
    /// An incomplete frame filling the whole buffer can never complete: it is discarded.
    fn process_input(&mut self) -> Result<(), Error> {
        let controller = &mut self.controller;
        self.framer.process(|frame| controller.dispatch(frame))?;
        if self.framer.is_full() {
            let discarded = self.framer.len();
            warn!("Input buffer stuck: {} bytes discarded", discarded);
            self.framer.clear();
            self.controller
                .diagnose(Diagnostic::BufferStuck { discarded });
        }
        Ok(())
    }

    /// System reset: every pin back to unknown mode and state, streaming off, default sampling
    /// interval. Buffered input is kept.
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// Forwards a board event to the host: `F0 0D source(3 bytes) event(3 bytes) F7`.
    pub fn report_event(&mut self, source: u16, event: u16) -> Result<(), Error> {
        trace!("Report event: source {} event {}", source, event);
        let transport = &mut self.controller.transport;
        transport.encode_7bit_pair(START_SYSEX, MB_REPORT_EVENT)?;
        transport.encode_7bit_triple(
            (source & 0x7F) as u8,
            ((source >> 7) & 0x7F) as u8,
            ((source >> 14) & 0x7F) as u8,
        )?;
        transport.encode_7bit_triple(
            (event & 0x7F) as u8,
            ((event >> 7) & 0x7F) as u8,
            ((event >> 14) & 0x7F) as u8,
        )?;
        transport.encode_byte(END_SYSEX)
    }

    /// Sends a debug string to the host: `F0 0E ascii... F7`. Bytes are truncated to 7 bits.
    pub fn send_debug(&mut self, text: &str) -> Result<(), Error> {
        trace!("Send debug string: {}", text);
        let transport = &mut self.controller.transport;
        transport.encode_7bit_pair(START_SYSEX, MB_DEBUG_STRING)?;
        for byte in text.bytes() {
            transport.encode_byte(byte & 0x7F)?;
        }
        transport.encode_byte(END_SYSEX)
    }

    /// Registers the hook receiving every diagnostic (replaces any previous one).
    pub fn on_diagnostic<F>(&mut self, hook: F)
    where
        F: FnMut(&Diagnostic) + Send + 'static,
    {
        self.controller.hook = Some(Box::new(hook));
    }

    // ########################################
    // Accessors

    pub fn config(&self) -> &EngineConfig {
        &self.controller.config
    }

    /// Retrieves the mode and state of a pin.
    pub fn pin(&self, pin: u8) -> Option<&Pin> {
        self.controller.pins.get(pin)
    }

    pub fn pins(&self) -> &PinTable {
        &self.controller.pins
    }

    pub fn streams(&self) -> &StreamFlags {
        &self.controller.streams
    }

    /// Current sampling interval (ms).
    pub fn sampling_interval(&self) -> u16 {
        self.controller.clock.interval()
    }

    pub fn is_display_enabled(&self) -> bool {
        self.controller.display.enabled
    }

    pub fn is_light_sensor_enabled(&self) -> bool {
        self.controller.display.light_sensor
    }

    /// Last text (or number) sent to the display for scrolling.
    pub fn scroll_text(&self) -> &str {
        &self.controller.display.scroll_text
    }

    /// Bytes buffered but not processed yet (at most one incomplete frame after a step).
    pub fn pending_input(&self) -> &[u8] {
        self.framer.pending()
    }

    pub fn hardware(&self) -> &H {
        &self.controller.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.controller.hardware
    }

    pub fn transport(&self) -> &T {
        &self.controller.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.controller.transport
    }
}

impl<H, T: Debug> Debug for Engine<H, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let controller = &self.controller;
        f.debug_struct("Engine")
            .field("transport", &controller.transport)
            .field("pins", &controller.pins)
            .field("streams", &controller.streams)
            .field("clock", &controller.clock)
            .field("display", &controller.display)
            .field("pending_input", &self.framer.len())
            .finish()
    }
}
