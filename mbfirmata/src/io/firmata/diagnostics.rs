use std::fmt::{Display, Formatter};

use crate::io::PinModeId;

/// Describes a request the engine silently ignored (or repaired).
///
/// The protocol has no error frame: none of these outcomes changes the bytes sent to the
/// host. They are logged at `debug` level and handed to the hook registered through
/// [`Engine::on_diagnostic`](crate::io::Engine::on_diagnostic).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The pin index is outside the pin table.
    PinOutOfRange { pin: u8 },
    /// The pin does not exist on the board.
    UnavailablePin { pin: u8 },
    /// The requested mode byte is not one of the legal modes.
    UnsupportedMode { pin: u8, mode: u8 },
    /// Analog input was requested on a pin without analog capability.
    NotAnalogCapable { pin: u8 },
    /// The pin is used by the display while the display is enabled.
    ReservedByDisplay { pin: u8 },
    /// Touch sensing was requested on a pin without touch capability.
    NotTouchCapable { pin: u8 },
    /// A value was written to a pin whose mode does not accept it.
    WrongMode { pin: u8, mode: PinModeId },
    /// The digital port does not exist.
    PortOutOfRange { port: u8 },
    /// Streaming of an analog channel was refused (its pin is used by the display).
    StreamRefused { channel: u8 },
    /// A sysex frame was not terminated where expected: its bytes were skipped.
    MalformedSysex { skipped: usize },
    /// A sysex frame carried no sub-command (`F0 F7`).
    EmptySysex,
    /// The command byte matches no known command.
    UnknownCommand { command: u8 },
    /// The sysex sub-command matches no known command.
    UnknownSysex { command: u8 },
    /// The sysex sub-command did not carry the expected number of arguments.
    InvalidSysexLength { command: u8, length: usize },
    /// Input bytes were received while the input buffer was full.
    BufferOverflow { dropped: usize },
    /// An incomplete frame filled the whole input buffer and was discarded.
    BufferStuck { discarded: usize },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::PinOutOfRange { pin } => write!(f, "Pin ({}) is out of range", pin),
            Diagnostic::UnavailablePin { pin } => {
                write!(f, "Pin ({}) is not available on the board", pin)
            }
            Diagnostic::UnsupportedMode { pin, mode } => {
                write!(f, "Mode (0x{:02X}) is not supported by pin ({})", mode, pin)
            }
            Diagnostic::NotAnalogCapable { pin } => {
                write!(f, "Pin ({}) cannot be used as analog input", pin)
            }
            Diagnostic::ReservedByDisplay { pin } => {
                write!(f, "Pin ({}) is reserved by the display", pin)
            }
            Diagnostic::NotTouchCapable { pin } => {
                write!(f, "Pin ({}) does not support touch sensing", pin)
            }
            Diagnostic::WrongMode { pin, mode } => {
                write!(f, "Pin ({}) cannot be written in {} mode", pin, mode)
            }
            Diagnostic::PortOutOfRange { port } => write!(f, "Port ({}) is out of range", port),
            Diagnostic::StreamRefused { channel } => {
                write!(f, "Channel ({}) cannot be streamed", channel)
            }
            Diagnostic::MalformedSysex { skipped } => {
                write!(f, "Malformed sysex: {} bytes skipped", skipped)
            }
            Diagnostic::EmptySysex => write!(f, "Empty sysex ignored"),
            Diagnostic::UnknownCommand { command } => {
                write!(f, "Unknown command (0x{:02X})", command)
            }
            Diagnostic::UnknownSysex { command } => {
                write!(f, "Unknown sysex command (0x{:02X})", command)
            }
            Diagnostic::InvalidSysexLength { command, length } => write!(
                f,
                "Sysex command (0x{:02X}) received an invalid argument count ({})",
                command, length
            ),
            Diagnostic::BufferOverflow { dropped } => {
                write!(f, "Input buffer full: {} bytes dropped", dropped)
            }
            Diagnostic::BufferStuck { discarded } => {
                write!(f, "Incomplete frame too long: {} bytes discarded", discarded)
            }
        }
    }
}
