//! Firmata protocol constants, including the micro:bit extensions.

// ########################################
// Protocol related functions

/// For non-compatible changes
pub const PROTOCOL_MAJOR_VERSION: u8 = 2;
/// For backwards-compatible changes
pub const PROTOCOL_MINOR_VERSION: u8 = 6;

/// Default firmware name reported to hosts.
pub const FIRMWARE_NAME: &str = "micro:bit Firmata";
/// Default firmware (major, minor) version reported to hosts.
pub const FIRMWARE_VERSION: (u8, u8) = (0, 9);

// ########################################
// Message command bytes (128-255/0x80-0xFF)

/// Send data for a digital port (collection of 8 pins)
pub const DIGITAL_MESSAGE: u8 = 0x90;
/// Send data for an analog channel (or PWM)
pub const ANALOG_MESSAGE: u8 = 0xE0;
/// Enable analog input by channel #
pub const REPORT_ANALOG: u8 = 0xC0;
/// Enable digital input by port
pub const REPORT_DIGITAL: u8 = 0xD0;
//
/// Set a pin to INPUT/OUTPUT/PWM/etc
pub const SET_PIN_MODE: u8 = 0xF4;
/// Set value of an individual digital pin
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
//
/// Report protocol version
pub const REPORT_VERSION: u8 = 0xF9;
/// Reset from MIDI
pub const SYSTEM_RESET: u8 = 0xFF;
//
/// Start a MIDI Sysex message
pub const START_SYSEX: u8 = 0xF0;
/// End a MIDI Sysex message
pub const END_SYSEX: u8 = 0xF7;

// ########################################
// micro:bit sysex commands (0x01-0x0F)

/// Clear the display and stop any animation
pub const MB_DISPLAY_CLEAR: u8 = 0x01;
/// Show a 5x5 image
pub const MB_DISPLAY_SHOW: u8 = 0x02;
/// Set the brightness of a single pixel
pub const MB_DISPLAY_PLOT: u8 = 0x03;
/// Scroll a string
pub const MB_SCROLL_STRING: u8 = 0x04;
/// Scroll an integer
pub const MB_SCROLL_INTEGER: u8 = 0x05;
/// Arm or disarm touch sensing on a pin
pub const MB_SET_TOUCH_MODE: u8 = 0x06;
/// Enable or disable the display (and the pins it reserves)
pub const MB_DISPLAY_ENABLE: u8 = 0x07;
/// Board event report (device to host)
pub const MB_REPORT_EVENT: u8 = 0x0D;
/// Debug string (device to host)
pub const MB_DEBUG_STRING: u8 = 0x0E;
/// Reserved for an extended micro:bit command set
pub const MB_EXTENDED_SYSEX: u8 = 0x0F;

// ########################################
// Standard sysex commands (0x10-0x7F)

/// Ask for the analog channel to pin mapping
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
/// Reply with the analog channel to pin mapping
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
/// Ask for supported modes and resolution of all pins
pub const CAPABILITY_QUERY: u8 = 0x6B;
/// Reply with supported modes and resolution
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
/// Ask for a pin's current mode and value
pub const PIN_STATE_QUERY: u8 = 0x6D;
/// Reply with pin's current mode and value
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
/// Analog write (PWM, Servo, etc) to any pin
pub const EXTENDED_ANALOG: u8 = 0x6F;
/// A string message with 14-bits per char
pub const STRING_DATA: u8 = 0x71;
/// Report name and version of the firmware
pub const REPORT_FIRMWARE: u8 = 0x79;
/// Set the poll rate of the main loop
pub const SAMPLING_INTERVAL: u8 = 0x7A;

// ########################################
// Capability table

/// Separates pins in a capability response
pub const CAPABILITY_PIN_SEPARATOR: u8 = 0x7F;
/// Resolution (in bits) advertised for analog input and PWM
pub const ANALOG_RESOLUTION: u8 = 10;

// ########################################
// Engine limits

/// Size of the receive buffer (a complete frame must fit)
pub const MAX_INPUT_BUFFER: usize = 250;
/// Maximum number of bytes kept from a scrolled string
pub const MAX_SCROLL_TEXT: usize = 200;
/// Maximum value accepted by the analog output of a pin
pub const MAX_ANALOG_OUTPUT: u16 = 1023;
/// Number of 8-pin digital ports addressable by streaming requests
pub const PORT_COUNT: usize = 16;
/// Digital ports actually sampled (pins 0..24)
pub const SAMPLED_PORTS: u8 = 3;
/// Default sampling interval (ms)
pub const DEFAULT_SAMPLING_INTERVAL: u16 = 100;
/// Default minimal sampling interval (ms)
pub const MIN_SAMPLING_INTERVAL: u16 = 1;
