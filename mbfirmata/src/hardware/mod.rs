//! Defines the hardware capabilities the engine drives: pins, display, sensors and clock.

mod layout;

pub use layout::*;

/// Pull resistor configuration for a digital input pin.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
    #[default]
    None,
}

/// Rendering mode of the pixel display.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    BlackAndWhite,
    Greyscale,
}

/// A three-axis sensor reading (accelerometer or compass).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<(i32, i32, i32)> for Axes {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

/// Capability interface of the board the engine runs on.
///
/// One thin adapter implements this trait per target. The engine calls it only from
/// within [`Engine::step`](crate::io::Engine::step) (or from one of the engine reporting
/// functions) and never overlaps calls: implementations may assume synchronous,
/// non-reentrant access.
pub trait Hardware {
    // ########################################
    // Pins

    /// Drives a digital output `pin` to `level`.
    fn set_digital_output(&mut self, pin: u8, level: bool);

    /// Reads the level of a digital input `pin`.
    fn read_digital_input(&mut self, pin: u8) -> bool;

    /// Configures the pull resistor of `pin`.
    fn set_pin_pull(&mut self, pin: u8, pull: Pull);

    /// Writes a PWM/analog `value` (0..=1023) to `pin`.
    fn set_analog_output(&mut self, pin: u8, value: u16);

    /// Reads the analog value (0..=1023) of `pin`.
    fn read_analog_input(&mut self, pin: u8) -> u16;

    // ########################################
    // Sensors

    fn read_accelerometer(&mut self) -> Axes;

    fn read_compass(&mut self) -> Axes;

    /// Board temperature in degrees Celsius.
    fn read_temperature(&mut self) -> i32;

    fn read_light_level(&mut self) -> i32;

    // ########################################
    // Display

    /// Stops any running animation and clears the display.
    fn display_clear(&mut self);

    /// Sets the brightness `level` (0..=255) of the pixel at (`x`, `y`).
    fn display_set_pixel(&mut self, x: u8, y: u8, level: u8);

    fn display_set_mode(&mut self, mode: DisplayMode);

    /// Stops any running animation and scrolls `text` with the given `speed` (ms per step).
    fn display_scroll_text(&mut self, text: &str, speed: u8);

    /// Stops any running animation and scrolls the decimal representation of `number`.
    fn display_scroll_number(&mut self, number: i32, speed: u8);

    fn display_enable(&mut self, enabled: bool);

    // ########################################
    // Touch & clock

    /// Queries the touch state of `pin`. Querying a pin arms touch events for it.
    fn is_touched(&mut self, pin: u8) -> bool;

    /// Monotonic time in milliseconds (allowed to wrap around).
    fn now(&self) -> u32;
}
