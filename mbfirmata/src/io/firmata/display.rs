//! micro:bit display, touch and light sensor commands.

use std::fmt::Write;

use heapless::String;
use log::trace;

use crate::hardware::{DisplayMode, Hardware, Pull};
use crate::io::firmata::codec::{decode_7bit_fields, decode_doubled_bytes};
use crate::io::firmata::constants::{
    MAX_SCROLL_TEXT, MB_DISPLAY_ENABLE, MB_DISPLAY_PLOT, MB_DISPLAY_SHOW, MB_SCROLL_INTEGER,
    MB_SCROLL_STRING, MB_SET_TOUCH_MODE,
};
use crate::io::firmata::{Controller, Diagnostic};
use crate::io::Transport;

/// Number of pixels of the 5x5 display.
const PIXEL_COUNT: usize = 25;

/// State of the display sub-path.
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// The display is on (it is at startup) and reserves its pins.
    pub enabled: bool,
    /// Light sensing through the display matrix is on.
    pub light_sensor: bool,
    /// Last scrolled text (or number).
    pub scroll_text: String<MAX_SCROLL_TEXT>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            enabled: true,
            light_sensor: false,
            scroll_text: String::new(),
        }
    }
}

/// Converts a 7-bit brightness level to the 8-bit display range.
fn to_8bit_level(level: u8) -> u8 {
    match level & 0x7F {
        127 => 255,
        level => level * 2,
    }
}

impl<H: Hardware, T: Transport> Controller<H, T> {
    /// Checks if `pin` is currently used by the display.
    pub(crate) fn is_reserved_by_display(&self, pin: u8) -> bool {
        self.display.enabled && self.config.layout.display_pins.contains(pin)
    }

    pub(crate) fn display_clear(&mut self) {
        self.hardware.display_clear();
    }

    /// Shows a full image: `[greyscale, level * 25]`, row by row.
    pub(crate) fn display_show(&mut self, args: &[u8]) {
        if args.len() < PIXEL_COUNT + 1 {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_DISPLAY_SHOW,
                length: args.len(),
            });
        }
        let mode = match args[0] {
            0 => DisplayMode::BlackAndWhite,
            _ => DisplayMode::Greyscale,
        };
        self.hardware.display_set_mode(mode);
        for (index, level) in args[1..=PIXEL_COUNT].iter().enumerate() {
            let (x, y) = ((index % 5) as u8, (index / 5) as u8);
            self.hardware.display_set_pixel(x, y, to_8bit_level(*level));
        }
    }

    /// Sets a single pixel: `[x, y, level]`. Intermediate levels switch to greyscale.
    pub(crate) fn display_plot(&mut self, args: &[u8]) {
        let [x, y, level, ..] = *args else {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_DISPLAY_PLOT,
                length: args.len(),
            });
        };
        let level = to_8bit_level(level);
        if level > 0 && level < 255 {
            self.hardware.display_set_mode(DisplayMode::Greyscale);
        }
        self.hardware.display_set_pixel(x, y, level);
    }

    /// Scrolls a string: `[speed, utf8 bytes doubled...]`.
    ///
    /// The text is truncated to [`MAX_SCROLL_TEXT`] bytes, then to its longest valid UTF-8
    /// prefix.
    pub(crate) fn scroll_string(&mut self, args: &[u8]) {
        let Some((&speed, payload)) = args.split_first() else {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_SCROLL_STRING,
                length: 0,
            });
        };
        let mut bytes = heapless::Vec::<u8, MAX_SCROLL_TEXT>::new();
        for byte in decode_doubled_bytes(payload).take(MAX_SCROLL_TEXT) {
            let _ = bytes.push(byte);
        }
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(error) => std::str::from_utf8(&bytes[..error.valid_up_to()]).unwrap_or_default(),
        };
        self.display.scroll_text.clear();
        let _ = self.display.scroll_text.push_str(text);
        trace!("Scroll text: {:?}", self.display.scroll_text);
        self.hardware
            .display_scroll_text(&self.display.scroll_text, speed);
    }

    /// Scrolls a number: `[speed, up to five 7-bit fields]` assembled into a signed 32-bit.
    pub(crate) fn scroll_number(&mut self, args: &[u8]) {
        if args.len() < 2 {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_SCROLL_INTEGER,
                length: args.len(),
            });
        }
        let speed = args[0];
        let number = decode_7bit_fields(&args[1..]) as i32;
        self.display.scroll_text.clear();
        let _ = write!(self.display.scroll_text, "{}", number);
        trace!("Scroll number: {}", number);
        self.hardware.display_scroll_number(number, speed);
    }

    /// Arms touch sensing on a pin: `[pin, on]`.
    ///
    /// Touch events cannot be disarmed once armed: turning the mode off is a no-op.
    pub(crate) fn set_touch_mode(&mut self, args: &[u8]) {
        let [pin, on, ..] = *args else {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_SET_TOUCH_MODE,
                length: args.len(),
            });
        };
        if !self.config.layout.touch_pins.contains(pin) {
            return self.diagnose(Diagnostic::NotTouchCapable { pin });
        }
        if on != 0 {
            self.hardware.is_touched(pin);
        }
    }

    /// Turns the display on or off: `[enabled]`.
    pub(crate) fn enable_display(&mut self, args: &[u8]) {
        match args.first() {
            Some(enabled) => self.set_display_enabled(*enabled != 0),
            None => self.diagnose(Diagnostic::InvalidSysexLength {
                command: MB_DISPLAY_ENABLE,
                length: 0,
            }),
        }
    }

    /// Turns the display off, then back on if `enabled`.
    ///
    /// Any change turns the light sensor off (requesting analog input on the light sensor
    /// pin turns it on again) and stops the streaming of channels backed by display pins.
    pub(crate) fn set_display_enabled(&mut self, enabled: bool) {
        self.hardware.display_clear();
        self.hardware.display_enable(false);
        self.hardware.display_set_mode(DisplayMode::BlackAndWhite);
        self.display.light_sensor = false;
        self.display.enabled = enabled;
        if enabled {
            self.hardware.display_enable(true);
        }

        for channel in 0..self.config.layout.channels.len() as u8 {
            let Some(pin) = self.config.layout.channel_pin(channel) else {
                continue;
            };
            if self.config.layout.display_pins.contains(pin)
                && self.streams.is_analog_enabled(channel)
            {
                self.streams.set_analog(channel, false);
                self.hardware.set_pin_pull(pin, Pull::None);
                self.diagnose(Diagnostic::StreamRefused { channel });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_8bit_level() {
        assert_eq!(to_8bit_level(0), 0);
        assert_eq!(to_8bit_level(1), 2);
        assert_eq!(to_8bit_level(64), 128);
        assert_eq!(to_8bit_level(126), 252);
        assert_eq!(to_8bit_level(127), 255);
    }

    #[test]
    fn test_default_display_state() {
        let state = DisplayState::default();
        assert!(state.enabled);
        assert!(!state.light_sensor);
        assert!(state.scroll_text.is_empty());
    }
}
