use std::fmt::{Debug, Formatter};
use std::ops::Range;

use crate::errors::{ConfigError, Error};
use crate::io::PIN_COUNT;

/// Number of logical analog channels addressable on the wire.
pub const CHANNEL_COUNT: usize = 16;

/// A set of pin indices (`0..PIN_COUNT`) stored as a bitmask.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PinSet(u32);

impl PinSet {
    pub const EMPTY: PinSet = PinSet(0);

    /// Builds a set from a list of pins. Pins out of the `u32` range are ignored.
    pub const fn from_pins(pins: &[u8]) -> Self {
        let mut mask = 0u32;
        let mut i = 0;
        while i < pins.len() {
            if pins[i] < 32 {
                mask |= 1 << pins[i];
            }
            i += 1;
        }
        Self(mask)
    }

    /// Builds a set covering a contiguous range of pins.
    pub const fn from_range(range: Range<u8>) -> Self {
        let mut mask = 0u32;
        let mut pin = range.start;
        while pin < range.end && pin < 32 {
            mask |= 1 << pin;
            pin += 1;
        }
        Self(mask)
    }

    pub const fn contains(&self, pin: u8) -> bool {
        pin < 32 && self.0 & (1 << pin) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..32u8).filter(|&pin| self.contains(pin))
    }

    /// Highest pin of the set, if any.
    fn max(&self) -> Option<u8> {
        match self.0 {
            0 => None,
            mask => Some(31 - mask.leading_zeros() as u8),
        }
    }
}

impl Debug for PinSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// What a logical analog channel samples.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelSource {
    /// Unmapped channel: always reads 0.
    #[default]
    Unmapped,
    /// Analog input of a physical pin (requires the pin in analog-input mode).
    Pin(u8),
    AccelerometerX,
    AccelerometerY,
    AccelerometerZ,
    /// Light level, measured through the display matrix.
    LightLevel,
    Temperature,
    CompassX,
    CompassY,
    CompassZ,
}

/// Board-specific pin legality and channel mapping.
///
/// The default layout describes the BBC micro:bit (v1):
/// - pins 0-4 and 10 are analog capable (channels 0-4 and 5 respectively),
/// - pins 17 and 18 are the 3.3V rail and cannot be used,
/// - the LED matrix reserves pins 3 and above while the display is enabled,
/// - pins 0-2 support touch sensing,
/// - asking for analog-input mode on pin 11 turns the light sensor on,
/// - channels 8-15 map to the accelerometer, light sensor, thermometer and compass.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardLayout {
    /// Pins accepting the analog-input mode.
    pub analog_pins: PinSet,
    /// Pins physically absent: they report no capability and refuse any mode.
    pub unavailable_pins: PinSet,
    /// Pins used by the display while it is enabled.
    pub display_pins: PinSet,
    /// Pins supporting touch sensing.
    pub touch_pins: PinSet,
    /// Requesting analog-input mode on this pin enables the light sensor.
    pub light_sensor_pin: Option<u8>,
    /// Source of each logical analog channel.
    pub channels: [ChannelSource; CHANNEL_COUNT],
    /// Right shift applied to raw compass readings to fit the 14-bit wire range.
    pub compass_shift: u8,
}

impl Default for BoardLayout {
    fn default() -> Self {
        use ChannelSource::*;
        Self {
            analog_pins: PinSet::from_pins(&[0, 1, 2, 3, 4, 10]),
            unavailable_pins: PinSet::from_pins(&[17, 18]),
            display_pins: PinSet::from_range(3..PIN_COUNT as u8),
            touch_pins: PinSet::from_pins(&[0, 1, 2]),
            light_sensor_pin: Some(11),
            channels: [
                Pin(0),
                Pin(1),
                Pin(2),
                Pin(3),
                Pin(4),
                Pin(10),
                Unmapped,
                Unmapped,
                AccelerometerX,
                AccelerometerY,
                AccelerometerZ,
                LightLevel,
                Temperature,
                CompassX,
                CompassY,
                CompassZ,
            ],
            compass_shift: 5,
        }
    }
}

impl BoardLayout {
    /// Returns the pin backing the given `channel`, if the channel is pin-backed.
    pub fn channel_pin(&self, channel: u8) -> Option<u8> {
        match self.channels.get(channel as usize) {
            Some(ChannelSource::Pin(pin)) => Some(*pin),
            _ => None,
        }
    }

    /// Checks that every pin referenced by the layout exists.
    pub fn validate(&self) -> Result<(), Error> {
        let sets = [
            (self.analog_pins, "analog pins"),
            (self.unavailable_pins, "unavailable pins"),
            (self.display_pins, "display pins"),
            (self.touch_pins, "touch pins"),
        ];
        for (set, context) in sets {
            if let Some(pin) = set.max().filter(|&pin| pin as usize >= PIN_COUNT) {
                return Err(ConfigError::InvalidPin { pin, context }.into());
            }
        }
        if let Some(pin) = self.light_sensor_pin.filter(|&pin| pin as usize >= PIN_COUNT) {
            return Err(ConfigError::InvalidPin {
                pin,
                context: "light sensor pin",
            }
            .into());
        }
        for (channel, source) in self.channels.iter().enumerate() {
            if let ChannelSource::Pin(pin) = source {
                if *pin as usize >= PIN_COUNT || self.unavailable_pins.contains(*pin) {
                    return Err(ConfigError::InvalidChannel {
                        channel: channel as u8,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
