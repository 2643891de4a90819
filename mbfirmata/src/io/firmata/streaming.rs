//! Periodic reporting of digital ports and analog channels.

use log::trace;

use crate::errors::Error;
use crate::hardware::{ChannelSource, Hardware, CHANNEL_COUNT};
use crate::io::firmata::codec::{split_low7_high7, WireWrite};
use crate::io::firmata::constants::{ANALOG_MESSAGE, DIGITAL_MESSAGE, PORT_COUNT, SAMPLED_PORTS};
use crate::io::firmata::Controller;
use crate::io::{PinModeId, Transport, PIN_COUNT};

/// Streaming enable flags, per analog channel and per digital port.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamFlags {
    analog: [bool; CHANNEL_COUNT],
    digital: [bool; PORT_COUNT],
}

impl StreamFlags {
    pub fn is_analog_enabled(&self, channel: u8) -> bool {
        self.analog.get(channel as usize).copied().unwrap_or(false)
    }

    pub fn is_digital_enabled(&self, port: u8) -> bool {
        self.digital.get(port as usize).copied().unwrap_or(false)
    }

    pub fn set_analog(&mut self, channel: u8, enabled: bool) {
        if let Some(flag) = self.analog.get_mut(channel as usize) {
            *flag = enabled;
        }
    }

    pub fn set_digital(&mut self, port: u8, enabled: bool) {
        if let Some(flag) = self.digital.get_mut(port as usize) {
            *flag = enabled;
        }
    }

    /// Checks if any flag is set.
    pub fn any(&self) -> bool {
        self.analog.iter().chain(self.digital.iter()).any(|flag| *flag)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Global sampling rate of the analog channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingClock {
    /// Minimal time (ms) between two sampling passes.
    interval: u16,
    /// Time (ms) of the last sampling pass.
    last_sample: u32,
}

impl SamplingClock {
    pub fn new(interval: u16, now: u32) -> Self {
        Self {
            interval,
            last_sample: now,
        }
    }

    pub fn interval(&self) -> u16 {
        self.interval
    }

    pub fn last_sample(&self) -> u32 {
        self.last_sample
    }

    /// Sets the interval, raised to `floor` if lower.
    pub fn set_interval(&mut self, interval: u16, floor: u16) {
        self.interval = interval.max(floor);
    }

    /// Checks if a sampling pass is due at `now`.
    ///
    /// Elapsed time is computed on wrapping arithmetic and read as signed: a negative
    /// elapsed time (clock jump or overflow) is not due yet.
    pub fn is_due(&self, now: u32) -> bool {
        let elapsed = now.wrapping_sub(self.last_sample) as i32;
        elapsed >= self.interval as i32
    }

    pub fn advance(&mut self, now: u32) {
        self.last_sample = now;
    }
}

impl<H: Hardware, T: Transport> Controller<H, T> {
    /// Reports the enabled digital ports whose input pins changed since the last report.
    ///
    /// Change is detected pin by pin against the recorded pin states, not against the
    /// previous port mask.
    pub(crate) fn stream_digital_ports(&mut self) -> Result<(), Error> {
        for port in 0..SAMPLED_PORTS {
            if !self.streams.is_digital_enabled(port) {
                continue;
            }
            let mut changed = false;
            let mut mask = 0i32;
            for bit in 0..8u8 {
                let pin = port * 8 + bit;
                if pin as usize >= PIN_COUNT || !self.pins.mode(pin).is_digital_input() {
                    continue;
                }
                let level = self.hardware.read_digital_input(pin) as u16;
                if let Some(record) = self.pins.get_mut(pin) {
                    changed |= record.state != level;
                    record.state = level;
                }
                mask |= (level as i32) << bit;
            }
            if changed {
                let (low, high) = split_low7_high7(mask);
                trace!("Report digital port {}: {:#04X}", port, mask);
                self.transport
                    .encode_7bit_triple(DIGITAL_MESSAGE | port, low, high)?;
            }
        }
        Ok(())
    }

    /// Reports every enabled analog channel if the sampling interval elapsed.
    pub(crate) fn stream_analog_channels(&mut self) -> Result<(), Error> {
        let now = self.hardware.now();
        if !self.clock.is_due(now) {
            return Ok(());
        }
        for channel in 0..CHANNEL_COUNT as u8 {
            if !self.streams.is_analog_enabled(channel) {
                continue;
            }
            if let Some(value) = self.channel_value(channel) {
                let (low, high) = split_low7_high7(value);
                trace!("Report analog channel {}: {}", channel, value);
                self.transport
                    .encode_7bit_triple(ANALOG_MESSAGE | channel, low, high)?;
            }
        }
        self.clock.advance(now);
        Ok(())
    }

    /// Reads the current value of a channel.
    ///
    /// # Returns
    /// `None` for a pin-backed channel whose pin is not readable: not in analog-input
    /// mode or used by the display.
    pub(crate) fn channel_value(&mut self, channel: u8) -> Option<i32> {
        let shift = self.config.layout.compass_shift;
        let source = self
            .config
            .layout
            .channels
            .get(channel as usize)
            .copied()
            .unwrap_or_default();
        let value = match source {
            ChannelSource::Unmapped => 0,
            ChannelSource::Pin(pin) => {
                if self.is_reserved_by_display(pin) || self.pins.mode(pin) != PinModeId::ANALOG {
                    return None;
                }
                self.hardware.read_analog_input(pin) as i32
            }
            ChannelSource::AccelerometerX => self.hardware.read_accelerometer().x,
            ChannelSource::AccelerometerY => self.hardware.read_accelerometer().y,
            ChannelSource::AccelerometerZ => self.hardware.read_accelerometer().z,
            ChannelSource::LightLevel => match self.display.enabled && self.display.light_sensor {
                true => self.hardware.read_light_level(),
                false => 0,
            },
            ChannelSource::Temperature => self.hardware.read_temperature(),
            ChannelSource::CompassX => self.hardware.read_compass().x >> shift,
            ChannelSource::CompassY => self.hardware.read_compass().y >> shift,
            ChannelSource::CompassZ => self.hardware.read_compass().z >> shift,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_flags() {
        let mut flags = StreamFlags::default();
        assert!(!flags.any());
        flags.set_analog(8, true);
        flags.set_digital(2, true);
        flags.set_analog(16, true);
        flags.set_digital(99, true);
        assert!(flags.is_analog_enabled(8));
        assert!(flags.is_digital_enabled(2));
        assert!(!flags.is_analog_enabled(16));
        assert!(!flags.is_digital_enabled(99));
        assert!(flags.any());
        flags.reset();
        assert!(!flags.any());
    }

    #[test]
    fn test_sampling_clock() {
        let mut clock = SamplingClock::new(100, 1000);
        assert!(!clock.is_due(1000));
        assert!(!clock.is_due(1099));
        assert!(clock.is_due(1100));
        assert!(clock.is_due(5000));

        // Clock going backward: not due.
        assert!(!clock.is_due(500));

        clock.advance(1100);
        assert_eq!(clock.last_sample(), 1100);
        assert!(!clock.is_due(1150));

        clock.set_interval(0, 1);
        assert_eq!(clock.interval(), 1);
        clock.set_interval(250, 1);
        assert_eq!(clock.interval(), 250);
    }

    #[test]
    fn test_sampling_clock_wraparound() {
        let mut clock = SamplingClock::new(100, u32::MAX - 49);
        // 50ms elapsed across the overflow.
        assert!(!clock.is_due(0));
        // 100ms elapsed across the overflow.
        assert!(clock.is_due(50));
        clock.advance(50);
        assert!(!clock.is_due(149));
        assert!(clock.is_due(150));
    }
}
