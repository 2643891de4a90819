//! Interprets framed commands: core Firmata commands and sysex sub-commands.

use log::trace;

use crate::errors::Error;
use crate::hardware::{Hardware, Pull};
use crate::io::firmata::codec::{decode_7bit_fields, join_low7_high7, split_low7_high7, WireWrite};
use crate::io::firmata::constants::*;
use crate::io::firmata::framer::Frame;
use crate::io::firmata::{Controller, Diagnostic};
use crate::io::{PinModeId, Transport, PIN_COUNT};

impl<H: Hardware, T: Transport> Controller<H, T> {
    /// Executes a frame produced by the framer.
    ///
    /// # Errors
    /// Only transport failures: invalid requests are ignored (see [`Diagnostic`]).
    pub(crate) fn dispatch(&mut self, frame: Frame<'_>) -> Result<(), Error> {
        match frame {
            Frame::Core {
                command,
                arg1,
                arg2,
            } => self.dispatch_core(command, arg1, arg2),
            Frame::Sysex { command, args } => self.dispatch_sysex(command, args),
            Frame::EmptySysex => {
                self.diagnose(Diagnostic::EmptySysex);
                Ok(())
            }
            Frame::Malformed { skipped } => {
                self.diagnose(Diagnostic::MalformedSysex { skipped });
                Ok(())
            }
        }
    }

    fn dispatch_core(&mut self, command: u8, arg1: u8, arg2: u8) -> Result<(), Error> {
        trace!(
            "Received command: [0x{:02X}, 0x{:02X}, 0x{:02X}]",
            command,
            arg1,
            arg2
        );
        let channel = command & 0x0F;
        match command & 0xF0 {
            DIGITAL_MESSAGE => self.set_digital_port(channel, join_low7_high7(arg1, arg2)),
            ANALOG_MESSAGE => self.set_analog_pin(channel, join_low7_high7(arg1, arg2) as u32),
            REPORT_ANALOG => self.stream_analog_channel(channel, arg1 != 0),
            REPORT_DIGITAL => self.stream_digital_port(channel, arg1 != 0),
            _ => match command {
                SET_PIN_MODE => self.set_pin_mode(arg1, arg2),
                SET_DIGITAL_PIN_VALUE => self.set_digital_pin(arg1, arg2 != 0),
                REPORT_VERSION => return self.report_protocol_version(),
                SYSTEM_RESET => self.reset(),
                _ => self.diagnose(Diagnostic::UnknownCommand { command }),
            },
        }
        Ok(())
    }

    fn dispatch_sysex(&mut self, command: u8, args: &[u8]) -> Result<(), Error> {
        trace!("Received sysex: 0x{:02X} {:02X?}", command, args);
        match command {
            MB_DISPLAY_CLEAR => self.display_clear(),
            MB_DISPLAY_SHOW => self.display_show(args),
            MB_DISPLAY_PLOT => self.display_plot(args),
            MB_SCROLL_STRING => self.scroll_string(args),
            MB_SCROLL_INTEGER => self.scroll_number(args),
            MB_SET_TOUCH_MODE => self.set_touch_mode(args),
            MB_DISPLAY_ENABLE => self.enable_display(args),
            ANALOG_MAPPING_QUERY => return self.report_analog_mapping(),
            CAPABILITY_QUERY => return self.report_capabilities(),
            PIN_STATE_QUERY => return self.report_pin_state(args),
            EXTENDED_ANALOG => self.extended_analog_write(args),
            REPORT_FIRMWARE => return self.report_firmware(),
            SAMPLING_INTERVAL => self.set_sampling_interval(args),
            _ => self.diagnose(Diagnostic::UnknownSysex { command }),
        }
        Ok(())
    }

    // ########################################
    // Pin commands

    /// Changes the mode of a pin, if legal for this pin.
    pub(crate) fn set_pin_mode(&mut self, pin: u8, mode: u8) {
        if pin as usize >= PIN_COUNT {
            return self.diagnose(Diagnostic::PinOutOfRange { pin });
        }
        let Some(mode) = PinModeId::from_u8(mode) else {
            return self.diagnose(Diagnostic::UnsupportedMode { pin, mode });
        };
        let layout = &self.config.layout;
        if layout.unavailable_pins.contains(pin) {
            return self.diagnose(Diagnostic::UnavailablePin { pin });
        }
        if mode == PinModeId::ANALOG {
            if layout.light_sensor_pin == Some(pin) {
                self.display.light_sensor = true;
            }
            if !self.config.layout.analog_pins.contains(pin) {
                return self.diagnose(Diagnostic::NotAnalogCapable { pin });
            }
        }
        if self.is_reserved_by_display(pin) {
            return self.diagnose(Diagnostic::ReservedByDisplay { pin });
        }

        self.pins.set_mode(pin, mode);
        match mode {
            PinModeId::OUTPUT => {
                self.record_state(pin, 0);
                self.hardware.set_digital_output(pin, false);
            }
            PinModeId::PWM => {
                self.record_state(pin, 0);
                self.hardware.set_analog_output(pin, 0);
            }
            PinModeId::PULLUP => self.hardware.set_pin_pull(pin, Pull::Up),
            PinModeId::PULLDOWN => self.hardware.set_pin_pull(pin, Pull::Down),
            _ => self.hardware.set_pin_pull(pin, Pull::None),
        }
    }

    /// Drives a digital output pin.
    pub(crate) fn set_digital_pin(&mut self, pin: u8, level: bool) {
        let Some(record) = self.pins.get(pin) else {
            return self.diagnose(Diagnostic::PinOutOfRange { pin });
        };
        if record.mode != PinModeId::OUTPUT {
            let mode = record.mode;
            return self.diagnose(Diagnostic::WrongMode { pin, mode });
        }
        if self.is_reserved_by_display(pin) {
            return self.diagnose(Diagnostic::ReservedByDisplay { pin });
        }
        self.record_state(pin, level as u16);
        self.hardware.set_digital_output(pin, level);
    }

    /// Applies a port mask to the digital output pins of the port; other pins are left untouched.
    pub(crate) fn set_digital_port(&mut self, port: u8, mask: u16) {
        if port >= SAMPLED_PORTS {
            return self.diagnose(Diagnostic::PortOutOfRange { port });
        }
        for bit in 0..8u8 {
            let pin = port * 8 + bit;
            if self.pins.mode(pin) == PinModeId::OUTPUT {
                self.set_digital_pin(pin, mask & (1 << bit) != 0);
            }
        }
    }

    /// Writes a PWM value (clamped to the output range) to a pin in PWM mode.
    pub(crate) fn set_analog_pin(&mut self, pin: u8, value: u32) {
        let Some(record) = self.pins.get(pin) else {
            return self.diagnose(Diagnostic::PinOutOfRange { pin });
        };
        if record.mode != PinModeId::PWM {
            let mode = record.mode;
            return self.diagnose(Diagnostic::WrongMode { pin, mode });
        }
        if self.is_reserved_by_display(pin) {
            return self.diagnose(Diagnostic::ReservedByDisplay { pin });
        }
        let value = value.min(MAX_ANALOG_OUTPUT as u32) as u16;
        self.record_state(pin, value);
        self.hardware.set_analog_output(pin, value);
    }

    /// Analog write with a variable width value: `[pin, 1 to 3 value fields]`.
    fn extended_analog_write(&mut self, args: &[u8]) {
        match args {
            [pin, value @ ..] if (1..=3).contains(&value.len()) => {
                self.set_analog_pin(*pin, decode_7bit_fields(value))
            }
            _ => self.diagnose(Diagnostic::InvalidSysexLength {
                command: EXTENDED_ANALOG,
                length: args.len(),
            }),
        }
    }

    fn record_state(&mut self, pin: u8, state: u16) {
        if let Some(record) = self.pins.get_mut(pin) {
            record.state = state;
        }
    }

    // ########################################
    // Streaming commands

    /// Turns the streaming of an analog channel on or off.
    ///
    /// Enabling a pin-backed channel is refused while its pin is used by the display; otherwise
    /// its pin is released from any pull resistor and primed for analog reads.
    pub(crate) fn stream_analog_channel(&mut self, channel: u8, enabled: bool) {
        self.streams.set_analog(channel, enabled);
        let Some(pin) = self.config.layout.channel_pin(channel) else {
            return;
        };
        if self.is_reserved_by_display(pin) {
            self.streams.set_analog(channel, false);
            if enabled {
                self.diagnose(Diagnostic::StreamRefused { channel });
            }
            return;
        }
        self.hardware.set_pin_pull(pin, Pull::None);
        if enabled {
            self.hardware.read_analog_input(pin);
        }
    }

    pub(crate) fn stream_digital_port(&mut self, port: u8, enabled: bool) {
        if port as usize >= PORT_COUNT {
            return self.diagnose(Diagnostic::PortOutOfRange { port });
        }
        self.streams.set_digital(port, enabled);
    }

    /// Sets the sampling interval: `[lsb, msb]`, raised to the configured floor.
    fn set_sampling_interval(&mut self, args: &[u8]) {
        let Some(&low) = args.first() else {
            return self.diagnose(Diagnostic::InvalidSysexLength {
                command: SAMPLING_INTERVAL,
                length: 0,
            });
        };
        let high = args.get(1).copied().unwrap_or(0);
        let interval = join_low7_high7(low, high);
        self.clock
            .set_interval(interval, self.config.min_sampling_interval);
        trace!("Sampling interval set to {}ms", self.clock.interval());
    }

    // ########################################
    // Reports

    /// Sends the Firmata protocol version: `F9 02 06`.
    pub(crate) fn report_protocol_version(&mut self) -> Result<(), Error> {
        trace!(
            "Report protocol version {}.{}",
            PROTOCOL_MAJOR_VERSION,
            PROTOCOL_MINOR_VERSION
        );
        self.transport.encode_7bit_triple(
            REPORT_VERSION,
            PROTOCOL_MAJOR_VERSION,
            PROTOCOL_MINOR_VERSION,
        )
    }

    /// Sends the firmware version and name: `F0 79 major minor name(doubled) F7`.
    fn report_firmware(&mut self) -> Result<(), Error> {
        let (major, minor) = self.config.firmware_version;
        trace!(
            "Report firmware: {} {}.{}",
            self.config.firmware_name,
            major,
            minor
        );
        self.transport.encode_7bit_pair(START_SYSEX, REPORT_FIRMWARE)?;
        self.transport.encode_7bit_pair(major & 0x7F, minor & 0x7F)?;
        self.transport
            .encode_string_as_doubled_bytes(&self.config.firmware_name)?;
        self.transport.encode_byte(END_SYSEX)
    }

    /// Sends the analog channel numbers: `F0 6A 00 01 .. 0F F7`.
    fn report_analog_mapping(&mut self) -> Result<(), Error> {
        trace!("Report analog mapping");
        self.transport
            .encode_7bit_pair(START_SYSEX, ANALOG_MAPPING_RESPONSE)?;
        for channel in 0..PORT_COUNT as u8 {
            self.transport.encode_byte(channel)?;
        }
        self.transport.encode_byte(END_SYSEX)
    }

    /// Sends the (mode, resolution) pairs supported by each pin, pins separated by `0x7F`.
    ///
    /// Analog input is advertised on the layout's analog pins (0-4 and 10 by default, the
    /// micro:bit v1 table). The micro:bit v2 firmware advertises it on pins 0-5 and 11
    /// instead: hosts comparing against that firmware see a different byte stream for
    /// pins 5, 10 and 11.
    fn report_capabilities(&mut self) -> Result<(), Error> {
        trace!("Report capabilities");
        self.transport
            .encode_7bit_pair(START_SYSEX, CAPABILITY_RESPONSE)?;
        for pin in 0..PIN_COUNT as u8 {
            let layout = &self.config.layout;
            if !layout.unavailable_pins.contains(pin) {
                let analog = layout.analog_pins.contains(pin);
                self.transport.encode_7bit_pair(PinModeId::INPUT.into(), 1)?;
                self.transport.encode_7bit_pair(PinModeId::OUTPUT.into(), 1)?;
                if analog {
                    self.transport
                        .encode_7bit_pair(PinModeId::ANALOG.into(), ANALOG_RESOLUTION)?;
                }
                self.transport
                    .encode_7bit_pair(PinModeId::PWM.into(), ANALOG_RESOLUTION)?;
                self.transport.encode_7bit_pair(PinModeId::PULLUP.into(), 1)?;
            }
            if (pin as usize) < PIN_COUNT - 1 {
                self.transport.encode_byte(CAPABILITY_PIN_SEPARATOR)?;
            }
        }
        self.transport.encode_byte(END_SYSEX)
    }

    /// Sends the mode and state of a pin: `F0 6E pin mode state_lsb state_msb F7`.
    fn report_pin_state(&mut self, args: &[u8]) -> Result<(), Error> {
        let Some(&pin) = args.first() else {
            self.diagnose(Diagnostic::InvalidSysexLength {
                command: PIN_STATE_QUERY,
                length: 0,
            });
            return Ok(());
        };
        let Some(record) = self.pins.get(pin).copied() else {
            self.diagnose(Diagnostic::PinOutOfRange { pin });
            return Ok(());
        };
        trace!("Report pin {} state: {:?}", pin, record);
        let (low, high) = split_low7_high7(record.state as i32);
        self.transport
            .encode_7bit_pair(START_SYSEX, PIN_STATE_RESPONSE)?;
        self.transport.encode_7bit_pair(pin, record.mode.into())?;
        self.transport.encode_7bit_pair(low, high)?;
        self.transport.encode_byte(END_SYSEX)
    }
}
