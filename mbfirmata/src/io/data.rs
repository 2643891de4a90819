use std::fmt::{Debug, Display, Formatter};

/// Number of pins tracked by the engine (`0..PIN_COUNT`).
pub const PIN_COUNT: usize = 21;

/// Sentinel state of a pin that has never been sampled or written since its mode changed.
/// It lies outside the 14-bit wire range, so the first real observation always differs.
pub const UNKNOWN_PIN_STATE: u16 = 55555;

/// Enumerates the pin modes known by the engine, with their Firmata wire value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[repr(u8)]
pub enum PinModeId {
    /// Digital input, no pull resistor.
    INPUT = 0x00,
    /// Digital output.
    OUTPUT = 0x01,
    /// Analog input (only on analog capable pins).
    ANALOG = 0x02,
    /// PWM output.
    PWM = 0x03,
    /// Digital input with internal pull-up resistor.
    PULLUP = 0x0B,
    /// Digital input with internal pull-down resistor (micro:bit extension of Firmata).
    PULLDOWN = 0x0F,
    /// Mode not set since the last reset.
    #[default]
    UNKNOWN = 0x0E,
}

impl PinModeId {
    /// Converts a wire byte into one of the six requestable modes.
    ///
    /// # Returns
    /// `None` when the value does not match a mode a host may request: this includes
    /// the `UNKNOWN` marker itself.
    pub fn from_u8(value: u8) -> Option<PinModeId> {
        match value {
            0x00 => Some(PinModeId::INPUT),
            0x01 => Some(PinModeId::OUTPUT),
            0x02 => Some(PinModeId::ANALOG),
            0x03 => Some(PinModeId::PWM),
            0x0B => Some(PinModeId::PULLUP),
            0x0F => Some(PinModeId::PULLDOWN),
            _ => None,
        }
    }

    /// Checks if the mode reads a digital level (the modes sampled by digital streaming).
    pub fn is_digital_input(&self) -> bool {
        matches!(
            self,
            PinModeId::INPUT | PinModeId::PULLUP | PinModeId::PULLDOWN
        )
    }
}

impl From<PinModeId> for u8 {
    fn from(mode: PinModeId) -> u8 {
        mode as u8
    }
}

impl Display for PinModeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ########################################

/// Represents the current mode and last known state of a pin.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    /// Currently configured mode.
    pub mode: PinModeId,
    /// Last written or sampled value (0..=16383) or [`UNKNOWN_PIN_STATE`].
    pub state: u16,
}

impl Default for Pin {
    fn default() -> Self {
        Self {
            mode: PinModeId::UNKNOWN,
            state: UNKNOWN_PIN_STATE,
        }
    }
}

impl Pin {
    /// Checks if the state has been observed since the last mode change.
    pub fn is_known(&self) -> bool {
        self.state != UNKNOWN_PIN_STATE
    }
}

impl Debug for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("Pin");
        debug_struct.field("mode", &self.mode.to_string());
        match self.is_known() {
            true => debug_struct.field("state", &self.state),
            false => debug_struct.field("state", &"UNKNOWN"),
        };
        debug_struct.finish()
    }
}

/// Fixed-size table of all pins of the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PinTable {
    pins: [Pin; PIN_COUNT],
}

impl PinTable {
    /// Retrieves a pin by its index, `None` if the index is out of bounds.
    pub fn get(&self, pin: u8) -> Option<&Pin> {
        self.pins.get(pin as usize)
    }

    /// Retrieves a mutable pin by its index, `None` if the index is out of bounds.
    pub fn get_mut(&mut self, pin: u8) -> Option<&mut Pin> {
        self.pins.get_mut(pin as usize)
    }

    /// Changes the mode of a pin: its state becomes unknown.
    pub fn set_mode(&mut self, pin: u8, mode: PinModeId) -> Option<&mut Pin> {
        let record = self.get_mut(pin)?;
        record.mode = mode;
        record.state = UNKNOWN_PIN_STATE;
        Some(record)
    }

    /// Current mode of a pin, `UNKNOWN` for out of bounds pins.
    pub fn mode(&self, pin: u8) -> PinModeId {
        self.get(pin).map(|record| record.mode).unwrap_or_default()
    }

    /// Puts every pin back to unknown mode and state.
    pub fn reset(&mut self) {
        self.pins = [Pin::default(); PIN_COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_mode_id_conversions() {
        assert_eq!(PinModeId::from_u8(0), Some(PinModeId::INPUT));
        assert_eq!(PinModeId::from_u8(1), Some(PinModeId::OUTPUT));
        assert_eq!(PinModeId::from_u8(2), Some(PinModeId::ANALOG));
        assert_eq!(PinModeId::from_u8(3), Some(PinModeId::PWM));
        assert_eq!(PinModeId::from_u8(0x0B), Some(PinModeId::PULLUP));
        assert_eq!(PinModeId::from_u8(0x0F), Some(PinModeId::PULLDOWN));

        // Servo, unknown marker and garbage are not requestable.
        assert_eq!(PinModeId::from_u8(4), None);
        assert_eq!(PinModeId::from_u8(0x0E), None);
        assert_eq!(PinModeId::from_u8(100), None);

        assert_eq!(u8::from(PinModeId::PULLDOWN), 0x0F);
        assert_eq!(u8::from(PinModeId::UNKNOWN), 0x0E);
    }

    #[test]
    fn test_pin_mode_id_display() {
        assert_eq!(format!("{}", PinModeId::PWM), "PWM");
        assert!(PinModeId::PULLUP.is_digital_input());
        assert!(!PinModeId::OUTPUT.is_digital_input());
        assert!(!PinModeId::ANALOG.is_digital_input());
    }

    #[test]
    fn test_pin_debug() {
        let mut pin = Pin::default();
        assert_eq!(
            format!("{:?}", pin),
            "Pin { mode: \"UNKNOWN\", state: \"UNKNOWN\" }"
        );
        pin.mode = PinModeId::OUTPUT;
        pin.state = 1;
        assert_eq!(format!("{:?}", pin), "Pin { mode: \"OUTPUT\", state: 1 }");
    }

    #[test]
    fn test_pin_table() {
        let mut table = PinTable::default();
        assert!(table.iter().all(|pin| *pin == Pin::default()));
        assert!(table.get(21).is_none());
        assert!(table.set_mode(42, PinModeId::OUTPUT).is_none());

        table.get_mut(3).unwrap().state = 12;
        table.set_mode(3, PinModeId::OUTPUT);
        assert_eq!(table.mode(3), PinModeId::OUTPUT);
        assert!(!table.get(3).unwrap().is_known(), "mode change forgets the state");

        table.reset();
        assert_eq!(table.mode(3), PinModeId::UNKNOWN);
        assert_eq!(table.mode(66), PinModeId::UNKNOWN);
    }
}
