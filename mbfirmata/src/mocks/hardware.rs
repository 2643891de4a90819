use std::sync::Arc;

use parking_lot::RwLock;

use crate::hardware::{Axes, DisplayMode, Hardware, Pull};
use crate::io::PIN_COUNT;

/// A call received by [`MockHardware`], in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HardwareCall {
    SetDigitalOutput(u8, bool),
    ReadDigitalInput(u8),
    SetPinPull(u8, Pull),
    SetAnalogOutput(u8, u16),
    ReadAnalogInput(u8),
    ReadAccelerometer,
    ReadCompass,
    ReadTemperature,
    ReadLightLevel,
    DisplayClear,
    DisplaySetPixel(u8, u8, u8),
    DisplaySetMode(DisplayMode),
    DisplayScrollText(String, u8),
    DisplayScrollNumber(i32, u8),
    DisplayEnable(bool),
    IsTouched(u8),
}

#[derive(Debug)]
struct MockHardwareData {
    calls: Vec<HardwareCall>,
    digital_inputs: [bool; PIN_COUNT],
    analog_inputs: [u16; PIN_COUNT],
    accelerometer: Axes,
    compass: Axes,
    temperature: i32,
    light_level: i32,
    touched: [bool; PIN_COUNT],
    now: u32,
}

impl Default for MockHardwareData {
    fn default() -> Self {
        Self {
            calls: vec![],
            digital_inputs: [false; PIN_COUNT],
            analog_inputs: [0; PIN_COUNT],
            accelerometer: Axes::default(),
            compass: Axes::default(),
            temperature: 0,
            light_level: 0,
            touched: [false; PIN_COUNT],
            now: 0,
        }
    }
}

/// Scriptable fake board recording every call it receives.
///
/// Clones share the same state: keep one in the test and give another to the engine.
#[derive(Clone, Debug, Default)]
pub struct MockHardware {
    data: Arc<RwLock<MockHardwareData>>,
}

impl MockHardware {
    /// Every call received so far.
    pub fn calls(&self) -> Vec<HardwareCall> {
        self.data.read().calls.clone()
    }

    /// Every call received so far, clearing the record.
    pub fn take_calls(&self) -> Vec<HardwareCall> {
        std::mem::take(&mut self.data.write().calls)
    }

    /// Calls that changed the board (reads are filtered out).
    pub fn writes(&self) -> Vec<HardwareCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    HardwareCall::ReadDigitalInput(_)
                        | HardwareCall::ReadAnalogInput(_)
                        | HardwareCall::ReadAccelerometer
                        | HardwareCall::ReadCompass
                        | HardwareCall::ReadTemperature
                        | HardwareCall::ReadLightLevel
                        | HardwareCall::IsTouched(_)
                )
            })
            .collect()
    }

    pub fn set_digital_input(&self, pin: u8, level: bool) {
        self.data.write().digital_inputs[pin as usize] = level;
    }

    pub fn set_analog_input(&self, pin: u8, value: u16) {
        self.data.write().analog_inputs[pin as usize] = value;
    }

    pub fn set_accelerometer<A: Into<Axes>>(&self, axes: A) {
        self.data.write().accelerometer = axes.into();
    }

    pub fn set_compass<A: Into<Axes>>(&self, axes: A) {
        self.data.write().compass = axes.into();
    }

    pub fn set_temperature(&self, temperature: i32) {
        self.data.write().temperature = temperature;
    }

    pub fn set_light_level(&self, level: i32) {
        self.data.write().light_level = level;
    }

    pub fn set_touched(&self, pin: u8, touched: bool) {
        self.data.write().touched[pin as usize] = touched;
    }

    /// Sets the clock to `now` milliseconds.
    pub fn set_time(&self, now: u32) {
        self.data.write().now = now;
    }

    /// Moves the clock forward by `ms` milliseconds (wrapping around).
    pub fn advance_time(&self, ms: u32) {
        let mut data = self.data.write();
        data.now = data.now.wrapping_add(ms);
    }

    fn record(&self, call: HardwareCall) {
        self.data.write().calls.push(call);
    }
}

impl Hardware for MockHardware {
    fn set_digital_output(&mut self, pin: u8, level: bool) {
        self.record(HardwareCall::SetDigitalOutput(pin, level));
    }

    fn read_digital_input(&mut self, pin: u8) -> bool {
        self.record(HardwareCall::ReadDigitalInput(pin));
        self.data.read().digital_inputs[pin as usize]
    }

    fn set_pin_pull(&mut self, pin: u8, pull: Pull) {
        self.record(HardwareCall::SetPinPull(pin, pull));
    }

    fn set_analog_output(&mut self, pin: u8, value: u16) {
        self.record(HardwareCall::SetAnalogOutput(pin, value));
    }

    fn read_analog_input(&mut self, pin: u8) -> u16 {
        self.record(HardwareCall::ReadAnalogInput(pin));
        self.data.read().analog_inputs[pin as usize]
    }

    fn read_accelerometer(&mut self) -> Axes {
        self.record(HardwareCall::ReadAccelerometer);
        self.data.read().accelerometer
    }

    fn read_compass(&mut self) -> Axes {
        self.record(HardwareCall::ReadCompass);
        self.data.read().compass
    }

    fn read_temperature(&mut self) -> i32 {
        self.record(HardwareCall::ReadTemperature);
        self.data.read().temperature
    }

    fn read_light_level(&mut self) -> i32 {
        self.record(HardwareCall::ReadLightLevel);
        self.data.read().light_level
    }

    fn display_clear(&mut self) {
        self.record(HardwareCall::DisplayClear);
    }

    fn display_set_pixel(&mut self, x: u8, y: u8, level: u8) {
        self.record(HardwareCall::DisplaySetPixel(x, y, level));
    }

    fn display_set_mode(&mut self, mode: DisplayMode) {
        self.record(HardwareCall::DisplaySetMode(mode));
    }

    fn display_scroll_text(&mut self, text: &str, speed: u8) {
        self.record(HardwareCall::DisplayScrollText(text.to_string(), speed));
    }

    fn display_scroll_number(&mut self, number: i32, speed: u8) {
        self.record(HardwareCall::DisplayScrollNumber(number, speed));
    }

    fn display_enable(&mut self, enabled: bool) {
        self.record(HardwareCall::DisplayEnable(enabled));
    }

    fn is_touched(&mut self, pin: u8) -> bool {
        self.record(HardwareCall::IsTouched(pin));
        self.data.read().touched[pin as usize]
    }

    fn now(&self) -> u32 {
        self.data.read().now
    }
}
