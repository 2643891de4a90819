//! Engine configuration: board layout, firmware identity and sampling bounds.

use crate::errors::{ConfigError, Error};
use crate::hardware::BoardLayout;
use crate::io::firmata::constants::{
    DEFAULT_SAMPLING_INTERVAL, FIRMWARE_NAME, FIRMWARE_VERSION, MIN_SAMPLING_INTERVAL,
};

/// Configuration of an [`Engine`](crate::io::Engine).
///
/// # Example
/// ```
/// use mbfirmata::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_firmware_name("my board")
///     .with_sampling_interval(20);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pin legality and channel mapping of the board.
    pub layout: BoardLayout,
    /// Name sent in the firmware report.
    pub firmware_name: String,
    /// (major, minor) version sent in the firmware report.
    pub firmware_version: (u8, u8),
    /// Sampling interval (ms) applied at startup and after each reset.
    pub default_sampling_interval: u16,
    /// Lowest sampling interval (ms) a host may request.
    pub min_sampling_interval: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: BoardLayout::default(),
            firmware_name: String::from(FIRMWARE_NAME),
            firmware_version: FIRMWARE_VERSION,
            default_sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            min_sampling_interval: MIN_SAMPLING_INTERVAL,
        }
    }
}

impl EngineConfig {
    pub fn with_layout(mut self, layout: BoardLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_firmware_name<S: Into<String>>(mut self, name: S) -> Self {
        self.firmware_name = name.into();
        self
    }

    pub fn with_firmware_version(mut self, major: u8, minor: u8) -> Self {
        self.firmware_version = (major, minor);
        self
    }

    pub fn with_sampling_interval(mut self, interval: u16) -> Self {
        self.default_sampling_interval = interval;
        self
    }

    pub fn with_min_sampling_interval(mut self, interval: u16) -> Self {
        self.min_sampling_interval = interval;
        self
    }

    /// Checks the configuration is consistent.
    ///
    /// # Errors
    /// * `InvalidPin`/`InvalidChannel`: the layout references pins the board does not have.
    /// * `InvalidSamplingInterval`: the floor is zero or above the default interval.
    pub fn validate(&self) -> Result<(), Error> {
        self.layout.validate()?;
        if self.min_sampling_interval == 0 {
            return Err(ConfigError::InvalidSamplingInterval {
                min: 1,
                found: self.min_sampling_interval,
            }
            .into());
        }
        if self.default_sampling_interval < self.min_sampling_interval {
            return Err(ConfigError::InvalidSamplingInterval {
                min: self.min_sampling_interval,
                found: self.default_sampling_interval,
            }
            .into());
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields take their default value.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|error| ConfigError::Parse {
                info: error.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::hardware::PinSet;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.firmware_name, "micro:bit Firmata");
        assert_eq!(config.firmware_version, (0, 9));
        assert_eq!(config.default_sampling_interval, 100);
        assert_eq!(config.min_sampling_interval, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_firmware_name("test")
            .with_firmware_version(1, 2)
            .with_sampling_interval(19)
            .with_min_sampling_interval(5)
            .with_layout(BoardLayout {
                light_sensor_pin: None,
                ..Default::default()
            });
        assert_eq!(config.firmware_name, "test");
        assert_eq!(config.firmware_version, (1, 2));
        assert_eq!(config.default_sampling_interval, 19);
        assert_eq!(config.min_sampling_interval, 5);
        assert_eq!(config.layout.light_sensor_pin, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = EngineConfig::default().with_min_sampling_interval(0);
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Config error: Sampling interval must be at least 1ms (found 0ms)."
        );

        let config = EngineConfig::default()
            .with_min_sampling_interval(10)
            .with_sampling_interval(5);
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Config error: Sampling interval must be at least 10ms (found 5ms)."
        );

        let config = EngineConfig::default().with_layout(BoardLayout {
            analog_pins: PinSet::from_pins(&[30]),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let config = EngineConfig::from_json(
            r#"{"firmware_name": "json board", "default_sampling_interval": 50}"#,
        );
        assert!(config.is_ok(), "{:?}", config);
        let config = config.unwrap();
        assert_eq!(config.firmware_name, "json board");
        assert_eq!(config.default_sampling_interval, 50);
        assert_eq!(config.layout, BoardLayout::default());

        let error = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(error.to_string().starts_with("Config error: Cannot parse configuration"));

        let error = EngineConfig::from_json(r#"{"min_sampling_interval": 0}"#).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Config error: Sampling interval must be at least 1ms (found 0ms)."
        );
    }
}
