use log::error;
use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::errors::ProtocolError::IoException;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure the engine runs inside a tokio runtime?
    RuntimeError,
    /// Protocol error: {source}.
    ProtocolError { source: ProtocolError },
    /// Config error: {source}.
    ConfigError { source: ConfigError },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        let info = match error.kind() {
            std::io::ErrorKind::NotFound => String::from("Serial port not found or already in use"),
            std::io::ErrorKind::PermissionDenied => String::from("Serial connection lost"),
            _ => error.to_string(),
        };
        Self::ProtocolError {
            source: IoException { info },
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(value: ProtocolError) -> Self {
        Self::ProtocolError { source: value }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::ConfigError { source: value }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProtocolError {
    /// {info}
    IoException { info: String },
    /// Connection has not been initialized
    NotInitialized,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Pin ({pin}) does not exist on the board - {context}
    InvalidPin { pin: u8, context: &'static str },
    /// Channel ({channel}) is not backed by an existing pin
    InvalidChannel { channel: u8 },
    /// Sampling interval must be at least {min}ms (found {found}ms)
    InvalidSamplingInterval { min: u16, found: u16 },
    /// Cannot parse configuration: {info}
    Parse { info: String },
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::ConfigError::{InvalidPin, InvalidSamplingInterval};

    use super::*;

    #[test]
    fn test_error_display() {
        let runtime_error = RuntimeError;
        assert_eq!(
            format!("{}", runtime_error),
            "Runtime error: Are you sure the engine runs inside a tokio runtime?"
        );

        let protocol_error = Error::from(IoException {
            info: "I/O error message".to_string(),
        });
        assert_eq!(
            format!("{}", protocol_error),
            "Protocol error: I/O error message."
        );

        let config_error = Error::from(InvalidPin {
            pin: 42,
            context: "analog pins",
        });
        assert_eq!(
            format!("{}", config_error),
            "Config error: Pin (42) does not exist on the board - analog pins."
        );

        let unknown_error = Unknown {
            info: "Some unknown error".to_string(),
        };
        assert_eq!(
            format!("{}", unknown_error),
            "Unknown error: Some unknown error."
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert_eq!(
            format!("{}", error),
            "Protocol error: Serial port not found or already in use."
        );

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_error.into();
        assert_eq!(format!("{}", error), "Protocol error: Serial connection lost.");
    }

    #[test]
    fn test_from_protocol_error() {
        let error: Error = ProtocolError::NotInitialized.into();
        assert_eq!(
            format!("{}", error),
            "Protocol error: Connection has not been initialized."
        );
    }

    #[test]
    fn test_from_config_error() {
        let error: Error = InvalidSamplingInterval { min: 5, found: 1 }.into();
        assert_eq!(
            format!("{}", error),
            "Config error: Sampling interval must be at least 5ms (found 1ms)."
        );
    }
}
