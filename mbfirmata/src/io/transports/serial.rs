use std::fmt::{Debug, Display, Formatter};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::errors::Error;
use crate::errors::ProtocolError::NotInitialized;
use crate::io::Transport;

/// Serial line transport (57600 bauds, 8N1, no flow control).
#[derive(Clone)]
pub struct Serial {
    /// The connection port.
    port: String,
    /// A Read/Write io object.
    io: Arc<Mutex<Option<Box<dyn SerialPort>>>>,
}

impl Serial {
    /// Constructs a new `Serial` transport for communication through the specified port.
    ///
    /// # Arguments
    /// * `port` - The serial port to use for communication.
    ///
    /// # Example
    /// ```no_run
    /// use mbfirmata::io::Serial;
    ///
    /// let mut serial = Serial::new("/dev/ttyACM0");
    /// serial.open().expect("serial port should open");
    /// ```
    pub fn new<P: Into<String>>(port: P) -> Self {
        Self {
            port: port.into(),
            io: Arc::new(Mutex::new(None)),
        }
    }

    /// Retrieves the configured port.
    pub fn get_port(&self) -> String {
        self.port.clone()
    }

    /// Checks if the port is currently opened.
    pub fn is_open(&self) -> bool {
        self.io.lock().is_some()
    }

    /// Opens the serial port (blocking until the port is available).
    pub fn open(&mut self) -> Result<(), Error> {
        let connexion = serialport::new(self.port.clone(), 57_600)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;
        trace!("Serial port is now opened: {:?}", connexion.name());
        *self.io.lock() = Some(connexion);
        Ok(())
    }

    /// Gracefully closes the serial port.
    pub fn close(&mut self) -> Result<(), Error> {
        *self.io.lock() = None;
        Ok(())
    }
}

impl Default for Serial {
    /// Creates a new serial transport with the first available port or an empty string if no ports are available.
    ///
    /// # Notes
    /// If no port is available, the open phase will fail.
    #[cfg(not(tarpaulin_include))]
    fn default() -> Self {
        let ports = serialport::available_ports().unwrap_or_else(|_| vec![]);
        match ports.first() {
            Some(port) => Self::new(&port.port_name),
            None => Self::new(""),
        }
    }
}

impl Display for Serial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Serial({})", self.port)
    }
}

impl Debug for Serial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serial")
            .field("port", &self.port)
            .field("opened", &self.is_open())
            .finish()
    }
}

impl Transport for Serial {
    /// Reads the pending bytes only: never waits for the port timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut lock = self.io.lock();
        let io = lock.as_mut().ok_or(NotInitialized)?;
        let pending = (io.bytes_to_read()? as usize).min(buf.len());
        if pending == 0 {
            return Ok(0);
        }
        io.read_exact(&mut buf[..pending])?;
        Ok(pending)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut lock = self.io.lock();
        lock.as_mut().ok_or(NotInitialized)?.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        let mut lock = self.io.lock();
        lock.as_mut().ok_or(NotInitialized)?.flush()?;
        Ok(())
    }
}

impl From<serialport::Error> for Error {
    fn from(value: serialport::Error) -> Self {
        std::io::Error::from(value).into()
    }
}

#[cfg(test)]
mod tests {
    use serialport::ErrorKind;

    use crate::mocks::serial_port::SerialPortMock;

    use super::*;

    fn get_test_successful_serial() -> Serial {
        let serial = Serial::new("/dev/ttyACM0");
        *serial.io.lock() = Some(Box::new(SerialPortMock::new(&[0xF9, 0xFF])));
        serial
    }

    fn get_test_failing_serial() -> Serial {
        let serial = Serial::new("/dev/ttyACM0");
        *serial.io.lock() = Some(Box::new(SerialPortMock::failing(ErrorKind::InvalidInput)));
        serial
    }

    #[test]
    fn test_new_serial() {
        let serial = Serial::new("/dev/ttyACM0");
        assert_eq!(serial.get_port(), "/dev/ttyACM0");
        assert!(!serial.is_open());
    }

    #[test]
    fn test_close_serial() {
        let mut serial = get_test_successful_serial();
        assert!(serial.is_open());
        let result = serial.close();
        assert!(result.is_ok());
        assert!(!serial.is_open());
    }

    #[test]
    fn test_not_initialized() {
        let mut serial = Serial::new("/dev/ttyACM0");
        let mut buf = [0; 3];
        let result = serial.read(&mut buf);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Protocol error: Connection has not been initialized."
        );
        assert!(serial.write(&[0xF9]).is_err());
        assert!(serial.flush().is_err());
    }

    #[test]
    fn test_read_pending_bytes() {
        let mut serial = get_test_successful_serial();
        let mut buf = [0; 8];
        let result = serial.read(&mut buf);
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(buf[..2], [0xF9, 0xFF]);

        // Nothing left: the read does not wait.
        let result = serial.read(&mut buf);
        assert_eq!(result.unwrap(), 0);

        let mut serial = get_test_failing_serial();
        assert!(serial.read(&mut buf).is_err());
    }

    #[test]
    fn test_read_is_bounded_by_buffer() {
        let mut serial = get_test_successful_serial();
        let mut buf = [0; 1];
        assert_eq!(serial.read(&mut buf).unwrap(), 1);
        assert_eq!(buf, [0xF9]);
        assert_eq!(serial.read(&mut buf).unwrap(), 1);
        assert_eq!(buf, [0xFF]);
    }

    #[test]
    fn test_write_data() {
        let mut serial = get_test_successful_serial();
        assert!(serial.write(&[1, 2, 3]).is_ok());
        assert!(serial.write(&[]).is_ok());
        assert!(serial.flush().is_ok());

        let mut serial = get_test_failing_serial();
        assert!(serial.write(&[1, 2, 3]).is_err());
        assert!(serial.flush().is_err());
    }

    #[test]
    fn test_from_serial_error() {
        let serial_error = serialport::Error {
            kind: ErrorKind::Unknown,
            description: String::from("test error"),
        };
        let custom_error: Error = serial_error.into();
        assert_eq!(custom_error.to_string(), "Protocol error: test error.");

        let serial_error = serialport::Error {
            kind: ErrorKind::Io(std::io::ErrorKind::NotFound),
            description: String::from("IO error"),
        };
        let custom_error: Error = serial_error.into();
        assert_eq!(
            custom_error.to_string(),
            "Protocol error: Serial port not found or already in use."
        );
    }

    #[test]
    fn test_display_serial() {
        let serial = Serial::new("/dev/ttyACM0");
        assert_eq!(format!("{}", serial), "Serial(/dev/ttyACM0)");
        assert_eq!(
            format!("{:?}", serial),
            "Serial { port: \"/dev/ttyACM0\", opened: false }"
        );
    }
}
