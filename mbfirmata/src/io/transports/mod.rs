use std::fmt::{Debug, Display};

use crate::errors::Error;

pub mod serial;

/// Byte source and sink linking the engine to the host.
///
/// The engine only ever talks to the host through this trait: raw bytes in, raw bytes out,
/// no framing. Implementations must never block in [`Transport::read`].
pub trait Transport: Debug + Display + Send {
    /// Reads the bytes currently available into `buf` without waiting for more.
    ///
    /// # Returns
    /// The number of bytes written into `buf`: `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Queues `buf` to be sent to the host.
    fn write(&mut self, buf: &[u8]) -> Result<(), Error>;

    /// Waits for the outbound queue to drain.
    ///
    /// # Notes
    /// This is the only blocking point of a step: it is called once at the end of each
    /// [`Engine::step`](crate::io::Engine::step).
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
