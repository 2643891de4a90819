use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::Error;
use crate::errors::ProtocolError::IoException;
use crate::io::Transport;

#[derive(Debug, Default)]
struct MockTransportData {
    input: VecDeque<u8>,
    output: Vec<u8>,
    flushes: usize,
    chunk_size: Option<usize>,
    broken: bool,
}

/// In-memory transport. Clones share the same buffers, so a test can keep a handle
/// while the engine owns another one.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    data: Arc<Mutex<MockTransportData>>,
}

impl MockTransport {
    /// Creates a transport with `input` pending to be read.
    pub fn new(input: &[u8]) -> Self {
        let transport = Self::default();
        transport.push_input(input);
        transport
    }

    /// Limits the number of bytes delivered by each read (simulates a fragmented stream).
    pub fn with_chunk_size(self, size: usize) -> Self {
        self.data.lock().chunk_size = Some(size.max(1));
        self
    }

    /// Makes every following operation fail.
    pub fn break_connection(&self) {
        self.data.lock().broken = true;
    }

    /// Appends `bytes` to the pending input.
    pub fn push_input(&self, bytes: &[u8]) {
        self.data.lock().input.extend(bytes);
    }

    /// Number of input bytes not read yet.
    pub fn pending_input(&self) -> usize {
        self.data.lock().input.len()
    }

    /// Everything written so far.
    pub fn output(&self) -> Vec<u8> {
        self.data.lock().output.clone()
    }

    /// Everything written so far, clearing the captured output.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.data.lock().output)
    }

    /// Number of flush calls received.
    pub fn flushes(&self) -> usize {
        self.data.lock().flushes
    }

    fn check(data: &MockTransportData) -> Result<(), Error> {
        match data.broken {
            false => Ok(()),
            true => Err(IoException {
                info: String::from("Mock connection lost"),
            }
            .into()),
        }
    }
}

impl Display for MockTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockTransport")
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut data = self.data.lock();
        Self::check(&data)?;
        let limit = data.chunk_size.unwrap_or(usize::MAX);
        let count = buf.len().min(data.input.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(data.input.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut data = self.data.lock();
        Self::check(&data)?;
        data.output.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        let mut data = self.data.lock();
        Self::check(&data)?;
        data.flushes += 1;
        Ok(())
    }
}
