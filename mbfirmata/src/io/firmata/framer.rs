//! Reconstructs discrete frames from a fragmented byte stream.

use heapless::Vec;

use crate::io::firmata::constants::{
    END_SYSEX, MAX_INPUT_BUFFER, REPORT_VERSION, START_SYSEX, SYSTEM_RESET,
};

/// A complete frame found in the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A core command and its two arguments (zero padded).
    Core { command: u8, arg1: u8, arg2: u8 },
    /// A sysex sub-command and its arguments (start/end markers and sub-command excluded).
    Sysex { command: u8, args: &'a [u8] },
    /// A sysex frame with nothing between its markers.
    EmptySysex,
    /// A sysex frame not terminated where expected: `skipped` bytes were dropped.
    Malformed { skipped: usize },
}

/// Checks if `byte` is a command byte (high bit set).
fn is_command(byte: &u8) -> bool {
    byte & 0x80 != 0
}

/// Minimum number of argument bytes a core command needs before it can be dispatched.
fn required_args(command: u8) -> usize {
    match command {
        REPORT_VERSION | SYSTEM_RESET => 0,
        _ if matches!(command & 0xF0, 0xC0 | 0xD0) => 1,
        _ => 2,
    }
}

/// Bounded input buffer holding not-yet-parsed bytes.
///
/// After [`Framer::process`] the buffer holds at most one incomplete frame, always aligned
/// to its start.
#[derive(Clone, Debug, Default)]
pub struct Framer {
    buffer: Vec<u8, MAX_INPUT_BUFFER>,
}

impl Framer {
    /// Number of bytes that can still be buffered.
    pub fn free_space(&self) -> usize {
        MAX_INPUT_BUFFER - self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == MAX_INPUT_BUFFER
    }

    /// Bytes currently retained.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends `bytes` to the buffer.
    ///
    /// # Returns
    /// The number of bytes dropped because the buffer was full.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes.len().min(self.free_space());
        // Cannot fail: `accepted` fits in the free space.
        let _ = self.buffer.extend_from_slice(&bytes[..accepted]);
        bytes.len() - accepted
    }

    /// Hands every complete frame of the buffer to `handler`, in order, then compacts the
    /// buffer so that only the trailing incomplete frame (if any) remains.
    ///
    /// # Errors
    /// Stops at the first error returned by `handler`: the frame which failed is consumed,
    /// the following ones stay buffered for the next call.
    pub fn process<E, F>(&mut self, mut handler: F) -> Result<(), E>
    where
        F: FnMut(Frame<'_>) -> Result<(), E>,
    {
        let length = self.buffer.len();
        let mut cursor = 0;
        let mut result = Ok(());

        while cursor < length {
            let start = match self.buffer[cursor..].iter().position(is_command) {
                Some(offset) => cursor + offset,
                None => {
                    cursor = length;
                    break;
                }
            };
            let command = self.buffer[start];
            let next = self.buffer[start + 1..]
                .iter()
                .position(is_command)
                .map(|offset| start + 1 + offset);

            let arg_bytes = match next {
                Some(next) => next - start - 1,
                None => {
                    let available = length - start - 1;
                    if command == START_SYSEX || available < required_args(command) {
                        // Incomplete: wait for more input.
                        cursor = start;
                        break;
                    }
                    available
                }
            };

            let (frame, consumed) = match command {
                START_SYSEX => {
                    let end = start + arg_bytes + 1;
                    match self.buffer[end] {
                        END_SYSEX if arg_bytes == 0 => (Frame::EmptySysex, 2),
                        END_SYSEX => (
                            Frame::Sysex {
                                command: self.buffer[start + 1],
                                args: &self.buffer[start + 2..end],
                            },
                            arg_bytes + 2,
                        ),
                        _ => (
                            Frame::Malformed {
                                skipped: arg_bytes + 1,
                            },
                            arg_bytes + 1,
                        ),
                    }
                }
                _ => {
                    let arg = |index: usize| match index <= arg_bytes {
                        true => self.buffer[start + index],
                        false => 0,
                    };
                    (
                        Frame::Core {
                            command,
                            arg1: arg(1),
                            arg2: arg(2),
                        },
                        arg_bytes + 1,
                    )
                }
            };

            cursor = start + consumed;
            result = handler(frame);
            if result.is_err() {
                break;
            }
        }

        self.compact(cursor.min(length));
        result
    }

    /// Drops the first `consumed` bytes and moves the rest to the start of the buffer.
    fn compact(&mut self, consumed: usize) {
        if consumed == 0 {
            return;
        }
        let remaining = self.buffer.len() - consumed;
        self.buffer.copy_within(consumed.., 0);
        self.buffer.truncate(remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Owned {
        Core(u8, u8, u8),
        Sysex(u8, std::vec::Vec<u8>),
        Empty,
        Malformed(usize),
    }

    fn collect(framer: &mut Framer) -> std::vec::Vec<Owned> {
        let mut frames = vec![];
        let result: Result<(), ()> = framer.process(|frame| {
            frames.push(match frame {
                Frame::Core {
                    command,
                    arg1,
                    arg2,
                } => Owned::Core(command, arg1, arg2),
                Frame::Sysex { command, args } => Owned::Sysex(command, args.to_vec()),
                Frame::EmptySysex => Owned::Empty,
                Frame::Malformed { skipped } => Owned::Malformed(skipped),
            });
            Ok(())
        });
        assert!(result.is_ok());
        frames
    }

    fn run_chunked(bytes: &[u8], chunk: usize) -> std::vec::Vec<Owned> {
        let mut framer = Framer::default();
        let mut frames = vec![];
        for part in bytes.chunks(chunk) {
            assert_eq!(framer.feed(part), 0);
            frames.extend(collect(&mut framer));
        }
        frames
    }

    #[test]
    fn test_core_commands() {
        let mut framer = Framer::default();
        framer.feed(&[0xF9, 0xF4, 0x00, 0x01, 0xC8, 0x01, 0xFF]);
        assert_eq!(
            collect(&mut framer),
            vec![
                Owned::Core(0xF9, 0, 0),
                Owned::Core(0xF4, 0x00, 0x01),
                Owned::Core(0xC8, 0x01, 0),
                Owned::Core(0xFF, 0, 0),
            ]
        );
        assert!(framer.is_empty());
    }

    #[test]
    fn test_incomplete_core_command() {
        let mut framer = Framer::default();
        framer.feed(&[0xF9, 0xE1, 0x7F]);
        assert_eq!(collect(&mut framer), vec![Owned::Core(0xF9, 0, 0)]);
        assert_eq!(framer.pending(), &[0xE1, 0x7F]);

        framer.feed(&[0x07]);
        assert_eq!(collect(&mut framer), vec![Owned::Core(0xE1, 0x7F, 0x07)]);
        assert!(framer.is_empty());

        // Stream commands only need one argument.
        framer.feed(&[0xD0]);
        assert!(collect(&mut framer).is_empty());
        framer.feed(&[0x01]);
        assert_eq!(collect(&mut framer), vec![Owned::Core(0xD0, 0x01, 0)]);
    }

    #[test]
    fn test_short_core_command_is_zero_padded() {
        // The next command byte bounds the arguments.
        let mut framer = Framer::default();
        framer.feed(&[0xF5, 0x03, 0xF9]);
        assert_eq!(
            collect(&mut framer),
            vec![Owned::Core(0xF5, 0x03, 0), Owned::Core(0xF9, 0, 0)]
        );
    }

    #[test]
    fn test_sysex_frames() {
        let mut framer = Framer::default();
        framer.feed(&[0xF0, 0x79, 0xF7, 0xF0, 0x7A, 0x64, 0x00, 0xF7, 0xF0, 0xF7]);
        assert_eq!(
            collect(&mut framer),
            vec![
                Owned::Sysex(0x79, vec![]),
                Owned::Sysex(0x7A, vec![0x64, 0x00]),
                Owned::Empty,
            ]
        );
        assert!(framer.is_empty());
    }

    #[test]
    fn test_incomplete_sysex() {
        let mut framer = Framer::default();
        framer.feed(&[0xF9, 0xF0, 0x71, 0x41, 0x00]);
        assert_eq!(collect(&mut framer), vec![Owned::Core(0xF9, 0, 0)]);
        assert_eq!(framer.pending(), &[0xF0, 0x71, 0x41, 0x00]);

        framer.feed(&[0x42, 0x00, 0xF7]);
        assert_eq!(
            collect(&mut framer),
            vec![Owned::Sysex(0x71, vec![0x41, 0x00, 0x42, 0x00])]
        );
        assert!(framer.is_empty());
    }

    #[test]
    fn test_malformed_sysex_recovery() {
        let mut framer = Framer::default();
        // The sysex is interrupted by a version request: both the sysex start and its
        // arguments are skipped, the interrupting command is dispatched.
        framer.feed(&[0xF0, 0x6D, 0x01, 0xF9, 0xF4, 0x00, 0x01]);
        assert_eq!(
            collect(&mut framer),
            vec![
                Owned::Malformed(3),
                Owned::Core(0xF9, 0, 0),
                Owned::Core(0xF4, 0x00, 0x01),
            ]
        );
        assert!(framer.is_empty());
    }

    #[test]
    fn test_leading_garbage_is_skipped() {
        let mut framer = Framer::default();
        framer.feed(&[0x01, 0x02, 0xF9, 0x05]);
        assert_eq!(collect(&mut framer), vec![Owned::Core(0xF9, 0x05, 0)]);
        assert!(framer.is_empty());

        framer.feed(&[0x01, 0x02]);
        assert!(collect(&mut framer).is_empty());
        assert!(framer.is_empty());
    }

    #[test]
    fn test_chunking_independence() {
        let stream: &[u8] = &[
            0xF9, 0xF4, 0x00, 0x01, 0xF5, 0x00, 0x01, 0xF0, 0x79, 0xF7, 0xC8, 0x01, 0xD0, 0x01,
            0xF0, 0x6D, 0x01, 0xF9, 0xF0, 0x04, 0x50, 0x00, 0x48, 0x00, 0x69, 0x00, 0xF7, 0x90,
            0x01, 0x00, 0xE1, 0x7F, 0x07, 0xF0, 0xF7, 0xFF,
        ];
        let reference = run_chunked(stream, stream.len());
        assert_eq!(reference.len(), 13);
        for chunk in 1..stream.len() {
            assert_eq!(
                run_chunked(stream, chunk),
                reference,
                "chunk size {} changes the frames",
                chunk
            );
        }
    }

    #[test]
    fn test_feed_overflow() {
        let mut framer = Framer::default();
        let garbage = [0x01u8; 300];
        assert_eq!(framer.feed(&garbage[..200]), 0);
        assert_eq!(framer.free_space(), 50);
        assert_eq!(framer.feed(&garbage[..100]), 50);
        assert!(framer.is_full());
        assert_eq!(framer.feed(&[0xF9]), 1);
    }

    #[test]
    fn test_handler_error_keeps_remaining_frames() {
        let mut framer = Framer::default();
        framer.feed(&[0xF9, 0xFF, 0xF9]);
        let mut count = 0;
        let result = framer.process(|_| {
            count += 1;
            match count {
                1 => Err("broken"),
                _ => Ok(()),
            }
        });
        assert_eq!(result, Err("broken"));
        assert_eq!(framer.pending(), &[0xFF, 0xF9]);
        assert_eq!(collect(&mut framer).len(), 2);
    }
}
