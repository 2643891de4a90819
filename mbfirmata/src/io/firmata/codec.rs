//! 7-bit safe wire encoding.
//!
//! Every byte on the wire with its high bit set is a command byte: all data has to be
//! spread on 7-bit fields. Values are sent least significant field first.

use crate::errors::Error;
use crate::io::Transport;

/// Splits a value into its two low 7-bit fields: `(v & 0x7F, (v >> 7) & 0x7F)`.
///
/// Negative values are masked as their two's complement representation.
pub fn split_low7_high7(value: i32) -> (u8, u8) {
    ((value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8)
}

/// Inverse of [`split_low7_high7`] for values in `0..16384`.
pub fn join_low7_high7(low: u8, high: u8) -> u16 {
    (low as u16 & 0x7F) | ((high as u16 & 0x7F) << 7)
}

/// Assembles a value sent as successive 7-bit fields, least significant first.
///
/// Each field is OR'd in with an increasing shift (0, 7, 14, 21 then 28 bits): fields
/// past the fifth one do not fit in 32 bits and are ignored.
pub fn decode_7bit_fields(fields: &[u8]) -> u32 {
    fields
        .iter()
        .take(5)
        .enumerate()
        .fold(0, |value, (i, field)| {
            value | ((*field as u32 & 0x7F) << (7 * i))
        })
}

/// Encodes each byte `b` as the two 7-bit bytes `(b & 0x7F, (b >> 7) & 1)`.
pub fn encode_doubled_bytes(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes.iter().flat_map(|b| [b & 0x7F, (b >> 7) & 0x01])
}

/// Decodes a payload produced by [`encode_doubled_bytes`]. A trailing odd byte is ignored.
pub fn decode_doubled_bytes(payload: &[u8]) -> impl Iterator<Item = u8> + '_ {
    payload
        .chunks_exact(2)
        .map(|pair| (pair[0] & 0x7F) | ((pair[1] & 0x01) << 7))
}

/// Low level writing primitives available on every [`Transport`].
///
/// Values are emitted verbatim: callers guarantee data bytes are already in `0..128`.
pub trait WireWrite {
    fn encode_byte(&mut self, byte: u8) -> Result<(), Error>;

    fn encode_7bit_pair(&mut self, b1: u8, b2: u8) -> Result<(), Error>;

    fn encode_7bit_triple(&mut self, b1: u8, b2: u8, b3: u8) -> Result<(), Error>;

    /// Writes `text` byte-doubled (see [`encode_doubled_bytes`]).
    fn encode_string_as_doubled_bytes(&mut self, text: &str) -> Result<(), Error>;
}

impl<T: Transport + ?Sized> WireWrite for T {
    fn encode_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.write(&[byte])
    }

    fn encode_7bit_pair(&mut self, b1: u8, b2: u8) -> Result<(), Error> {
        self.write(&[b1, b2])
    }

    fn encode_7bit_triple(&mut self, b1: u8, b2: u8, b3: u8) -> Result<(), Error> {
        self.write(&[b1, b2, b3])
    }

    fn encode_string_as_doubled_bytes(&mut self, text: &str) -> Result<(), Error> {
        for byte in text.bytes() {
            self.write(&[byte & 0x7F, (byte >> 7) & 0x01])?;
        }
        Ok(())
    }
}
