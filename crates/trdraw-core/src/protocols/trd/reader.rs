use crate::source::ByteSource;

use super::error::DecodeError;
use super::layout;

/// Field-level reads over a sequential byte source.
///
/// Multi-byte integers are little-endian. Every read names the field it
/// belongs to so a short stream reports what was missing.
pub struct FieldReader<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<'a, S: ByteSource + ?Sized> FieldReader<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self { source }
    }

    /// Read one byte, returning `None` when the source is exhausted.
    pub fn try_read_u8(&mut self, field: &'static str) -> Result<Option<u8>, DecodeError> {
        self.source
            .next_byte()
            .map_err(|source| DecodeError::Source { field, source })
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.try_read_u8(field)?
            .ok_or(DecodeError::TruncatedInput { field })
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        let mut bytes = [0u8; 2];
        self.read_into(&mut bytes, field)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u24_le(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        let mut bytes = [0u8; 4];
        self.read_into(&mut bytes[..layout::BYTE_COUNT_LEN], field)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_into(&mut self, buf: &mut [u8], field: &'static str) -> Result<(), DecodeError> {
        for slot in buf.iter_mut() {
            *slot = self.read_u8(field)?;
        }
        Ok(())
    }
}

/// Decode a pad address byte; 0 encodes the unset index.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// assert_eq!(pad_index(1), 0);
/// assert_eq!(pad_index(0), -1);
/// ```
pub fn pad_index(byte: u8) -> i16 {
    i16::from(byte) - layout::ADDRESS_OFFSET
}

/// Compose a 15-bit sample from its high and low data bytes.
///
/// Bit 7 of the high byte carries no signal and is dropped.
pub fn compose_signal(high: u8, low: u8) -> u16 {
    (u16::from(high & layout::SIGNAL_HIGH_MASK) << layout::SIGNAL_HIGH_SHIFT) | u16::from(low)
}

pub fn is_zero_run(byte: u8) -> bool {
    byte == layout::ZERO_RUN_MARKER
}
