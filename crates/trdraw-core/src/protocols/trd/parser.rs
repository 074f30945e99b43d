use serde::{Deserialize, Serialize};

use crate::source::ByteSource;

use super::error::DecodeError;
use super::layout;
use super::reader::FieldReader;

/// Framing header of one detector block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub detector: u16,
    /// Payload bytes following the header.
    pub byte_count: u32,
    /// Declared number of active pads. Advisory only.
    pub pad_count: u16,
}

/// One decoded observation.
///
/// # Examples
/// ```
/// use trdraw_core::Digit;
///
/// let digit = Digit { detector: 1, row: 2, column: -1, time_bin: 4, signal: 272 };
/// assert!(!digit.has_valid_pad());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digit {
    pub detector: u16,
    /// Pad row; `-1` when the stream carried no row.
    pub row: i16,
    /// Pad column; `-1` when the stream carried no column.
    pub column: i16,
    pub time_bin: u32,
    pub signal: u16,
}

impl Digit {
    pub fn has_valid_pad(&self) -> bool {
        self.row > layout::UNSET_PAD_INDEX && self.column > layout::UNSET_PAD_INDEX
    }
}

/// What the decoder saw of one block once it is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRecord {
    pub header: BlockHeader,
    pub pads_addressed: u32,
    pub digits: u64,
    /// `false` when decoding stopped inside the block.
    pub complete: bool,
}

/// Encode a block header in wire order.
///
/// # Examples
/// ```
/// use trdraw_core::{BlockHeader, encode_block_header};
///
/// let bytes = encode_block_header(&BlockHeader { detector: 1, byte_count: 7, pad_count: 1 });
/// assert_eq!(bytes, [0xBB, 0x01, 0x00, 0x07, 0x00, 0x00, 0x01, 0x00]);
/// ```
pub fn encode_block_header(header: &BlockHeader) -> [u8; layout::BLOCK_HEADER_LEN] {
    let mut out = [0u8; layout::BLOCK_HEADER_LEN];
    out[layout::SYNC_OFFSET] = layout::SYNC_MARKER;
    out[layout::DETECTOR_RANGE].copy_from_slice(&header.detector.to_le_bytes());
    out[layout::BYTE_COUNT_RANGE]
        .copy_from_slice(&header.byte_count.to_le_bytes()[..layout::BYTE_COUNT_LEN]);
    out[layout::PAD_COUNT_RANGE].copy_from_slice(&header.pad_count.to_le_bytes());
    out
}

/// Parse a block header.
///
/// Returns `Ok(None)` when the source is exhausted before the sync flag, the
/// only place where the stream may end cleanly.
///
/// # Errors
/// `DecodeError::ProtocolViolation` when the flag is not the sync marker,
/// `DecodeError::TruncatedInput` when the header is cut short.
pub fn parse_block_header<S: ByteSource + ?Sized>(
    reader: &mut FieldReader<'_, S>,
) -> Result<Option<BlockHeader>, DecodeError> {
    let Some(flag) = reader.try_read_u8("flag")? else {
        return Ok(None);
    };
    if flag != layout::SYNC_MARKER {
        return Err(DecodeError::ProtocolViolation { found: flag });
    }

    let detector = reader.read_u16_le("detector number")?;
    let byte_count = reader.read_u24_le("number of bytes")?;
    let pad_count = reader.read_u16_le("number of active pads")?;

    Ok(Some(BlockHeader {
        detector,
        byte_count,
        pad_count,
    }))
}
