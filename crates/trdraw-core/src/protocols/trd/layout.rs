pub const SYNC_MARKER: u8 = 0xBB;

pub const SYNC_OFFSET: usize = 0;
pub const DETECTOR_RANGE: std::ops::Range<usize> = 1..3;
pub const BYTE_COUNT_RANGE: std::ops::Range<usize> = 3..6;
pub const PAD_COUNT_RANGE: std::ops::Range<usize> = 6..8;
pub const BLOCK_HEADER_LEN: usize = 8;
pub const BYTE_COUNT_LEN: usize = 3;

/// Payload bytes needed before a pad address is read: row, column and at
/// least one data byte.
pub const MIN_BYTES_FOR_ADDRESS: u32 = 3;
pub const ADDRESS_OFFSET: i16 = 1;
pub const UNSET_PAD_INDEX: i16 = -1;

pub const ZERO_RUN_MARKER: u8 = 0x00;
pub const SIGNAL_HIGH_MASK: u8 = 0x7F;
pub const SIGNAL_HIGH_SHIFT: u32 = 8;
pub const MAX_SIGNAL: u16 = 0x7FFF;
