pub const TAG_RANGE: std::ops::Range<usize> = 0..4;
pub const LENGTH_RANGE: std::ops::Range<usize> = 4..8;
pub const RECORD_HEADER_LEN: usize = 8;

pub const TAG_PADDING: u8 = 0x00;

pub const READER_BUFFER_SIZE: usize = 64 * 1024;
