//! TRD raw stream decoding.
//!
//! The stream is a sequence of detector blocks. Each block opens with a
//! sync flag, the detector number, the payload size and the number of active
//! pads. The payload addresses a pad (row, column) and then describes its
//! time bins as a mix of zero-run skips and 15-bit samples; a new address
//! follows once the configured number of time bins is used up.
//!
//! The decoder is a pull-based state machine over a sequential `ByteSource`.
//! Malformed framing, truncated input and source failures end decoding for
//! good; a missing time-bin count only fails the current call.

pub mod decoder;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use decoder::RawStreamDecoder;
pub use error::{AbortReason, DecodeError};
pub use parser::{BlockHeader, BlockRecord, Digit, encode_block_header, parse_block_header};
