//! Tagged equipment-record container.
//!
//! A raw capture interleaves the readout of several subsystems. Each record
//! carries a 4-byte NUL-padded subsystem tag and a little-endian payload
//! length; the source delivers payload bytes of the selected subsystem as one
//! contiguous stream and skips everything else.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::ContainerSource;
pub use reader::encode_record;
