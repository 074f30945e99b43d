//! Byte sources feeding the raw stream decoder.
//!
//! A source hands out one byte at a time and can never be rewound. `Ok(None)`
//! means the source is exhausted; `Err` means it failed. The decoder treats
//! both as the end of its input, but only the latter is an I/O problem.

mod buffer;
pub(crate) mod container;

pub use buffer::BufferSource;
pub use container::{ContainerSource, encode_record};

use thiserror::Error;

pub trait ByteSource {
    /// Restrict the stream to the records of one subsystem.
    ///
    /// Must be called before the first byte is read; sources without a
    /// notion of subsystems accept any name.
    fn select_subsystem(&mut self, name: &str);

    fn next_byte(&mut self) -> Result<Option<u8>, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn select_subsystem(&mut self, name: &str) {
        (**self).select_subsystem(name)
    }

    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        (**self).next_byte()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("container error: {0}")]
    Container(String),
}

impl From<container::error::ContainerError> for SourceError {
    fn from(value: container::error::ContainerError) -> Self {
        match value {
            container::error::ContainerError::Io(err) => SourceError::Io(err),
            other => SourceError::Container(other.to_string()),
        }
    }
}
