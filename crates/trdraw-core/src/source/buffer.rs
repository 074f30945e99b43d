use super::{ByteSource, SourceError};

/// In-memory source over a single subsystem's payload bytes.
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    data: Vec<u8>,
    pos: usize,
    subsystem: Option<String>,
}

impl BufferSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            subsystem: None,
        }
    }

    /// Number of bytes handed out so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn subsystem(&self) -> Option<&str> {
        self.subsystem.as_deref()
    }
}

impl ByteSource for BufferSource {
    fn select_subsystem(&mut self, name: &str) {
        self.subsystem = Some(name.to_string());
    }

    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }
}
