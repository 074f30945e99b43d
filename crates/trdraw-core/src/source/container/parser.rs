use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::source::{ByteSource, SourceError};

use super::error::ContainerError;
use super::layout;
use super::reader::{read_record_header, read_u8, skip};

/// Byte source over a tagged equipment-record stream.
pub struct ContainerSource<R> {
    reader: R,
    selected: Option<String>,
    current_tag: String,
    remaining: u64,
    records_read: u64,
    exhausted: bool,
}

impl ContainerSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        Ok(Self::new(BufReader::with_capacity(
            layout::READER_BUFFER_SIZE,
            file,
        )))
    }
}

impl<R: Read> ContainerSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            selected: None,
            current_tag: String::new(),
            remaining: 0,
            records_read: 0,
            exhausted: false,
        }
    }

    /// Number of selected records whose payload has been entered.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn accepts(&self, tag: &str) -> bool {
        self.selected.as_deref().is_none_or(|name| name == tag)
    }

    fn next_payload_byte(&mut self) -> Result<Option<u8>, ContainerError> {
        loop {
            if self.remaining > 0 {
                return match read_u8(&mut self.reader)? {
                    Some(byte) => {
                        self.remaining -= 1;
                        Ok(Some(byte))
                    }
                    None => Err(ContainerError::TruncatedPayload {
                        tag: self.current_tag.clone(),
                        missing: self.remaining,
                    }),
                };
            }

            let Some(header) = read_record_header(&mut self.reader)? else {
                self.exhausted = true;
                return Ok(None);
            };

            if self.accepts(&header.tag) {
                self.records_read += 1;
                self.current_tag = header.tag;
                self.remaining = u64::from(header.length);
            } else {
                let wanted = u64::from(header.length);
                let skipped = skip(&mut self.reader, wanted)?;
                if skipped < wanted {
                    return Err(ContainerError::TruncatedPayload {
                        tag: header.tag,
                        missing: wanted - skipped,
                    });
                }
            }
        }
    }
}

impl<R: Read> ByteSource for ContainerSource<R> {
    fn select_subsystem(&mut self, name: &str) {
        self.selected = Some(name.to_string());
    }

    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        if self.exhausted {
            return Ok(None);
        }
        self.next_payload_byte().map_err(SourceError::from)
    }
}
