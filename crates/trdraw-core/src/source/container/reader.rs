use std::io::{ErrorKind, Read};

use super::error::ContainerError;
use super::layout;

/// Header of one equipment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub tag: String,
    pub length: u32,
}

/// Read the next record header.
///
/// Returns `Ok(None)` when the reader is exhausted exactly at a record
/// boundary.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use std::io::Cursor;
///
/// let mut cursor = Cursor::new(*b"TRD\0\x02\0\0\0ab");
/// let header = read_record_header(&mut cursor).unwrap().unwrap();
/// assert_eq!(header.tag, "TRD");
/// assert_eq!(header.length, 2);
/// ```
///
/// # Errors
/// Returns `ContainerError::TruncatedHeader` when the header is cut short.
pub fn read_record_header<R: Read>(reader: &mut R) -> Result<Option<RecordHeader>, ContainerError> {
    let mut raw = [0u8; layout::RECORD_HEADER_LEN];
    let filled = fill(reader, &mut raw)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < raw.len() {
        return Err(ContainerError::TruncatedHeader {
            needed: layout::RECORD_HEADER_LEN,
            actual: filled,
        });
    }

    let tag = decode_tag(&raw[layout::TAG_RANGE.clone()]);
    let len = &raw[layout::LENGTH_RANGE.clone()];
    let length = u32::from_le_bytes([len[0], len[1], len[2], len[3]]);
    Ok(Some(RecordHeader { tag, length }))
}

/// Decode a NUL-padded subsystem tag.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// assert_eq!(decode_tag(b"TOF\0"), "TOF");
/// ```
pub fn decode_tag(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == layout::TAG_PADDING)
        .unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Encode a subsystem name as a record tag, truncating or padding to width.
pub fn encode_tag(name: &str) -> [u8; 4] {
    let mut tag = [layout::TAG_PADDING; 4];
    for (slot, byte) in tag.iter_mut().zip(name.bytes()) {
        *slot = byte;
    }
    tag
}

/// Build one equipment record around `payload`.
///
/// # Examples
/// ```
/// use trdraw_core::encode_record;
///
/// assert_eq!(encode_record("TRD", &[0xBB]), b"TRD\0\x01\0\0\0\xBB".to_vec());
/// ```
pub fn encode_record(tag: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(layout::RECORD_HEADER_LEN + payload.len());
    out.extend_from_slice(&encode_tag(tag));
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Read a single byte, mapping a short read to `None`.
pub fn read_u8<R: Read>(reader: &mut R) -> Result<Option<u8>, ContainerError> {
    let mut buf = [0u8; 1];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf[0])),
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(ContainerError::Io(err)),
    }
}

/// Discard `len` bytes, returning how many were actually available.
pub fn skip<R: Read>(reader: &mut R, len: u64) -> Result<u64, ContainerError> {
    let skipped = std::io::copy(&mut reader.take(len), &mut std::io::sink())?;
    Ok(skipped)
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ContainerError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ContainerError::Io(err)),
        }
    }
    Ok(filled)
}
