use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record header too short: need {needed} bytes, got {actual}")]
    TruncatedHeader { needed: usize, actual: usize },
    #[error("record payload of '{tag}' truncated: {missing} bytes missing")]
    TruncatedPayload { tag: String, missing: u64 },
}
