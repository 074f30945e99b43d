use std::fmt;

use thiserror::Error;

use crate::source::SourceError;

/// Errors returned by the raw stream decoder.
///
/// # Examples
/// ```
/// use trdraw_core::DecodeError;
///
/// let err = DecodeError::ProtocolViolation { found: 0xAA };
/// assert!(err.to_string().contains("wrong flag"));
/// assert!(err.abort_reason().is_some());
/// assert!(DecodeError::ConfigurationUnavailable.abort_reason().is_none());
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("wrong flag: {found:#04x}")]
    ProtocolViolation { found: u8 },
    #[error("could not read {field}")]
    TruncatedInput { field: &'static str },
    #[error("{field} lies past the declared block end")]
    BlockOverrun { field: &'static str },
    #[error("source failed while reading {field}: {source}")]
    Source {
        field: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("number of time bins unavailable")]
    ConfigurationUnavailable,
}

impl DecodeError {
    /// The permanent abort this error causes, if any.
    ///
    /// A missing configuration is not a property of the stream and does not
    /// abort decoding.
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            DecodeError::ProtocolViolation { found } => {
                Some(AbortReason::ProtocolViolation { found: *found })
            }
            DecodeError::TruncatedInput { field } => {
                Some(AbortReason::TruncatedInput { field: *field })
            }
            DecodeError::BlockOverrun { field } => Some(AbortReason::BlockOverrun { field: *field }),
            DecodeError::Source { field, .. } => Some(AbortReason::SourceFailure { field: *field }),
            DecodeError::ConfigurationUnavailable => None,
        }
    }
}

/// Why a decoder stopped for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    ProtocolViolation { found: u8 },
    TruncatedInput { field: &'static str },
    BlockOverrun { field: &'static str },
    SourceFailure { field: &'static str },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::ProtocolViolation { found } => write!(f, "wrong flag: {found:#04x}"),
            AbortReason::TruncatedInput { field } => write!(f, "could not read {field}"),
            AbortReason::BlockOverrun { field } => {
                write!(f, "{field} lies past the declared block end")
            }
            AbortReason::SourceFailure { field } => {
                write!(f, "source failed while reading {field}")
            }
        }
    }
}
