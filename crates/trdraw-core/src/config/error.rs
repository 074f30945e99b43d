use thiserror::Error;

/// Errors raised while loading or checking decoder configuration.
///
/// # Examples
/// ```
/// use trdraw_core::ConfigError;
///
/// let err = ConfigError::TimeBinMismatch { raw: 24, reference: 30 };
/// assert!(err.to_string().contains("does not match"));
/// ```
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("number of time bins does not match reference value (raw: {raw}, reference: {reference})")]
    TimeBinMismatch { raw: u32, reference: u32 },
    #[error("time-bin count must be positive")]
    ZeroTimeBins,
}
