use super::{ConfigError, TimeBinProvider};

/// Digits metadata carried alongside decoded data.
///
/// Setting the time-bin count checks it against a reference provider (for
/// example the detector control system value) unless the check is disabled.
///
/// # Examples
/// ```
/// use trdraw_core::{DigitsParam, FixedTimeBins};
///
/// let mut param = DigitsParam::new();
/// assert!(param.set_time_bins(24, &FixedTimeBins(24)).is_ok());
/// assert!(param.set_time_bins(30, &FixedTimeBins(24)).is_err());
/// assert_eq!(param.time_bins(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitsParam {
    check_reference: bool,
    time_bins: u32,
}

impl Default for DigitsParam {
    fn default() -> Self {
        Self {
            check_reference: true,
            time_bins: 0,
        }
    }
}

impl DigitsParam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_check_reference(&mut self, check: bool) {
        self.check_reference = check;
    }

    pub fn check_reference(&self) -> bool {
        self.check_reference
    }

    /// Store the time-bin count and verify it against `reference`.
    ///
    /// The value is stored even when the check fails.
    ///
    /// # Errors
    /// `ConfigError::TimeBinMismatch` when the check is enabled, the
    /// reference is available and the values differ.
    pub fn set_time_bins<P: TimeBinProvider>(
        &mut self,
        time_bins: u32,
        reference: &P,
    ) -> Result<(), ConfigError> {
        self.time_bins = time_bins;
        if !self.check_reference {
            return Ok(());
        }
        match reference.time_bin_count() {
            Some(expected) if expected != time_bins => {
                log::error!(
                    "number of time bins does not match reference value (raw: {time_bins}, reference: {expected})"
                );
                Err(ConfigError::TimeBinMismatch {
                    raw: time_bins,
                    reference: expected,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn time_bins(&self) -> u32 {
        self.time_bins
    }
}
