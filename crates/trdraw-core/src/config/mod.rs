//! Time-bin configuration consumed by the decoder.
//!
//! The decoder never reaches for a global: whoever builds it injects a
//! `TimeBinProvider`. `SharedTimeBins` stands in for a process-wide
//! calibration store whose value can change (or disappear) between events.

mod error;
mod params;
mod settings;

pub use error::ConfigError;
pub use params::DigitsParam;
pub use settings::{BoundsPolicy, DEFAULT_SUBSYSTEM, DecoderConfig};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Supplies the number of time bins per pad.
pub trait TimeBinProvider {
    /// Current time-bin count, or `None` when the provider is unavailable.
    fn time_bin_count(&self) -> Option<u32>;
}

impl<T: TimeBinProvider + ?Sized> TimeBinProvider for &T {
    fn time_bin_count(&self) -> Option<u32> {
        (**self).time_bin_count()
    }
}

impl<T: TimeBinProvider + ?Sized> TimeBinProvider for Arc<T> {
    fn time_bin_count(&self) -> Option<u32> {
        (**self).time_bin_count()
    }
}

/// Constant time-bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeBins(pub u32);

impl TimeBinProvider for FixedTimeBins {
    fn time_bin_count(&self) -> Option<u32> {
        Some(self.0)
    }
}

/// An optional count behaves like a provider that may be unavailable.
impl TimeBinProvider for Option<u32> {
    fn time_bin_count(&self) -> Option<u32> {
        *self
    }
}

/// Settable, shareable time-bin count that may be unset.
///
/// Clones share the same value.
///
/// # Examples
/// ```
/// use trdraw_core::{SharedTimeBins, TimeBinProvider};
///
/// let shared = SharedTimeBins::unset();
/// let handle = shared.clone();
/// assert_eq!(handle.time_bin_count(), None);
/// shared.set(24);
/// assert_eq!(handle.time_bin_count(), Some(24));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedTimeBins {
    // 0 is the "unset" marker; a zero time-bin count is not a usable value.
    value: Arc<AtomicU32>,
}

impl SharedTimeBins {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn new(time_bins: u32) -> Self {
        let shared = Self::default();
        shared.set(time_bins);
        shared
    }

    pub fn set(&self, time_bins: u32) {
        self.value.store(time_bins, Ordering::Release);
    }

    pub fn clear(&self) {
        self.value.store(0, Ordering::Release);
    }

    pub fn get(&self) -> Option<u32> {
        match self.value.load(Ordering::Acquire) {
            0 => None,
            n => Some(n),
        }
    }
}

impl TimeBinProvider for SharedTimeBins {
    fn time_bin_count(&self) -> Option<u32> {
        self.get()
    }
}
