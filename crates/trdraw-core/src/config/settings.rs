use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Subsystem selected from the raw stream unless configured otherwise.
pub const DEFAULT_SUBSYSTEM: &str = "TRD";

/// How the decoder treats a two-byte step that crosses the declared block end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Abort before reading past the block.
    #[default]
    Strict,
    /// Read the byte anyway and terminate once the step completes. Matches
    /// the behaviour existing captures were written against.
    Lenient,
}

/// Decoder settings, loadable from a JSON file.
///
/// # Examples
/// ```
/// use trdraw_core::{BoundsPolicy, DecoderConfig};
///
/// let config: DecoderConfig = serde_json::from_str(r#"{"time_bins": 24}"#).unwrap();
/// assert_eq!(config.subsystem, "TRD");
/// assert_eq!(config.time_bins, Some(24));
/// assert_eq!(config.bounds, BoundsPolicy::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_subsystem")]
    pub subsystem: String,
    /// Fixed time-bin count used when no other provider is injected.
    #[serde(default)]
    pub time_bins: Option<u32>,
    /// Reference count the configured value is checked against.
    #[serde(default)]
    pub reference_time_bins: Option<u32>,
    #[serde(default)]
    pub bounds: BoundsPolicy,
    /// Keep every decoded digit in the report.
    #[serde(default)]
    pub include_digits: bool,
}

fn default_subsystem() -> String {
    DEFAULT_SUBSYSTEM.to_string()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            subsystem: default_subsystem(),
            time_bins: None,
            reference_time_bins: None,
            bounds: BoundsPolicy::default(),
            include_digits: false,
        }
    }
}

impl DecoderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: DecoderConfig = serde_json::from_str(&raw)?;
        if config.time_bins == Some(0) {
            return Err(ConfigError::ZeroTimeBins);
        }
        Ok(config)
    }
}
