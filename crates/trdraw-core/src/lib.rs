//! trdraw core library for decoding TRD raw readout streams.
//!
//! This crate implements the offline decoding pipeline used by the CLI:
//! byte sources feed the raw stream decoder (layout/reader/parser), whose
//! digits are aggregated into a deterministic report. Decoding pulls bytes
//! strictly sequentially and never seeks; all file access is isolated in
//! `source` modules and the time-bin configuration is injected through a
//! `TimeBinProvider`.
//!
//! Invariants:
//! - Digits are reported in stream order; summaries in detector order.
//! - A decoder that met a malformed or truncated stream never resumes.
//! - The time-bin count is looked up on every decoding step, never cached.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use trdraw_core::{DecoderConfig, analyze_raw_file};
//!
//! let config = DecoderConfig {
//!     time_bins: Some(24),
//!     ..DecoderConfig::default()
//! };
//! let report = analyze_raw_file(Path::new("raw.bin"), &config)?;
//! println!("digits: {}", report.digits_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod config;
mod protocols;
mod source;

pub use analysis::{AnalysisError, analyze_payload_file, analyze_raw_file, analyze_source};
pub use config::{
    BoundsPolicy, ConfigError, DEFAULT_SUBSYSTEM, DecoderConfig, DigitsParam, FixedTimeBins,
    SharedTimeBins, TimeBinProvider,
};
pub use protocols::trd::layout::{MAX_SIGNAL, SYNC_MARKER, UNSET_PAD_INDEX};
pub use protocols::trd::{
    AbortReason, BlockHeader, BlockRecord, DecodeError, Digit, RawStreamDecoder,
    encode_block_header,
};
pub use source::{BufferSource, ByteSource, ContainerSource, SourceError, encode_record};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the caller does not stamp the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decoding report with deterministic ordering.
///
/// # Examples
/// ```
/// use trdraw_core::{InputInfo, make_stub_report};
///
/// let report = make_stub_report(InputInfo {
///     path: "raw.bin".to_string(),
///     bytes: 123,
/// });
/// assert_eq!(report.report_version, trdraw_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    pub input: InputInfo,

    /// Subsystem selected from the raw stream.
    pub subsystem: String,
    /// Time-bin count in effect when decoding stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_bins: Option<u32>,
    pub status: DecodeStatus,
    /// Reason decoding stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Blocks in stream order.
    pub blocks: Vec<BlockSummary>,
    /// Per-detector summaries sorted by detector number.
    pub detectors: Vec<DetectorSummary>,
    pub digits_total: u64,
    /// Every decoded digit in stream order, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<Vec<Digit>>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// How decoding ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeStatus {
    /// The stream ended on a block boundary.
    Complete,
    /// A malformed or truncated stream stopped decoding.
    Aborted,
}

/// One framed detector block as seen by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    pub detector: u16,
    /// Declared payload size.
    pub byte_count: u32,
    /// Active pad count from the header (advisory).
    pub declared_pads: u16,
    /// Pad addresses actually read.
    pub observed_pads: u32,
    pub digits: u64,
    /// `false` when decoding stopped inside this block.
    pub complete: bool,
}

/// Per-detector digit summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorSummary {
    pub detector: u16,
    pub digits: u64,
    /// Distinct valid pads that produced digits.
    pub pads: u64,
    pub max_signal: u16,
    /// Digits whose row or column was unset in the stream.
    pub unset_pad_digits: u64,
}

/// Build a stub report with base fields filled and empty aggregates.
pub fn make_stub_report(input: InputInfo) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "trdraw".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input,
        subsystem: DEFAULT_SUBSYSTEM.to_string(),
        time_bins: None,
        status: DecodeStatus::Complete,
        error: None,
        blocks: vec![],
        detectors: vec![],
        digits_total: 0,
        digits: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let report = make_stub_report(InputInfo {
            path: "raw.bin".to_string(),
            bytes: 1,
        });

        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("time_bins").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("digits").is_none());
        assert_eq!(value["status"], "complete");
        assert_eq!(value["subsystem"], "TRD");
    }

    #[test]
    fn digits_serialize_with_signed_pads() {
        let mut report = make_stub_report(InputInfo {
            path: "raw.bin".to_string(),
            bytes: 1,
        });
        report.status = DecodeStatus::Aborted;
        report.digits = Some(vec![Digit {
            detector: 1,
            row: UNSET_PAD_INDEX,
            column: 3,
            time_bin: 4,
            signal: 272,
        }]);

        let value = serde_json::to_value(&report).expect("report json");
        assert_eq!(value["status"], "aborted");
        let digit = &value["digits"][0];
        assert_eq!(digit["row"], -1);
        assert_eq!(digit["signal"], 272);
    }
}
