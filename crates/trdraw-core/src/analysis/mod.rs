use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::{ConfigError, DecoderConfig, DigitsParam, FixedTimeBins, TimeBinProvider};
use crate::protocols::trd::{DecodeError, Digit, RawStreamDecoder};
use crate::source::{BufferSource, ByteSource, ContainerSource, SourceError};
use crate::{DecodeStatus, InputInfo, Report, make_stub_report};

mod detectors;

use detectors::{DetectorStats, add_digit, block_summary, build_detector_summaries};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("number of time bins not configured")]
    MissingTimeBins,
    #[error("number of time bins unavailable")]
    ConfigurationUnavailable,
}

/// Decode a tagged equipment-record capture.
pub fn analyze_raw_file(path: &Path, config: &DecoderConfig) -> Result<Report, AnalysisError> {
    let provider = configured_time_bins(config)?;
    let source = ContainerSource::open(path)?;
    analyze_source(input_info(path)?, source, provider, config)
}

/// Decode a file holding one subsystem's payload bytes without container
/// records.
pub fn analyze_payload_file(path: &Path, config: &DecoderConfig) -> Result<Report, AnalysisError> {
    let provider = configured_time_bins(config)?;
    let source = BufferSource::new(fs::read(path)?);
    analyze_source(input_info(path)?, source, provider, config)
}

/// Drive a decoder over `source` until no digits remain.
///
/// Stream faults end decoding and are recorded in the report; only a missing
/// time-bin count fails the analysis.
pub fn analyze_source<S: ByteSource, P: TimeBinProvider>(
    input: InputInfo,
    source: S,
    provider: P,
    config: &DecoderConfig,
) -> Result<Report, AnalysisError> {
    let mut decoder = RawStreamDecoder::with_config(source, provider, config);
    let mut detector_stats: HashMap<u16, DetectorStats> = HashMap::new();
    let mut digits: Vec<Digit> = Vec::new();
    let mut blocks = Vec::new();
    let mut digits_total = 0u64;
    let mut error = None;

    loop {
        let result = decoder.advance();
        blocks.extend(decoder.drain_blocks().map(block_summary));
        match result {
            Ok(Some(digit)) => {
                digits_total += 1;
                add_digit(&mut detector_stats, &digit);
                if config.include_digits {
                    digits.push(digit);
                }
            }
            Ok(None) => break,
            Err(DecodeError::ConfigurationUnavailable) => {
                return Err(AnalysisError::ConfigurationUnavailable);
            }
            Err(err) => {
                error = Some(err.to_string());
                break;
            }
        }
    }

    // A lenient overrun stops the decoder without an error result.
    if error.is_none() {
        error = decoder.abort_reason().map(|reason| reason.to_string());
    }

    let mut report = make_stub_report(input);
    report.status = if decoder.is_aborted() {
        DecodeStatus::Aborted
    } else {
        DecodeStatus::Complete
    };
    report.error = error;
    report.subsystem = config.subsystem.clone();
    report.time_bins = decoder.provider().time_bin_count();
    report.blocks = blocks;
    report.detectors = build_detector_summaries(detector_stats);
    report.digits_total = digits_total;
    report.digits = config.include_digits.then_some(digits);
    Ok(report)
}

fn configured_time_bins(config: &DecoderConfig) -> Result<FixedTimeBins, AnalysisError> {
    let time_bins = config.time_bins.ok_or(AnalysisError::MissingTimeBins)?;
    if time_bins == 0 {
        return Err(ConfigError::ZeroTimeBins.into());
    }
    let mut param = DigitsParam::new();
    param.set_time_bins(time_bins, &config.reference_time_bins)?;
    Ok(FixedTimeBins(param.time_bins()))
}

fn input_info(path: &Path) -> Result<InputInfo, AnalysisError> {
    Ok(InputInfo {
        path: path.display().to_string(),
        bytes: path.metadata()?.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::{AnalysisError, analyze_source, configured_time_bins};
    use crate::config::{ConfigError, DecoderConfig, FixedTimeBins, SharedTimeBins};
    use crate::protocols::trd::layout;
    use crate::source::BufferSource;
    use crate::{DecodeStatus, InputInfo};

    fn block(detector: u16, pads: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![layout::SYNC_MARKER];
        out.extend_from_slice(&detector.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
        out.extend_from_slice(&pads.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn input() -> InputInfo {
        InputInfo {
            path: "memory".to_string(),
            bytes: 0,
        }
    }

    #[test]
    fn complete_stream_reports_blocks_and_detectors() {
        let mut stream = block(5, 1, &[0x02, 0x03, 0x01, 0x10, 0x00, 0x01, 0x02, 0x20]);
        stream.extend(block(1, 1, &[0x01, 0x01, 0x00, 0x00]));
        let config = DecoderConfig {
            include_digits: true,
            ..DecoderConfig::default()
        };

        let report =
            analyze_source(input(), BufferSource::new(stream), FixedTimeBins(10), &config).unwrap();
        assert_eq!(report.status, DecodeStatus::Complete);
        assert!(report.error.is_none());
        assert_eq!(report.time_bins, Some(10));
        assert_eq!(report.digits_total, 2);
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].detector, 5);
        assert_eq!(report.blocks[1].digits, 0);
        assert_eq!(report.detectors.len(), 1);
        assert_eq!(report.detectors[0].pads, 1);
        assert_eq!(report.detectors[0].max_signal, 0x0220);
        let digits = report.digits.unwrap();
        assert_eq!(digits[1].time_bin, 4);
    }

    #[test]
    fn aborted_stream_keeps_partial_results() {
        let mut stream = block(5, 1, &[0x02, 0x03, 0x01, 0x10]);
        stream.push(0x00);
        let report = analyze_source(
            input(),
            BufferSource::new(stream),
            FixedTimeBins(10),
            &DecoderConfig::default(),
        )
        .unwrap();
        assert_eq!(report.status, DecodeStatus::Aborted);
        assert!(report.error.as_deref().unwrap().contains("wrong flag"));
        assert_eq!(report.digits_total, 1);
        assert!(report.digits.is_none());
    }

    #[test]
    fn missing_provider_fails_analysis() {
        let err = analyze_source(
            input(),
            BufferSource::new(block(1, 1, &[1, 1, 1, 1])),
            SharedTimeBins::unset(),
            &DecoderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigurationUnavailable));
    }

    #[test]
    fn configured_time_bins_checks_reference() {
        let mut config = DecoderConfig::default();
        assert!(matches!(
            configured_time_bins(&config),
            Err(AnalysisError::MissingTimeBins)
        ));

        config.time_bins = Some(24);
        config.reference_time_bins = Some(30);
        assert!(matches!(
            configured_time_bins(&config),
            Err(AnalysisError::Config(ConfigError::TimeBinMismatch { .. }))
        ));

        config.reference_time_bins = Some(24);
        assert_eq!(configured_time_bins(&config).unwrap(), FixedTimeBins(24));
    }
}
