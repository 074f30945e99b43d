use std::collections::{HashMap, HashSet};

use crate::protocols::trd::{BlockRecord, Digit};
use crate::{BlockSummary, DetectorSummary};

#[derive(Debug, Default)]
pub(crate) struct DetectorStats {
    pub digits: u64,
    pub pads: HashSet<(i16, i16)>,
    pub max_signal: u16,
    pub unset_pad_digits: u64,
}

pub(crate) fn add_digit(stats: &mut HashMap<u16, DetectorStats>, digit: &Digit) {
    let entry = stats.entry(digit.detector).or_default();
    entry.digits += 1;
    entry.max_signal = entry.max_signal.max(digit.signal);
    if digit.has_valid_pad() {
        entry.pads.insert((digit.row, digit.column));
    } else {
        entry.unset_pad_digits += 1;
    }
}

pub(crate) fn build_detector_summaries(
    stats: HashMap<u16, DetectorStats>,
) -> Vec<DetectorSummary> {
    let mut summaries: Vec<DetectorSummary> = stats
        .into_iter()
        .map(|(detector, stats)| DetectorSummary {
            detector,
            digits: stats.digits,
            pads: stats.pads.len() as u64,
            max_signal: stats.max_signal,
            unset_pad_digits: stats.unset_pad_digits,
        })
        .collect();
    summaries.sort_by_key(|summary| summary.detector);
    summaries
}

pub(crate) fn block_summary(record: BlockRecord) -> BlockSummary {
    BlockSummary {
        detector: record.header.detector,
        byte_count: record.header.byte_count,
        declared_pads: record.header.pad_count,
        observed_pads: record.pads_addressed,
        digits: record.digits,
        complete: record.complete,
    }
}
