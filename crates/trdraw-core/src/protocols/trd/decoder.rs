use std::collections::VecDeque;

use crate::config::{BoundsPolicy, DEFAULT_SUBSYSTEM, DecoderConfig, TimeBinProvider};
use crate::source::ByteSource;

use super::error::{AbortReason, DecodeError};
use super::layout;
use super::parser::{BlockHeader, BlockRecord, Digit, parse_block_header};
use super::reader::{FieldReader, compose_signal, is_zero_run, pad_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    AwaitBlockHeader,
    InBlock(BlockCursor),
    /// The source ended on a block boundary.
    Finished,
    Aborted(AbortReason),
}

/// Progress through the payload of the active block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockCursor {
    header: BlockHeader,
    remaining: u32,
    time_bin: u32,
    pads_addressed: u32,
    digits: u64,
    /// Set when a lenient read went past the declared block end.
    overrun: Option<&'static str>,
}

impl BlockCursor {
    fn new(header: BlockHeader, time_bins: u32) -> Self {
        // A saturated cursor forces a pad address before the first sample.
        Self {
            header,
            remaining: header.byte_count,
            time_bin: time_bins,
            pads_addressed: 0,
            digits: 0,
            overrun: None,
        }
    }

    fn wants_pad_address(&self, time_bins: u32) -> bool {
        self.time_bin >= time_bins && self.remaining >= layout::MIN_BYTES_FOR_ADDRESS
    }

    fn record(&self, complete: bool) -> BlockRecord {
        BlockRecord {
            header: self.header,
            pads_addressed: self.pads_addressed,
            digits: self.digits,
            complete,
        }
    }
}

enum Step {
    Skipped,
    Emitted(Digit),
}

/// Pull decoder turning a zero-suppressed raw stream into digits.
///
/// The decoder owns its source for the whole pass and cannot be restarted:
/// once the stream is malformed, truncated or the source fails, every later
/// call to [`advance`](Self::advance) reports that no digits remain. A missing
/// time-bin count only fails the call in progress.
///
/// # Examples
/// ```
/// use trdraw_core::{BufferSource, FixedTimeBins, RawStreamDecoder};
///
/// let stream = vec![
///     0xBB, 0x01, 0x00, 0x06, 0x00, 0x00, 0x01, 0x00, // header
///     0x03, 0x04, 0x00, 0x02, 0x81, 0x10, // payload
/// ];
/// let mut decoder = RawStreamDecoder::new(BufferSource::new(stream), FixedTimeBins(5));
/// let digit = decoder.advance()?.unwrap();
/// assert_eq!((digit.row, digit.column, digit.time_bin, digit.signal), (2, 3, 4, 272));
/// assert!(decoder.advance()?.is_none());
/// # Ok::<(), trdraw_core::DecodeError>(())
/// ```
pub struct RawStreamDecoder<S, P> {
    source: S,
    provider: P,
    bounds: BoundsPolicy,
    state: DecoderState,
    detector: Option<u16>,
    prev_detector: Option<u16>,
    row: i16,
    prev_row: i16,
    column: i16,
    prev_column: i16,
    last_digit: Option<Digit>,
    last_block: Option<BlockHeader>,
    blocks_seen: u64,
    finished_blocks: VecDeque<BlockRecord>,
}

impl<S: ByteSource, P: TimeBinProvider> RawStreamDecoder<S, P> {
    /// Create a decoder over the default subsystem with strict block bounds.
    pub fn new(source: S, provider: P) -> Self {
        Self::build(source, provider, DEFAULT_SUBSYSTEM, BoundsPolicy::default())
    }

    pub fn with_config(source: S, provider: P, config: &DecoderConfig) -> Self {
        Self::build(source, provider, &config.subsystem, config.bounds)
    }

    fn build(mut source: S, provider: P, subsystem: &str, bounds: BoundsPolicy) -> Self {
        source.select_subsystem(subsystem);
        Self {
            source,
            provider,
            bounds,
            state: DecoderState::AwaitBlockHeader,
            detector: None,
            prev_detector: None,
            row: layout::UNSET_PAD_INDEX,
            prev_row: layout::UNSET_PAD_INDEX,
            column: layout::UNSET_PAD_INDEX,
            prev_column: layout::UNSET_PAD_INDEX,
            last_digit: None,
            last_block: None,
            blocks_seen: 0,
            finished_blocks: VecDeque::new(),
        }
    }

    /// Decode the next digit.
    ///
    /// `Ok(None)` means no digits remain, either because the source ended on
    /// a block boundary or because an earlier call failed fatally.
    ///
    /// # Errors
    /// The first fatal stream condition is returned once and aborts the
    /// decoder; `DecodeError::ConfigurationUnavailable` is returned on every
    /// call made while the provider has no time-bin count, without consuming
    /// any bytes.
    pub fn advance(&mut self) -> Result<Option<Digit>, DecodeError> {
        if self.is_terminated() {
            return Ok(None);
        }

        self.prev_detector = self.detector;
        self.prev_row = self.row;
        self.prev_column = self.column;

        let Some(time_bins) = self.provider.time_bin_count() else {
            log::warn!("number of time bins unavailable, cannot decode");
            return Err(DecodeError::ConfigurationUnavailable);
        };

        self.decode_next(time_bins).inspect_err(|err| {
            if let Some(reason) = err.abort_reason() {
                log::error!("{err}");
                self.abort(reason);
            }
        })
    }

    fn decode_next(&mut self, time_bins: u32) -> Result<Option<Digit>, DecodeError> {
        loop {
            let mut block = match self.state {
                DecoderState::InBlock(block) => block,
                DecoderState::AwaitBlockHeader => match self.read_block_header(time_bins)? {
                    Some(block) => block,
                    None => {
                        log::debug!("end of stream after {} blocks", self.blocks_seen);
                        self.state = DecoderState::Finished;
                        return Ok(None);
                    }
                },
                DecoderState::Finished | DecoderState::Aborted(_) => return Ok(None),
            };

            if block.remaining == 0 {
                self.finished_blocks.push_back(block.record(true));
                self.state = DecoderState::AwaitBlockHeader;
                continue;
            }

            let result = self.step(&mut block, time_bins);
            self.state = DecoderState::InBlock(block);
            let step = result?;

            if let Some(field) = block.overrun {
                return match step {
                    Step::Emitted(digit) => {
                        log::warn!(
                            "detector {}: {field} read past the declared block end",
                            block.header.detector
                        );
                        self.abort(AbortReason::BlockOverrun { field });
                        Ok(Some(digit))
                    }
                    Step::Skipped => Err(DecodeError::BlockOverrun { field }),
                };
            }

            match step {
                Step::Skipped => continue,
                Step::Emitted(digit) => return Ok(Some(digit)),
            }
        }
    }

    fn read_block_header(&mut self, time_bins: u32) -> Result<Option<BlockCursor>, DecodeError> {
        let mut reader = FieldReader::new(&mut self.source);
        let Some(header) = parse_block_header(&mut reader)? else {
            return Ok(None);
        };

        log::debug!(
            "detector {}: {} bytes, {} active pads",
            header.detector,
            header.byte_count,
            header.pad_count
        );
        self.detector = Some(header.detector);
        self.last_block = Some(header);
        self.blocks_seen += 1;

        let block = BlockCursor::new(header, time_bins);
        self.state = DecoderState::InBlock(block);
        Ok(Some(block))
    }

    fn step(&mut self, block: &mut BlockCursor, time_bins: u32) -> Result<Step, DecodeError> {
        if block.wants_pad_address(time_bins) {
            self.read_pad_address(block)?;
        }

        let data = self.consume(block, "data")?;
        if is_zero_run(data) {
            let run = self.consume(block, "time value")?;
            block.time_bin = block.time_bin.saturating_add(u32::from(run) + 1);
            return Ok(Step::Skipped);
        }

        let low = self.consume(block, "ADC value")?;
        block.time_bin = block.time_bin.saturating_add(1);
        block.digits += 1;

        let digit = Digit {
            detector: block.header.detector,
            row: self.row,
            column: self.column,
            time_bin: block.time_bin,
            signal: compose_signal(data, low),
        };
        self.last_digit = Some(digit);
        Ok(Step::Emitted(digit))
    }

    fn read_pad_address(&mut self, block: &mut BlockCursor) -> Result<(), DecodeError> {
        let row = self.consume(block, "row number")?;
        self.row = pad_index(row);
        let column = self.consume(block, "column number")?;
        self.column = pad_index(column);
        block.time_bin = 0;
        block.pads_addressed += 1;

        if self.row == layout::UNSET_PAD_INDEX || self.column == layout::UNSET_PAD_INDEX {
            log::warn!(
                "detector {}: pad address without channel (row {}, column {})",
                block.header.detector,
                self.row,
                self.column
            );
        }
        if block.pads_addressed == u32::from(block.header.pad_count) + 1 {
            log::warn!(
                "detector {}: more pads addressed than the {} declared",
                block.header.detector,
                block.header.pad_count
            );
        }
        Ok(())
    }

    fn consume(&mut self, block: &mut BlockCursor, field: &'static str) -> Result<u8, DecodeError> {
        match block.remaining.checked_sub(1) {
            Some(rest) => block.remaining = rest,
            None => match self.bounds {
                BoundsPolicy::Strict => return Err(DecodeError::BlockOverrun { field }),
                BoundsPolicy::Lenient => block.overrun = Some(field),
            },
        }
        FieldReader::new(&mut self.source).read_u8(field)
    }

    fn abort(&mut self, reason: AbortReason) {
        if let DecoderState::InBlock(block) = self.state {
            self.finished_blocks.push_back(block.record(false));
        }
        self.state = DecoderState::Aborted(reason);
    }
}

impl<S, P> RawStreamDecoder<S, P> {
    pub fn detector(&self) -> Option<u16> {
        self.detector
    }

    pub fn row(&self) -> i16 {
        self.row
    }

    pub fn column(&self) -> i16 {
        self.column
    }

    /// Time bin of the last emitted digit.
    pub fn time_bin(&self) -> Option<u32> {
        self.last_digit.map(|digit| digit.time_bin)
    }

    /// Signal of the last emitted digit.
    pub fn signal(&self) -> Option<u16> {
        self.last_digit.map(|digit| digit.signal)
    }

    /// Header of the most recently entered block.
    pub fn block(&self) -> Option<&BlockHeader> {
        self.last_block.as_ref()
    }

    pub fn blocks_seen(&self) -> u64 {
        self.blocks_seen
    }

    pub fn is_new_detector(&self) -> bool {
        self.detector != self.prev_detector
    }

    pub fn is_new_row(&self) -> bool {
        self.row != self.prev_row
    }

    pub fn is_new_column(&self) -> bool {
        self.column != self.prev_column
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, DecoderState::Aborted(_))
    }

    /// True once the source ended cleanly on a block boundary.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, DecoderState::Finished)
    }

    pub fn is_terminated(&self) -> bool {
        self.is_aborted() || self.is_finished()
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self.state {
            DecoderState::Aborted(reason) => Some(reason),
            _ => None,
        }
    }

    /// Records of the blocks left since the last call, in stream order.
    pub fn drain_blocks(&mut self) -> impl Iterator<Item = BlockRecord> + '_ {
        self.finished_blocks.drain(..)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Iteration stops after the end of the stream or the first fatal error.
/// While the provider is unavailable every call yields that error again.
impl<S: ByteSource, P: TimeBinProvider> Iterator for RawStreamDecoder<S, P> {
    type Item = Result<Digit, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
