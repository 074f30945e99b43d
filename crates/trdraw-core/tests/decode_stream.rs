use std::io::Cursor;

use trdraw_core::{
    AbortReason, BlockHeader, BufferSource, ContainerSource, DecodeError, DecoderConfig, Digit,
    FixedTimeBins, RawStreamDecoder, SharedTimeBins, analyze_payload_file, encode_block_header,
    encode_record,
};

fn block(detector: u16, pad_count: u16, body: &[u8]) -> Vec<u8> {
    let mut out = encode_block_header(&BlockHeader {
        detector,
        byte_count: body.len() as u32,
        pad_count,
    })
    .to_vec();
    out.extend_from_slice(body);
    out
}

#[test]
fn documented_block_decodes_to_one_digit() {
    let stream = block(1, 1, &[0x03, 0x04, 0x00, 0x02, 0x81, 0x10]);
    let mut decoder = RawStreamDecoder::new(BufferSource::new(stream), FixedTimeBins(5));

    let digit = decoder.advance().unwrap().unwrap();
    assert_eq!(
        digit,
        Digit {
            detector: 1,
            row: 2,
            column: 3,
            time_bin: 4,
            signal: 272,
        }
    );
    assert!(decoder.is_new_detector());
    assert!(decoder.advance().unwrap().is_none());
    assert!(decoder.is_finished());
}

#[test]
fn short_block_emits_digit_before_truncation() {
    let mut stream = encode_block_header(&BlockHeader {
        detector: 1,
        byte_count: 7,
        pad_count: 1,
    })
    .to_vec();
    stream.extend_from_slice(&[0x03, 0x04, 0x00, 0x02, 0x81, 0x10]);
    let mut decoder = RawStreamDecoder::new(BufferSource::new(stream), FixedTimeBins(5));

    assert_eq!(decoder.advance().unwrap().unwrap().signal, 272);
    let err = decoder.advance().unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput { field: "data" }));
    assert_eq!(
        decoder.abort_reason(),
        Some(AbortReason::TruncatedInput { field: "data" })
    );
}

#[test]
fn termination_is_idempotent() {
    let mut decoder =
        RawStreamDecoder::new(BufferSource::new(vec![0xAA, 0x01]), FixedTimeBins(5));
    assert!(decoder.advance().is_err());
    for _ in 0..3 {
        assert!(decoder.advance().unwrap().is_none());
    }
    assert!(decoder.is_aborted());
}

#[test]
fn container_records_feed_the_decoder() {
    let payload = block(12, 1, &[0x01, 0x01, 0x01, 0x00, 0x02, 0x00]);
    let (first, second) = payload.split_at(5);
    let mut data = encode_record("TRD", first);
    data.extend(encode_record("TOF", &[0xBB; 8]));
    data.extend(encode_record("TRD", second));

    let decoder = RawStreamDecoder::new(ContainerSource::new(Cursor::new(data)), FixedTimeBins(4));
    let digits: Vec<Digit> = decoder.collect::<Result<_, _>>().unwrap();
    let signals: Vec<u16> = digits.iter().map(|d| d.signal).collect();
    assert_eq!(signals, vec![0x0100, 0x0200]);
    assert!(digits.iter().all(|d| d.detector == 12 && d.row == 0));
}

#[test]
fn shared_time_bins_can_arrive_late() {
    let time_bins = SharedTimeBins::unset();
    let stream = block(2, 1, &[0x01, 0x01, 0x01, 0x05]);
    let mut decoder = RawStreamDecoder::new(BufferSource::new(stream), time_bins.clone());

    assert!(matches!(
        decoder.advance(),
        Err(DecodeError::ConfigurationUnavailable)
    ));
    assert!(!decoder.is_terminated());

    time_bins.set(3);
    assert_eq!(decoder.advance().unwrap().unwrap().signal, 0x0105);
}

#[test]
fn payload_file_is_decoded_without_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("payload.bin");
    let mut stream = block(4, 1, &[0x02, 0x02, 0x7F, 0xFF]);
    stream.extend(block(4, 0, &[]));
    std::fs::write(&path, &stream).expect("write payload");

    let config = DecoderConfig {
        time_bins: Some(8),
        include_digits: true,
        ..DecoderConfig::default()
    };
    let report = analyze_payload_file(&path, &config).unwrap();
    assert_eq!(report.input.bytes, stream.len() as u64);
    assert_eq!(report.blocks.len(), 2);
    assert_eq!(report.detectors[0].max_signal, 0x7FFF);
    assert_eq!(report.digits.unwrap()[0].row, 1);
}
