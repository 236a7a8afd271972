//! End-to-end scenarios spanning the scanner, transport-stream parser, PES
//! timestamp decoding, and the video decoder front-end.

use sdrstack_core::context::DspContext;
use sdrstack_core::logging::SignalLogger;
use sdrstack_core::scanner::{self, ScanConfig};
use sdrstack_core::ts::packet::{PACKET_SIZE, SYNC_BYTE};
use sdrstack_core::ts::pmt::StreamType;
use sdrstack_core::ts::TransportStreamParser;
use sdrstack_core::video::decoder::{DecoderState, VideoDecoder, VideoFrontEnd};
use sdrstack_core::video::pes::parse_pes_header;
use sdrstack_core::errors::DecoderError;

fn packet_with_payload(pid: u16, cc: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= PACKET_SIZE - 4);
    let mut packet = vec![0xFFu8; PACKET_SIZE];
    packet[0] = SYNC_BYTE;
    packet[1] = 0x40 | ((pid >> 8) as u8 & 0x1F); // payload_unit_start
    packet[2] = (pid & 0xFF) as u8;
    packet[3] = 0x10 | (cc & 0x0F);
    packet[4..4 + payload.len()].copy_from_slice(payload);
    packet
}

#[test]
fn s1_sync_recovery_after_garbage_bytes() {
    let mut stream = vec![0x00u8; 400];
    let pat_payload = [
        0x00u8, // pointer byte
        0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, 0x00, 0x01, 0xE1, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ];
    stream.extend_from_slice(&packet_with_payload(0x0000, 0, &pat_payload));

    let mut parser = TransportStreamParser::new();
    let parsed_count = parser.parse_stream(&stream);

    assert_eq!(parsed_count, 1);
    assert!(parser.counters().sync_errors >= 400);
}

#[test]
fn s2_minimal_pat_maps_program_to_pmt_pid() {
    let pat_payload = [
        0x00u8, // pointer byte
        0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, 0x00, 0x01, 0xE1, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ];
    let packet = packet_with_payload(0x0000, 0, &pat_payload);

    let mut parser = TransportStreamParser::new();
    parser.parse_packet(&packet).unwrap();

    let pat = parser.get_pat().expect("PAT should be present");
    assert_eq!(pat.transport_stream_id, 1);
    assert_eq!(pat.program_map.get(&1), Some(&0x0100));
}

#[test]
fn s3_pmt_linkage_exposes_video_and_audio_pids() {
    let pat_payload = [
        0x00u8,
        0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, 0x00, 0x01, 0xE1, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ];
    let pmt_payload = [
        0x00u8, // pointer byte
        0x02, 0xB0, 0x17, 0x00, 0x01, 0xC1, 0x00, 0x00, 0xE1, 0x00, 0xF0, 0x00, 0x1B, 0xE1, 0x01,
        0xF0, 0x00, 0x0F, 0xE1, 0x02, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut parser = TransportStreamParser::new();
    parser.parse_packet(&packet_with_payload(0x0000, 0, &pat_payload)).unwrap();
    parser.parse_packet(&packet_with_payload(0x0100, 0, &pmt_payload)).unwrap();

    let pmt = parser.get_pmt(1).expect("PMT should be present");
    let streams: Vec<(StreamType, u16)> = pmt
        .elementary_streams
        .iter()
        .map(|es| (es.stream_type, es.elementary_pid))
        .collect();
    assert_eq!(streams, vec![(StreamType::H264Video, 0x0101), (StreamType::Aac, 0x0102)]);

    assert_eq!(parser.get_video_pids(1), vec![0x0101]);
    assert_eq!(parser.get_audio_pids(1), vec![0x0102]);
}

fn three_tone_iq(fs: f64, n: usize, offsets_hz: &[f64]) -> (Vec<f32>, Vec<f32>) {
    let mut i = vec![0.0f32; n];
    let mut q = vec![0.0f32; n];
    for &offset in offsets_hz {
        for k in 0..n {
            let phase = 2.0 * std::f64::consts::PI * offset * (k as f64) / fs;
            i[k] += phase.cos() as f32;
            q[k] += phase.sin() as f32;
        }
    }
    (i, q)
}

#[test]
fn s4_three_station_scan_finds_all_peaks() {
    let fs = 2_000_000.0;
    let fc = 100_000_000.0;
    let n = 8192;
    let (i, q) = three_tone_iq(fs, n, &[-200_000.0, 0.0, 200_000.0]);

    let config = ScanConfig {
        fft_size: n,
        threshold_db: -200.0,
        auto_threshold: false,
        ..ScanConfig::default()
    };
    let ctx = DspContext::new();
    let mut logger = SignalLogger::default();

    let peaks = scanner::scan(&i, &q, fs, fc, &config, &ctx, &mut logger).unwrap();
    assert!(peaks.len() >= 3, "expected at least 3 peaks, got {}", peaks.len());

    let expected = [99_800_000.0, 100_000_000.0, 100_200_000.0];
    for target in expected {
        assert!(
            peaks.iter().any(|p| (p.frequency_hz - target).abs() < 5_000.0),
            "no peak found near {target} Hz"
        );
    }
}

#[test]
fn s5_close_peaks_merge_under_default_separation() {
    let fs = 2_000_000.0;
    let fc = 100_000_000.0;
    let n = 8192;
    let (i, q) = three_tone_iq(fs, n, &[-20_000.0, 20_000.0]);

    let config = ScanConfig {
        fft_size: n,
        threshold_db: -200.0,
        auto_threshold: false,
        ..ScanConfig::default()
    };
    let ctx = DspContext::new();
    let mut logger = SignalLogger::default();

    let peaks = scanner::scan(&i, &q, fs, fc, &config, &ctx, &mut logger).unwrap();
    assert!(peaks.len() <= 1, "expected close tones to merge, got {} peaks", peaks.len());
}

#[test]
fn s6_large_pts_decodes_without_overflow() {
    let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x80, 0x05];
    data.extend_from_slice(&[0x3E, 0xFF, 0xFF, 0xFF, 0xFF]);

    let header = parse_pes_header(&data).unwrap();
    assert_eq!(header.pts, Some((1u64 << 33) - 1));
}

struct StubDecoder {
    decode_calls: usize,
}

impl VideoDecoder for StubDecoder {
    fn configure(&mut self, _codec: StreamType, _w: u32, _h: u32) -> Result<(), DecoderError> {
        Ok(())
    }
    fn decode(&mut self, _chunk: &[u8]) -> Result<(), DecoderError> {
        self.decode_calls += 1;
        Ok(())
    }
    fn flush(&mut self) -> Result<(), DecoderError> {
        Ok(())
    }
    fn reset(&mut self) -> Result<(), DecoderError> {
        Ok(())
    }
    fn close(&mut self) {}
    fn is_config_supported(&self, _codec: StreamType, _w: u32, _h: u32) -> bool {
        true
    }
}

#[test]
fn s7_decoder_lifecycle_rejects_double_init_and_closes_cleanly() {
    let mut front_end = VideoFrontEnd::new(Box::new(StubDecoder { decode_calls: 0 }));

    front_end.initialize(StreamType::H264Video, 1920, 1080).unwrap();
    let err = front_end.initialize(StreamType::H264Video, 1920, 1080).unwrap_err();
    assert!(matches!(err, DecoderError::AlreadyConfigured));

    front_end.close();
    assert_eq!(front_end.state(), DecoderState::Closed);

    front_end.process_payload(&[0x00, 0x00, 0x00, 0x01, 0x65]).unwrap();
    assert_eq!(front_end.metrics().frames_decoded, 0);
}
