//! Integration tests for the MPEG-TS scanner: packet-size detection, PSI
//! discovery, PES reassembly and early termination.

mod common;

use avsprobe_lib::codec::{AvsInfo, CodecKind};
use avsprobe_lib::format::mpegts::demuxer::TsReport;
use avsprobe_lib::format::mpegts::{ScanStatus, TsScanner};
use common::{
    assemble_es, avs3_sequence_header, m2ts_wrap, null_packet, packetize_pes, pat_packet,
    pes_from_es, pmt_packet, ts_packet, VideoParams,
};

const PMT_PID: u16 = 0x0100;
const VIDEO_PID: u16 = 0x0101;
const AUDIO_PID: u16 = 0x0102;

fn avs3_es() -> Vec<u8> {
    assemble_es(&[(0xB0, avs3_sequence_header(&VideoParams::hd25()))])
}

/// AVS3 video descriptor block matching the in-band header
fn avs3_descriptor_block() -> Vec<u8> {
    vec![
        0xD1, 0x08, // tag, length
        0x20, 0x22, // profile, level
        0b0_0011_001u8, // frc=3, precision=1
        0b01_000000u8,  // chroma=4:2:0
        1, 1, 1, 0, // primaries, transfer, matrix, reserved
    ]
}

/// Small PES that only exists to finalize the previous buffer on its PID
fn terminator_packet(pid: u16, stream_id: u8, cc: u8) -> Vec<u8> {
    let pes = pes_from_es(stream_id, &[0x00, 0x00, 0x01, 0xB1, 0xFF, 0xFF]);
    ts_packet(pid, true, cc, &pes)
}

fn avs3_program_packets(pes_chunk_size: usize) -> Vec<Vec<u8>> {
    let pes = pes_from_es(0xE0, &avs3_es());
    let mut packets = vec![
        pat_packet(1, PMT_PID),
        pmt_packet(PMT_PID, 1, &[(0xD4, VIDEO_PID, avs3_descriptor_block())]),
    ];
    packets.extend(packetize_pes(VIDEO_PID, &pes, pes_chunk_size, 0));
    let cc = packets.len() as u8;
    packets.push(terminator_packet(VIDEO_PID, 0xE0, cc));
    packets
}

fn assert_scenario_report(report: &TsReport) {
    assert_eq!(report.programs.len(), 1);
    let program = &report.programs[0];
    assert_eq!(program.program_number, 1);
    assert_eq!(program.pmt_pid, PMT_PID);
    assert_eq!(program.streams.len(), 1);

    let stream = program.streams.get(&VIDEO_PID).expect("video stream");
    assert_eq!(stream.stream_type, 0xD4);
    assert_eq!(stream.codec, Some(CodecKind::Avs3Video));

    let info = match stream.info.as_ref().expect("in-band info") {
        AvsInfo::Video(video) => video,
        AvsInfo::Audio(_) => panic!("expected video info"),
    };
    assert_eq!(info.generation, "AVS3");
    assert_eq!(info.width, 1920);
    assert_eq!(info.height, 1080);
    assert_eq!(info.frame_rate, 25.0);
    assert!(info.progressive);
    assert!(!info.low_delay);

    // descriptor and in-band info coexist and agree on overlapping fields
    let descriptor = stream
        .descriptor
        .as_ref()
        .and_then(|d| d.as_video())
        .expect("AVS3 video descriptor");
    assert_eq!(descriptor.profile, info.profile);
    assert_eq!(descriptor.level, info.level);
    assert_eq!(descriptor.frame_rate, info.frame_rate);
    assert_eq!(descriptor.chroma_format, info.chroma_format);
    assert_eq!(descriptor.bit_depth, info.luma_bit_depth);
}

/// One program with an in-band AVS3 sequence header in its first PES
#[test]
fn test_single_program_avs3_detection() {
    let packets = avs3_program_packets(184);
    let data: Vec<u8> = packets.concat();

    let report = TsScanner::scan(&data).unwrap();
    assert_eq!(report.packet_size, 188);
    assert_eq!(report.start_offset, 0);
    assert_scenario_report(&report);
}

/// Zero packets are parsed after the early-termination condition is met
#[test]
fn test_early_termination_stops_packet_parsing() {
    let mut packets = avs3_program_packets(184);
    let detection_packets = packets.len() as u64;
    for _ in 0..40 {
        packets.push(null_packet());
    }
    let data: Vec<u8> = packets.concat();

    let mut scanner = TsScanner::new();
    let status = scanner.push(&data).unwrap();
    assert_eq!(status, ScanStatus::Complete);
    assert_eq!(scanner.packets_processed(), detection_packets);

    // further input is ignored entirely
    let more: Vec<u8> = (0..10).map(|_| null_packet()).collect::<Vec<_>>().concat();
    assert_eq!(scanner.push(&more).unwrap(), ScanStatus::Complete);
    assert_eq!(scanner.packets_processed(), detection_packets);

    let report = scanner.finish().unwrap();
    assert_scenario_report(&report);
}

/// Splitting the same PES across different packet boundaries yields the
/// same reassembled result
#[test]
fn test_pes_reassembly_split_invariance() {
    let mut reference: Option<(u32, u32, f64, String)> = None;
    for chunk_size in [184usize, 100, 27, 5] {
        let packets = avs3_program_packets(chunk_size);
        let data: Vec<u8> = packets.concat();
        let report = TsScanner::scan(&data).unwrap();
        let stream = &report.programs[0].streams[&VIDEO_PID];
        let info = match stream.info.as_ref().expect("info for every split") {
            AvsInfo::Video(video) => video,
            AvsInfo::Audio(_) => panic!("expected video info"),
        };
        let key = (
            info.width,
            info.height,
            info.frame_rate,
            info.profile.clone(),
        );
        match &reference {
            None => reference = Some(key),
            Some(expected) => assert_eq!(&key, expected, "chunk size {}", chunk_size),
        }
    }
}

/// Detection works when the PES precedes the PMT (backlog replay)
#[test]
fn test_pes_before_pmt_is_replayed() {
    let pes = pes_from_es(0xE0, &avs3_es());
    let mut packets = vec![pat_packet(1, PMT_PID)];
    packets.extend(packetize_pes(VIDEO_PID, &pes, 184, 0));
    packets.push(terminator_packet(VIDEO_PID, 0xE0, 9));
    packets.push(pmt_packet(PMT_PID, 1, &[(0xD4, VIDEO_PID, vec![])]));
    let data: Vec<u8> = packets.concat();

    let report = TsScanner::scan(&data).unwrap();
    let stream = &report.programs[0].streams[&VIDEO_PID];
    assert!(stream.info.is_some(), "backlogged PES should be replayed");
}

/// A 188-byte stream prefixed by garbage reports the sync offset
#[test]
fn test_packet_detection_with_leading_garbage() {
    let garbage = [0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55];
    let packets = avs3_program_packets(184);
    let mut data = garbage.to_vec();
    data.extend(packets.concat());

    let report = TsScanner::scan(&data).unwrap();
    assert_eq!(report.packet_size, 188);
    assert_eq!(report.start_offset, garbage.len());
    assert_scenario_report(&report);
}

/// M2TS (192-byte packets) carrying Audio Vivid
#[test]
fn test_m2ts_av3a_detection() {
    let pes = pes_from_es(0xC0, &common::aatf_stereo_frame());
    let mut packets = vec![
        pat_packet(1, PMT_PID),
        pmt_packet(PMT_PID, 1, &[(0xD5, AUDIO_PID, vec![])]),
    ];
    packets.extend(packetize_pes(AUDIO_PID, &pes, 184, 0));
    packets.push(terminator_packet(AUDIO_PID, 0xC0, 5));
    while packets.len() < 25 {
        packets.push(null_packet());
    }
    let data = m2ts_wrap(&packets);

    let report = TsScanner::scan(&data).unwrap();
    assert_eq!(report.packet_size, 192);
    assert_eq!(report.start_offset, 0);

    let stream = &report.programs[0].streams[&AUDIO_PID];
    assert_eq!(stream.stream_type, 0xD5);
    assert_eq!(stream.codec, Some(CodecKind::Av3aAudio));
    let info = match stream.info.as_ref().expect("audio info") {
        AvsInfo::Audio(audio) => audio,
        AvsInfo::Video(_) => panic!("expected audio info"),
    };
    assert_eq!(info.sampling_frequency, 48000);
    assert_eq!(info.channel_number, Some(2));
    assert_eq!(info.resolution, 16);
    assert_eq!(info.bit_rate, Some(144_000));
}

/// A duplicate PMT is skipped silently and does not duplicate streams
#[test]
fn test_duplicate_pmt_suppressed() {
    let pes = pes_from_es(0xE0, &avs3_es());
    let mut packets = vec![
        pat_packet(1, PMT_PID),
        pmt_packet(PMT_PID, 1, &[(0xD4, VIDEO_PID, vec![])]),
        pmt_packet(PMT_PID, 1, &[(0xD4, VIDEO_PID, vec![])]),
    ];
    packets.extend(packetize_pes(VIDEO_PID, &pes, 184, 0));
    packets.push(terminator_packet(VIDEO_PID, 0xE0, 9));
    let data: Vec<u8> = packets.concat();

    let report = TsScanner::scan(&data).unwrap();
    assert_eq!(report.programs.len(), 1);
    assert_eq!(report.programs[0].streams.len(), 1);
    assert!(report.programs[0].streams[&VIDEO_PID].info.is_some());
}

/// Unstructured data containing a sync byte falls back to 188 with a warning
#[test]
fn test_unrecognized_structure_warns_and_defaults() {
    let data = vec![0x47u8; 64];
    let report = TsScanner::scan(&data).unwrap();
    assert_eq!(report.packet_size, 188);
    assert!(!report.warnings.is_empty());
    assert!(report.programs.is_empty());
}

/// A program carrying only non-AVS streams terminates without detection
#[test]
fn test_non_avs_program_terminates_immediately() {
    let mut packets = vec![
        pat_packet(1, PMT_PID),
        pmt_packet(PMT_PID, 1, &[(0x1B, VIDEO_PID, vec![]), (0x0F, AUDIO_PID, vec![])]),
    ];
    let detection_packets = packets.len() as u64;
    for _ in 0..30 {
        packets.push(null_packet());
    }
    let data: Vec<u8> = packets.concat();

    let mut scanner = TsScanner::new();
    assert_eq!(scanner.push(&data).unwrap(), ScanStatus::Complete);
    assert_eq!(scanner.packets_processed(), detection_packets);

    let report = scanner.finish().unwrap();
    let program = &report.programs[0];
    assert_eq!(program.streams.len(), 2);
    assert!(program.streams.values().all(|s| s.codec.is_none()));
    assert!(program.streams.values().all(|s| s.info.is_none()));
}

/// The packet budget stops a fast scan once a program and stream exist
#[test]
fn test_packet_budget_fast_scan() {
    // the announced AVS stream never yields a sequence header, so only the
    // budget can stop the scan before end of input
    let garbage_pes = pes_from_es(0xE0, &[0xAAu8; 64]);
    let mut packets = vec![
        pat_packet(1, PMT_PID),
        pmt_packet(PMT_PID, 1, &[(0xD4, VIDEO_PID, vec![])]),
    ];
    let mut cc = 0u8;
    for _ in 0..40 {
        packets.extend(packetize_pes(VIDEO_PID, &garbage_pes, 184, cc));
        cc = cc.wrapping_add(1);
    }
    let data: Vec<u8> = packets.concat();

    let mut scanner = TsScanner::new().with_packet_budget(8);
    let status = scanner.push(&data).unwrap();
    assert_eq!(status, ScanStatus::Complete);
    assert_eq!(scanner.packets_processed(), 8);

    let report = scanner.finish().unwrap();
    assert_eq!(report.programs.len(), 1);
}
