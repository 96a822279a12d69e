//! Integration tests for the ISO BMFF scanner and the probe entry points

mod common;

use avsprobe_lib::codec::{AvsInfo, CodecKind};
use avsprobe_lib::format::bmff::{self, BmffScanner};
use avsprobe_lib::format::{Container, ExternalSample, VecSampleSource};
use avsprobe_lib::{probe, Error};
use common::{
    assemble_es, avs2_sequence_header, avs3_sequence_header, bmff_single_track, VideoParams,
};

fn avs3_es() -> Vec<u8> {
    assemble_es(&[(0xB0, avs3_sequence_header(&VideoParams::hd25()))])
}

/// An avs3 track is enumerated, its first sample extracted and parsed
#[test]
fn test_avs3_track_end_to_end() {
    let file = bmff_single_track(b"avs3", b"vide", &avs3_es());
    let report = probe::analyze(&file, Container::Bmff).unwrap();

    assert_eq!(report.streams.len(), 1);
    let stream = &report.streams[0];
    assert_eq!(stream.fourcc, Some(*b"avs3"));
    assert_eq!(stream.codec, Some(CodecKind::Avs3Video));
    let info = match stream.info.as_ref().expect("sample should parse") {
        AvsInfo::Video(video) => video,
        AvsInfo::Audio(_) => panic!("expected video info"),
    };
    assert_eq!(info.generation, "AVS3");
    assert_eq!(info.width, 1920);
    assert_eq!(info.height, 1080);
}

/// avst maps to AVS2
#[test]
fn test_avst_track_maps_to_avs2() {
    let es = assemble_es(&[(0xB0, avs2_sequence_header(&VideoParams::hd25()))]);
    let file = bmff_single_track(b"avst", b"vide", &es);
    let report = probe::analyze(&file, Container::Bmff).unwrap();

    let stream = &report.streams[0];
    assert_eq!(stream.codec, Some(CodecKind::Avs2));
    let info = match stream.info.as_ref().unwrap() {
        AvsInfo::Video(video) => video,
        AvsInfo::Audio(_) => panic!("expected video info"),
    };
    assert_eq!(info.generation, "AVS2");
}

/// av3a forces the audio track type even when the container claims video
#[test]
fn test_av3a_track_type_corrected_from_fourcc() {
    let file = bmff_single_track(b"av3a", b"vide", &common::aatf_stereo_frame());
    let scan = bmff::scanner::scan(&file).unwrap();

    assert_eq!(scan.tracks.len(), 1);
    let track = &scan.tracks[0];
    assert_eq!(track.codec, Some(CodecKind::Av3aAudio));
    assert!(!track.is_video, "fourCC must override the handler claim");
    assert_eq!(&track.handler, b"vide");

    let report = probe::analyze(&file, Container::Bmff).unwrap();
    let info = match report.streams[0].info.as_ref().unwrap() {
        AvsInfo::Audio(audio) => audio,
        AvsInfo::Video(_) => panic!("expected audio info"),
    };
    assert_eq!(info.sampling_frequency, 48000);
    assert_eq!(info.channel_number, Some(2));
}

/// Non-AVS tracks are labelled but not parsed
#[test]
fn test_foreign_track_reported_without_info() {
    let file = bmff_single_track(b"hvc1", b"vide", &[0x00, 0x00, 0x01, 0x40]);
    let report = probe::analyze(&file, Container::Bmff).unwrap();

    let stream = &report.streams[0];
    assert_eq!(stream.codec, None);
    assert!(stream.info.is_none());
    assert!(stream.type_label.contains("H.265"));

    match report.require_avs() {
        Err(Error::NoAvsContent(observed)) => {
            assert_eq!(observed, vec!["hvc1".to_string()]);
        }
        other => panic!("expected NoAvsContent, got {:?}", other.map(|_| ())),
    }
}

/// The incremental scanner asks for more data until the moov completes
#[test]
fn test_incremental_scan_waits_for_moov() {
    let file = bmff_single_track(b"avs3", b"vide", &avs3_es());
    let cut = file.len() / 2;

    let mut scanner = BmffScanner::new();
    assert!(scanner.push(&file[..cut]).unwrap().is_none());
    let report = scanner
        .push(&file[cut..])
        .unwrap()
        .expect("complete file should scan");
    assert_eq!(report.tracks.len(), 1);
}

/// A truncated buffer fails with the retryable error kind
#[test]
fn test_truncated_scan_is_retryable() {
    let file = bmff_single_track(b"avs3", b"vide", &avs3_es());
    let err = bmff::scanner::scan(&file[..file.len() / 2]).unwrap_err();
    assert!(err.is_retryable());
}

/// Auto-detection routes BMFF files by the ftyp magic
#[test]
fn test_analyze_auto_routes_bmff() {
    let file = bmff_single_track(b"avs3", b"vide", &avs3_es());
    let report = probe::analyze_auto(&file).unwrap();
    assert_eq!(report.container, Container::Bmff);
    assert!(report.streams[0].info.is_some());
}

/// External sample sources reach the same codec parsers
#[test]
fn test_sample_source_avs_tracks() {
    let mut source = VecSampleSource::new(vec![
        ExternalSample {
            track_id: 1,
            codec_tag: *b"avs3",
            data: avs3_es(),
        },
        ExternalSample {
            track_id: 2,
            codec_tag: *b"av3a",
            data: common::aatf_stereo_frame(),
        },
    ]);
    let report = probe::analyze_sample_source(&mut source).unwrap();

    assert_eq!(report.streams.len(), 2);
    let video = report
        .streams
        .iter()
        .find(|s| s.fourcc == Some(*b"avs3"))
        .unwrap();
    assert!(matches!(video.info, Some(AvsInfo::Video(_))));
    let audio = report
        .streams
        .iter()
        .find(|s| s.fourcc == Some(*b"av3a"))
        .unwrap();
    assert!(matches!(audio.info, Some(AvsInfo::Audio(_))));
}

/// Raw elementary-stream inputs skip container handling entirely
#[test]
fn test_raw_es_analysis() {
    let report = probe::analyze(&avs3_es(), Container::RawEs(CodecKind::Avs3Video)).unwrap();
    assert_eq!(report.streams.len(), 1);
    let info = match report.streams[0].info.as_ref().unwrap() {
        AvsInfo::Video(video) => video,
        AvsInfo::Audio(_) => panic!("expected video info"),
    };
    assert_eq!(info.width, 1920);
}
