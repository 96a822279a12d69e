//! Top-level analysis entry points
//!
//! Routes container bytes through the TS scanner, the BMFF scanner or the
//! raw-ES path and aggregates the per-stream records into a [`MediaReport`].

pub mod report;

pub use report::{MediaReport, StreamId, StreamReport};

use crate::codec::{CodecKind, EsAnalyzer};
use crate::error::{Error, Result};
use crate::format::bmff::{self, fourcc_str};
use crate::format::mpegts::TsScanner;
use crate::format::{sniff_container, Container, SampleSource};
use tracing::debug;

/// Analyze an input whose container kind is already known.
pub fn analyze(data: &[u8], container: Container) -> Result<MediaReport> {
    match container {
        Container::MpegTs => analyze_ts(data),
        Container::Bmff => analyze_bmff(data),
        Container::RawEs(kind) => analyze_raw_es(data, kind),
        Container::External => Err(Error::invalid_input(
            "Container::External requires analyze_sample_source, not raw byte data",
        )),
    }
}

/// Analyze an input, sniffing the container from its leading bytes.
///
/// A transport stream that yields no programs falls back to the BMFF walk
/// before giving up.
pub fn analyze_auto(data: &[u8]) -> Result<MediaReport> {
    match sniff_container(data) {
        Some(container) => analyze(data, container),
        None => {
            debug!("container sniff inconclusive, probing TS then BMFF");
            match analyze_ts(data) {
                Ok(report) if !report.streams.is_empty() => Ok(report),
                _ => {
                    let report = analyze_bmff(data)?;
                    if report.streams.is_empty() {
                        Err(Error::ContainerUnrecognized)
                    } else {
                        Ok(report)
                    }
                }
            }
        }
    }
}

/// Analyze a transport stream.
pub fn analyze_ts(data: &[u8]) -> Result<MediaReport> {
    let ts = TsScanner::scan(data)?;
    let mut streams = Vec::new();
    for program in &ts.programs {
        for entry in program.streams.values() {
            let type_label = match entry.type_name {
                Some(name) => format!("0x{:02X} {}", entry.stream_type, name),
                None => match entry.codec_hint {
                    Some(hint) => format!("0x{:02X} {}", entry.stream_type, hint),
                    None => format!("0x{:02X}", entry.stream_type),
                },
            };
            streams.push(StreamReport {
                program_number: Some(program.program_number),
                id: StreamId::Pid(entry.pid),
                stream_type: Some(entry.stream_type),
                fourcc: None,
                type_label,
                codec: entry.codec,
                language: entry.language.clone(),
                registration_fourcc: entry.registration,
                max_bitrate: entry.max_bitrate,
                descriptor: entry.descriptor.clone(),
                info: entry.info.clone(),
            });
        }
    }
    Ok(MediaReport {
        container: Container::MpegTs,
        streams,
        warnings: ts.warnings,
    })
}

/// Analyze an ISO BMFF file.
pub fn analyze_bmff(data: &[u8]) -> Result<MediaReport> {
    let bmff = bmff::scanner::scan(data)?;
    let mut streams = Vec::new();
    for track in bmff.tracks {
        let info = match (track.codec, &track.first_sample) {
            (Some(kind), Some(sample)) => {
                let mut analyzer = EsAnalyzer::new(kind);
                analyzer.push(sample);
                analyzer.into_result()
            }
            _ => None,
        };
        let type_label = match track.codec_name {
            Some(name) => format!("{} ({})", fourcc_str(&track.fourcc), name),
            None => fourcc_str(&track.fourcc),
        };
        streams.push(StreamReport {
            program_number: None,
            id: StreamId::Track(track.track_id),
            stream_type: None,
            fourcc: Some(track.fourcc),
            type_label,
            codec: track.codec,
            language: None,
            registration_fourcc: None,
            max_bitrate: None,
            descriptor: None,
            info,
        });
    }
    Ok(MediaReport {
        container: Container::Bmff,
        streams,
        warnings: Vec::new(),
    })
}

/// Analyze a raw elementary stream of a known codec kind.
pub fn analyze_raw_es(data: &[u8], kind: CodecKind) -> Result<MediaReport> {
    let mut analyzer = EsAnalyzer::new(kind);
    analyzer.push(data);
    let info = analyzer.into_result();
    let streams = vec![StreamReport {
        program_number: None,
        id: StreamId::Raw,
        stream_type: None,
        fourcc: None,
        type_label: kind.name().to_string(),
        codec: Some(kind),
        language: None,
        registration_fourcc: None,
        max_bitrate: None,
        descriptor: None,
        info,
    }];
    Ok(MediaReport {
        container: Container::RawEs(kind),
        streams,
        warnings: Vec::new(),
    })
}

/// Analyze samples handed over by an external demuxer.
///
/// Drains the source, parsing the first sample of each AVS track; non-AVS
/// tracks are reported with their fourCC only.
pub fn analyze_sample_source<S: SampleSource>(source: &mut S) -> Result<MediaReport> {
    use std::collections::BTreeMap;

    struct TrackState {
        fourcc: [u8; 4],
        codec: Option<CodecKind>,
        info: Option<crate::codec::AvsInfo>,
    }

    let mut tracks: BTreeMap<u32, TrackState> = BTreeMap::new();
    while let Some(sample) = source.next_sample()? {
        let codec = sample.codec();
        let state = tracks.entry(sample.track_id).or_insert(TrackState {
            fourcc: sample.codec_tag,
            codec,
            info: None,
        });
        if state.info.is_none() {
            if let Some(kind) = codec {
                let mut analyzer = EsAnalyzer::new(kind);
                analyzer.push(&sample.data);
                state.info = analyzer.into_result();
            }
        }
    }

    let streams = tracks
        .into_iter()
        .map(|(track_id, state)| StreamReport {
            program_number: None,
            id: StreamId::Track(track_id),
            stream_type: None,
            fourcc: Some(state.fourcc),
            type_label: fourcc_str(&state.fourcc),
            codec: state.codec,
            language: None,
            registration_fourcc: None,
            max_bitrate: None,
            descriptor: None,
            info: state.info,
        })
        .collect();

    Ok(MediaReport {
        container: Container::External,
        streams,
        warnings: Vec::new(),
    })
}
