//! AVS2 (GB/T 33475.2) sequence-level parser
//!
//! Same dispatch shape as AVS1 with a considerably richer sequence header:
//! reference configuration sets, weight-quantization matrices, tool flags
//! and the multi-view display-extension additions.

pub mod headers;

use crate::codec::bitstream::BitReader;
use crate::codec::info::AvsVideoInfo;
use crate::codec::tables::{self, ChromaFormat, PackingMode, AVS2_COLOR_RANGES};
use crate::codec::{
    start_codes, EXT_ID_SEQUENCE_DISPLAY, START_CODE_EXTENSION, START_CODE_I_PICTURE,
    START_CODE_PB_PICTURE, START_CODE_SEQUENCE,
};
use crate::error::Error;
use headers::{DisplayExtension, SequenceHeader};
use tracing::debug;

/// Scan buffered elementary-stream bytes for AVS2 sequence-level data.
///
/// Returns a record once a picture header terminates the scan, or when
/// `force` is set and a sequence header has been captured.
pub fn probe_es(data: &[u8], force: bool) -> Option<AvsVideoInfo> {
    let mut seq: Option<SequenceHeader> = None;
    let mut display: Option<DisplayExtension> = None;

    for (payload, suffix) in start_codes(data) {
        match suffix {
            START_CODE_SEQUENCE if seq.is_none() => {
                let mut br = BitReader::at_offset(data, payload);
                match headers::parse_sequence_header(&mut br) {
                    Ok(header) => seq = Some(header),
                    Err(Error::Truncated) if !force => return None,
                    Err(e) => {
                        debug!(error = %e, "AVS2 sequence header rejected");
                    }
                }
            }
            START_CODE_EXTENSION if seq.is_some() && display.is_none() => {
                let profile_id = seq.as_ref().map(|s| s.profile_id).unwrap_or_default();
                let mut br = BitReader::at_offset(data, payload);
                match br.read_bits(4) {
                    Ok(ext_id) if ext_id == EXT_ID_SEQUENCE_DISPLAY => {
                        match headers::parse_display_extension(&mut br, profile_id) {
                            Ok(ext) => display = Some(ext),
                            Err(Error::Truncated) if !force => return None,
                            Err(e) => {
                                debug!(error = %e, "AVS2 display extension rejected");
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(_) if !force => return None,
                    Err(_) => {}
                }
            }
            START_CODE_I_PICTURE | START_CODE_PB_PICTURE => {
                if let Some(header) = seq.take() {
                    return Some(build_info(&header, display.as_ref()));
                }
            }
            _ => {}
        }
    }

    if force {
        if let Some(header) = seq {
            return Some(build_info(&header, display.as_ref()));
        }
    }
    None
}

fn build_info(seq: &SequenceHeader, display: Option<&DisplayExtension>) -> AvsVideoInfo {
    let precision = seq.encoding_precision.unwrap_or(seq.sample_precision);
    let depth = tables::bit_depth(precision);
    let (sar, dar) = tables::aspect_ratio(seq.aspect_ratio_code);

    let mut info = AvsVideoInfo {
        generation: "AVS2",
        profile: headers::profile_name(seq.profile_id),
        level: headers::level_name(seq.level_id),
        width: seq.horizontal_size,
        height: seq.vertical_size,
        progressive: seq.progressive_sequence,
        chroma_format: ChromaFormat::from_code(seq.chroma_format),
        luma_bit_depth: depth,
        chroma_bit_depth: depth,
        frame_rate: tables::frame_rate(seq.frame_rate_code),
        bit_rate: seq.bit_rate,
        low_delay: seq.low_delay,
        sar,
        dar,
        video_format: None,
        full_range: None,
        hdr_dynamic_metadata: None,
        color_description: None,
        color_primaries: None,
        transfer_characteristics: None,
        matrix_coefficients: None,
        display_width: None,
        display_height: None,
        packing_mode: None,
    };

    if let Some(ext) = display {
        info.video_format = Some(tables::video_format(ext.video_format));
        info.full_range = Some(ext.full_range);
        info.display_width = Some(ext.display_horizontal_size);
        info.display_height = Some(ext.display_vertical_size);
        if ext.td_mode {
            info.packing_mode = ext.td_packing_code.map(PackingMode::from_avs2_td);
        }
        if let (Some(p), Some(t), Some(m)) = (
            ext.color_primaries,
            ext.transfer_characteristics,
            ext.matrix_coefficients,
        ) {
            info.color_primaries = tables::color_primaries(p, &AVS2_COLOR_RANGES);
            info.transfer_characteristics =
                tables::transfer_characteristics(t, &AVS2_COLOR_RANGES);
            info.matrix_coefficients = tables::matrix_coefficients(m, &AVS2_COLOR_RANGES);
            info.color_description = tables::combined_color_description(p, t, m);
        }
    }

    info
}
