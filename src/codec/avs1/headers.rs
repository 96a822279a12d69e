//! AVS1 (GB/T 20090.2) sequence-level syntax parsing

use crate::codec::bitstream::BitReader;
use crate::error::Result;

/// Broadcasting profile (AVS+, GY/T 257)
pub const PROFILE_GUANGBO: u8 = 0x48;
/// Shenzhan (extended) profile
pub const PROFILE_SHENZHAN: u8 = 0x24;
/// Jizhun (baseline) profile
pub const PROFILE_JIZHUN: u8 = 0x20;

/// Parsed AVS1 sequence header (start code 0xB0)
#[derive(Debug, Clone)]
pub struct SequenceHeader {
    pub profile_id: u8,
    pub level_id: u8,
    pub progressive_sequence: bool,
    pub horizontal_size: u32,
    pub vertical_size: u32,
    pub chroma_format: u32,
    pub sample_precision: u32,
    pub aspect_ratio_code: u32,
    pub frame_rate_code: u32,
    /// Combined bit rate in bits per second ((upper<<18 | lower) * 400)
    pub bit_rate: u64,
    pub low_delay: bool,
    pub bbv_buffer_size: u32,
    /// Shenzhan-profile scene fields
    pub scene: Option<SceneFields>,
}

/// Shenzhan-profile additions to the sequence header
#[derive(Debug, Clone)]
pub struct SceneFields {
    pub background_picture_disable: bool,
    pub core_picture_disable: bool,
    pub core_picture_buffer_size: Option<u32>,
    pub slice_set_disable: bool,
    pub scene_model: u32,
}

/// Parsed AVS1 sequence display extension (ext id 0b0010)
#[derive(Debug, Clone, Default)]
pub struct DisplayExtension {
    pub video_format: u32,
    pub full_range: bool,
    /// Raw colour codes; present only when `colour_description` was set
    pub color_primaries: Option<u32>,
    pub transfer_characteristics: Option<u32>,
    pub matrix_coefficients: Option<u32>,
    pub display_horizontal_size: u32,
    pub display_vertical_size: u32,
    pub packing_code: u32,
}

/// Parse the sequence header body (reader positioned after 00 00 01 B0).
pub fn parse_sequence_header(br: &mut BitReader) -> Result<SequenceHeader> {
    let profile_id = br.read_bits(8)? as u8;
    let level_id = br.read_bits(8)? as u8;
    let progressive_sequence = br.read_boolean()?;
    let horizontal_size = br.read_bits(14)?;
    let vertical_size = br.read_bits(14)?;
    let chroma_format = br.read_bits(2)?;
    let sample_precision = br.read_bits(3)?;
    let aspect_ratio_code = br.read_bits(4)?;
    let frame_rate_code = br.read_bits(4)?;
    let bit_rate_lower = br.read_bits(18)?;
    br.check_marker_bit()?;
    let bit_rate_upper = br.read_bits(12)?;
    let low_delay = br.read_boolean()?;
    br.check_marker_bit()?;
    let bbv_buffer_size = br.read_bits(18)?;

    let scene = if profile_id == PROFILE_SHENZHAN {
        let background_picture_disable = br.read_boolean()?;
        let core_picture_disable = br.read_boolean()?;
        let core_picture_buffer_size = if !core_picture_disable {
            Some(br.read_bits(4)?)
        } else {
            None
        };
        let slice_set_disable = br.read_boolean()?;
        br.check_marker_bit()?;
        let scene_model = br.read_bits(4)?;
        if core_picture_disable {
            br.skip_bits(5);
        } else {
            br.skip_bits(3);
        }
        Some(SceneFields {
            background_picture_disable,
            core_picture_disable,
            core_picture_buffer_size,
            slice_set_disable,
            scene_model,
        })
    } else {
        br.skip_bits(3);
        None
    };

    let bit_rate = (((bit_rate_upper as u64) << 18) | bit_rate_lower as u64) * 400;

    Ok(SequenceHeader {
        profile_id,
        level_id,
        progressive_sequence,
        horizontal_size,
        vertical_size,
        chroma_format,
        sample_precision,
        aspect_ratio_code,
        frame_rate_code,
        bit_rate,
        low_delay,
        bbv_buffer_size,
        scene,
    })
}

/// Parse the sequence display extension body (reader positioned after the
/// 4-bit extension id).
pub fn parse_display_extension(br: &mut BitReader) -> Result<DisplayExtension> {
    let video_format = br.read_bits(3)?;
    let full_range = br.read_boolean()?;
    let colour_description = br.read_boolean()?;
    let (color_primaries, transfer_characteristics, matrix_coefficients) = if colour_description {
        (
            Some(br.read_bits(8)?),
            Some(br.read_bits(8)?),
            Some(br.read_bits(8)?),
        )
    } else {
        (None, None, None)
    };
    let display_horizontal_size = br.read_bits(14)?;
    br.check_marker_bit()?;
    let display_vertical_size = br.read_bits(14)?;
    let packing_code = br.read_bits(2)?;

    Ok(DisplayExtension {
        video_format,
        full_range,
        color_primaries,
        transfer_characteristics,
        matrix_coefficients,
        display_horizontal_size,
        display_vertical_size,
        packing_code,
    })
}

/// Profile name for an AVS1 `profile_id`
pub fn profile_name(profile_id: u8) -> String {
    match profile_id {
        PROFILE_JIZHUN => "Jizhun".to_string(),
        PROFILE_SHENZHAN => "Shenzhan".to_string(),
        0x28 => "Yidong".to_string(),
        PROFILE_GUANGBO => "Guangbo (Broadcasting)".to_string(),
        other => format!("Unknown (0x{:02X})", other),
    }
}

/// Level name for an AVS1 `level_id`
pub fn level_name(level_id: u8) -> String {
    match level_id {
        0x10 => "2.0".to_string(),
        0x16 => "2.1".to_string(),
        0x20 => "4.0".to_string(),
        0x22 => "4.2".to_string(),
        0x40 => "6.0".to_string(),
        0x42 => "6.2".to_string(),
        other => format!("Unknown (0x{:02X})", other),
    }
}
