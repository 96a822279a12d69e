//! AVS2 (GB/T 33475.2) sequence-level syntax parsing

use crate::codec::bitstream::BitReader;
use crate::codec::tables::{DEFAULT_WQM_4X4, DEFAULT_WQM_8X8};
use crate::error::Result;

/// Main Picture profile
pub const PROFILE_MAIN_PICTURE: u8 = 0x12;
/// Main profile
pub const PROFILE_MAIN: u8 = 0x20;
/// Main 10bit profile
pub const PROFILE_MAIN_10: u8 = 0x22;
/// Scene profile
pub const PROFILE_SCENE: u8 = 0x24;
/// Multi View profile
pub const PROFILE_MULTI_VIEW: u8 = 0x30;
/// Multi View 10bit profile
pub const PROFILE_MULTI_VIEW_10: u8 = 0x32;

/// Profiles carrying an `encoding_precision` field
pub fn has_encoding_precision(profile_id: u8) -> bool {
    matches!(
        profile_id,
        PROFILE_MAIN_PICTURE | PROFILE_MAIN_10 | PROFILE_MULTI_VIEW_10
    )
}

/// Profiles whose display extension carries a content description
pub fn is_multi_view(profile_id: u8) -> bool {
    matches!(profile_id, PROFILE_MULTI_VIEW | PROFILE_MULTI_VIEW_10)
}

/// Weight-quantization matrices in effect for the sequence
#[derive(Debug, Clone)]
pub struct WeightQuantMatrices {
    pub wqm_4x4: [u32; 16],
    pub wqm_8x8: [u32; 64],
    /// Whether the matrices were loaded from the stream (vs. defaults)
    pub loaded: bool,
}

/// One reference configuration set
#[derive(Debug, Clone)]
pub struct ReferenceConfigSet {
    pub refered_by_others: bool,
    pub reference_deltas: Vec<u32>,
    pub removed_deltas: Vec<u32>,
}

/// Sequence-level tool enable flags
#[derive(Debug, Clone, Default)]
pub struct ToolFlags {
    pub multi_hypothesis_skip: bool,
    pub dual_hypothesis_prediction: bool,
    pub weighted_skip: bool,
    pub asymmetric_motion_partitions: bool,
    pub nonsquare_quadtree_transform: bool,
    pub nonsquare_intra_prediction: bool,
    pub secondary_transform: bool,
    pub sample_adaptive_offset: bool,
    pub adaptive_loop_filter: bool,
    pub pmvr: bool,
}

/// Parsed AVS2 sequence header (start code 0xB0)
#[derive(Debug, Clone)]
pub struct SequenceHeader {
    pub profile_id: u8,
    pub level_id: u8,
    pub progressive_sequence: bool,
    pub field_coded_sequence: bool,
    pub horizontal_size: u32,
    pub vertical_size: u32,
    pub chroma_format: u32,
    pub sample_precision: u32,
    pub encoding_precision: Option<u32>,
    pub aspect_ratio_code: u32,
    pub frame_rate_code: u32,
    /// Combined bit rate in bits per second ((upper<<18 | lower) * 400)
    pub bit_rate: u64,
    pub low_delay: bool,
    pub temporal_id_enable: bool,
    pub bbv_buffer_size: u32,
    pub lcu_size: u32,
    pub weight_quant: Option<WeightQuantMatrices>,
    pub background_picture_disable: Option<bool>,
    pub tools: ToolFlags,
    pub reference_config_sets: Vec<ReferenceConfigSet>,
    pub output_reorder_delay: Option<u32>,
    pub cross_slice_loopfilter: bool,
    pub universal_string_prediction: Option<bool>,
}

/// Depth range record from the 3D display extension
#[derive(Debug, Clone)]
pub struct DepthRange {
    pub near: SignedFloat,
    pub far: SignedFloat,
}

/// Sign/exponent/mantissa float encoding used by the 3D extensions
#[derive(Debug, Clone)]
pub struct SignedFloat {
    pub sign: bool,
    pub exponent: u32,
    pub mantissa: u32,
}

/// Camera parameter set from the 3D display extension
#[derive(Debug, Clone)]
pub struct CameraParameterSet {
    pub focal_length_exponent: u32,
    pub focal_length_mantissa: u32,
    pub camera_position: SignedFloat,
    pub camera_shift_x_exponent: u32,
    pub camera_shift_x_mantissa: u32,
    pub camera_shift_x_sign: bool,
}

/// Parsed AVS2 sequence display extension (ext id 0b0010)
#[derive(Debug, Clone, Default)]
pub struct DisplayExtension {
    pub video_format: u32,
    pub full_range: bool,
    pub color_primaries: Option<u32>,
    pub transfer_characteristics: Option<u32>,
    pub matrix_coefficients: Option<u32>,
    pub display_horizontal_size: u32,
    pub display_vertical_size: u32,
    pub content_description: Option<u32>,
    pub depth_ranges: Vec<DepthRange>,
    pub camera_parameters: Vec<CameraParameterSet>,
    pub td_mode: bool,
    pub td_packing_code: Option<u32>,
    pub view_reverse: Option<bool>,
}

/// Parse the sequence header body (reader positioned after 00 00 01 B0).
pub fn parse_sequence_header(br: &mut BitReader) -> Result<SequenceHeader> {
    let profile_id = br.read_bits(8)? as u8;
    let level_id = br.read_bits(8)? as u8;
    let progressive_sequence = br.read_boolean()?;
    let field_coded_sequence = br.read_boolean()?;
    let horizontal_size = br.read_bits(14)?;
    br.check_marker_bit()?;
    let vertical_size = br.read_bits(14)?;
    let chroma_format = br.read_bits(2)?;
    let sample_precision = br.read_bits(3)?;
    let encoding_precision = if has_encoding_precision(profile_id) {
        Some(br.read_bits(3)?)
    } else {
        None
    };
    br.check_marker_bit()?;
    let aspect_ratio_code = br.read_bits(4)?;
    let frame_rate_code = br.read_bits(4)?;
    br.check_marker_bit()?;
    let bit_rate_lower = br.read_bits(18)?;
    br.check_marker_bit()?;
    let bit_rate_upper = br.read_bits(12)?;
    let low_delay = br.read_boolean()?;
    br.check_marker_bit()?;
    let temporal_id_enable = br.read_boolean()?;
    let bbv_buffer_size = br.read_bits(18)?;
    br.check_marker_bit()?;
    let lcu_size = br.read_bits(3)?;

    let weight_quant = parse_weight_quant(br)?;

    let background_picture_disable = if profile_id == PROFILE_SCENE {
        Some(br.read_boolean()?)
    } else {
        None
    };

    let tools = ToolFlags {
        multi_hypothesis_skip: br.read_boolean()?,
        dual_hypothesis_prediction: br.read_boolean()?,
        weighted_skip: br.read_boolean()?,
        asymmetric_motion_partitions: br.read_boolean()?,
        nonsquare_quadtree_transform: br.read_boolean()?,
        nonsquare_intra_prediction: br.read_boolean()?,
        secondary_transform: br.read_boolean()?,
        sample_adaptive_offset: br.read_boolean()?,
        adaptive_loop_filter: br.read_boolean()?,
        pmvr: br.read_boolean()?,
    };
    br.check_marker_bit()?;

    let num_of_rcs = br.read_bits(6)?;
    let mut reference_config_sets = Vec::with_capacity(num_of_rcs as usize);
    for _ in 0..num_of_rcs {
        reference_config_sets.push(parse_reference_config_set(br)?);
    }

    let output_reorder_delay = if !low_delay {
        Some(br.read_bits(5)?)
    } else {
        None
    };
    let cross_slice_loopfilter = br.read_boolean()?;
    let universal_string_prediction = if chroma_format == 0b11 {
        Some(br.read_boolean()?)
    } else {
        None
    };
    br.skip_bits(2);

    let bit_rate = (((bit_rate_upper as u64) << 18) | bit_rate_lower as u64) * 400;

    Ok(SequenceHeader {
        profile_id,
        level_id,
        progressive_sequence,
        field_coded_sequence,
        horizontal_size,
        vertical_size,
        chroma_format,
        sample_precision,
        encoding_precision,
        aspect_ratio_code,
        frame_rate_code,
        bit_rate,
        low_delay,
        temporal_id_enable,
        bbv_buffer_size,
        lcu_size,
        weight_quant,
        background_picture_disable,
        tools,
        reference_config_sets,
        output_reorder_delay,
        cross_slice_loopfilter,
        universal_string_prediction,
    })
}

/// Parse `weight_quant_enable_flag` and the optional matrix data.
///
/// When enabled with `load_seq_weight_quant_data_flag` 0 the default
/// matrices apply; otherwise 16 + 64 ue(v) codes are read row-major.
pub(crate) fn parse_weight_quant(br: &mut BitReader) -> Result<Option<WeightQuantMatrices>> {
    if !br.read_boolean()? {
        return Ok(None);
    }
    let loaded = br.read_boolean()?;
    if !loaded {
        return Ok(Some(WeightQuantMatrices {
            wqm_4x4: DEFAULT_WQM_4X4,
            wqm_8x8: DEFAULT_WQM_8X8,
            loaded: false,
        }));
    }
    let mut wqm_4x4 = [0u32; 16];
    for value in wqm_4x4.iter_mut() {
        *value = br.read_ue()?;
    }
    let mut wqm_8x8 = [0u32; 64];
    for value in wqm_8x8.iter_mut() {
        *value = br.read_ue()?;
    }
    Ok(Some(WeightQuantMatrices {
        wqm_4x4,
        wqm_8x8,
        loaded: true,
    }))
}

fn parse_reference_config_set(br: &mut BitReader) -> Result<ReferenceConfigSet> {
    let refered_by_others = br.read_boolean()?;
    let num_reference = br.read_bits(3)?;
    let mut reference_deltas = Vec::with_capacity(num_reference as usize);
    for _ in 0..num_reference {
        reference_deltas.push(br.read_bits(6)?);
    }
    let num_removed = br.read_bits(3)?;
    let mut removed_deltas = Vec::with_capacity(num_removed as usize);
    for _ in 0..num_removed {
        removed_deltas.push(br.read_bits(6)?);
    }
    br.check_marker_bit()?;
    Ok(ReferenceConfigSet {
        refered_by_others,
        reference_deltas,
        removed_deltas,
    })
}

fn parse_signed_float(br: &mut BitReader) -> Result<SignedFloat> {
    let sign = br.read_boolean()?;
    let exponent = br.read_bits(8)?;
    br.check_marker_bit()?;
    let mantissa = br.read_bits(22)?;
    br.check_marker_bit()?;
    Ok(SignedFloat {
        sign,
        exponent,
        mantissa,
    })
}

fn parse_depth_range(br: &mut BitReader) -> Result<DepthRange> {
    Ok(DepthRange {
        near: parse_signed_float(br)?,
        far: parse_signed_float(br)?,
    })
}

fn parse_camera_parameter_set(br: &mut BitReader) -> Result<CameraParameterSet> {
    let focal_length_exponent = br.read_bits(8)?;
    br.check_marker_bit()?;
    let focal_length_mantissa = br.read_bits(22)?;
    br.check_marker_bit()?;
    let camera_position = parse_signed_float(br)?;
    let camera_shift_x_exponent = br.read_bits(8)?;
    br.check_marker_bit()?;
    let camera_shift_x_mantissa = br.read_bits(22)?;
    br.check_marker_bit()?;
    let camera_shift_x_sign = br.read_boolean()?;
    Ok(CameraParameterSet {
        focal_length_exponent,
        focal_length_mantissa,
        camera_position,
        camera_shift_x_exponent,
        camera_shift_x_mantissa,
        camera_shift_x_sign,
    })
}

/// Content-description value that carries depth/camera records per view
const CONTENT_DESCRIPTION_DEPTH: u32 = 2;
/// Stereo view count for the depth/camera loop
const STEREO_VIEWS: usize = 2;

/// Parse the sequence display extension body (reader positioned after the
/// 4-bit extension id). `profile_id` gates the 3D content description.
pub fn parse_display_extension(br: &mut BitReader, profile_id: u8) -> Result<DisplayExtension> {
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

    let mut content_description = None;
    let mut depth_ranges = Vec::new();
    let mut camera_parameters = Vec::new();
    if is_multi_view(profile_id) {
        let value = br.read_bits(2)?;
        content_description = Some(value);
        if value == CONTENT_DESCRIPTION_DEPTH {
            for _ in 0..STEREO_VIEWS {
                depth_ranges.push(parse_depth_range(br)?);
                camera_parameters.push(parse_camera_parameter_set(br)?);
            }
        }
    }

    let td_mode = br.read_boolean()?;
    let (td_packing_code, view_reverse) = if td_mode {
        (Some(br.read_bits(8)?), Some(br.read_boolean()?))
    } else {
        (None, None)
    };

    Ok(DisplayExtension {
        video_format,
        full_range,
        color_primaries,
        transfer_characteristics,
        matrix_coefficients,
        display_horizontal_size,
        display_vertical_size,
        content_description,
        depth_ranges,
        camera_parameters,
        td_mode,
        td_packing_code,
        view_reverse,
    })
}

/// Profile name for an AVS2 `profile_id`
pub fn profile_name(profile_id: u8) -> String {
    match profile_id {
        PROFILE_MAIN_PICTURE => "Main Picture".to_string(),
        PROFILE_MAIN => "Main".to_string(),
        PROFILE_MAIN_10 => "Main 10bit".to_string(),
        PROFILE_SCENE => "Scene".to_string(),
        PROFILE_MULTI_VIEW => "Multi View".to_string(),
        PROFILE_MULTI_VIEW_10 => "Multi View 10bit".to_string(),
        other => format!("Unknown (0x{:02X})", other),
    }
}

/// Level name for an AVS2 `level_id`
pub fn level_name(level_id: u8) -> String {
    match level_id {
        0x10 => "2.0.15".to_string(),
        0x12 => "2.0.30".to_string(),
        0x14 => "2.0.60".to_string(),
        0x20 => "4.0.30".to_string(),
        0x22 => "4.0.60".to_string(),
        0x40 => "6.0.30".to_string(),
        0x42 => "6.0.60".to_string(),
        0x44 => "6.0.120".to_string(),
        0x46 => "6.2.30".to_string(),
        0x48 => "6.2.60".to_string(),
        0x4A => "6.2.120".to_string(),
        0x50 => "8.0.30".to_string(),
        0x52 => "8.0.60".to_string(),
        0x54 => "8.0.120".to_string(),
        0x56 => "8.2.30".to_string(),
        0x58 => "8.2.60".to_string(),
        0x5A => "8.2.120".to_string(),
        0x60 => "10.0.30".to_string(),
        0x62 => "10.0.60".to_string(),
        0x64 => "10.0.120".to_string(),
        0x66 => "10.2.30".to_string(),
        0x68 => "10.2.60".to_string(),
        0x6A => "10.2.120".to_string(),
        other => format!("Unknown (0x{:02X})", other),
    }
}
