//! AVS3 (T/AI 109.2, GY/T 368) sequence-level syntax parsing

use crate::codec::avs2::headers::{parse_weight_quant, WeightQuantMatrices};
use crate::codec::bitstream::BitReader;
use crate::error::Result;

/// Main 8bit profile
pub const PROFILE_MAIN_8: u8 = 0x20;
/// Main 10bit profile
pub const PROFILE_MAIN_10: u8 = 0x22;
/// High 8bit profile
pub const PROFILE_HIGH_8: u8 = 0x30;
/// High 10bit profile
pub const PROFILE_HIGH_10: u8 = 0x32;

/// Profiles carrying an `encoding_precision` field
pub fn has_encoding_precision(profile_id: u8) -> bool {
    matches!(profile_id, PROFILE_MAIN_10 | PROFILE_HIGH_10)
}

/// Profiles carrying the enhanced tool-flag block
pub fn is_enhanced(profile_id: u8) -> bool {
    matches!(profile_id, PROFILE_HIGH_8 | PROFILE_HIGH_10)
}

/// One reference-picture-list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RplEntry {
    /// Reference into the library picture buffer
    Library { index: u32 },
    /// Decode-order-index delta to a regular reference picture
    Doi { delta: i32 },
}

/// One reference picture list set
#[derive(Debug, Clone)]
pub struct ReferencePictureList {
    pub reference_to_library_enable: bool,
    pub entries: Vec<RplEntry>,
}

/// Base tool-enable flags
#[derive(Debug, Clone, Default)]
pub struct ToolFlags {
    pub st: bool,
    pub sao: bool,
    pub alf: bool,
    pub affine: bool,
    pub smvd: bool,
    pub ipcm: bool,
    pub amvr: bool,
    pub num_of_hmvp_cand: u32,
    pub umve: bool,
    pub emvr: bool,
    pub intra_pf: bool,
    pub tscpm: bool,
    pub dt: bool,
    pub log2_max_dt_size_minus4: Option<u32>,
    pub pbt: bool,
}

/// Enhanced-profile tool flags (profiles 0x30/0x32)
///
/// Parsing the block also implies a set of companion features (eipm, mipf,
/// intra_pf_chroma, umve_enhancement, affine_umve, sb_tmvp, srcc,
/// enhanced_st, enhanced_tscpm, maec), represented by `implied_features`.
#[derive(Debug, Clone, Default)]
pub struct EnhancedToolFlags {
    pub pmc: bool,
    pub iip: bool,
    pub sawp: bool,
    pub asr: Option<bool>,
    pub awp: bool,
    pub etmvp_mvap: bool,
    pub dmvr: bool,
    pub bio: bool,
    pub bgc: bool,
    pub inter_pf: bool,
    pub inter_pc: bool,
    pub obmc: bool,
    pub sbt: bool,
    pub ist: bool,
    pub esao: bool,
    pub ccsao: bool,
    pub ealf: Option<bool>,
    pub ibc: bool,
    pub isc: bool,
    pub num_of_intra_hmvp_cand: Option<u32>,
    pub fimc: bool,
    pub nn_tools_set_hook: u32,
    pub num_of_nn_filter_minus1: Option<u32>,
    pub implied_features: bool,
}

/// Patch partitioning parameters
#[derive(Debug, Clone, Default)]
pub struct PatchParams {
    pub cross_patch_loop_filter: bool,
    pub ref_colocated_patch: bool,
    pub stable_patch: bool,
    pub uniform_patch: Option<bool>,
    pub patch_width_minus1: Option<u32>,
    pub patch_height_minus1: Option<u32>,
}

/// Parsed AVS3 sequence header (start code 0xB0)
#[derive(Debug, Clone)]
pub struct SequenceHeader {
    pub profile_id: u8,
    pub level_id: u8,
    pub progressive_sequence: bool,
    pub field_coded_sequence: bool,
    pub library_stream: bool,
    pub library_picture_enable: bool,
    pub duplicate_sequence_header: Option<bool>,
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
    pub max_dpb_minus1: u32,
    pub rpl1_index_exist: bool,
    pub rpl1_same_as_rpl0: bool,
    pub rpl0: Vec<ReferencePictureList>,
    pub rpl1: Vec<ReferencePictureList>,
    pub num_ref_default_active_minus1: [u32; 2],
    pub log2_lcu_size_minus2: u32,
    pub log2_min_cu_size_minus2: u32,
    pub log2_max_part_ratio_minus2: u32,
    pub max_split_times_minus6: u32,
    pub log2_min_qt_size_minus2: u32,
    pub log2_max_bt_size_minus2: u32,
    pub log2_max_eqt_size_minus3: u32,
    pub weight_quant: Option<WeightQuantMatrices>,
    pub tools: ToolFlags,
    pub enhanced_tools: Option<EnhancedToolFlags>,
    pub output_reorder_delay: Option<u32>,
    pub patch: PatchParams,
}

/// Parsed AVS3 sequence display extension (ext id 0b0010)
#[derive(Debug, Clone, Default)]
pub struct DisplayExtension {
    pub video_format: u32,
    pub full_range: bool,
    pub color_primaries: Option<u32>,
    pub transfer_characteristics: Option<u32>,
    pub matrix_coefficients: Option<u32>,
    pub display_horizontal_size: u32,
    pub display_vertical_size: u32,
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
    let library_stream = br.read_boolean()?;
    let mut library_picture_enable = false;
    let mut duplicate_sequence_header = None;
    if !library_stream {
        library_picture_enable = br.read_boolean()?;
        if library_picture_enable {
            duplicate_sequence_header = Some(br.read_boolean()?);
        }
    }
    br.check_marker_bit()?;
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
    let temporal_id_enable = br.read_boolean()?;
    br.check_marker_bit()?;
    let bbv_buffer_size = br.read_bits(18)?;
    br.check_marker_bit()?;
    let max_dpb_minus1 = br.read_ue()?;
    let rpl1_index_exist = br.read_boolean()?;
    let rpl1_same_as_rpl0 = br.read_boolean()?;
    br.check_marker_bit()?;

    let num_rpl0 = br.read_ue()?;
    let mut rpl0 = Vec::with_capacity(num_rpl0.min(64) as usize);
    for _ in 0..num_rpl0 {
        rpl0.push(parse_reference_picture_list(br, library_picture_enable)?);
    }
    let mut rpl1 = Vec::new();
    if !rpl1_same_as_rpl0 {
        let num_rpl1 = br.read_ue()?;
        rpl1.reserve(num_rpl1.min(64) as usize);
        for _ in 0..num_rpl1 {
            rpl1.push(parse_reference_picture_list(br, library_picture_enable)?);
        }
    }

    let num_ref_default_active_minus1 = [br.read_ue()?, br.read_ue()?];
    let log2_lcu_size_minus2 = br.read_bits(3)?;
    let log2_min_cu_size_minus2 = br.read_bits(2)?;
    let log2_max_part_ratio_minus2 = br.read_bits(2)?;
    let max_split_times_minus6 = br.read_bits(3)?;
    let log2_min_qt_size_minus2 = br.read_bits(3)?;
    let log2_max_bt_size_minus2 = br.read_bits(3)?;
    let log2_max_eqt_size_minus3 = br.read_bits(2)?;
    br.check_marker_bit()?;

    let weight_quant = parse_weight_quant(br)?;

    let mut tools = ToolFlags {
        st: br.read_boolean()?,
        sao: br.read_boolean()?,
        alf: br.read_boolean()?,
        affine: br.read_boolean()?,
        smvd: br.read_boolean()?,
        ipcm: br.read_boolean()?,
        amvr: br.read_boolean()?,
        num_of_hmvp_cand: br.read_bits(4)?,
        umve: br.read_boolean()?,
        ..Default::default()
    };
    if tools.amvr && tools.num_of_hmvp_cand != 0 {
        tools.emvr = br.read_boolean()?;
    }
    tools.intra_pf = br.read_boolean()?;
    tools.tscpm = br.read_boolean()?;
    br.check_marker_bit()?;
    tools.dt = br.read_boolean()?;
    if tools.dt {
        tools.log2_max_dt_size_minus4 = Some(br.read_bits(2)?);
    }
    tools.pbt = br.read_boolean()?;

    let enhanced_tools = if is_enhanced(profile_id) {
        let enhanced = parse_enhanced_tools(br, &tools)?;
        if enhanced.esao {
            tools.sao = false;
        }
        Some(enhanced)
    } else {
        None
    };

    let output_reorder_delay = if !low_delay {
        Some(br.read_bits(5)?)
    } else {
        None
    };

    let mut patch = PatchParams {
        cross_patch_loop_filter: br.read_boolean()?,
        ref_colocated_patch: br.read_boolean()?,
        stable_patch: br.read_boolean()?,
        ..Default::default()
    };
    if patch.stable_patch {
        let uniform = br.read_boolean()?;
        patch.uniform_patch = Some(uniform);
        if uniform {
            br.check_marker_bit()?;
            patch.patch_width_minus1 = Some(br.read_ue()?);
            patch.patch_height_minus1 = Some(br.read_ue()?);
        }
    }
    br.skip_bits(2);

    let bit_rate = (((bit_rate_upper as u64) << 18) | bit_rate_lower as u64) * 400;

    Ok(SequenceHeader {
        profile_id,
        level_id,
        progressive_sequence,
        field_coded_sequence,
        library_stream,
        library_picture_enable,
        duplicate_sequence_header,
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
        max_dpb_minus1,
        rpl1_index_exist,
        rpl1_same_as_rpl0,
        rpl0,
        rpl1,
        num_ref_default_active_minus1,
        log2_lcu_size_minus2,
        log2_min_cu_size_minus2,
        log2_max_part_ratio_minus2,
        max_split_times_minus6,
        log2_min_qt_size_minus2,
        log2_max_bt_size_minus2,
        log2_max_eqt_size_minus3,
        weight_quant,
        tools,
        enhanced_tools,
        output_reorder_delay,
        patch,
    })
}

/// Parse one reference picture list set.
///
/// `library_index_flag` is read only when `reference_to_library_enable` is
/// set; otherwise every entry is a DOI delta.
fn parse_reference_picture_list(
    br: &mut BitReader,
    library_picture_enable: bool,
) -> Result<ReferencePictureList> {
    let reference_to_library_enable = if library_picture_enable {
        br.read_boolean()?
    } else {
        false
    };
    let num_of_ref_pic = br.read_ue()?;
    let mut entries = Vec::with_capacity(num_of_ref_pic.min(64) as usize);
    for _ in 0..num_of_ref_pic {
        let library_index_flag = if reference_to_library_enable {
            br.read_boolean()?
        } else {
            false
        };
        if library_index_flag {
            entries.push(RplEntry::Library {
                index: br.read_ue()?,
            });
        } else {
            let abs_delta_doi = br.read_ue()?;
            let delta = if abs_delta_doi > 0 {
                if br.read_boolean()? {
                    -(abs_delta_doi as i32)
                } else {
                    abs_delta_doi as i32
                }
            } else {
                0
            };
            entries.push(RplEntry::Doi { delta });
        }
    }
    Ok(ReferencePictureList {
        reference_to_library_enable,
        entries,
    })
}

fn parse_enhanced_tools(br: &mut BitReader, base: &ToolFlags) -> Result<EnhancedToolFlags> {
    let mut enhanced = EnhancedToolFlags {
        pmc: br.read_boolean()?,
        iip: br.read_boolean()?,
        sawp: br.read_boolean()?,
        ..Default::default()
    };
    if base.affine {
        enhanced.asr = Some(br.read_boolean()?);
    }
    enhanced.awp = br.read_boolean()?;
    enhanced.etmvp_mvap = br.read_boolean()?;
    enhanced.dmvr = br.read_boolean()?;
    enhanced.bio = br.read_boolean()?;
    enhanced.bgc = br.read_boolean()?;
    enhanced.inter_pf = br.read_boolean()?;
    enhanced.inter_pc = br.read_boolean()?;
    enhanced.obmc = br.read_boolean()?;
    enhanced.sbt = br.read_boolean()?;
    enhanced.ist = br.read_boolean()?;
    enhanced.esao = br.read_boolean()?;
    enhanced.ccsao = br.read_boolean()?;
    if base.alf {
        enhanced.ealf = Some(br.read_boolean()?);
    }
    enhanced.ibc = br.read_boolean()?;
    br.check_marker_bit()?;
    enhanced.isc = br.read_boolean()?;
    if enhanced.ibc || enhanced.isc {
        enhanced.num_of_intra_hmvp_cand = Some(br.read_bits(4)?);
    }
    enhanced.fimc = br.read_boolean()?;
    enhanced.nn_tools_set_hook = br.read_bits(8)?;
    if enhanced.nn_tools_set_hook & 1 != 0 {
        enhanced.num_of_nn_filter_minus1 = Some(br.read_ue()?);
    }
    br.check_marker_bit()?;
    enhanced.implied_features = true;
    Ok(enhanced)
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
        td_mode,
        td_packing_code,
        view_reverse,
    })
}

/// Parse the HDR dynamic metadata extension body (reader positioned after
/// the 4-bit extension id). Returns the raw 4-bit metadata type.
pub fn parse_hdr_dynamic_metadata_extension(br: &mut BitReader) -> Result<u32> {
    br.read_bits(4)
}

/// Profile name for an AVS3 `profile_id`
pub fn profile_name(profile_id: u8) -> String {
    match profile_id {
        PROFILE_MAIN_8 => "Main 8bit".to_string(),
        PROFILE_MAIN_10 => "Main 10bit".to_string(),
        PROFILE_HIGH_8 => "High 8bit".to_string(),
        PROFILE_HIGH_10 => "High 10bit".to_string(),
        other => format!("Unknown (0x{:02X})", other),
    }
}

/// Level name for an AVS3 `level_id`
pub fn level_name(level_id: u8) -> String {
    match level_id {
        0x10 => "2.0.15".to_string(),
        0x12 => "2.0.30".to_string(),
        0x14 => "2.0.60".to_string(),
        0x20 => "4.0.30".to_string(),
        0x22 => "4.0.60".to_string(),
        0x24 => "4.2.30".to_string(),
        0x26 => "4.2.60".to_string(),
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
