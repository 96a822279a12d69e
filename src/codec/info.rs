//! Semantic records produced by the codec parsers

use crate::codec::tables::{
    ChromaFormat, ColorDescription, ColorPrimaries, HdrDynamicMetadataType, MatrixCoefficients,
    PackingMode, TransferCharacteristics,
};

/// Decoded AVS video sequence-level information
///
/// Built from the sequence header; the optional display-extension fields are
/// populated only when a sequence display extension was present before the
/// first picture header.
#[derive(Debug, Clone)]
pub struct AvsVideoInfo {
    /// Generation name ("AVS", "AVS+", "AVS2", "AVS3")
    pub generation: &'static str,

    /// Profile name derived from `profile_id`
    pub profile: String,

    /// Level name derived from `level_id`
    pub level: String,

    /// Coded horizontal size in luma samples
    pub width: u32,

    /// Coded vertical size in luma samples
    pub height: u32,

    /// Progressive sequence flag
    pub progressive: bool,

    /// Chroma sampling format
    pub chroma_format: ChromaFormat,

    /// Luma bit depth (8/10/12); None for reserved precision codes
    pub luma_bit_depth: Option<u8>,

    /// Chroma bit depth; equals luma depth unless encoding precision differs
    pub chroma_bit_depth: Option<u8>,

    /// Frame rate from the shared table (0.0 for reserved codes)
    pub frame_rate: f64,

    /// Bit rate in bits per second
    pub bit_rate: u64,

    /// Low-delay flag
    pub low_delay: bool,

    /// Sample aspect ratio (present only for SAR-class codes)
    pub sar: Option<&'static str>,

    /// Display aspect ratio (present only for DAR-class codes)
    pub dar: Option<&'static str>,

    /// Video format name (display extension)
    pub video_format: Option<&'static str>,

    /// Sample range (display extension): false = limited, true = full
    pub full_range: Option<bool>,

    /// HDR dynamic-metadata type (AVS3 extension 0b0101)
    pub hdr_dynamic_metadata: Option<HdrDynamicMetadataType>,

    /// Combined colour description when primaries/transfer/matrix agree
    pub color_description: Option<ColorDescription>,

    /// Colour primaries (display extension; 0 reported as absent)
    pub color_primaries: Option<ColorPrimaries>,

    /// Transfer characteristics (display extension)
    pub transfer_characteristics: Option<TransferCharacteristics>,

    /// Matrix coefficients (display extension)
    pub matrix_coefficients: Option<MatrixCoefficients>,

    /// Display horizontal size (display extension)
    pub display_width: Option<u32>,

    /// Display vertical size (display extension)
    pub display_height: Option<u32>,

    /// Stereo/3D frame packing mode (display extension)
    pub packing_mode: Option<PackingMode>,
}

/// AV3A audio codec id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodecId {
    Lossless,
    General,
}

impl AudioCodecId {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(AudioCodecId::Lossless),
            2 => Some(AudioCodecId::General),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioCodecId::Lossless => "Lossless",
            AudioCodecId::General => "General",
        }
    }
}

/// AV3A coding profile (3-bit field in the AATF frame header)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingProfile {
    Basic,
    ObjectMetadata,
    FoaHoa,
    Reserved,
}

impl CodingProfile {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => CodingProfile::Basic,
            1 => CodingProfile::ObjectMetadata,
            2 => CodingProfile::FoaHoa,
            _ => CodingProfile::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CodingProfile::Basic => "Basic",
            CodingProfile::ObjectMetadata => "Object metadata",
            CodingProfile::FoaHoa => "FOA/HOA",
            CodingProfile::Reserved => "Reserved",
        }
    }
}

/// Neural-network type (General codec only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NnType {
    Basic,
    LowComplexity,
    Reserved,
}

impl NnType {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => NnType::Basic,
            1 => NnType::LowComplexity,
            _ => NnType::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NnType::Basic => "Basic",
            NnType::LowComplexity => "Low complexity",
            NnType::Reserved => "Reserved",
        }
    }
}

/// Decoded Audio Vivid (AV3A) frame-header information
#[derive(Debug, Clone)]
pub struct AvsAudioInfo {
    /// Audio codec id (Lossless / General)
    pub codec_id: AudioCodecId,

    /// Coding profile branch the header followed
    pub coding_profile: CodingProfile,

    /// Sampling frequency in Hz
    pub sampling_frequency: u32,

    /// Sample resolution in bits (8/16/24)
    pub resolution: u8,

    /// Neural-network type (General codec only)
    pub nn_type: Option<NnType>,

    /// Channel count (channel-bed configurations)
    pub channel_number: Option<u16>,

    /// Channel configuration name (General/Basic and sound-bed branches)
    pub channel_configuration: Option<&'static str>,

    /// Number of object channels (object-metadata profile)
    pub object_channel_number: Option<u16>,

    /// HOA order (FOA/HOA profile)
    pub hoa_order: Option<u8>,

    /// Bit rate in bits per second; absent when no branch set it
    pub bit_rate: Option<u64>,
}

/// Either of the two in-band info records
#[derive(Debug, Clone)]
pub enum AvsInfo {
    Video(AvsVideoInfo),
    Audio(AvsAudioInfo),
}

impl AvsInfo {
    pub fn as_video(&self) -> Option<&AvsVideoInfo> {
        match self {
            AvsInfo::Video(v) => Some(v),
            AvsInfo::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AvsAudioInfo> {
        match self {
            AvsInfo::Video(_) => None,
            AvsInfo::Audio(a) => Some(a),
        }
    }
}
