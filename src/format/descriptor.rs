//! PMT elementary-stream descriptor parsing
//!
//! Parses the AVS video/audio descriptors (tags 0x3F/0x40/0xD1/0xD2) into
//! typed records and captures the generic registration, language and
//! maximum-bitrate descriptors. Unknown tags are skipped.

use crate::codec::av3a::tables as av3a_tables;
use crate::codec::bitstream::BitReader;
use crate::codec::info::AudioCodecId;
use crate::codec::tables::{
    self, ChromaFormat, ColorPrimaries, MatrixCoefficients, TransferCharacteristics,
    AVS3_COLOR_RANGES,
};
use crate::codec::{avs1, avs2, avs3, CodecKind};
use crate::error::Result;
use tracing::trace;

/// Descriptor tag: AVS1 video
pub const TAG_AVS1_VIDEO: u8 = 0x3F;
/// Descriptor tag: AVS2 video
pub const TAG_AVS2_VIDEO: u8 = 0x40;
/// Descriptor tag: AVS3 video
pub const TAG_AVS3_VIDEO: u8 = 0xD1;
/// Descriptor tag: AVS3 audio
pub const TAG_AVS3_AUDIO: u8 = 0xD2;
/// Descriptor tag: registration
pub const TAG_REGISTRATION: u8 = 0x05;
/// Descriptor tag: ISO 639 language
pub const TAG_ISO_639_LANGUAGE: u8 = 0x0A;
/// Descriptor tag: maximum bitrate
pub const TAG_MAXIMUM_BITRATE: u8 = 0x0E;

/// Container-side AVS video metadata from a PMT descriptor
#[derive(Debug, Clone)]
pub struct AvsVideoDescriptor {
    pub generation: CodecKind,
    pub profile_id: u8,
    pub level_id: u8,
    pub profile: String,
    pub level: String,
    pub multiple_frame_rate: bool,
    pub frame_rate_code: u32,
    pub frame_rate: f64,
    pub still_present: bool,
    pub chroma_format: ChromaFormat,
    pub sample_precision: u32,
    pub bit_depth: Option<u8>,
    /// AVS3-only flags
    pub temporal_id_flag: Option<bool>,
    pub td_mode: Option<bool>,
    pub library_stream: Option<bool>,
    pub library_picture_enable: Option<bool>,
    /// AVS3-only colour description
    pub color_primaries: Option<ColorPrimaries>,
    pub transfer_characteristics: Option<TransferCharacteristics>,
    pub matrix_coefficients: Option<MatrixCoefficients>,
}

/// Container-side AVS3 audio metadata from a PMT descriptor
#[derive(Debug, Clone)]
pub struct AvsAudioDescriptor {
    pub audio_codec_id: Option<AudioCodecId>,
    pub sampling_frequency: u32,
    pub content_type: u32,
    pub channel_number_index: Option<u32>,
    pub channel_configuration: Option<&'static str>,
    pub object_channel_number: Option<u16>,
    pub hoa_order: Option<u8>,
    /// Total bit rate in bits per second
    pub total_bitrate: u64,
    pub resolution: u8,
}

/// Either of the two AVS descriptor records
#[derive(Debug, Clone)]
pub enum AvsDescriptor {
    Video(AvsVideoDescriptor),
    Audio(AvsAudioDescriptor),
}

impl AvsDescriptor {
    pub fn as_video(&self) -> Option<&AvsVideoDescriptor> {
        match self {
            AvsDescriptor::Video(v) => Some(v),
            AvsDescriptor::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AvsAudioDescriptor> {
        match self {
            AvsDescriptor::Video(_) => None,
            AvsDescriptor::Audio(a) => Some(a),
        }
    }
}

/// Everything captured from one elementary stream's descriptor block
#[derive(Debug, Clone, Default)]
pub struct EsDescriptors {
    /// ISO 639 language code (3 characters)
    pub language: Option<String>,
    /// Registration descriptor fourCC
    pub registration: Option<[u8; 4]>,
    /// Maximum bitrate in bits per second
    pub max_bitrate: Option<u64>,
    /// Human-readable codec name from the well-known tag table
    pub codec_hint: Option<&'static str>,
    /// Typed AVS descriptor for the matching tag + stream-type pairs
    pub avs: Option<AvsDescriptor>,
}

/// Parse the descriptor block of one PMT elementary-stream entry.
///
/// Individual descriptor failures are recoverable: a malformed descriptor is
/// skipped and the rest of the block is still processed.
pub fn parse_es_descriptors(stream_type: u8, data: &[u8]) -> EsDescriptors {
    let mut result = EsDescriptors::default();
    let mut offset = 0usize;

    while offset + 2 <= data.len() {
        let tag = data[offset];
        let length = data[offset + 1] as usize;
        offset += 2;
        if offset + length > data.len() {
            break;
        }
        let body = &data[offset..offset + length];
        offset += length;

        match tag {
            TAG_REGISTRATION => {
                if body.len() >= 4 {
                    result.registration = Some([body[0], body[1], body[2], body[3]]);
                }
            }
            TAG_ISO_639_LANGUAGE => {
                if body.len() >= 3 {
                    result.language =
                        Some(String::from_utf8_lossy(&body[..3]).into_owned());
                }
            }
            TAG_MAXIMUM_BITRATE => {
                if body.len() >= 3 {
                    let raw = ((body[0] as u32) << 16) | ((body[1] as u32) << 8) | body[2] as u32;
                    result.max_bitrate = Some(((raw & 0x3FFFF) as u64) * 400);
                }
            }
            TAG_AVS1_VIDEO if stream_type == 0x42 => {
                match parse_avs_video_descriptor(CodecKind::Avs1, body) {
                    Ok(descriptor) => result.avs = Some(AvsDescriptor::Video(descriptor)),
                    Err(e) => trace!(error = %e, "AVS1 video descriptor rejected"),
                }
            }
            TAG_AVS2_VIDEO if stream_type == 0xD2 => {
                match parse_avs_video_descriptor(CodecKind::Avs2, body) {
                    Ok(descriptor) => result.avs = Some(AvsDescriptor::Video(descriptor)),
                    Err(e) => trace!(error = %e, "AVS2 video descriptor rejected"),
                }
            }
            TAG_AVS3_VIDEO if stream_type == 0xD4 => {
                match parse_avs3_video_descriptor(body) {
                    Ok(descriptor) => result.avs = Some(AvsDescriptor::Video(descriptor)),
                    Err(e) => trace!(error = %e, "AVS3 video descriptor rejected"),
                }
            }
            TAG_AVS3_AUDIO if stream_type == 0xD5 => {
                match parse_avs3_audio_descriptor(body) {
                    Ok(descriptor) => result.avs = Some(AvsDescriptor::Audio(descriptor)),
                    Err(e) => trace!(error = %e, "AVS3 audio descriptor rejected"),
                }
            }
            _ => {
                if let Some(name) = well_known_tag_name(tag) {
                    result.codec_hint = Some(name);
                }
            }
        }
    }

    result
}

/// Human-readable names for well-known descriptor tags
pub fn well_known_tag_name(tag: u8) -> Option<&'static str> {
    match tag {
        0x28 => Some("AVC video"),
        0x2B => Some("AAC audio (MPEG-2)"),
        0x38 => Some("HEVC video"),
        0x56 => Some("Teletext"),
        0x59 => Some("DVB subtitles"),
        0x6A => Some("AC-3"),
        0x7A => Some("E-AC-3"),
        0x7B => Some("DTS"),
        0x7C => Some("AAC"),
        0x81 => Some("AC-3 (ATSC)"),
        0x86 => Some("Caption service"),
        _ => None,
    }
}

/// AVS1/AVS2 video descriptor: profile, level, frame rate, still-picture
/// flag, chroma format and sample precision.
fn parse_avs_video_descriptor(generation: CodecKind, body: &[u8]) -> Result<AvsVideoDescriptor> {
    let mut br = BitReader::new(body);
    let profile_id = br.read_bits(8)? as u8;
    let level_id = br.read_bits(8)? as u8;
    let multiple_frame_rate = br.read_boolean()?;
    let frame_rate_code = br.read_bits(4)?;
    let still_present = br.read_boolean()?;
    let chroma_format = br.read_bits(2)?;
    let sample_precision = br.read_bits(3)?;
    br.skip_bits(5);

    let (profile, level) = match generation {
        CodecKind::Avs1 => (
            avs1::headers::profile_name(profile_id),
            avs1::headers::level_name(level_id),
        ),
        _ => (
            avs2::headers::profile_name(profile_id),
            avs2::headers::level_name(level_id),
        ),
    };

    Ok(AvsVideoDescriptor {
        generation,
        profile_id,
        level_id,
        profile,
        level,
        multiple_frame_rate,
        frame_rate_code,
        frame_rate: tables::frame_rate(frame_rate_code),
        still_present,
        chroma_format: ChromaFormat::from_code(chroma_format),
        sample_precision,
        bit_depth: tables::bit_depth(sample_precision),
        temporal_id_flag: None,
        td_mode: None,
        library_stream: None,
        library_picture_enable: None,
        color_primaries: None,
        transfer_characteristics: None,
        matrix_coefficients: None,
    })
}

/// AVS3 video descriptor: adds temporal-id/TD/library flags and an explicit
/// colour description. A chroma format other than 4:2:0 is normalized to
/// Reserved.
fn parse_avs3_video_descriptor(body: &[u8]) -> Result<AvsVideoDescriptor> {
    let mut br = BitReader::new(body);
    let profile_id = br.read_bits(8)? as u8;
    let level_id = br.read_bits(8)? as u8;
    let multiple_frame_rate = br.read_boolean()?;
    let frame_rate_code = br.read_bits(4)?;
    let sample_precision = br.read_bits(3)?;
    let chroma_code = br.read_bits(2)?;
    let temporal_id_flag = br.read_boolean()?;
    let td_mode = br.read_boolean()?;
    let library_stream = br.read_boolean()?;
    let library_picture_enable = br.read_boolean()?;
    br.skip_bits(2);
    let primaries_code = br.read_bits(8)?;
    let transfer_code = br.read_bits(8)?;
    let matrix_code = br.read_bits(8)?;

    let chroma_format = if chroma_code == 1 {
        ChromaFormat::Yuv420
    } else {
        ChromaFormat::Reserved
    };

    Ok(AvsVideoDescriptor {
        generation: CodecKind::Avs3Video,
        profile_id,
        level_id,
        profile: avs3::headers::profile_name(profile_id),
        level: avs3::headers::level_name(level_id),
        multiple_frame_rate,
        frame_rate_code,
        frame_rate: tables::frame_rate(frame_rate_code),
        still_present: false,
        chroma_format,
        sample_precision,
        bit_depth: tables::bit_depth(sample_precision),
        temporal_id_flag: Some(temporal_id_flag),
        td_mode: Some(td_mode),
        library_stream: Some(library_stream),
        library_picture_enable: Some(library_picture_enable),
        color_primaries: tables::color_primaries(primaries_code, &AVS3_COLOR_RANGES),
        transfer_characteristics: tables::transfer_characteristics(
            transfer_code,
            &AVS3_COLOR_RANGES,
        ),
        matrix_coefficients: tables::matrix_coefficients(matrix_code, &AVS3_COLOR_RANGES),
    })
}

/// AVS3 audio descriptor: content-type branches parallel the AATF frame
/// header; `total_bitrate` is carried in kbps on the wire.
fn parse_avs3_audio_descriptor(body: &[u8]) -> Result<AvsAudioDescriptor> {
    let mut br = BitReader::new(body);
    let codec_id_raw = br.read_bits(4)?;
    let sampling_frequency_index = br.read_bits(4)?;
    let sampling_frequency = if sampling_frequency_index == 0xF {
        br.read_bits(24)?
    } else {
        av3a_tables::sampling_frequency(sampling_frequency_index).unwrap_or(0)
    };

    let content_type = br.read_bits(4)?;
    let mut channel_number_index = None;
    let mut channel_configuration = None;
    let mut object_channel_number = None;
    let mut hoa_order = None;
    match content_type {
        0 => {
            let index = br.read_bits(7)?;
            br.skip_bits(1);
            channel_number_index = Some(index);
            channel_configuration =
                av3a_tables::ChannelConfiguration::from_index(index).map(|c| c.name());
        }
        1 => {
            object_channel_number = Some(br.read_bits(7)? as u16 + 1);
            br.skip_bits(1);
        }
        2 => {
            let index = br.read_bits(7)?;
            br.skip_bits(1);
            channel_number_index = Some(index);
            channel_configuration =
                av3a_tables::ChannelConfiguration::from_index(index).map(|c| c.name());
            object_channel_number = Some(br.read_bits(7)? as u16 + 1);
            br.skip_bits(1);
        }
        3 => {
            hoa_order = Some(br.read_bits(4)? as u8);
            br.skip_bits(4);
        }
        _ => {}
    }

    let total_bitrate_kbps = br.read_bits(16)?;
    let resolution = av3a_tables::resolution_bits(br.read_bits(2)?);

    Ok(AvsAudioDescriptor {
        audio_codec_id: AudioCodecId::from_code(codec_id_raw),
        sampling_frequency,
        content_type,
        channel_number_index,
        channel_configuration,
        object_channel_number,
        hoa_order,
        total_bitrate: total_bitrate_kbps as u64 * 1000,
        resolution,
    })
}
