//! Audio Vivid / AV3A (GY/T 363, T/AI 109.3) frame-header parser
//!
//! Locates the 12-bit AATF syncword 0xFFF (byte-aligned) and decodes the
//! frame header. A candidate that does not lead to a valid header advances
//! the scan by one byte.

pub mod tables;

use crate::codec::bitstream::BitReader;
use crate::codec::info::{AudioCodecId, AvsAudioInfo, CodingProfile, NnType};
use crate::error::{Error, Result};
use tables::ChannelConfiguration;
use tracing::debug;

/// Scan buffered elementary-stream bytes for the first AATF frame header.
///
/// Returns `None` while more input could still complete a candidate parse
/// (unless `force` is set, in which case every candidate is final).
pub fn probe_es(data: &[u8], force: bool) -> Option<AvsAudioInfo> {
    let mut pos = 0usize;
    while pos + 1 < data.len() {
        if data[pos] == 0xFF && (data[pos + 1] & 0xF0) == 0xF0 {
            match parse_frame_header(data, pos) {
                Ok(info) => return Some(info),
                Err(Error::Truncated) if !force => return None,
                Err(e) => {
                    debug!(offset = pos, error = %e, "AATF sync candidate rejected");
                }
            }
        }
        pos += 1;
    }
    None
}

/// Parse an AATF frame header at a syncword candidate offset.
fn parse_frame_header(data: &[u8], offset: usize) -> Result<AvsAudioInfo> {
    let mut br = BitReader::at_offset(data, offset);
    br.skip_bits(12); // syncword

    let codec_id =
        AudioCodecId::from_code(br.read_bits(4)?).ok_or(Error::InvalidSyncword)?;
    br.skip_bits(1); // anc_data_index

    let nn_type = if codec_id == AudioCodecId::General {
        Some(NnType::from_code(br.read_bits(3)?))
    } else {
        None
    };

    let coding_profile = CodingProfile::from_code(br.read_bits(3)?);
    let sampling_frequency_index = br.read_bits(4)?;
    let sampling_frequency =
        if codec_id == AudioCodecId::Lossless && sampling_frequency_index == 0xF {
            br.read_bits(24)?
        } else {
            tables::sampling_frequency(sampling_frequency_index).unwrap_or(0)
        };

    if codec_id != AudioCodecId::General {
        let _raw_frame_length = br.read_bits(16)?;
    }
    br.skip_bits(8); // aatf_error_check CRC

    let mut channel_number: Option<u16> = None;
    let mut channel_configuration: Option<ChannelConfiguration> = None;
    let mut object_channel_number: Option<u16> = None;
    let mut hoa_order: Option<u8> = None;
    let mut bit_rate_kbps: Option<u64> = None;

    match codec_id {
        AudioCodecId::Lossless => {
            let coded = br.read_bits(4)?;
            let channels = if coded == 15 { br.read_bits(8)? } else { coded };
            channel_number = Some(channels as u16);
        }
        AudioCodecId::General => match coding_profile {
            CodingProfile::Basic => {
                let index = br.read_bits(7)?;
                if let Some(config) = ChannelConfiguration::from_index(index) {
                    channel_number = Some(config.channels());
                    channel_configuration = Some(config);
                }
            }
            CodingProfile::ObjectMetadata => {
                let sound_bed_type = br.read_bits(2)?;
                match sound_bed_type {
                    0 => {
                        let objects = br.read_bits(7)? + 1;
                        let bitrate_index = br.read_bits(4)?;
                        object_channel_number = Some(objects as u16);
                        bit_rate_kbps = ChannelConfiguration::Mono
                            .bitrate_kbps(bitrate_index)
                            .map(|rate| rate as u64 * objects as u64);
                    }
                    1 => {
                        let bed_index = br.read_bits(7)?;
                        let bed_bitrate_index = br.read_bits(4)?;
                        let objects = br.read_bits(7)? + 1;
                        let object_bitrate_index = br.read_bits(4)?;
                        object_channel_number = Some(objects as u16);
                        if let Some(config) = ChannelConfiguration::from_index(bed_index) {
                            channel_number = Some(config.channels());
                            channel_configuration = Some(config);
                            let bed = config.bitrate_kbps(bed_bitrate_index);
                            let object = ChannelConfiguration::Mono
                                .bitrate_kbps(object_bitrate_index)
                                .map(|rate| rate as u64 * objects as u64);
                            bit_rate_kbps = match (bed, object) {
                                (Some(b), Some(o)) => Some(b as u64 + o),
                                _ => None,
                            };
                        }
                    }
                    _ => {}
                }
            }
            CodingProfile::FoaHoa => {
                let order = br.read_bits(4)?;
                hoa_order = Some(order as u8);
                if let Some(config) = ChannelConfiguration::from_hoa_order(order) {
                    channel_number = Some(config.channels());
                    channel_configuration = Some(config);
                }
            }
            CodingProfile::Reserved => {}
        },
    }

    let resolution = tables::resolution_bits(br.read_bits(2)?);

    if codec_id == AudioCodecId::General && coding_profile != CodingProfile::ObjectMetadata {
        let bitrate_index = br.read_bits(4)?;
        if let Some(config) = channel_configuration {
            bit_rate_kbps = config.bitrate_kbps(bitrate_index).map(u64::from);
        }
    }

    Ok(AvsAudioInfo {
        codec_id,
        coding_profile,
        sampling_frequency,
        resolution,
        nn_type,
        channel_number,
        channel_configuration: channel_configuration.map(|c| c.name()),
        object_channel_number,
        hoa_order,
        bit_rate: bit_rate_kbps.map(|rate| rate * 1000),
    })
}
