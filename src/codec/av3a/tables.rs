//! Fixed tables for Audio Vivid (AV3A) frame-header decoding
//!
//! Sampling frequencies, channel configurations and the per-configuration
//! bit-rate tables are pure data lifted from the AATF syntax tables.

/// Sampling frequencies in Hz indexed by `sampling_frequency_index`.
///
/// Indices past the table are reserved; index 0xF (Lossless only) escapes
/// to an explicit 24-bit frequency field.
pub const SAMPLING_FREQUENCIES: [u32; 9] = [
    192000, 96000, 48000, 44100, 32000, 24000, 22050, 16000, 8000,
];

/// Look up a sampling frequency; reserved indices yield `None`.
pub fn sampling_frequency(index: u32) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}

/// Channel configuration indexed by `channel_number_index` (u7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelConfiguration {
    Mono,
    Stereo,
    Mc5_1,
    Mc7_1,
    Mc10_2,
    Mc22_2,
    Mc4_0,
    Mc5_1_2,
    Mc5_1_4,
    Mc7_1_2,
    Mc7_1_4,
    Foa,
    HoaOrder2,
    HoaOrder3,
}

impl ChannelConfiguration {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(ChannelConfiguration::Mono),
            1 => Some(ChannelConfiguration::Stereo),
            2 => Some(ChannelConfiguration::Mc5_1),
            3 => Some(ChannelConfiguration::Mc7_1),
            4 => Some(ChannelConfiguration::Mc10_2),
            5 => Some(ChannelConfiguration::Mc22_2),
            6 => Some(ChannelConfiguration::Mc4_0),
            7 => Some(ChannelConfiguration::Mc5_1_2),
            8 => Some(ChannelConfiguration::Mc5_1_4),
            9 => Some(ChannelConfiguration::Mc7_1_2),
            10 => Some(ChannelConfiguration::Mc7_1_4),
            11 => Some(ChannelConfiguration::Foa),
            12 => Some(ChannelConfiguration::HoaOrder2),
            13 => Some(ChannelConfiguration::HoaOrder3),
            _ => None,
        }
    }

    /// Configuration selected by the FOA/HOA `order` field
    pub fn from_hoa_order(order: u32) -> Option<Self> {
        match order {
            1 => Some(ChannelConfiguration::Foa),
            2 => Some(ChannelConfiguration::HoaOrder2),
            3 => Some(ChannelConfiguration::HoaOrder3),
            _ => None,
        }
    }

    /// Derived channel count
    pub fn channels(&self) -> u16 {
        match self {
            ChannelConfiguration::Mono => 1,
            ChannelConfiguration::Stereo => 2,
            ChannelConfiguration::Mc5_1 => 6,
            ChannelConfiguration::Mc7_1 => 8,
            ChannelConfiguration::Mc10_2 => 12,
            ChannelConfiguration::Mc22_2 => 24,
            ChannelConfiguration::Mc4_0 => 4,
            ChannelConfiguration::Mc5_1_2 => 8,
            ChannelConfiguration::Mc5_1_4 => 10,
            ChannelConfiguration::Mc7_1_2 => 10,
            ChannelConfiguration::Mc7_1_4 => 12,
            ChannelConfiguration::Foa => 4,
            ChannelConfiguration::HoaOrder2 => 9,
            ChannelConfiguration::HoaOrder3 => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChannelConfiguration::Mono => "Mono",
            ChannelConfiguration::Stereo => "Stereo",
            ChannelConfiguration::Mc5_1 => "5.1",
            ChannelConfiguration::Mc7_1 => "7.1",
            ChannelConfiguration::Mc10_2 => "10.2",
            ChannelConfiguration::Mc22_2 => "22.2",
            ChannelConfiguration::Mc4_0 => "4.0",
            ChannelConfiguration::Mc5_1_2 => "5.1.2",
            ChannelConfiguration::Mc5_1_4 => "5.1.4",
            ChannelConfiguration::Mc7_1_2 => "7.1.2",
            ChannelConfiguration::Mc7_1_4 => "7.1.4",
            ChannelConfiguration::Foa => "FOA",
            ChannelConfiguration::HoaOrder2 => "HOA order 2",
            ChannelConfiguration::HoaOrder3 => "HOA order 3",
        }
    }

    /// Per-configuration bit-rate table in kbps, indexed by `bitrate_index`
    pub fn bitrate_table(&self) -> &'static [u32] {
        match self {
            ChannelConfiguration::Mono => &BITRATES_MONO,
            ChannelConfiguration::Stereo => &BITRATES_STEREO,
            ChannelConfiguration::Mc5_1 => &BITRATES_MC_5_1,
            ChannelConfiguration::Mc7_1 => &BITRATES_MC_7_1,
            ChannelConfiguration::Mc10_2 => &BITRATES_MC_10_2,
            ChannelConfiguration::Mc22_2 => &BITRATES_MC_22_2,
            ChannelConfiguration::Mc4_0 => &BITRATES_MC_4_0,
            ChannelConfiguration::Mc5_1_2 => &BITRATES_MC_5_1_2,
            ChannelConfiguration::Mc5_1_4 => &BITRATES_MC_5_1_4,
            ChannelConfiguration::Mc7_1_2 => &BITRATES_MC_7_1_2,
            ChannelConfiguration::Mc7_1_4 => &BITRATES_MC_7_1_4,
            ChannelConfiguration::Foa => &BITRATES_FOA,
            ChannelConfiguration::HoaOrder2 => &BITRATES_HOA_ORDER2,
            ChannelConfiguration::HoaOrder3 => &BITRATES_HOA_ORDER3,
        }
    }

    /// Bit rate in kbps for a `bitrate_index`; reserved indices yield `None`
    pub fn bitrate_kbps(&self, index: u32) -> Option<u32> {
        self.bitrate_table().get(index as usize).copied()
    }
}

pub const BITRATES_MONO: [u32; 12] = [16, 32, 44, 56, 64, 72, 80, 96, 128, 144, 164, 192];
pub const BITRATES_STEREO: [u32; 11] = [24, 32, 48, 64, 80, 96, 128, 144, 192, 256, 320];
pub const BITRATES_MC_5_1: [u32; 12] =
    [192, 256, 320, 384, 448, 512, 640, 720, 144, 96, 128, 160];
pub const BITRATES_MC_7_1: [u32; 8] = [192, 480, 256, 384, 576, 640, 128, 160];
pub const BITRATES_MC_4_0: [u32; 5] = [48, 96, 128, 192, 256];
pub const BITRATES_MC_5_1_2: [u32; 4] = [152, 320, 480, 576];
pub const BITRATES_MC_5_1_4: [u32; 6] = [176, 384, 576, 704, 256, 448];
pub const BITRATES_MC_7_1_2: [u32; 5] = [216, 480, 576, 384, 768];
pub const BITRATES_MC_7_1_4: [u32; 5] = [240, 608, 384, 512, 832];
pub const BITRATES_MC_10_2: [u32; 5] = [576, 800, 1024, 1200, 1536];
pub const BITRATES_MC_22_2: [u32; 3] = [800, 1536, 1200];
pub const BITRATES_FOA: [u32; 4] = [96, 128, 192, 256];
pub const BITRATES_HOA_ORDER2: [u32; 7] = [192, 256, 320, 384, 480, 512, 640];
pub const BITRATES_HOA_ORDER3: [u32; 6] = [256, 320, 384, 512, 640, 896];

/// Map a 2-bit `resolution` code to bits per sample (0 for reserved)
pub fn resolution_bits(code: u32) -> u8 {
    match code {
        0 => 8,
        1 => 16,
        2 => 24,
        _ => 0,
    }
}
