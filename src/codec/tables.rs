//! Shared numeric tables and enums for AVS video parsing
//!
//! Frame-rate and aspect-ratio tables, chroma/colour/packing enums and the
//! default weight-quantization matrices are shared by the AVS1/AVS2/AVS3
//! sequence-header parsers. All tables are immutable process-wide constants.

/// Frame rates indexed by `frame_rate_code` (u4).
///
/// Index 0 is forbidden. Codes 9..=13 are defined by AVS3 only; earlier
/// generations treat them as reserved, which the shared table represents
/// uniformly (a reserved code reads as 0.0).
pub const FRAME_RATES: [f64; 16] = [
    0.0,               // forbidden
    24000.0 / 1001.0,  // 23.976
    24.0,
    25.0,
    30000.0 / 1001.0,  // 29.97
    30.0,
    50.0,
    60000.0 / 1001.0,  // 59.94
    60.0,
    100.0,
    120.0,
    200.0,
    240.0,
    300.0,
    0.0,               // reserved
    0.0,               // reserved
];

/// Look up the frame rate for a 4-bit frame-rate code.
pub fn frame_rate(code: u32) -> f64 {
    FRAME_RATES.get(code as usize).copied().unwrap_or(0.0)
}

/// Aspect-ratio signalling: `(sar, dar)` indexed by `aspect_ratio_info` (u4).
///
/// Code 1 signals a square sample aspect ratio; codes 2..=4 signal a display
/// aspect ratio instead. Everything else is reserved and reports neither.
pub const ASPECT_RATIOS: [(Option<&str>, Option<&str>); 16] = [
    (None, None), // forbidden
    (Some("1:1"), None),
    (None, Some("4:3")),
    (None, Some("16:9")),
    (None, Some("2.21:1")),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
    (None, None),
];

/// Look up `(sar, dar)` for a 4-bit aspect-ratio code.
pub fn aspect_ratio(code: u32) -> (Option<&'static str>, Option<&'static str>) {
    ASPECT_RATIOS
        .get(code as usize)
        .copied()
        .unwrap_or((None, None))
}

/// Chroma sampling format (2-bit `chroma_format` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaFormat {
    Reserved,
    Yuv420,
    Yuv422,
    Yuv444,
}

impl ChromaFormat {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ChromaFormat::Yuv420,
            2 => ChromaFormat::Yuv422,
            3 => ChromaFormat::Yuv444,
            _ => ChromaFormat::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChromaFormat::Reserved => "Reserved",
            ChromaFormat::Yuv420 => "4:2:0",
            ChromaFormat::Yuv422 => "4:2:2",
            ChromaFormat::Yuv444 => "4:4:4",
        }
    }
}

/// Map a 3-bit `sample_precision` / `encoding_precision` code to a bit depth.
///
/// Returns `None` for reserved or forbidden codes.
pub fn bit_depth(precision_code: u32) -> Option<u8> {
    match precision_code {
        1 => Some(8),
        3 => Some(10),
        5 => Some(12),
        _ => None,
    }
}

/// Video format names from the display extension (3-bit `video_format`)
pub const VIDEO_FORMATS: [&str; 8] = [
    "Component",
    "PAL",
    "NTSC",
    "SECAM",
    "MAC",
    "Unspecified",
    "Reserved",
    "Reserved",
];

pub fn video_format(code: u32) -> &'static str {
    VIDEO_FORMATS.get(code as usize).copied().unwrap_or("Reserved")
}

/// Colour primaries (8-bit code from the display extension)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPrimaries {
    Bt709,
    Unspecified,
    Bt470M,
    Bt601_625,
    Bt601_525,
    Smpte240M,
    GenericFilm,
    Bt2020,
    Reserved,
}

impl ColorPrimaries {
    fn from_valid_code(code: u32) -> Self {
        match code {
            1 => ColorPrimaries::Bt709,
            2 => ColorPrimaries::Unspecified,
            4 => ColorPrimaries::Bt470M,
            5 => ColorPrimaries::Bt601_625,
            6 => ColorPrimaries::Bt601_525,
            7 => ColorPrimaries::Smpte240M,
            8 => ColorPrimaries::GenericFilm,
            9 => ColorPrimaries::Bt2020,
            _ => ColorPrimaries::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorPrimaries::Bt709 => "BT.709",
            ColorPrimaries::Unspecified => "Unspecified",
            ColorPrimaries::Bt470M => "BT.470 System M",
            ColorPrimaries::Bt601_625 => "BT.601 625",
            ColorPrimaries::Bt601_525 => "BT.601 525",
            ColorPrimaries::Smpte240M => "SMPTE 240M",
            ColorPrimaries::GenericFilm => "Generic film",
            ColorPrimaries::Bt2020 => "BT.2020",
            ColorPrimaries::Reserved => "Reserved",
        }
    }
}

/// Transfer characteristics (8-bit code from the display extension)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCharacteristics {
    Bt709,
    Unspecified,
    Gamma22,
    Gamma28,
    Bt601,
    Smpte240M,
    Linear,
    Log100,
    Log316,
    Bt1361,
    Pq,
    Hlg,
    Reserved,
}

impl TransferCharacteristics {
    fn from_valid_code(code: u32) -> Self {
        match code {
            1 => TransferCharacteristics::Bt709,
            2 => TransferCharacteristics::Unspecified,
            4 => TransferCharacteristics::Gamma22,
            5 => TransferCharacteristics::Gamma28,
            6 => TransferCharacteristics::Bt601,
            7 => TransferCharacteristics::Smpte240M,
            8 => TransferCharacteristics::Linear,
            9 => TransferCharacteristics::Log100,
            10 => TransferCharacteristics::Log316,
            11 => TransferCharacteristics::Bt1361,
            12 => TransferCharacteristics::Pq,
            14 => TransferCharacteristics::Hlg,
            _ => TransferCharacteristics::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferCharacteristics::Bt709 => "BT.709",
            TransferCharacteristics::Unspecified => "Unspecified",
            TransferCharacteristics::Gamma22 => "Gamma 2.2",
            TransferCharacteristics::Gamma28 => "Gamma 2.8",
            TransferCharacteristics::Bt601 => "BT.601",
            TransferCharacteristics::Smpte240M => "SMPTE 240M",
            TransferCharacteristics::Linear => "Linear",
            TransferCharacteristics::Log100 => "Log 100:1",
            TransferCharacteristics::Log316 => "Log 316:1",
            TransferCharacteristics::Bt1361 => "BT.1361",
            TransferCharacteristics::Pq => "PQ",
            TransferCharacteristics::Hlg => "HLG",
            TransferCharacteristics::Reserved => "Reserved",
        }
    }
}

/// Matrix coefficients (8-bit code from the display extension)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixCoefficients {
    Bt709,
    Unspecified,
    Fcc,
    Bt470Bg,
    Smpte170M,
    Smpte240M,
    Bt2020Ncl,
    Reserved,
}

impl MatrixCoefficients {
    fn from_valid_code(code: u32) -> Self {
        match code {
            1 => MatrixCoefficients::Bt709,
            2 => MatrixCoefficients::Unspecified,
            4 => MatrixCoefficients::Fcc,
            5 => MatrixCoefficients::Bt470Bg,
            6 => MatrixCoefficients::Smpte170M,
            7 => MatrixCoefficients::Smpte240M,
            9 => MatrixCoefficients::Bt2020Ncl,
            _ => MatrixCoefficients::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatrixCoefficients::Bt709 => "BT.709",
            MatrixCoefficients::Unspecified => "Unspecified",
            MatrixCoefficients::Fcc => "FCC",
            MatrixCoefficients::Bt470Bg => "BT.470 System B/G",
            MatrixCoefficients::Smpte170M => "SMPTE 170M",
            MatrixCoefficients::Smpte240M => "SMPTE 240M",
            MatrixCoefficients::Bt2020Ncl => "BT.2020 non-constant luminance",
            MatrixCoefficients::Reserved => "Reserved",
        }
    }
}

/// Per-codec valid ranges for the colour description fields.
///
/// Value 0 is forbidden and maps to "absent"; values inside the range map to
/// their enum member; everything else is normalized to Reserved.
#[derive(Debug, Clone, Copy)]
pub struct ColorRanges {
    pub primaries_max: u32,
    pub transfer_max: u32,
    pub transfer_reserved: &'static [u32],
    pub matrix_max: u32,
    pub matrix_reserved: &'static [u32],
}

/// AVS1 (GB/T 20090.2) valid colour ranges
pub const AVS1_COLOR_RANGES: ColorRanges = ColorRanges {
    primaries_max: 8,
    transfer_max: 10,
    transfer_reserved: &[3],
    matrix_max: 7,
    matrix_reserved: &[3],
};

/// AVS2 (GB/T 33475.2) valid colour ranges
pub const AVS2_COLOR_RANGES: ColorRanges = ColorRanges {
    primaries_max: 9,
    transfer_max: 14,
    transfer_reserved: &[3],
    matrix_max: 9,
    matrix_reserved: &[3, 8],
};

/// AVS3 (T/AI 109.2) valid colour ranges
pub const AVS3_COLOR_RANGES: ColorRanges = ColorRanges {
    primaries_max: 9,
    transfer_max: 14,
    transfer_reserved: &[3, 13],
    matrix_max: 9,
    matrix_reserved: &[3, 8],
};

/// Validate and map a colour-primaries code. 0 is forbidden (absent).
pub fn color_primaries(code: u32, ranges: &ColorRanges) -> Option<ColorPrimaries> {
    if code == 0 {
        return None;
    }
    if code > ranges.primaries_max {
        return Some(ColorPrimaries::Reserved);
    }
    Some(ColorPrimaries::from_valid_code(code))
}

/// Validate and map a transfer-characteristics code. 0 is forbidden (absent).
pub fn transfer_characteristics(
    code: u32,
    ranges: &ColorRanges,
) -> Option<TransferCharacteristics> {
    if code == 0 {
        return None;
    }
    if code > ranges.transfer_max || ranges.transfer_reserved.contains(&code) {
        return Some(TransferCharacteristics::Reserved);
    }
    Some(TransferCharacteristics::from_valid_code(code))
}

/// Validate and map a matrix-coefficients code. 0 is forbidden (absent).
pub fn matrix_coefficients(code: u32, ranges: &ColorRanges) -> Option<MatrixCoefficients> {
    if code == 0 {
        return None;
    }
    if code > ranges.matrix_max || ranges.matrix_reserved.contains(&code) {
        return Some(MatrixCoefficients::Reserved);
    }
    Some(MatrixCoefficients::from_valid_code(code))
}

/// Combined colour description reported when the three fields agree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDescription {
    Bt709,
    Bt601_625,
    Bt601_525,
    Smpte240M,
    Bt2020,
}

impl ColorDescription {
    pub fn name(&self) -> &'static str {
        match self {
            ColorDescription::Bt709 => "BT.709",
            ColorDescription::Bt601_625 => "BT.601 625",
            ColorDescription::Bt601_525 => "BT.601 525",
            ColorDescription::Smpte240M => "SMPTE 240M",
            ColorDescription::Bt2020 => "BT.2020",
        }
    }

    fn from_common_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ColorDescription::Bt709),
            5 => Some(ColorDescription::Bt601_625),
            6 => Some(ColorDescription::Bt601_525),
            7 => Some(ColorDescription::Smpte240M),
            9 => Some(ColorDescription::Bt2020),
            _ => None,
        }
    }
}

/// Derive the combined colour description from raw field codes.
///
/// "BT.709" fires for the (primaries=1, transfer=6, matrix=1) combination;
/// otherwise a description is reported only when all three codes are equal
/// and the common value has a matching member.
pub fn combined_color_description(
    primaries: u32,
    transfer: u32,
    matrix: u32,
) -> Option<ColorDescription> {
    if primaries == 1 && transfer == 6 && matrix == 1 {
        return Some(ColorDescription::Bt709);
    }
    if primaries == transfer && transfer == matrix {
        return ColorDescription::from_common_code(primaries);
    }
    None
}

/// Unified stereo/3D frame packing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingMode {
    Mono,
    Mode2D,
    SideBySide,
    OverUnder,
    Quad,
    TdOverUnder,
    TdSideBySide,
    Reserved,
}

impl PackingMode {
    /// AVS1 `stereo_packing_mode` (u2)
    pub fn from_avs1_stereo(code: u32) -> Self {
        match code {
            0 => PackingMode::Mono,
            1 => PackingMode::SideBySide,
            2 => PackingMode::OverUnder,
            _ => PackingMode::Reserved,
        }
    }

    /// AVS2 `td_packing_mode` (u8); valid values 0..=4
    pub fn from_avs2_td(code: u32) -> Self {
        match code {
            0 => PackingMode::Mode2D,
            1 => PackingMode::SideBySide,
            2 => PackingMode::OverUnder,
            3 => PackingMode::Quad,
            4 => PackingMode::TdOverUnder,
            _ => PackingMode::Reserved,
        }
    }

    /// AVS3 `td_packing_mode` (u8); valid values 0..=2
    pub fn from_avs3_td(code: u32) -> Self {
        match code {
            0 => PackingMode::Mode2D,
            1 => PackingMode::SideBySide,
            2 => PackingMode::OverUnder,
            _ => PackingMode::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackingMode::Mono => "Mono",
            PackingMode::Mode2D => "2D",
            PackingMode::SideBySide => "Side by side",
            PackingMode::OverUnder => "Over under",
            PackingMode::Quad => "Quad",
            PackingMode::TdOverUnder => "TD over under",
            PackingMode::TdSideBySide => "TD side by side",
            PackingMode::Reserved => "Reserved",
        }
    }
}

/// HDR dynamic-metadata type from the AVS3 extension (ext id 0b0101)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrDynamicMetadataType {
    HdrVivid,
    Reserved,
}

impl HdrDynamicMetadataType {
    pub fn from_code(code: u32) -> Self {
        match code {
            5 => HdrDynamicMetadataType::HdrVivid,
            _ => HdrDynamicMetadataType::Reserved,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HdrDynamicMetadataType::HdrVivid => "HDR Vivid",
            HdrDynamicMetadataType::Reserved => "Reserved",
        }
    }
}

/// Default 4x4 weight-quantization matrix, row-major
pub const DEFAULT_WQM_4X4: [u32; 16] = [
    64, 64, 64, 68,
    64, 64, 68, 72,
    64, 68, 76, 80,
    72, 76, 84, 96,
];

/// Default 8x8 weight-quantization matrix, row-major
pub const DEFAULT_WQM_8X8: [u32; 64] = [
    64, 64, 64, 64, 68, 68, 72, 76,
    64, 64, 64, 68, 72, 76, 84, 92,
    64, 64, 68, 72, 76, 80, 88, 100,
    64, 68, 72, 80, 84, 92, 100, 112,
    68, 72, 80, 84, 92, 104, 112, 128,
    76, 80, 84, 92, 104, 116, 132, 152,
    96, 100, 104, 116, 124, 140, 164, 188,
    104, 108, 116, 128, 152, 172, 192, 216,
];
