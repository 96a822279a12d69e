//! ISO BMFF (MP4/MOV family) box-level parsing
//!
//! Only the structural subset needed to enumerate tracks and pull the first
//! compressed sample is implemented; sample data itself is never decoded.

pub mod scanner;

pub use scanner::{BmffReport, BmffScanner, BmffTrack};

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};

/// Parsed box header
#[derive(Debug, Clone, Copy)]
pub struct BoxHeader {
    pub box_type: [u8; 4],
    /// Bytes occupied by the size/type (and largesize) fields
    pub header_size: usize,
    /// Total box size including the header; `None` means "to end of file"
    pub total_size: Option<u64>,
}

/// Parse a box header at `offset`.
pub fn parse_box_header(data: &[u8], offset: usize) -> Result<BoxHeader> {
    let head = data.get(offset..offset + 8).ok_or(Error::Truncated)?;
    let size32 = BigEndian::read_u32(&head[0..4]);
    let box_type = [head[4], head[5], head[6], head[7]];

    match size32 {
        0 => Ok(BoxHeader {
            box_type,
            header_size: 8,
            total_size: None,
        }),
        1 => {
            let large = data
                .get(offset + 8..offset + 16)
                .ok_or(Error::Truncated)?;
            let size64 = BigEndian::read_u64(large);
            if size64 < 16 {
                return Err(Error::invalid_input("box largesize too small"));
            }
            Ok(BoxHeader {
                box_type,
                header_size: 16,
                total_size: Some(size64),
            })
        }
        2..=7 => Err(Error::invalid_input("box size too small")),
        _ => Ok(BoxHeader {
            box_type,
            header_size: 8,
            total_size: Some(size32 as u64),
        }),
    }
}

/// Enumerate `(header, content_start, content_end)` for the children of a
/// byte range. Fails with `Truncated` when a child extends past `end`.
pub fn child_boxes(
    data: &[u8],
    start: usize,
    end: usize,
) -> Result<Vec<(BoxHeader, usize, usize)>> {
    let mut children = Vec::new();
    let mut offset = start;
    while offset + 8 <= end {
        let header = parse_box_header(data, offset)?;
        let total = match header.total_size {
            Some(size) => size as usize,
            None => end - offset,
        };
        if total < header.header_size {
            return Err(Error::invalid_input("box size smaller than header"));
        }
        if offset + total > end {
            return Err(Error::Truncated);
        }
        children.push((header, offset + header.header_size, offset + total));
        offset += total;
    }
    Ok(children)
}

/// Printable form of a fourCC
pub fn fourcc_str(fourcc: &[u8; 4]) -> String {
    fourcc
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Human-readable codec label for common non-AVS sample entries
pub fn sample_entry_name(fourcc: &[u8; 4]) -> Option<&'static str> {
    match fourcc {
        b"avc1" | b"avc3" => Some("H.264"),
        b"hvc1" | b"hev1" => Some("H.265"),
        b"av01" => Some("AV1"),
        b"vp09" => Some("VP9"),
        b"mp4a" => Some("AAC"),
        b"ac-3" => Some("AC-3"),
        b"ec-3" => Some("E-AC-3"),
        b"dtsc" => Some("DTS"),
        b"Opus" => Some("Opus"),
        b"fLaC" => Some("FLAC"),
        b"avst" => Some("AVS2"),
        b"avs3" => Some("AVS3"),
        b"av3a" => Some("Audio Vivid"),
        _ => None,
    }
}
