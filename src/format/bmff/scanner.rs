//! Track enumeration and first-sample extraction for ISO BMFF inputs
//!
//! Walks moov/trak/mdia/minf/stbl, recognizes the AVS sample-entry fourCCs
//! and resolves the file offset of one compressed sample per matching track
//! through stsc/stsz/stco(co64), preferring the first sync sample listed in
//! stss.

use super::{child_boxes, fourcc_str, parse_box_header, sample_entry_name};
use crate::codec::CodecKind;
use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace};

/// One track discovered in the moov box
#[derive(Debug, Clone)]
pub struct BmffTrack {
    pub track_id: u32,
    /// Sample-entry fourCC from stsd
    pub fourcc: [u8; 4],
    /// Handler type from hdlr (container's own claim)
    pub handler: [u8; 4],
    /// AVS codec kind for `avst`/`avs3`/`av3a` entries
    pub codec: Option<CodecKind>,
    /// Track type corrected from the fourCC for AVS entries
    pub is_video: bool,
    /// Generic label for non-AVS entries
    pub codec_name: Option<&'static str>,
    /// First compressed sample for codec parsing
    pub first_sample: Option<Vec<u8>>,
}

/// Scan outcome
#[derive(Debug, Clone, Default)]
pub struct BmffReport {
    pub tracks: Vec<BmffTrack>,
}

impl BmffReport {
    /// Tracks carrying an AVS codec
    pub fn avs_tracks(&self) -> impl Iterator<Item = &BmffTrack> {
        self.tracks.iter().filter(|t| t.codec.is_some())
    }
}

/// Incremental front-end: buffer appended chunks until a scan completes.
#[derive(Default)]
pub struct BmffScanner {
    buffer: Vec<u8>,
}

impl BmffScanner {
    pub fn new() -> Self {
        BmffScanner { buffer: Vec::new() }
    }

    /// Append a chunk; returns the report once the walk no longer runs out
    /// of bytes, `None` while more data is needed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<BmffReport>> {
        self.buffer.extend_from_slice(chunk);
        match scan(&self.buffer) {
            Ok(report) => Ok(Some(report)),
            Err(Error::Truncated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Input exhausted: the walk must complete with what was buffered.
    pub fn finish(self) -> Result<BmffReport> {
        scan(&self.buffer)
    }
}

/// One-shot scan over a complete (or sufficiently complete) input.
pub fn scan(data: &[u8]) -> Result<BmffReport> {
    let mut report = BmffReport::default();
    let mut offset = 0usize;

    while offset + 8 <= data.len() {
        let header = parse_box_header(data, offset)?;
        let total = match header.total_size {
            Some(size) => size as usize,
            None => data.len() - offset,
        };
        if &header.box_type == b"moov" {
            if offset + total > data.len() {
                return Err(Error::Truncated);
            }
            let content_start = offset + header.header_size;
            parse_moov(data, content_start, offset + total, &mut report)?;
        }
        // mdat and friends are skipped structurally; sample extents are
        // resolved through absolute stco offsets
        if total < header.header_size {
            return Err(Error::invalid_input("box size smaller than header"));
        }
        offset += total;
    }

    Ok(report)
}

fn parse_moov(data: &[u8], start: usize, end: usize, report: &mut BmffReport) -> Result<()> {
    for (header, content_start, content_end) in child_boxes(data, start, end)? {
        if &header.box_type == b"trak" {
            match parse_trak(data, content_start, content_end) {
                Ok(Some(track)) => {
                    debug!(
                        track_id = track.track_id,
                        fourcc = %fourcc_str(&track.fourcc),
                        avs = track.codec.is_some(),
                        "track enumerated"
                    );
                    report.tracks.push(track);
                }
                Ok(None) => {}
                Err(Error::Truncated) => return Err(Error::Truncated),
                Err(e) => trace!(error = %e, "track rejected"),
            }
        }
    }
    Ok(())
}

fn parse_trak(data: &[u8], start: usize, end: usize) -> Result<Option<BmffTrack>> {
    let mut track_id = 0u32;
    let mut handler = [0u8; 4];
    let mut stbl_range: Option<(usize, usize)> = None;

    for (header, content_start, content_end) in child_boxes(data, start, end)? {
        match &header.box_type {
            b"tkhd" => {
                track_id = parse_tkhd_track_id(&data[content_start..content_end])?;
            }
            b"mdia" => {
                for (mdia_child, mdia_start, mdia_end) in
                    child_boxes(data, content_start, content_end)?
                {
                    match &mdia_child.box_type {
                        b"hdlr" => {
                            let body = &data[mdia_start..mdia_end];
                            if body.len() >= 12 {
                                handler.copy_from_slice(&body[8..12]);
                            }
                        }
                        b"minf" => {
                            for (minf_child, minf_start, minf_end) in
                                child_boxes(data, mdia_start, mdia_end)?
                            {
                                if &minf_child.box_type == b"stbl" {
                                    stbl_range = Some((minf_start, minf_end));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let Some((stbl_start, stbl_end)) = stbl_range else {
        return Ok(None);
    };
    let tables = parse_stbl(data, stbl_start, stbl_end)?;
    let Some(fourcc) = tables.sample_entry else {
        return Ok(None);
    };

    let codec = CodecKind::from_fourcc(&fourcc);
    // the fourCC wins over the container's handler claim
    let is_video = match codec {
        Some(kind) => kind.is_video(),
        None => &handler == b"vide",
    };

    let first_sample = match codec {
        Some(_) => extract_first_sample(data, &tables)?,
        None => None,
    };

    Ok(Some(BmffTrack {
        track_id,
        fourcc,
        handler,
        codec,
        is_video,
        codec_name: sample_entry_name(&fourcc),
        first_sample,
    }))
}

fn parse_tkhd_track_id(body: &[u8]) -> Result<u32> {
    if body.is_empty() {
        return Err(Error::Truncated);
    }
    let version = body[0];
    // version/flags (4) + creation/modification times (8 or 16)
    let offset = if version == 1 { 4 + 16 } else { 4 + 8 };
    let id_bytes = body.get(offset..offset + 4).ok_or(Error::Truncated)?;
    Ok(BigEndian::read_u32(id_bytes))
}

/// Sample-table data needed to locate one sample
#[derive(Debug, Default)]
struct SampleTables {
    sample_entry: Option<[u8; 4]>,
    /// (first_chunk, samples_per_chunk) runs from stsc
    sample_to_chunk: Vec<(u32, u32)>,
    /// Uniform sample size, or 0 with per-sample sizes
    uniform_size: u32,
    sample_sizes: Vec<u32>,
    sample_count: u32,
    chunk_offsets: Vec<u64>,
    /// First sync sample number (1-based) from stss
    first_sync_sample: Option<u32>,
}

fn parse_stbl(data: &[u8], start: usize, end: usize) -> Result<SampleTables> {
    let mut tables = SampleTables::default();

    for (header, content_start, content_end) in child_boxes(data, start, end)? {
        let body = &data[content_start..content_end];
        match &header.box_type {
            b"stsd" => {
                tables.sample_entry = parse_stsd_entry(data, content_start, content_end)?;
            }
            b"stsc" => {
                if body.len() < 8 {
                    return Err(Error::Truncated);
                }
                let count = BigEndian::read_u32(&body[4..8]) as usize;
                let entries = body.get(8..8 + count * 12).ok_or(Error::Truncated)?;
                for entry in entries.chunks_exact(12) {
                    tables.sample_to_chunk.push((
                        BigEndian::read_u32(&entry[0..4]),
                        BigEndian::read_u32(&entry[4..8]),
                    ));
                }
            }
            b"stsz" => {
                if body.len() < 12 {
                    return Err(Error::Truncated);
                }
                tables.uniform_size = BigEndian::read_u32(&body[4..8]);
                tables.sample_count = BigEndian::read_u32(&body[8..12]);
                if tables.uniform_size == 0 {
                    let count = tables.sample_count as usize;
                    let sizes = body.get(12..12 + count * 4).ok_or(Error::Truncated)?;
                    for size in sizes.chunks_exact(4) {
                        tables.sample_sizes.push(BigEndian::read_u32(size));
                    }
                }
            }
            b"stco" => {
                if body.len() < 8 {
                    return Err(Error::Truncated);
                }
                let count = BigEndian::read_u32(&body[4..8]) as usize;
                let offsets = body.get(8..8 + count * 4).ok_or(Error::Truncated)?;
                for chunk in offsets.chunks_exact(4) {
                    tables.chunk_offsets.push(BigEndian::read_u32(chunk) as u64);
                }
            }
            b"co64" => {
                if body.len() < 8 {
                    return Err(Error::Truncated);
                }
                let count = BigEndian::read_u32(&body[4..8]) as usize;
                let offsets = body.get(8..8 + count * 8).ok_or(Error::Truncated)?;
                for chunk in offsets.chunks_exact(8) {
                    tables.chunk_offsets.push(BigEndian::read_u64(chunk));
                }
            }
            b"stss" => {
                if body.len() < 8 {
                    return Err(Error::Truncated);
                }
                let count = BigEndian::read_u32(&body[4..8]) as usize;
                if count > 0 {
                    let first = body.get(8..12).ok_or(Error::Truncated)?;
                    tables.first_sync_sample = Some(BigEndian::read_u32(first));
                }
            }
            _ => {}
        }
    }

    Ok(tables)
}

fn parse_stsd_entry(data: &[u8], start: usize, end: usize) -> Result<Option<[u8; 4]>> {
    let body = &data[start..end];
    if body.len() < 8 {
        return Err(Error::Truncated);
    }
    let entry_count = BigEndian::read_u32(&body[4..8]);
    if entry_count == 0 {
        return Ok(None);
    }
    // first sample entry is itself a box
    let entry = parse_box_header(data, start + 8)?;
    Ok(Some(entry.box_type))
}

/// Resolve and copy one compressed sample.
///
/// Prefers the first sync sample from stss; falls back to sample 1. Fails
/// with `Truncated` when the sample extent lies beyond the supplied bytes.
fn extract_first_sample(data: &[u8], tables: &SampleTables) -> Result<Option<Vec<u8>>> {
    if tables.chunk_offsets.is_empty() || tables.sample_count == 0 {
        return Ok(None);
    }
    let sample_number = tables
        .first_sync_sample
        .filter(|&n| n >= 1 && n <= tables.sample_count)
        .unwrap_or(1);

    let Some((offset, size)) = locate_sample(tables, sample_number) else {
        return Ok(None);
    };
    let start = offset as usize;
    let end = start
        .checked_add(size as usize)
        .ok_or_else(|| Error::invalid_input("sample extent overflow"))?;
    let bytes = data.get(start..end).ok_or(Error::Truncated)?;
    Ok(Some(bytes.to_vec()))
}

fn sample_size(tables: &SampleTables, sample_number: u32) -> Option<u32> {
    if tables.uniform_size != 0 {
        Some(tables.uniform_size)
    } else {
        tables
            .sample_sizes
            .get(sample_number as usize - 1)
            .copied()
    }
}

/// Map a 1-based sample number to its absolute file offset and size.
fn locate_sample(tables: &SampleTables, sample_number: u32) -> Option<(u64, u32)> {
    if tables.sample_to_chunk.is_empty() {
        return None;
    }
    let chunk_count = tables.chunk_offsets.len() as u32;
    let mut remaining = sample_number - 1;

    for (i, &(first_chunk, samples_per_chunk)) in tables.sample_to_chunk.iter().enumerate() {
        let run_end = tables
            .sample_to_chunk
            .get(i + 1)
            .map(|&(next_first, _)| next_first)
            .unwrap_or(chunk_count + 1);
        if first_chunk == 0 || samples_per_chunk == 0 || run_end <= first_chunk {
            return None;
        }
        let chunks_in_run = run_end - first_chunk;
        let samples_in_run = chunks_in_run.checked_mul(samples_per_chunk)?;
        if remaining < samples_in_run {
            let chunk_index = first_chunk - 1 + remaining / samples_per_chunk;
            let index_in_chunk = remaining % samples_per_chunk;
            let chunk_offset = *tables.chunk_offsets.get(chunk_index as usize)?;
            let first_sample_of_chunk = sample_number - index_in_chunk;
            let mut offset = chunk_offset;
            for n in first_sample_of_chunk..sample_number {
                offset += u64::from(sample_size(tables, n)?);
            }
            return Some((offset, sample_size(tables, sample_number)?));
        }
        remaining -= samples_in_run;
    }
    None
}
