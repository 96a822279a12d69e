//! Push-based MPEG-TS scanner with PES reassembly
//!
//! Appended chunks are consumed packet by packet: PAT/PMT tables are
//! discovered on the fly, PES packets are reassembled per PID and fed to the
//! codec analyzer selected by the stream type. The scan terminates early as
//! soon as every PMT has been parsed and every marked stream has yielded a
//! header.

use super::{
    pids, TsPacketHeader, M2TS_HEADER_SIZE, M2TS_PACKET_SIZE, TS_PACKET_SIZE, TS_SYNC_BYTE,
};
use crate::codec::{AvsInfo, CodecKind, EsAnalyzer};
use crate::error::{Error, Result};
use crate::format::descriptor::{self, AvsDescriptor};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, trace, warn};

/// Number of consecutive packets the size probe verifies
const PROBE_PACKETS: usize = 20;

/// Bytes needed for a full-confidence size probe
const PROBE_WINDOW: usize = M2TS_HEADER_SIZE + PROBE_PACKETS * M2TS_PACKET_SIZE;

/// Completed-PES buffers retained per PID before a codec analyzer exists
const MAX_COMPLETED_PES: usize = 8;

/// Upper bound on one reassembled PES buffer
const MAX_PES_BUFFER: usize = 2 << 20;

/// Packet budget applied in fast-scan mode
pub const FAST_SCAN_PACKET_BUDGET: u64 = 20_000;

/// Detected packet layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLayout {
    /// 188 (TS) or 192 (M2TS)
    pub packet_size: usize,
    /// Offset of the first packet in the input
    pub start_offset: usize,
}

/// Result of pushing a chunk into the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// More input may still change the result
    NeedMoreData,
    /// Early-termination condition met; further input is ignored
    Complete,
}

/// One elementary stream discovered via PMT
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub pid: u16,
    pub stream_type: u8,
    /// AVS codec kind when the stream type is an AVS kind
    pub codec: Option<CodecKind>,
    /// Human-readable name from the stream-type table
    pub type_name: Option<&'static str>,
    /// Codec hint from a well-known descriptor tag
    pub codec_hint: Option<&'static str>,
    pub language: Option<String>,
    pub registration: Option<[u8; 4]>,
    pub max_bitrate: Option<u64>,
    /// Container-side AVS descriptor
    pub descriptor: Option<AvsDescriptor>,
    /// In-band codec info once detected
    pub info: Option<AvsInfo>,
}

/// One program discovered via PAT/PMT
#[derive(Debug, Clone)]
pub struct Program {
    pub program_number: u16,
    pub pmt_pid: u16,
    pub streams: BTreeMap<u16, StreamEntry>,
}

/// Scan outcome
#[derive(Debug, Clone)]
pub struct TsReport {
    pub packet_size: usize,
    pub start_offset: usize,
    pub packets_processed: u64,
    pub programs: Vec<Program>,
    pub warnings: Vec<String>,
}

impl TsReport {
    /// Iterate all discovered streams across programs
    pub fn streams(&self) -> impl Iterator<Item = (&Program, &StreamEntry)> {
        self.programs
            .iter()
            .flat_map(|p| p.streams.values().map(move |s| (p, s)))
    }
}

/// Per-PID PES reassembly state
///
/// `payload_unit_start` finalizes the in-progress buffer into the completed
/// list; completed buffers are bounded (drop-oldest) while no analyzer has
/// claimed the PID yet.
#[derive(Debug, Default)]
struct PesState {
    current: Option<Vec<u8>>,
    completed: VecDeque<Vec<u8>>,
}

/// Push-based MPEG-TS scanner
pub struct TsScanner {
    layout: Option<PacketLayout>,
    pending: Vec<u8>,
    read_pos: usize,
    pat_parsed: bool,
    programs: BTreeMap<u16, Program>,
    pmt_pid_to_program: HashMap<u16, u16>,
    parsed_programs: HashSet<u16>,
    pid_to_program: HashMap<u16, u16>,
    pes: HashMap<u16, PesState>,
    detectors: HashMap<u16, EsAnalyzer>,
    packets_processed: u64,
    packet_budget: Option<u64>,
    finished: bool,
    warnings: Vec<String>,
}

impl Default for TsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TsScanner {
    pub fn new() -> Self {
        TsScanner {
            layout: None,
            pending: Vec::new(),
            read_pos: 0,
            pat_parsed: false,
            programs: BTreeMap::new(),
            pmt_pid_to_program: HashMap::new(),
            parsed_programs: HashSet::new(),
            pid_to_program: HashMap::new(),
            pes: HashMap::new(),
            detectors: HashMap::new(),
            packets_processed: 0,
            packet_budget: None,
            finished: false,
            warnings: Vec::new(),
        }
    }

    /// Limit the scan to a packet budget once a program and stream exist
    pub fn with_packet_budget(mut self, budget: u64) -> Self {
        self.packet_budget = Some(budget);
        self
    }

    /// Number of TS packets parsed so far
    pub fn packets_processed(&self) -> u64 {
        self.packets_processed
    }

    /// Whether the early-termination condition has been met
    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// One-shot scan over a complete input
    pub fn scan(data: &[u8]) -> Result<TsReport> {
        let mut scanner = TsScanner::new();
        scanner.push(data)?;
        scanner.finish()
    }

    /// Append a chunk of container bytes and drive the scan.
    pub fn push(&mut self, chunk: &[u8]) -> Result<ScanStatus> {
        if self.finished {
            return Ok(ScanStatus::Complete);
        }
        self.pending.extend_from_slice(chunk);
        self.drive(false)?;
        self.compact();
        if self.finished {
            Ok(ScanStatus::Complete)
        } else {
            Ok(ScanStatus::NeedMoreData)
        }
    }

    /// Input exhausted: flush per-PID state and build the report.
    pub fn finish(mut self) -> Result<TsReport> {
        if !self.finished {
            self.drive(true)?;
        }
        self.flush();

        let layout = self.layout.unwrap_or(PacketLayout {
            packet_size: TS_PACKET_SIZE,
            start_offset: 0,
        });
        Ok(TsReport {
            packet_size: layout.packet_size,
            start_offset: layout.start_offset,
            packets_processed: self.packets_processed,
            programs: self.programs.into_values().collect(),
            warnings: self.warnings,
        })
    }

    fn drive(&mut self, finalizing: bool) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.layout.is_none() {
            if self.pending.len() < PROBE_WINDOW && !finalizing {
                return Ok(());
            }
            let layout = self.detect_layout()?;
            debug!(
                packet_size = layout.packet_size,
                start_offset = layout.start_offset,
                "transport packet layout detected"
            );
            self.read_pos = layout.start_offset;
            self.layout = Some(layout);
        }
        let layout = self.layout.unwrap();

        while !self.finished && self.read_pos + layout.packet_size <= self.pending.len() {
            let packet_start = self.read_pos
                + if layout.packet_size == M2TS_PACKET_SIZE {
                    M2TS_HEADER_SIZE
                } else {
                    0
                };
            if self.pending[packet_start] != TS_SYNC_BYTE {
                // lost sync; hunt byte by byte
                self.read_pos += 1;
                continue;
            }
            let packet =
                self.pending[packet_start..self.read_pos + layout.packet_size].to_vec();
            self.read_pos += layout.packet_size;
            self.packets_processed += 1;
            self.process_packet(&packet);
            self.check_termination();
        }
        Ok(())
    }

    /// Drop consumed bytes from the pending buffer
    fn compact(&mut self) {
        if self.finished {
            self.pending.clear();
            self.read_pos = 0;
        } else if self.read_pos > 0 && self.layout.is_some() {
            self.pending.drain(..self.read_pos);
            self.read_pos = 0;
        }
    }

    /// Probe the 188-byte and 192-byte hypotheses at the first sync byte.
    fn detect_layout(&mut self) -> Result<PacketLayout> {
        let data = &self.pending;
        let sync_offset = data
            .iter()
            .position(|&b| b == TS_SYNC_BYTE)
            .ok_or(Error::ContainerUnrecognized)?;

        // M2TS: packet starts 4 bytes before the sync byte
        if sync_offset >= M2TS_HEADER_SIZE {
            let candidate = sync_offset - M2TS_HEADER_SIZE;
            if verify_sync_run(data, sync_offset, M2TS_PACKET_SIZE) {
                return Ok(PacketLayout {
                    packet_size: M2TS_PACKET_SIZE,
                    start_offset: candidate,
                });
            }
        }

        if verify_sync_run(data, sync_offset, TS_PACKET_SIZE) {
            return Ok(PacketLayout {
                packet_size: TS_PACKET_SIZE,
                start_offset: sync_offset,
            });
        }

        warn!("transport packet structure not recognized, assuming 188-byte packets");
        self.warnings
            .push("packet structure not recognized; assuming 188-byte packets".to_string());
        Ok(PacketLayout {
            packet_size: TS_PACKET_SIZE,
            start_offset: sync_offset,
        })
    }

    fn process_packet(&mut self, packet: &[u8]) {
        let header_bytes: [u8; 4] = match packet[0..4].try_into() {
            Ok(bytes) => bytes,
            Err(_) => return,
        };
        let header = match TsPacketHeader::from_bytes(&header_bytes) {
            Ok(header) => header,
            Err(_) => return,
        };
        if header.transport_error {
            return;
        }
        match header.pid {
            pids::NULL | pids::CAT | pids::TSDT => return,
            _ => {}
        }

        let payload = match payload_slice(packet, &header) {
            Some(payload) => payload,
            None => return,
        };

        if header.pid == pids::PAT {
            if header.payload_unit_start {
                self.parse_pat(payload);
            }
            return;
        }

        if let Some(&program_number) = self.pmt_pid_to_program.get(&header.pid) {
            if header.payload_unit_start {
                if self.parsed_programs.contains(&program_number) {
                    // duplicate PMT for an already-populated program
                    trace!(program_number, "duplicate PMT skipped");
                } else {
                    self.parse_pmt(program_number, header.pid, payload);
                }
            }
            return;
        }

        // PES reassembly: PIDs still under detection, or any PID while the
        // PMT set is incomplete (the stream type is not yet known)
        let collecting =
            self.detectors.contains_key(&header.pid) || !self.all_pmts_parsed();
        if !collecting {
            return;
        }

        let state = self.pes.entry(header.pid).or_default();
        if header.payload_unit_start {
            let prior = state.current.take();
            state.current = Some(payload.to_vec());
            if let Some(buffer) = prior {
                self.complete_pes(header.pid, buffer);
            }
        } else if let Some(current) = state.current.as_mut() {
            if current.len() + payload.len() <= MAX_PES_BUFFER {
                current.extend_from_slice(payload);
            }
        }
    }

    fn parse_pat(&mut self, payload: &[u8]) {
        let Some(section) = section_body(payload, 0x00) else {
            return;
        };
        // section body: ts id (2), version (1), section number (2) precede
        // the program loop; the trailing 4 bytes are the CRC
        if section.len() < 5 + 4 {
            return;
        }
        let entries = &section[5..section.len() - 4];
        for pair in entries.chunks_exact(4) {
            let program_number = ((pair[0] as u16) << 8) | pair[1] as u16;
            let pmt_pid = (((pair[2] & 0x1F) as u16) << 8) | pair[3] as u16;
            if program_number == 0 {
                continue; // network PID
            }
            debug!(program_number, pmt_pid, "program announced in PAT");
            self.pmt_pid_to_program.insert(pmt_pid, program_number);
            self.programs
                .entry(program_number)
                .or_insert_with(|| Program {
                    program_number,
                    pmt_pid,
                    streams: BTreeMap::new(),
                });
        }
        self.pat_parsed = true;
    }

    fn parse_pmt(&mut self, program_number: u16, pmt_pid: u16, payload: &[u8]) {
        let Some(section) = section_body(payload, 0x02) else {
            return;
        };
        // program number (2), version (1), section numbers (2), PCR PID (2),
        // program info length (2)
        if section.len() < 9 + 4 {
            return;
        }
        let program_info_length =
            (((section[7] & 0x0F) as usize) << 8) | section[8] as usize;
        let mut offset = 9 + program_info_length;
        let es_end = section.len() - 4; // CRC

        let mut entries = Vec::new();
        while offset + 5 <= es_end {
            let stream_type = section[offset];
            let es_pid =
                (((section[offset + 1] & 0x1F) as u16) << 8) | section[offset + 2] as u16;
            let es_info_length =
                (((section[offset + 3] & 0x0F) as usize) << 8) | section[offset + 4] as usize;
            offset += 5;
            if offset + es_info_length > es_end {
                break;
            }
            let descriptors = &section[offset..offset + es_info_length];
            offset += es_info_length;
            entries.push((stream_type, es_pid, descriptors.to_vec()));
        }

        for (stream_type, es_pid, descriptors) in entries {
            let parsed = descriptor::parse_es_descriptors(stream_type, &descriptors);
            let codec = CodecKind::from_stream_type(stream_type);
            debug!(
                program_number,
                es_pid,
                stream_type = %format_args!("0x{:02X}", stream_type),
                avs = codec.is_some(),
                "elementary stream announced in PMT"
            );
            let entry = StreamEntry {
                pid: es_pid,
                stream_type,
                codec,
                type_name: super::stream_type_name(stream_type),
                codec_hint: parsed.codec_hint,
                language: parsed.language,
                registration: parsed.registration,
                max_bitrate: parsed.max_bitrate,
                descriptor: parsed.avs,
                info: None,
            };
            if let Some(program) = self.programs.get_mut(&program_number) {
                program.pmt_pid = pmt_pid;
                program.streams.insert(es_pid, entry);
            }
            self.pid_to_program.insert(es_pid, program_number);

            if let Some(kind) = codec {
                self.detectors.insert(es_pid, EsAnalyzer::new(kind));
                // replay PES buffers completed before the PMT arrived
                let backlog: Vec<Vec<u8>> = self
                    .pes
                    .get_mut(&es_pid)
                    .map(|state| state.completed.drain(..).collect())
                    .unwrap_or_default();
                for buffer in backlog {
                    if !self.detectors.contains_key(&es_pid) {
                        break;
                    }
                    self.complete_pes(es_pid, buffer);
                }
            }
        }

        self.parsed_programs.insert(program_number);
    }

    /// Handle one fully reassembled PES buffer for a PID.
    fn complete_pes(&mut self, pid: u16, buffer: Vec<u8>) {
        if let Some(analyzer) = self.detectors.get_mut(&pid) {
            if let Some(es) = strip_pes_header(&buffer) {
                if analyzer.push(es).is_some() {
                    self.detection_finished(pid);
                }
            }
            return;
        }
        // no analyzer yet: retain a bounded backlog
        let state = self.pes.entry(pid).or_default();
        if state.completed.len() == MAX_COMPLETED_PES {
            state.completed.pop_front();
        }
        state.completed.push_back(buffer);
    }

    fn detection_finished(&mut self, pid: u16) {
        let Some(analyzer) = self.detectors.remove(&pid) else {
            return;
        };
        let info = analyzer.into_result();
        debug!(pid, "in-band codec info detected");
        self.store_info(pid, info);
        self.pes.remove(&pid);
    }

    fn store_info(&mut self, pid: u16, info: Option<AvsInfo>) {
        let Some(info) = info else { return };
        if let Some(&program_number) = self.pid_to_program.get(&pid) {
            if let Some(program) = self.programs.get_mut(&program_number) {
                if let Some(entry) = program.streams.get_mut(&pid) {
                    entry.info = Some(info);
                }
            }
        }
    }

    fn all_pmts_parsed(&self) -> bool {
        self.pat_parsed
            && self
                .pmt_pid_to_program
                .values()
                .all(|program| self.parsed_programs.contains(program))
    }

    fn check_termination(&mut self) {
        if self.pat_parsed && self.all_pmts_parsed() && self.detectors.is_empty() {
            self.finished = true;
            return;
        }
        if let Some(budget) = self.packet_budget {
            let has_stream = self.programs.values().any(|p| !p.streams.is_empty());
            if self.packets_processed >= budget && !self.programs.is_empty() && has_stream {
                debug!(budget, "packet budget reached, stopping fast scan");
                self.finished = true;
            }
        }
    }

    /// Finalize every in-progress PES buffer and the remaining analyzers.
    fn flush(&mut self) {
        let pids_with_current: Vec<u16> = self
            .pes
            .iter()
            .filter(|(_, state)| state.current.is_some())
            .map(|(&pid, _)| pid)
            .collect();
        for pid in pids_with_current {
            if let Some(buffer) = self.pes.get_mut(&pid).and_then(|s| s.current.take()) {
                self.complete_pes(pid, buffer);
            }
        }

        let remaining: Vec<u16> = self.detectors.keys().copied().collect();
        for pid in remaining {
            if let Some(analyzer) = self.detectors.remove(&pid) {
                let info = analyzer.into_result();
                self.store_info(pid, info);
            }
        }
        self.pes.clear();
    }
}

/// Verify the sync byte repeats with the given stride.
///
/// All positions inside the available data must carry 0x47; at least one
/// further packet is required for a hypothesis to hold.
fn verify_sync_run(data: &[u8], first_sync: usize, stride: usize) -> bool {
    let mut verified = 0usize;
    for i in 0..PROBE_PACKETS {
        let pos = first_sync + i * stride;
        if pos >= data.len() {
            break;
        }
        if data[pos] != TS_SYNC_BYTE {
            return false;
        }
        verified += 1;
    }
    verified >= 2
}

/// Payload offset past the header and any adaptation field
fn payload_slice<'a>(packet: &'a [u8], header: &TsPacketHeader) -> Option<&'a [u8]> {
    let mut offset = 4;
    match header.adaptation_field_control {
        0b01 => {}
        0b11 => {
            if offset >= packet.len() {
                return None;
            }
            let adaptation_length = packet[offset] as usize;
            offset += 1 + adaptation_length;
        }
        _ => return None, // reserved or adaptation-only
    }
    if offset >= packet.len() {
        None
    } else {
        Some(&packet[offset..])
    }
}

/// Skip the pointer field and validate the table id; returns the section
/// body starting after `section_length` and trimmed to that length.
fn section_body(payload: &[u8], expected_table_id: u8) -> Option<&[u8]> {
    if payload.is_empty() {
        return None;
    }
    let pointer = payload[0] as usize;
    let section = payload.get(1 + pointer..)?;
    if section.len() < 3 {
        return None;
    }
    if section[0] != expected_table_id {
        return None;
    }
    let section_length = (((section[1] & 0x0F) as usize) << 8) | section[2] as usize;
    let body = section.get(3..3 + section_length)?;
    Some(body)
}

/// Strip the PES header, returning the elementary-stream payload.
///
/// Accepts only video (0xE0-0xEF) and audio (0xC0-0xDF) stream ids.
fn strip_pes_header(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 9 {
        return None;
    }
    if data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
        return None;
    }
    let stream_id = data[3];
    if !((0xC0..=0xDF).contains(&stream_id) || (0xE0..=0xEF).contains(&stream_id)) {
        return None;
    }
    let header_data_length = data[8] as usize;
    let payload_start = 9 + header_data_length;
    if payload_start >= data.len() {
        return None;
    }
    Some(&data[payload_start..])
}
