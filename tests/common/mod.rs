//! Shared helpers for integration tests: a bit-level writer plus builders
//! for syntactically valid AVS headers, TS packets and BMFF boxes.

#![allow(dead_code)]

/// MSB-first bit writer used to compose test bitstreams
pub struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter { bits: Vec::new() }
    }

    /// Append `width` bits of `value`, MSB first
    pub fn push(&mut self, value: u32, width: u32) {
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    pub fn push_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append a marker bit (always 1)
    pub fn marker(&mut self) {
        self.bits.push(true);
    }

    /// Append an unsigned Exp-Golomb code
    pub fn push_ue(&mut self, value: u32) {
        let code = value as u64 + 1;
        let width = 64 - code.leading_zeros();
        for _ in 0..width - 1 {
            self.bits.push(false);
        }
        for i in (0..width).rev() {
            self.bits.push((code >> i) & 1 == 1);
        }
    }

    /// Pad with zero bits to the next byte boundary
    pub fn byte_align(&mut self) {
        while self.bits.len() % 8 != 0 {
            self.bits.push(false);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = vec![0u8; self.bits.len().div_ceil(8)];
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                out[i / 8] |= 1 << (7 - i % 8);
            }
        }
        out
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for the video sequence-header builders
pub struct VideoParams {
    pub profile_id: u32,
    pub level_id: u32,
    pub width: u32,
    pub height: u32,
    pub progressive: bool,
    pub chroma_format: u32,
    pub sample_precision: u32,
    pub aspect_ratio: u32,
    pub frame_rate_code: u32,
    pub bit_rate_lower: u32,
    pub bit_rate_upper: u32,
    pub low_delay: bool,
}

impl VideoParams {
    pub fn hd25() -> Self {
        VideoParams {
            profile_id: 0x20,
            level_id: 0x22,
            width: 1920,
            height: 1080,
            progressive: true,
            chroma_format: 1,
            sample_precision: 1,
            aspect_ratio: 2,
            frame_rate_code: 3,
            bit_rate_lower: 25000,
            bit_rate_upper: 0,
            low_delay: false,
        }
    }
}

/// Optional display-extension colour signalling
pub struct DisplayParams {
    pub video_format: u32,
    pub full_range: bool,
    pub colour: Option<(u32, u32, u32)>,
    pub display_width: u32,
    pub display_height: u32,
}

/// AVS1 sequence header bits (without start code)
pub fn avs1_sequence_header(p: &VideoParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(p.profile_id, 8);
    w.push(p.level_id, 8);
    w.push_bit(p.progressive);
    w.push(p.width, 14);
    w.push(p.height, 14);
    w.push(p.chroma_format, 2);
    w.push(p.sample_precision, 3);
    w.push(p.aspect_ratio, 4);
    w.push(p.frame_rate_code, 4);
    w.push(p.bit_rate_lower, 18);
    w.marker();
    w.push(p.bit_rate_upper, 12);
    w.push_bit(p.low_delay);
    w.marker();
    w.push(12000, 18); // bbv_buffer_size
    w.push(0, 3); // reserved
    w
}

/// AVS1 display-extension bits (without start code; includes the ext id)
pub fn avs1_display_extension(d: &DisplayParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(0b0010, 4);
    w.push(d.video_format, 3);
    w.push_bit(d.full_range);
    match d.colour {
        Some((primaries, transfer, matrix)) => {
            w.push_bit(true);
            w.push(primaries, 8);
            w.push(transfer, 8);
            w.push(matrix, 8);
        }
        None => w.push_bit(false),
    }
    w.push(d.display_width, 14);
    w.marker();
    w.push(d.display_height, 14);
    w.push(0, 2); // stereo_packing_mode
    w
}

/// AVS2 sequence header bits (without start code)
pub fn avs2_sequence_header(p: &VideoParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(p.profile_id, 8);
    w.push(p.level_id, 8);
    w.push_bit(p.progressive);
    w.push_bit(false); // field_coded_sequence
    w.push(p.width, 14);
    w.marker();
    w.push(p.height, 14);
    w.push(p.chroma_format, 2);
    w.push(p.sample_precision, 3);
    if matches!(p.profile_id, 0x12 | 0x22 | 0x32) {
        w.push(p.sample_precision, 3); // encoding_precision
    }
    w.marker();
    w.push(p.aspect_ratio, 4);
    w.push(p.frame_rate_code, 4);
    w.marker();
    w.push(p.bit_rate_lower, 18);
    w.marker();
    w.push(p.bit_rate_upper, 12);
    w.push_bit(p.low_delay);
    w.marker();
    w.push_bit(false); // temporal_id_enable_flag
    w.push(12000, 18); // bbv_buffer_size
    w.marker();
    w.push(3, 3); // lcu_size
    w.push_bit(true); // weight_quant_enable_flag
    w.push_bit(false); // load_seq_weight_quant_data_flag -> defaults
    w.push(0b10_0000_0101, 10); // tool flags
    w.marker();
    w.push(1, 6); // num_of_rcs
    // one reference configuration set
    w.push_bit(true); // refered_by_others
    w.push(1, 3); // num_of_reference_picture
    w.push(1, 6); // delta_doi
    w.push(0, 3); // num_of_removed_picture
    w.marker();
    if !p.low_delay {
        w.push(4, 5); // output_reorder_delay
    }
    w.push_bit(true); // cross_slice_loopfilter_enable_flag
    if p.chroma_format == 0b11 {
        w.push_bit(false); // universal_string_prediction_enable_flag
    }
    w.push(0, 2); // reserved
    w
}

/// AVS2 display-extension bits (non-3D profiles; includes the ext id)
pub fn avs2_display_extension(d: &DisplayParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(0b0010, 4);
    w.push(d.video_format, 3);
    w.push_bit(d.full_range);
    match d.colour {
        Some((primaries, transfer, matrix)) => {
            w.push_bit(true);
            w.push(primaries, 8);
            w.push(transfer, 8);
            w.push(matrix, 8);
        }
        None => w.push_bit(false),
    }
    w.push(d.display_width, 14);
    w.marker();
    w.push(d.display_height, 14);
    w.push_bit(false); // td_mode_flag
    w
}

/// AVS3 sequence header bits (without start code)
pub fn avs3_sequence_header(p: &VideoParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(p.profile_id, 8);
    w.push(p.level_id, 8);
    w.push_bit(p.progressive);
    w.push_bit(false); // field_coded_sequence
    w.push_bit(false); // library_stream_flag
    w.push_bit(false); // library_picture_enable_flag
    w.marker();
    w.push(p.width, 14);
    w.marker();
    w.push(p.height, 14);
    w.push(p.chroma_format, 2);
    w.push(p.sample_precision, 3);
    if matches!(p.profile_id, 0x22 | 0x32) {
        w.push(p.sample_precision, 3); // encoding_precision
    }
    w.marker();
    w.push(p.aspect_ratio, 4);
    w.push(p.frame_rate_code, 4);
    w.marker();
    w.push(p.bit_rate_lower, 18);
    w.marker();
    w.push(p.bit_rate_upper, 12);
    w.push_bit(p.low_delay);
    w.push_bit(false); // temporal_id_enable_flag
    w.marker();
    w.push(12000, 18); // bbv_buffer_size
    w.marker();
    w.push_ue(7); // max_dpb_minus1
    w.push_bit(false); // rpl1_index_exist_flag
    w.push_bit(true); // rpl1_same_as_rpl0_flag
    w.marker();
    w.push_ue(1); // num_ref_pic_list_set[0]
    // one list: no library, one DOI entry with delta +1
    w.push_ue(1); // num_of_ref_pic
    w.push_ue(1); // abs_delta_doi
    w.push_bit(false); // sign (positive)
    w.push_ue(1); // num_ref_default_active_minus1[0]
    w.push_ue(1); // num_ref_default_active_minus1[1]
    w.push(3, 3); // log2_lcu_size_minus2
    w.push(0, 2); // log2_min_cu_size_minus2
    w.push(2, 2); // log2_max_part_ratio_minus2
    w.push(0, 3); // max_split_times_minus6
    w.push(0, 3); // log2_min_qt_size_minus2
    w.push(4, 3); // log2_max_bt_size_minus2
    w.push(1, 2); // log2_max_eqt_size_minus3
    w.marker();
    w.push_bit(false); // weight_quant_enable_flag
    w.push_bit(true); // st_enable_flag
    w.push_bit(true); // sao_enable_flag
    w.push_bit(false); // alf_enable_flag
    w.push_bit(false); // affine_enable_flag
    w.push_bit(false); // smvd_enable_flag
    w.push_bit(false); // ipcm_enable_flag
    w.push_bit(false); // amvr_enable_flag (no emvr)
    w.push(8, 4); // num_of_hmvp_cand
    w.push_bit(false); // umve_enable_flag
    w.push_bit(false); // intra_pf_enable_flag
    w.push_bit(false); // tscpm_enable_flag
    w.marker();
    w.push_bit(false); // dt_enable_flag
    w.push_bit(false); // pbt_enable_flag
    if !p.low_delay {
        w.push(4, 5); // output_reorder_delay
    }
    w.push_bit(true); // cross_patch_loop_filter_enable_flag
    w.push_bit(false); // ref_colocated_patch_flag
    w.push_bit(false); // stable_patch_flag
    w.push(0, 2); // reserved
    w
}

/// AVS3 display-extension bits (includes the ext id)
pub fn avs3_display_extension(d: &DisplayParams) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(0b0010, 4);
    w.push(d.video_format, 3);
    w.push_bit(d.full_range);
    match d.colour {
        Some((primaries, transfer, matrix)) => {
            w.push_bit(true);
            w.push(primaries, 8);
            w.push(transfer, 8);
            w.push(matrix, 8);
        }
        None => w.push_bit(false),
    }
    w.push(d.display_width, 14);
    w.marker();
    w.push(d.display_height, 14);
    w.push_bit(false); // td_mode_flag
    w
}

/// AVS3 HDR dynamic-metadata extension bits (includes the ext id)
pub fn avs3_hdr_extension(metadata_type: u32) -> BitWriter {
    let mut w = BitWriter::new();
    w.push(0b0101, 4);
    w.push(metadata_type, 4);
    w
}

/// Assemble an elementary stream: each unit is (start-code suffix, bits).
/// A terminating I-picture header is appended.
pub fn assemble_es(units: &[(u8, BitWriter)]) -> Vec<u8> {
    let mut es = Vec::new();
    for (suffix, writer) in units {
        es.extend_from_slice(&[0x00, 0x00, 0x01, *suffix]);
        let mut w = BitWriter::new();
        w.push_from(writer);
        w.byte_align();
        es.extend_from_slice(&w.into_bytes());
    }
    es.extend_from_slice(&[0x00, 0x00, 0x01, 0xB3]);
    es.extend_from_slice(&[0x5A, 0x5A, 0x5A, 0x5A]);
    es
}

impl BitWriter {
    /// Append every bit of another writer
    pub fn push_from(&mut self, other: &BitWriter) {
        self.bits.extend_from_slice(&other.bits);
    }
}

/// AATF frame bytes: General codec, Basic profile, stereo @ 48 kHz, 16-bit
pub fn aatf_stereo_frame() -> Vec<u8> {
    let mut w = BitWriter::new();
    w.push(0xFFF, 12); // syncword
    w.push(2, 4); // audio_codec_id = General
    w.push(0, 1); // anc_data_index
    w.push(0, 3); // nn_type
    w.push(0, 3); // coding_profile = Basic
    w.push(2, 4); // sampling_frequency_index = 48 kHz
    w.push(0, 8); // aatf_error_check
    w.push(1, 7); // channel_number_index = stereo
    w.push(1, 2); // resolution = 16-bit
    w.push(7, 4); // bitrate_index
    w.byte_align();
    let mut bytes = w.into_bytes();
    bytes.extend_from_slice(&[0x11; 16]); // frame payload filler
    bytes
}

// ---------------------------------------------------------------------------
// MPEG-TS builders

pub const TS_PACKET_SIZE: usize = 188;

/// Build one TS packet; payloads shorter than 184 bytes are padded through
/// an adaptation field so reassembly sees exactly `payload`.
pub fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 184, "payload too large for one packet");
    let mut packet = Vec::with_capacity(TS_PACKET_SIZE);
    let stuffing = 184 - payload.len();
    let afc: u8 = if stuffing == 0 { 0b01 } else { 0b11 };
    packet.push(0x47);
    packet.push(if pusi { 0x40 } else { 0x00 } | ((pid >> 8) as u8 & 0x1F));
    packet.push((pid & 0xFF) as u8);
    packet.push((afc << 4) | (cc & 0x0F));
    if stuffing > 0 {
        let af_length = (stuffing - 1) as u8;
        packet.push(af_length);
        if af_length > 0 {
            packet.push(0x00); // adaptation flags
            packet.resize(packet.len() + af_length as usize - 1, 0xFF);
        }
    }
    packet.extend_from_slice(payload);
    assert_eq!(packet.len(), TS_PACKET_SIZE);
    packet
}

/// Null packet used as filler
pub fn null_packet() -> Vec<u8> {
    ts_packet(0x1FFF, false, 0, &[0xFF; 184])
}

/// PAT announcing one program
pub fn pat_packet(program_number: u16, pmt_pid: u16) -> Vec<u8> {
    let mut section = vec![0x00]; // table_id
    let body_len = 5 + 4 + 4; // fixed header + one entry + CRC
    section.push(0xB0 | ((body_len >> 8) as u8 & 0x0F));
    section.push((body_len & 0xFF) as u8);
    section.extend_from_slice(&[0x00, 0x01]); // transport_stream_id
    section.push(0xC1); // version 0, current
    section.push(0x00); // section_number
    section.push(0x00); // last_section_number
    section.push((program_number >> 8) as u8);
    section.push((program_number & 0xFF) as u8);
    section.push(0xE0 | ((pmt_pid >> 8) as u8 & 0x1F));
    section.push((pmt_pid & 0xFF) as u8);
    section.extend_from_slice(&[0u8; 4]); // CRC placeholder

    let mut payload = vec![0x00]; // pointer_field
    payload.extend_from_slice(&section);
    ts_packet(0x0000, true, 0, &payload)
}

/// PMT announcing the given `(stream_type, pid, descriptors)` entries
pub fn pmt_packet(
    pmt_pid: u16,
    program_number: u16,
    streams: &[(u8, u16, Vec<u8>)],
) -> Vec<u8> {
    let es_len: usize = streams.iter().map(|(_, _, d)| 5 + d.len()).sum();
    let body_len = 9 + es_len + 4;

    let mut section = vec![0x02]; // table_id
    section.push(0xB0 | ((body_len >> 8) as u8 & 0x0F));
    section.push((body_len & 0xFF) as u8);
    section.push((program_number >> 8) as u8);
    section.push((program_number & 0xFF) as u8);
    section.push(0xC1); // version 0, current
    section.push(0x00);
    section.push(0x00);
    let pcr_pid = streams.first().map(|&(_, pid, _)| pid).unwrap_or(0x1FFF);
    section.push(0xE0 | ((pcr_pid >> 8) as u8 & 0x1F));
    section.push((pcr_pid & 0xFF) as u8);
    section.extend_from_slice(&[0xF0, 0x00]); // program_info_length = 0
    for (stream_type, pid, descriptors) in streams {
        section.push(*stream_type);
        section.push(0xE0 | ((pid >> 8) as u8 & 0x1F));
        section.push((pid & 0xFF) as u8);
        section.push(0xF0 | ((descriptors.len() >> 8) as u8 & 0x0F));
        section.push((descriptors.len() & 0xFF) as u8);
        section.extend_from_slice(descriptors);
    }
    section.extend_from_slice(&[0u8; 4]); // CRC placeholder

    let mut payload = vec![0x00]; // pointer_field
    payload.extend_from_slice(&section);
    ts_packet(pmt_pid, true, 0, &payload)
}

/// Wrap an elementary stream into one PES packet
pub fn pes_from_es(stream_id: u8, es: &[u8]) -> Vec<u8> {
    let mut pes = vec![0x00, 0x00, 0x01, stream_id];
    pes.extend_from_slice(&[0x00, 0x00]); // PES_packet_length = 0 (unbounded)
    pes.extend_from_slice(&[0x80, 0x00, 0x00]); // flags, no PTS/DTS
    pes.extend_from_slice(es);
    pes
}

/// Split a PES buffer into TS packets with the given chunk size
pub fn packetize_pes(pid: u16, pes: &[u8], chunk_size: usize, cc_start: u8) -> Vec<Vec<u8>> {
    assert!(chunk_size >= 1 && chunk_size <= 184);
    let mut packets = Vec::new();
    let mut cc = cc_start;
    for (i, chunk) in pes.chunks(chunk_size).enumerate() {
        packets.push(ts_packet(pid, i == 0, cc, chunk));
        cc = (cc + 1) & 0x0F;
    }
    packets
}

/// Wrap TS packets into 192-byte M2TS packets (4-byte timecode header)
pub fn m2ts_wrap(packets: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, packet) in packets.iter().enumerate() {
        out.extend_from_slice(&(i as u32).to_be_bytes());
        out.extend_from_slice(packet);
    }
    out
}

// ---------------------------------------------------------------------------
// ISO BMFF builders

/// Wrap a payload into a box
pub fn bmff_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
    out.extend_from_slice(box_type);
    out.extend_from_slice(payload);
    out
}

/// Minimal single-track BMFF file; returns the full file bytes.
///
/// The track's single sample is `sample`, stored in an mdat after the moov.
pub fn bmff_single_track(fourcc: &[u8; 4], handler: &[u8; 4], sample: &[u8]) -> Vec<u8> {
    let ftyp = bmff_box(b"ftyp", b"isom\x00\x00\x02\x00isomavs3");

    // tkhd: version/flags + times + track id
    let mut tkhd = vec![0u8; 24];
    tkhd[12..16].copy_from_slice(&1u32.to_be_bytes());

    let mut hdlr = vec![0u8; 24];
    hdlr[8..12].copy_from_slice(handler);

    // sample entry carried in stsd
    let entry = bmff_box(fourcc, &[0u8; 16]);
    let mut stsd = vec![0u8; 8];
    stsd[7] = 1; // entry_count
    stsd.extend_from_slice(&entry);

    let mut stsc = vec![0u8; 8];
    stsc[7] = 1;
    stsc.extend_from_slice(&1u32.to_be_bytes()); // first_chunk
    stsc.extend_from_slice(&1u32.to_be_bytes()); // samples_per_chunk
    stsc.extend_from_slice(&1u32.to_be_bytes()); // sample_description_index

    let mut stsz = vec![0u8; 4];
    stsz.extend_from_slice(&0u32.to_be_bytes()); // sample_size = 0 (table)
    stsz.extend_from_slice(&1u32.to_be_bytes()); // sample_count
    stsz.extend_from_slice(&(sample.len() as u32).to_be_bytes());

    // chunk offset patched once the moov size is known
    let mut stco = vec![0u8; 8];
    stco[7] = 1;
    stco.extend_from_slice(&0u32.to_be_bytes());

    let build_moov = |chunk_offset: u32| -> Vec<u8> {
        let mut stco_patched = stco.clone();
        let len = stco_patched.len();
        stco_patched[len - 4..].copy_from_slice(&chunk_offset.to_be_bytes());
        let stbl = bmff_box(
            b"stbl",
            &[
                bmff_box(b"stsd", &stsd),
                bmff_box(b"stsc", &stsc),
                bmff_box(b"stsz", &stsz),
                bmff_box(b"stco", &stco_patched),
            ]
            .concat(),
        );
        let minf = bmff_box(b"minf", &stbl);
        let mdia = bmff_box(b"mdia", &[bmff_box(b"hdlr", &hdlr), minf].concat());
        let trak = bmff_box(b"trak", &[bmff_box(b"tkhd", &tkhd), mdia].concat());
        bmff_box(b"moov", &trak)
    };

    // two passes: moov size is independent of the offset value's width
    let moov_size = build_moov(0).len();
    let chunk_offset = (ftyp.len() + moov_size + 8) as u32;
    let moov = build_moov(chunk_offset);

    let mut file = Vec::new();
    file.extend_from_slice(&ftyp);
    file.extend_from_slice(&moov);
    file.extend_from_slice(&bmff_box(b"mdat", sample));
    file
}
