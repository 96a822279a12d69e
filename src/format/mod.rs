//! Container format handling
//!
//! MPEG-TS and ISO BMFF are parsed natively; anything else reaches the core
//! through the abstract [`sample::SampleSource`] seam.

pub mod bmff;
pub mod descriptor;
pub mod mpegts;
pub mod sample;

pub use descriptor::{AvsAudioDescriptor, AvsDescriptor, AvsVideoDescriptor};
pub use sample::{ExternalSample, SampleSource, VecSampleSource};

use crate::codec::CodecKind;

/// The container framing of an input byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// MPEG transport stream (188- or 192-byte packets)
    MpegTs,
    /// ISO base media file format
    Bmff,
    /// Raw elementary stream of a known codec
    RawEs(CodecKind),
    /// Externally demuxed container reached through a `SampleSource`
    External,
}

/// Guess the container from leading bytes (extension-less inputs).
///
/// Only distinguishes the two natively parsed containers; everything else
/// returns `None` and the caller picks a `SampleSource` or raw-ES kind.
pub fn sniff_container(head: &[u8]) -> Option<Container> {
    if head.len() >= 8 && (&head[4..8] == b"ftyp" || &head[4..8] == b"moov") {
        return Some(Container::Bmff);
    }
    if head.contains(&mpegts::TS_SYNC_BYTE) {
        let sync = head.iter().position(|&b| b == mpegts::TS_SYNC_BYTE)?;
        let next = sync + mpegts::TS_PACKET_SIZE;
        let next_m2ts = sync + mpegts::M2TS_PACKET_SIZE;
        if head.get(next) == Some(&mpegts::TS_SYNC_BYTE)
            || head.get(next_m2ts) == Some(&mpegts::TS_SYNC_BYTE)
        {
            return Some(Container::MpegTs);
        }
    }
    None
}
