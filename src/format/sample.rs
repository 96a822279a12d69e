//! Abstract sample seam for externally demuxed containers
//!
//! Containers other than MPEG-TS and ISO BMFF are demuxed by the caller;
//! the core only needs `(track_id, codec_tag, sample_bytes)` triples.

use crate::codec::CodecKind;
use crate::error::Result;

/// One compressed sample handed over by an external demuxer
#[derive(Debug, Clone)]
pub struct ExternalSample {
    pub track_id: u32,
    /// Sample-entry fourCC (`avst`, `avs3`, `av3a`, or anything else)
    pub codec_tag: [u8; 4],
    pub data: Vec<u8>,
}

impl ExternalSample {
    /// AVS codec kind for the tag, if any
    pub fn codec(&self) -> Option<CodecKind> {
        CodecKind::from_fourcc(&self.codec_tag)
    }
}

/// Pull-based source of samples from an external demuxer.
///
/// `next_sample` yields `None` when the source is exhausted. One sample per
/// AVS track is enough for detection; the core stops reading a track after
/// its first sample parses.
pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Option<ExternalSample>>;
}

/// Adapter over an in-memory sample list (test harnesses, simple callers)
pub struct VecSampleSource {
    samples: std::vec::IntoIter<ExternalSample>,
}

impl VecSampleSource {
    pub fn new(samples: Vec<ExternalSample>) -> Self {
        VecSampleSource {
            samples: samples.into_iter(),
        }
    }
}

impl SampleSource for VecSampleSource {
    fn next_sample(&mut self) -> Result<Option<ExternalSample>> {
        Ok(self.samples.next())
    }
}
