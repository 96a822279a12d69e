//! Aggregate records returned to the caller

use crate::codec::{AvsInfo, CodecKind};
use crate::error::{Error, Result};
use crate::format::bmff::fourcc_str;
use crate::format::{AvsDescriptor, Container};

/// Identifier of an elementary stream within its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    /// MPEG-TS packet identifier
    Pid(u16),
    /// ISO BMFF / external track identifier
    Track(u32),
    /// Raw elementary stream (no container)
    Raw,
}

/// Everything learned about one elementary stream
#[derive(Debug, Clone)]
pub struct StreamReport {
    pub program_number: Option<u16>,
    pub id: StreamId,
    /// TS stream-type byte, when the container is a transport stream
    pub stream_type: Option<u8>,
    /// Sample-entry fourCC, when the container is BMFF or an external source
    pub fourcc: Option<[u8; 4]>,
    /// Human-readable label of the stream type or fourCC
    pub type_label: String,
    /// AVS codec kind, when recognized
    pub codec: Option<CodecKind>,
    pub language: Option<String>,
    pub registration_fourcc: Option<[u8; 4]>,
    pub max_bitrate: Option<u64>,
    /// Container-side AVS descriptor, when one was present
    pub descriptor: Option<AvsDescriptor>,
    /// In-band codec info, when a header was decoded
    pub info: Option<AvsInfo>,
}

impl StreamReport {
    /// Label used in the "no recognizable AVS content" observation list
    pub fn observed_label(&self) -> String {
        match (self.stream_type, self.fourcc) {
            (Some(stream_type), _) => format!("0x{:02X}", stream_type),
            (None, Some(fourcc)) => fourcc_str(&fourcc),
            (None, None) => self.type_label.clone(),
        }
    }
}

/// Full analysis result for one input
#[derive(Debug, Clone)]
pub struct MediaReport {
    pub container: Container,
    pub streams: Vec<StreamReport>,
    pub warnings: Vec<String>,
}

impl MediaReport {
    /// Streams recognized as an AVS codec
    pub fn avs_streams(&self) -> impl Iterator<Item = &StreamReport> {
        self.streams.iter().filter(|s| s.codec.is_some())
    }

    /// Whether any AVS signaling (container- or bitstream-side) was found
    pub fn has_avs_content(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec.is_some() || s.info.is_some())
    }

    /// Fail with the observed stream types / fourCCs when nothing AVS was
    /// found.
    pub fn require_avs(self) -> Result<Self> {
        if self.has_avs_content() {
            Ok(self)
        } else {
            let observed = self
                .streams
                .iter()
                .map(StreamReport::observed_label)
                .collect();
            Err(Error::NoAvsContent(observed))
        }
    }
}
