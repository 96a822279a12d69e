//! Error types for avsprobe

use thiserror::Error;

/// Result type alias for avsprobe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for avsprobe
///
/// All parse errors are recoverable by the caller; none are process-fatal.
/// A failure on one elementary stream never poisons sibling streams.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bit cursor reached end-of-buffer mid-syntax-element
    #[error("Bitstream truncated")]
    Truncated,

    /// A required marker bit was 0
    #[error("Marker bit violation")]
    MarkerBitViolation,

    /// A reserved/forbidden value in a critical field
    #[error("Unsupported syntax: {0}")]
    UnsupportedSyntax(String),

    /// An AV3A syncword candidate did not lead to a valid frame header
    #[error("Invalid AATF syncword")]
    InvalidSyncword,

    /// Neither 188-byte nor 192-byte TS structure validated
    #[error("Container structure not recognized")]
    ContainerUnrecognized,

    /// No programs/tracks found and no codec headers decoded
    #[error("No recognizable AVS content (observed: {})", .0.join(", "))]
    NoAvsContent(Vec<String>),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an unsupported-syntax error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedSyntax(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Whether the parse attempt may succeed once more bytes arrive
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Truncated)
    }
}
