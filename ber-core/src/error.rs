use thiserror::Error;

/// Error type for BER encoding and decoding
///
/// Every variant is fatal for the operation that produced it. Running out of
/// input while decoding is *not* an error: readers report it as `Ok(None)`
/// so a caller streaming partial buffers can retry with more bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BerError {
    #[error("Expected 0x{expected:02x}: got 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("Length encoding too long: {0}")]
    LengthTooLong(usize),

    #[error("Integer too long: {0}")]
    IntegerTooLong(usize),

    #[error("Unterminated indefinite-length block at offset {0}")]
    UnterminatedBlock(usize),

    #[error("Sequence too long: {0} bytes")]
    SequenceTooLong(usize),

    #[error("{0} unended sequence(s)")]
    UnendedSequences(usize),

    #[error("Invalid OID: {0}")]
    InvalidOid(String),

    #[error("Invalid ASN.1: {0}")]
    InvalidAsn1(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad classification of a [`BerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes (or the structure being built) violate BER
    MalformedEncoding,
    /// The caller handed the codec a value it cannot work with
    InvalidArgument,
}

impl BerError {
    /// Classify the error as bad input bytes or a bad caller argument
    pub fn kind(&self) -> ErrorKind {
        match self {
            BerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            _ => ErrorKind::MalformedEncoding,
        }
    }
}

/// Result type alias for BER operations
pub type BerResult<T> = Result<T, BerError>;
