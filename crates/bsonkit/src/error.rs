//! BSON codec error types.

use bsonkit_buffers::BufferError;
use thiserror::Error;

/// What exactly was wrong with a buffer handed to the decoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("declared length {declared} does not match {actual} available bytes")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),
    #[error("unsupported element type 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("missing NUL terminator")]
    MissingTerminator,
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBoolean(u8),
    #[error("empty document key")]
    EmptyKey,
}

impl From<BufferError> for Malformed {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => Malformed::UnexpectedEof,
            BufferError::MissingNul => Malformed::MissingTerminator,
        }
    }
}

/// Error type for every BSON operation in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    #[error("malformed BSON at offset {offset}: {kind}")]
    MalformedInput { offset: usize, kind: Malformed },
    #[error("document nesting exceeds the limit of {0} levels")]
    DepthExceeded(usize),
    #[error("builder is closed")]
    BuilderClosed,
    #[error("invalid sort specification: {0}")]
    InvalidSpecification(String),
    #[error("invalid key {0:?}: keys must be non-empty and contain no NUL byte")]
    InvalidKey(String),
    #[error("C string contains a NUL byte")]
    InvalidCString,
    #[error("document of {0} bytes exceeds the maximum BSON size")]
    DocumentTooLarge(usize),
    #[error("invalid object id {0:?}")]
    InvalidObjectId(String),
}

impl BsonError {
    pub(crate) fn malformed(offset: usize, kind: Malformed) -> Self {
        BsonError::MalformedInput { offset, kind }
    }

    /// Returns `true` for structural decode failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, BsonError::MalformedInput { .. })
    }
}

pub type BsonResult<T> = Result<T, BsonError>;
