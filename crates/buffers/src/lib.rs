//! Little-endian binary buffer utilities for bsonkit.
//!
//! # Overview
//!
//! - [`Reader`] - Reads little-endian data from a byte slice with cursor tracking
//! - [`Writer`] - Writes little-endian data to an auto-growing buffer
//!
//! Every read is bounds-checked against the reader's end position and reports
//! [`BufferError::EndOfBuffer`] instead of panicking, so decoders built on top
//! can surface truncated input as an ordinary error.
//!
//! # Example
//!
//! ```
//! use bsonkit_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.i32(-2);
//! writer.buf(b"hello");
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x01);
//! assert_eq!(reader.i32().unwrap(), -2);
//! assert_eq!(reader.buf(5).unwrap(), b"hello");
//! assert!(reader.u8().is_err());
//! ```

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer,
    /// A NUL-terminated sequence ran to the end of the buffer.
    MissingNul,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::EndOfBuffer => write!(f, "end of buffer"),
            BufferError::MissingNul => write!(f, "missing NUL terminator"),
        }
    }
}

impl std::error::Error for BufferError {}
