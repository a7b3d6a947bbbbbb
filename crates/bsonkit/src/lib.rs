//! BSON value model, codec and sort-specification comparator.
//!
//! - [`BsonDecoder`] turns encoded bytes into an owned [`BsonDocument`] tree.
//! - [`BsonDocumentBuilder`] appends elements one by one and finalizes them
//!   into an encoded document; [`BsonEncoder`] does the same for a whole tree.
//! - [`BsonComparator`] orders encoded documents the way a document database
//!   orders query results for a sort specification such as `{"age": -1}`.
//!
//! ```
//! use bsonkit::{decode, encode, BsonDocument, BsonValue};
//!
//! let mut doc = BsonDocument::new();
//! doc.insert("a", 1);
//! doc.insert("b", "x");
//! let bytes = encode(&doc).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), doc);
//! assert_eq!(doc.get("b"), Some(&BsonValue::Str("x".into())));
//! ```

use std::cmp::Ordering;

pub mod constants;
mod comparator;
mod decoder;
mod document;
pub mod ejson;
mod encoder;
mod error;
mod oid;
pub mod order;
mod raw;
mod values;

pub use comparator::{BsonComparator, SortDirection};
pub use decoder::{BsonDecoder, DecoderOptions};
pub use document::BsonDocument;
pub use encoder::{BsonDocumentBuilder, BsonEncoder};
pub use error::{BsonError, BsonResult, Malformed};
pub use oid::BsonObjectId;
pub use raw::{RawDocument, RawElement, RawIter};
pub use values::{
    BsonBinary, BsonDateTime, BsonDbPointer, BsonDecimal128, BsonJavascriptCodeWithScope,
    BsonRegex, BsonTimestamp, BsonValue,
};

/// Encodes a document with the default encoder.
pub fn encode(doc: &BsonDocument) -> BsonResult<Vec<u8>> {
    BsonEncoder::new().encode(doc)
}

/// Decodes a single document with default options.
pub fn decode(data: &[u8]) -> BsonResult<BsonDocument> {
    BsonDecoder::new().decode(data)
}

/// Decodes a buffer of back-to-back documents with default options.
pub fn decode_sequence(data: &[u8]) -> BsonResult<Vec<BsonDocument>> {
    BsonDecoder::new().decode_sequence(data)
}

/// Compares two encoded documents under `specification`.
pub fn compare(specification: &BsonDocument, a: &[u8], b: &[u8]) -> BsonResult<Ordering> {
    BsonComparator::new(specification)?.compare(a, b)
}
