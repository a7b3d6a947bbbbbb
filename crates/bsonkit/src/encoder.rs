//! BSON encoding: the incremental document builder and the whole-document
//! encoder built on top of it.

use bsonkit_buffers::Writer;
use tracing::trace;

use crate::constants::*;
use crate::document::BsonDocument;
use crate::error::{BsonError, BsonResult};
use crate::oid::BsonObjectId;
use crate::values::{BsonBinary, BsonDateTime, BsonRegex, BsonTimestamp, BsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Open,
    Closed,
}

/// Append-only builder producing one encoded document.
///
/// Elements are written in the order they are appended. Appending a key that
/// is already present is allowed and puts a duplicate on the wire; decoding
/// such a buffer keeps the last value at the first key's position.
///
/// [`finalize`](Self::finalize) writes the terminator, patches the length
/// prefix and closes the builder. Every later call fails with
/// [`BsonError::BuilderClosed`]. A failed append leaves the bytes written so
/// far untouched.
#[derive(Debug, Clone)]
pub struct BsonDocumentBuilder {
    writer: Writer,
    state: BuilderState,
}

impl Default for BsonDocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonDocumentBuilder {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut writer = Writer::with_capacity(capacity.max(MIN_DOCUMENT_SIZE));
        writer.i32(0);
        Self {
            writer,
            state: BuilderState::Open,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == BuilderState::Closed
    }

    /// Bytes written so far, including the length placeholder.
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.len() <= 4
    }

    fn ensure_open(&self) -> BsonResult<()> {
        match self.state {
            BuilderState::Open => Ok(()),
            BuilderState::Closed => Err(BsonError::BuilderClosed),
        }
    }

    fn append_with(
        &mut self,
        key: &str,
        tag: u8,
        write: impl FnOnce(&mut Writer) -> BsonResult<()>,
    ) -> BsonResult<()> {
        self.ensure_open()?;
        let mark = self.writer.len();
        let result = write_key(&mut self.writer, tag, key).and_then(|_| write(&mut self.writer));
        if result.is_err() {
            self.writer.truncate(mark);
        }
        result
    }

    /// Appends any value.
    pub fn append(&mut self, key: &str, value: &BsonValue) -> BsonResult<()> {
        self.append_with(key, value.element_type(), |w| write_value(w, value))
    }

    pub fn append_f64(&mut self, key: &str, value: f64) -> BsonResult<()> {
        self.append_with(key, TYPE_DOUBLE, |w| {
            w.f64(value);
            Ok(())
        })
    }

    pub fn append_str(&mut self, key: &str, value: &str) -> BsonResult<()> {
        self.append_with(key, TYPE_STRING, |w| write_string(w, value))
    }

    pub fn append_document(&mut self, key: &str, value: &BsonDocument) -> BsonResult<()> {
        self.append_with(key, TYPE_DOCUMENT, |w| write_document(w, value))
    }

    pub fn append_array(&mut self, key: &str, values: &[BsonValue]) -> BsonResult<()> {
        self.append_with(key, TYPE_ARRAY, |w| write_array(w, values))
    }

    pub fn append_binary(&mut self, key: &str, value: &BsonBinary) -> BsonResult<()> {
        self.append_with(key, TYPE_BINARY, |w| write_binary(w, value))
    }

    pub fn append_object_id(&mut self, key: &str, value: BsonObjectId) -> BsonResult<()> {
        self.append_with(key, TYPE_OBJECT_ID, |w| {
            w.buf(&value.bytes());
            Ok(())
        })
    }

    pub fn append_bool(&mut self, key: &str, value: bool) -> BsonResult<()> {
        self.append_with(key, TYPE_BOOLEAN, |w| {
            w.u8(value as u8);
            Ok(())
        })
    }

    pub fn append_date_time(&mut self, key: &str, value: BsonDateTime) -> BsonResult<()> {
        self.append_with(key, TYPE_DATE_TIME, |w| {
            w.i64(value.0);
            Ok(())
        })
    }

    pub fn append_null(&mut self, key: &str) -> BsonResult<()> {
        self.append_with(key, TYPE_NULL, |_| Ok(()))
    }

    pub fn append_regex(&mut self, key: &str, value: &BsonRegex) -> BsonResult<()> {
        self.append_with(key, TYPE_REGEX, |w| write_regex(w, value))
    }

    pub fn append_i32(&mut self, key: &str, value: i32) -> BsonResult<()> {
        self.append_with(key, TYPE_INT32, |w| {
            w.i32(value);
            Ok(())
        })
    }

    pub fn append_timestamp(&mut self, key: &str, value: BsonTimestamp) -> BsonResult<()> {
        self.append_with(key, TYPE_TIMESTAMP, |w| {
            write_timestamp(w, value);
            Ok(())
        })
    }

    pub fn append_i64(&mut self, key: &str, value: i64) -> BsonResult<()> {
        self.append_with(key, TYPE_INT64, |w| {
            w.i64(value);
            Ok(())
        })
    }

    /// Finalizes `child` and embeds it as a document value.
    pub fn append_builder(&mut self, key: &str, mut child: BsonDocumentBuilder) -> BsonResult<()> {
        self.ensure_open()?;
        let bytes = child.finalize()?;
        self.append_with(key, TYPE_DOCUMENT, |w| {
            w.buf(&bytes);
            Ok(())
        })
    }

    /// Terminates the document and returns its bytes.
    ///
    /// Succeeds once; the builder is closed afterwards. If the document is too
    /// large to encode no bytes are returned and the builder stays open.
    pub fn finalize(&mut self) -> BsonResult<Vec<u8>> {
        self.ensure_open()?;
        self.writer.u8(0);
        let size = self.writer.len();
        if let Err(err) = patch_length(&mut self.writer, 0) {
            self.writer.truncate(size - 1);
            return Err(err);
        }
        self.state = BuilderState::Closed;
        trace!(size, "finalized BSON document");
        Ok(self.writer.flush())
    }
}

/// Whole-document BSON encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonEncoder;

impl BsonEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes `doc` by appending every entry, in the document's own order, to
    /// a fresh builder and finalizing it.
    pub fn encode(&self, doc: &BsonDocument) -> BsonResult<Vec<u8>> {
        let mut builder = BsonDocumentBuilder::new();
        for (key, value) in doc {
            builder.append(key, value)?;
        }
        builder.finalize()
    }
}

fn write_cstring(w: &mut Writer, s: &str) -> BsonResult<()> {
    if s.as_bytes().contains(&0) {
        return Err(BsonError::InvalidCString);
    }
    w.buf(s.as_bytes());
    w.u8(0);
    Ok(())
}

fn write_key(w: &mut Writer, tag: u8, key: &str) -> BsonResult<()> {
    if key.is_empty() || key.as_bytes().contains(&0) {
        return Err(BsonError::InvalidKey(key.to_owned()));
    }
    w.u8(tag);
    w.buf(key.as_bytes());
    w.u8(0);
    Ok(())
}

fn checked_len(len: usize) -> BsonResult<i32> {
    i32::try_from(len).map_err(|_| BsonError::DocumentTooLarge(len))
}

/// Patches the length of the document or scope that starts at `start` and
/// runs to the current end of the writer.
fn patch_length(w: &mut Writer, start: usize) -> BsonResult<()> {
    let size = checked_len(w.len() - start)?;
    w.patch_i32(start, size);
    Ok(())
}

fn write_string(w: &mut Writer, s: &str) -> BsonResult<()> {
    w.i32(checked_len(s.len() + 1)?);
    w.buf(s.as_bytes());
    w.u8(0);
    Ok(())
}

fn write_element(w: &mut Writer, key: &str, value: &BsonValue) -> BsonResult<()> {
    write_key(w, value.element_type(), key)?;
    write_value(w, value)
}

fn write_document(w: &mut Writer, doc: &BsonDocument) -> BsonResult<()> {
    let start = w.len();
    w.i32(0);
    for (key, value) in doc {
        write_element(w, key, value)?;
    }
    w.u8(0);
    patch_length(w, start)
}

fn write_array(w: &mut Writer, values: &[BsonValue]) -> BsonResult<()> {
    let start = w.len();
    w.i32(0);
    for (index, value) in values.iter().enumerate() {
        write_element(w, &index.to_string(), value)?;
    }
    w.u8(0);
    patch_length(w, start)
}

fn write_binary(w: &mut Writer, bin: &BsonBinary) -> BsonResult<()> {
    w.i32(checked_len(bin.data.len())?);
    w.u8(bin.subtype);
    w.buf(&bin.data);
    Ok(())
}

fn write_regex(w: &mut Writer, regex: &BsonRegex) -> BsonResult<()> {
    write_cstring(w, &regex.pattern)?;
    write_cstring(w, &regex.options)
}

fn write_timestamp(w: &mut Writer, ts: BsonTimestamp) {
    w.u32(ts.increment);
    w.u32(ts.time);
}

fn write_value(w: &mut Writer, value: &BsonValue) -> BsonResult<()> {
    match value {
        BsonValue::Float(f) => w.f64(*f),
        BsonValue::Str(s) | BsonValue::JavaScriptCode(s) | BsonValue::Symbol(s) => {
            write_string(w, s)?
        }
        BsonValue::Document(doc) => write_document(w, doc)?,
        BsonValue::Array(items) => write_array(w, items)?,
        BsonValue::Binary(bin) => write_binary(w, bin)?,
        BsonValue::ObjectId(id) => w.buf(&id.bytes()),
        BsonValue::Boolean(b) => w.u8(*b as u8),
        BsonValue::DateTime(dt) => w.i64(dt.0),
        BsonValue::Regex(regex) => write_regex(w, regex)?,
        BsonValue::DbPointer(ptr) => {
            write_string(w, &ptr.namespace)?;
            w.buf(&ptr.id.bytes());
        }
        BsonValue::JavaScriptCodeWithScope(cws) => {
            let start = w.len();
            w.i32(0);
            write_string(w, &cws.code)?;
            write_document(w, &cws.scope)?;
            patch_length(w, start)?;
        }
        BsonValue::Int32(i) => w.i32(*i),
        BsonValue::Timestamp(ts) => write_timestamp(w, *ts),
        BsonValue::Int64(i) => w.i64(*i),
        BsonValue::Decimal128(dec) => w.buf(&dec.bytes),
        BsonValue::Undefined | BsonValue::Null | BsonValue::MinKey | BsonValue::MaxKey => {}
    }
    Ok(())
}
