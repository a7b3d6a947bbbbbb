//! BSON document decoder.
//!
//! BSON is a little-endian binary format. Every document starts with its total
//! length and ends with a zero byte; the decoder checks both against the bytes
//! it actually consumes and never returns a partially decoded document.

use bsonkit_buffers::{BufferError, Reader};
use tracing::{debug, trace};

use crate::constants::*;
use crate::document::BsonDocument;
use crate::error::{BsonError, BsonResult, Malformed};
use crate::oid::BsonObjectId;
use crate::values::{
    BsonBinary, BsonDateTime, BsonDbPointer, BsonDecimal128, BsonJavascriptCodeWithScope,
    BsonRegex, BsonTimestamp, BsonValue,
};

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Maximum nesting of documents and arrays, counting the root document.
    pub max_depth: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// BSON document decoder.
#[derive(Debug, Clone, Default)]
pub struct BsonDecoder {
    options: DecoderOptions,
}

fn at(offset: usize) -> impl Fn(BufferError) -> BsonError {
    move |err| BsonError::malformed(offset, err.into())
}

impl BsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decodes a single BSON document occupying all of `data`.
    pub fn decode(&self, data: &[u8]) -> BsonResult<BsonDocument> {
        let mut reader = Reader::new(data);
        let declared = reader.i32().map_err(at(0))?;
        if declared < MIN_DOCUMENT_SIZE as i32 {
            return Err(BsonError::malformed(0, Malformed::InvalidLength(declared)));
        }
        if declared as usize != data.len() {
            return Err(BsonError::malformed(
                0,
                Malformed::LengthMismatch {
                    declared: declared as usize,
                    actual: data.len(),
                },
            ));
        }
        let mut reader = Reader::new(data);
        self.read_document(&mut reader, 1)
    }

    /// Decodes back-to-back documents until `data` is exhausted.
    ///
    /// An empty buffer yields no documents. Trailing bytes that do not form a
    /// complete document are an error.
    pub fn decode_sequence(&self, data: &[u8]) -> BsonResult<Vec<BsonDocument>> {
        let mut reader = Reader::new(data);
        let mut docs = Vec::new();
        while !reader.is_empty() {
            let start = reader.x;
            let doc = self.read_document(&mut reader, 1)?;
            trace!(offset = start, size = reader.x - start, "decoded document from sequence");
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Decodes the value of a single element whose payload spans
    /// `data[start..end]`.
    ///
    /// `depth` is the nesting level of the document holding the element.
    pub(crate) fn decode_value(
        &self,
        data: &[u8],
        tag: u8,
        start: usize,
        end: usize,
        depth: usize,
    ) -> BsonResult<BsonValue> {
        let mut reader = Reader {
            uint8: data,
            x: start,
            end,
        };
        let value = self.read_value(&mut reader, tag, depth)?;
        if !reader.is_empty() {
            return Err(BsonError::malformed(
                reader.x,
                Malformed::LengthMismatch {
                    declared: end - start,
                    actual: reader.x - start,
                },
            ));
        }
        Ok(value)
    }

    fn check_depth(&self, depth: usize, offset: usize) -> BsonResult<()> {
        if depth > self.options.max_depth {
            debug!(offset, max_depth = self.options.max_depth, "BSON nesting limit exceeded");
            return Err(BsonError::DepthExceeded(self.options.max_depth));
        }
        Ok(())
    }

    /// Reads one length-prefixed element list and hands each (key, value)
    /// pair to `sink` in wire order. Document keys (`keyed`) must be
    /// non-empty; array keys are ignored.
    fn read_elements(
        &self,
        reader: &mut Reader<'_>,
        depth: usize,
        keyed: bool,
        mut sink: impl FnMut(String, BsonValue),
    ) -> BsonResult<()> {
        let start = reader.x;
        self.check_depth(depth, start)?;
        let size = reader.i32().map_err(at(start))?;
        if size < MIN_DOCUMENT_SIZE as i32 {
            return Err(BsonError::malformed(start, Malformed::InvalidLength(size)));
        }
        let size = size as usize;
        let available = reader.size() + 4;
        if size > available {
            return Err(BsonError::malformed(
                start,
                Malformed::LengthMismatch {
                    declared: size,
                    actual: available,
                },
            ));
        }
        let mut body = reader.cut(size - 4).map_err(at(start))?;
        loop {
            let tag_pos = body.x;
            let tag = body
                .u8()
                .map_err(|_| BsonError::malformed(tag_pos, Malformed::MissingTerminator))?;
            if tag == 0 {
                if !body.is_empty() {
                    return Err(BsonError::malformed(
                        tag_pos,
                        Malformed::LengthMismatch {
                            declared: size,
                            actual: tag_pos + 1 - start,
                        },
                    ));
                }
                return Ok(());
            }
            let key = self.read_cstring(&mut body)?;
            if keyed && key.is_empty() {
                return Err(BsonError::malformed(tag_pos + 1, Malformed::EmptyKey));
            }
            let value = self.read_value(&mut body, tag, depth)?;
            sink(key, value);
        }
    }

    fn read_document(&self, reader: &mut Reader<'_>, depth: usize) -> BsonResult<BsonDocument> {
        let mut doc = BsonDocument::new();
        self.read_elements(reader, depth, true, |key, value| {
            doc.insert(key, value);
        })?;
        Ok(doc)
    }

    /// Array keys are not checked; elements keep their wire order.
    fn read_array(&self, reader: &mut Reader<'_>, depth: usize) -> BsonResult<Vec<BsonValue>> {
        let mut items = Vec::new();
        self.read_elements(reader, depth, false, |_, value| items.push(value))?;
        Ok(items)
    }

    fn read_cstring(&self, reader: &mut Reader<'_>) -> BsonResult<String> {
        let pos = reader.x;
        let bytes = reader.cstr().map_err(at(pos))?;
        utf8(bytes, pos)
    }

    fn read_string(&self, reader: &mut Reader<'_>) -> BsonResult<String> {
        let pos = reader.x;
        let length = reader.i32().map_err(at(pos))?;
        if length < 1 {
            return Err(BsonError::malformed(pos, Malformed::InvalidLength(length)));
        }
        let bytes = reader.buf(length as usize - 1).map_err(at(pos))?;
        let terminator_pos = reader.x;
        if reader.u8().map_err(at(terminator_pos))? != 0 {
            return Err(BsonError::malformed(
                terminator_pos,
                Malformed::MissingTerminator,
            ));
        }
        utf8(bytes, pos + 4)
    }

    fn read_object_id(&self, reader: &mut Reader<'_>) -> BsonResult<BsonObjectId> {
        let pos = reader.x;
        Ok(BsonObjectId::from_bytes(reader.array().map_err(at(pos))?))
    }

    fn read_value(&self, reader: &mut Reader<'_>, tag: u8, depth: usize) -> BsonResult<BsonValue> {
        let pos = reader.x;
        let value = match tag {
            TYPE_DOUBLE => BsonValue::Float(reader.f64().map_err(at(pos))?),
            TYPE_STRING => BsonValue::Str(self.read_string(reader)?),
            TYPE_DOCUMENT => BsonValue::Document(self.read_document(reader, depth + 1)?),
            TYPE_ARRAY => BsonValue::Array(self.read_array(reader, depth + 1)?),
            TYPE_BINARY => BsonValue::Binary(self.read_binary(reader)?),
            TYPE_UNDEFINED => BsonValue::Undefined,
            TYPE_OBJECT_ID => BsonValue::ObjectId(self.read_object_id(reader)?),
            TYPE_BOOLEAN => match reader.u8().map_err(at(pos))? {
                0 => BsonValue::Boolean(false),
                1 => BsonValue::Boolean(true),
                other => {
                    return Err(BsonError::malformed(pos, Malformed::InvalidBoolean(other)))
                }
            },
            TYPE_DATE_TIME => BsonValue::DateTime(BsonDateTime(reader.i64().map_err(at(pos))?)),
            TYPE_NULL => BsonValue::Null,
            TYPE_REGEX => {
                let pattern = self.read_cstring(reader)?;
                let options = self.read_cstring(reader)?;
                BsonValue::Regex(BsonRegex { pattern, options })
            }
            TYPE_DB_POINTER => {
                let namespace = self.read_string(reader)?;
                let id = self.read_object_id(reader)?;
                BsonValue::DbPointer(BsonDbPointer { namespace, id })
            }
            TYPE_JAVASCRIPT_CODE => BsonValue::JavaScriptCode(self.read_string(reader)?),
            TYPE_SYMBOL => BsonValue::Symbol(self.read_string(reader)?),
            TYPE_JAVASCRIPT_CODE_WITH_SCOPE => {
                BsonValue::JavaScriptCodeWithScope(self.read_code_with_scope(reader, depth)?)
            }
            TYPE_INT32 => BsonValue::Int32(reader.i32().map_err(at(pos))?),
            TYPE_TIMESTAMP => {
                let increment = reader.u32().map_err(at(pos))?;
                let time = reader.u32().map_err(at(pos))?;
                BsonValue::Timestamp(BsonTimestamp { time, increment })
            }
            TYPE_INT64 => BsonValue::Int64(reader.i64().map_err(at(pos))?),
            TYPE_DECIMAL128 => BsonValue::Decimal128(BsonDecimal128 {
                bytes: reader.array().map_err(at(pos))?,
            }),
            TYPE_MIN_KEY => BsonValue::MinKey,
            TYPE_MAX_KEY => BsonValue::MaxKey,
            other => return Err(BsonError::malformed(pos, Malformed::UnsupportedType(other))),
        };
        Ok(value)
    }

    fn read_binary(&self, reader: &mut Reader<'_>) -> BsonResult<BsonBinary> {
        let pos = reader.x;
        let length = reader.i32().map_err(at(pos))?;
        if length < 0 {
            return Err(BsonError::malformed(pos, Malformed::InvalidLength(length)));
        }
        let subtype = reader.u8().map_err(at(pos))?;
        let data = reader.buf(length as usize).map_err(at(pos))?.to_vec();
        Ok(BsonBinary { subtype, data })
    }

    fn read_code_with_scope(
        &self,
        reader: &mut Reader<'_>,
        depth: usize,
    ) -> BsonResult<BsonJavascriptCodeWithScope> {
        let pos = reader.x;
        let total = reader.i32().map_err(at(pos))?;
        // length prefix + minimal string + minimal document
        if total < 4 + 5 + MIN_DOCUMENT_SIZE as i32 {
            return Err(BsonError::malformed(pos, Malformed::InvalidLength(total)));
        }
        let mut inner = reader.cut(total as usize - 4).map_err(at(pos))?;
        let code = self.read_string(&mut inner)?;
        let scope = self.read_document(&mut inner, depth + 1)?;
        if !inner.is_empty() {
            return Err(BsonError::malformed(
                pos,
                Malformed::LengthMismatch {
                    declared: total as usize,
                    actual: inner.x - pos,
                },
            ));
        }
        Ok(BsonJavascriptCodeWithScope { code, scope })
    }
}

fn utf8(bytes: &[u8], offset: usize) -> BsonResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| BsonError::malformed(offset, Malformed::InvalidUtf8))
}
