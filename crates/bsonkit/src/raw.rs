//! Zero-copy scanning of encoded documents.
//!
//! [`RawDocument`] walks the elements of an encoded document without
//! materialising their values. Only the elements that are actually looked up
//! get decoded; everything else is checked for structure (lengths and
//! terminators) only.

use bsonkit_buffers::{BufferError, Reader};

use crate::constants::*;
use crate::decoder::BsonDecoder;
use crate::error::{BsonError, BsonResult, Malformed};
use crate::values::BsonValue;

fn at(offset: usize) -> impl Fn(BufferError) -> BsonError {
    move |err| BsonError::malformed(offset, err.into())
}

/// A borrowed view over one encoded document.
#[derive(Debug, Clone, Copy)]
pub struct RawDocument<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
    depth: usize,
}

/// One element of a [`RawDocument`].
#[derive(Debug, Clone, Copy)]
pub struct RawElement<'a> {
    pub key: &'a str,
    pub tag: u8,
    data: &'a [u8],
    start: usize,
    end: usize,
    depth: usize,
}

impl<'a> RawDocument<'a> {
    /// Wraps `data`, checking that its length prefix and terminator are
    /// consistent with the slice.
    pub fn from_bytes(data: &'a [u8]) -> BsonResult<Self> {
        let declared = Reader::new(data).i32().map_err(at(0))?;
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
        Ok(Self {
            data,
            start: 0,
            end: data.len(),
            depth: 1,
        })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        &self.data[self.start..self.end]
    }

    pub fn iter(&self) -> RawIter<'a> {
        RawIter {
            data: self.data,
            x: self.start + 4,
            end: self.end,
            depth: self.depth,
            done: false,
        }
    }

    /// Finds the element stored under `key`.
    ///
    /// When the key occurs more than once the last occurrence is returned,
    /// matching the value the decoder keeps. The whole element list is
    /// scanned, so structural errors anywhere at this level are reported.
    pub fn get(&self, key: &str) -> BsonResult<Option<RawElement<'a>>> {
        let mut found = None;
        for element in self.iter() {
            let element = element?;
            if element.key == key {
                found = Some(element);
            }
        }
        Ok(found)
    }

    /// Looks up a dot-separated path, descending into embedded documents and
    /// into arrays by element position.
    pub fn get_path(&self, path: &str) -> BsonResult<Option<RawElement<'a>>> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Ok(None);
        };
        let mut current = match self.get(first)? {
            Some(element) => element,
            None => return Ok(None),
        };
        for segment in segments {
            let next = match current.tag {
                TYPE_DOCUMENT => current.nested().get(segment)?,
                TYPE_ARRAY => match segment.parse::<usize>() {
                    Ok(index) => current.nested().iter().nth(index).transpose()?,
                    Err(_) => None,
                },
                _ => None,
            };
            match next {
                Some(element) => current = element,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

impl<'a> RawElement<'a> {
    /// The encoded value bytes, excluding tag and key.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.start..self.end]
    }

    /// Fully decodes this element's value.
    pub fn to_value(&self, decoder: &BsonDecoder) -> BsonResult<BsonValue> {
        decoder.decode_value(self.data, self.tag, self.start, self.end, self.depth)
    }

    /// View of an embedded document or array value.
    pub fn as_document(&self) -> Option<RawDocument<'a>> {
        matches!(self.tag, TYPE_DOCUMENT | TYPE_ARRAY).then(|| self.nested())
    }

    fn nested(&self) -> RawDocument<'a> {
        RawDocument {
            data: self.data,
            start: self.start,
            end: self.end,
            depth: self.depth + 1,
        }
    }
}

/// Iterator over the elements of a [`RawDocument`].
///
/// Yields an error and stops at the first structural problem.
pub struct RawIter<'a> {
    data: &'a [u8],
    x: usize,
    end: usize,
    depth: usize,
    done: bool,
}

impl<'a> RawIter<'a> {
    fn read_element(&mut self) -> BsonResult<Option<RawElement<'a>>> {
        let mut reader = Reader {
            uint8: self.data,
            x: self.x,
            end: self.end,
        };
        let tag_pos = reader.x;
        let tag = reader
            .u8()
            .map_err(|_| BsonError::malformed(tag_pos, Malformed::MissingTerminator))?;
        if tag == 0 {
            if !reader.is_empty() {
                return Err(BsonError::malformed(
                    tag_pos,
                    Malformed::LengthMismatch {
                        declared: self.end - tag_pos,
                        actual: 1,
                    },
                ));
            }
            return Ok(None);
        }
        let key_pos = reader.x;
        let key = reader.cstr().map_err(at(key_pos))?;
        let key = std::str::from_utf8(key)
            .map_err(|_| BsonError::malformed(key_pos, Malformed::InvalidUtf8))?;
        let start = reader.x;
        skip_value(&mut reader, tag)?;
        self.x = reader.x;
        Ok(Some(RawElement {
            key,
            tag,
            data: self.data,
            start,
            end: reader.x,
            depth: self.depth,
        }))
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = BsonResult<RawElement<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Advances past one value, checking only the lengths needed to find its end.
fn skip_value(reader: &mut Reader<'_>, tag: u8) -> BsonResult<()> {
    let pos = reader.x;
    let length = |reader: &mut Reader<'_>, min: i32| -> BsonResult<usize> {
        let n = reader.i32().map_err(at(pos))?;
        if n < min {
            return Err(BsonError::malformed(pos, Malformed::InvalidLength(n)));
        }
        Ok(n as usize)
    };
    let skipped = match tag {
        TYPE_DOUBLE | TYPE_DATE_TIME | TYPE_TIMESTAMP | TYPE_INT64 => reader.skip(8),
        TYPE_INT32 => reader.skip(4),
        TYPE_OBJECT_ID => reader.skip(12),
        TYPE_DECIMAL128 => reader.skip(16),
        TYPE_BOOLEAN => reader.skip(1),
        TYPE_UNDEFINED | TYPE_NULL | TYPE_MIN_KEY | TYPE_MAX_KEY => Ok(()),
        TYPE_STRING | TYPE_JAVASCRIPT_CODE | TYPE_SYMBOL => {
            let n = length(reader, 1)?;
            reader.skip(n)
        }
        TYPE_DOCUMENT | TYPE_ARRAY => {
            let n = length(reader, MIN_DOCUMENT_SIZE as i32)?;
            reader.skip(n - 4)
        }
        TYPE_BINARY => {
            let n = length(reader, 0)?;
            reader.skip(n + 1)
        }
        TYPE_REGEX => reader.cstr().and_then(|_| reader.cstr()).map(|_| ()),
        TYPE_DB_POINTER => {
            let n = length(reader, 1)?;
            reader.skip(n + 12)
        }
        TYPE_JAVASCRIPT_CODE_WITH_SCOPE => {
            let n = length(reader, 4 + 5 + MIN_DOCUMENT_SIZE as i32)?;
            reader.skip(n - 4)
        }
        other => return Err(BsonError::malformed(pos, Malformed::UnsupportedType(other))),
    };
    skipped.map_err(at(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1, "b": {"c": "x"}, "a": 2}
    const DUPLICATE: [u8; 36] = [
        36, 0, 0, 0, //
        0x10, b'a', 0, 1, 0, 0, 0, //
        0x03, b'b', 0, 14, 0, 0, 0, 0x02, b'c', 0, 2, 0, 0, 0, b'x', 0, 0, //
        0x10, b'a', 0, 2, 0, 0, 0, //
        0,
    ];

    #[test]
    fn iterates_in_wire_order() {
        let doc = RawDocument::from_bytes(&DUPLICATE).unwrap();
        let keys: Vec<_> = doc.iter().map(|e| e.unwrap().key).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn get_returns_last_occurrence() {
        let doc = RawDocument::from_bytes(&DUPLICATE).unwrap();
        let element = doc.get("a").unwrap().unwrap();
        assert_eq!(element.payload(), &[2, 0, 0, 0]);
        let value = element.to_value(&BsonDecoder::new()).unwrap();
        assert_eq!(value, BsonValue::Int32(2));
    }

    #[test]
    fn get_path_into_embedded_document() {
        let doc = RawDocument::from_bytes(&DUPLICATE).unwrap();
        let element = doc.get_path("b.c").unwrap().unwrap();
        assert_eq!(element.tag, TYPE_STRING);
        assert!(doc.get_path("b.z").unwrap().is_none());
        assert!(doc.get_path("a.c").unwrap().is_none());
    }

    #[test]
    fn reports_overlong_element() {
        // int64 tag with only four payload bytes before the terminator.
        let data = [12, 0, 0, 0, 0x12, b'a', 0, 1, 0, 0, 0, 0];
        let doc = RawDocument::from_bytes(&data).unwrap();
        assert!(doc.get("a").unwrap_err().is_malformed());
    }
}
