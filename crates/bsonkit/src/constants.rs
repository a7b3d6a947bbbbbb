//! BSON element type tags.

pub const TYPE_DOUBLE: u8 = 0x01;
pub const TYPE_STRING: u8 = 0x02;
pub const TYPE_DOCUMENT: u8 = 0x03;
pub const TYPE_ARRAY: u8 = 0x04;
pub const TYPE_BINARY: u8 = 0x05;
pub const TYPE_UNDEFINED: u8 = 0x06;
pub const TYPE_OBJECT_ID: u8 = 0x07;
pub const TYPE_BOOLEAN: u8 = 0x08;
pub const TYPE_DATE_TIME: u8 = 0x09;
pub const TYPE_NULL: u8 = 0x0a;
pub const TYPE_REGEX: u8 = 0x0b;
pub const TYPE_DB_POINTER: u8 = 0x0c;
pub const TYPE_JAVASCRIPT_CODE: u8 = 0x0d;
pub const TYPE_SYMBOL: u8 = 0x0e;
pub const TYPE_JAVASCRIPT_CODE_WITH_SCOPE: u8 = 0x0f;
pub const TYPE_INT32: u8 = 0x10;
pub const TYPE_TIMESTAMP: u8 = 0x11;
pub const TYPE_INT64: u8 = 0x12;
pub const TYPE_DECIMAL128: u8 = 0x13;
pub const TYPE_MIN_KEY: u8 = 0xff;
pub const TYPE_MAX_KEY: u8 = 0x7f;

/// Smallest possible document: length prefix plus terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Default nesting limit applied by the decoder, counting the root document.
pub const DEFAULT_MAX_DEPTH: usize = 100;

// Binary subtypes
pub const BINARY_GENERIC: u8 = 0x00;
pub const BINARY_FUNCTION: u8 = 0x01;
pub const BINARY_OLD: u8 = 0x02;
pub const BINARY_UUID_OLD: u8 = 0x03;
pub const BINARY_UUID: u8 = 0x04;
pub const BINARY_MD5: u8 = 0x05;
pub const BINARY_ENCRYPTED: u8 = 0x06;
pub const BINARY_USER_DEFINED: u8 = 0x80;
