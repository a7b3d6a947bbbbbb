//! BSON value model.

use std::fmt;

use crate::constants::*;
use crate::document::BsonDocument;
use crate::oid::BsonObjectId;

/// Binary payload with its subtype byte.
///
/// The payload is kept exactly as it appears on the wire. For the legacy
/// subtype 0x02 this includes the inner length prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonBinary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

impl BsonBinary {
    /// Generic (subtype 0x00) binary.
    pub fn generic(data: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: BINARY_GENERIC,
            data: data.into(),
        }
    }

    pub fn is_user_defined(&self) -> bool {
        self.subtype >= BINARY_USER_DEFINED
    }
}

/// UTC datetime as signed milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BsonDateTime(pub i64);

impl BsonDateTime {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0
    }

    /// Converts to a chrono datetime, or `None` when out of chrono's range.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for BsonDateTime {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

/// Regular expression: pattern and option flags, both NUL-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonRegex {
    pub pattern: String,
    pub options: String,
}

impl BsonRegex {
    pub fn new(pattern: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            options: options.into(),
        }
    }
}

/// Internal replication timestamp.
///
/// On the wire the increment occupies the low four bytes and the seconds the
/// high four bytes of a little-endian `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsonTimestamp {
    pub time: u32,
    pub increment: u32,
}

/// Opaque IEEE 754-2008 decimal128 bytes (little-endian, as on the wire).
///
/// No arithmetic is provided; `Display` renders the canonical string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsonDecimal128 {
    pub bytes: [u8; 16],
}

impl fmt::Display for BsonDecimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const EXPONENT_BIAS: i32 = 6176;
        const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999;

        let bits = u128::from_le_bytes(self.bytes);
        let negative = bits >> 127 == 1;
        let sign = if negative { "-" } else { "" };
        let (exponent, coefficient) = match (bits >> 122) & 0x1f {
            0b11111 => return f.write_str("NaN"),
            0b11110 => return write!(f, "{sign}Infinity"),
            // The implicit 0b100 prefix always exceeds the maximum coefficient.
            combination if combination >> 3 == 0b11 => ((bits >> 111) & 0x3fff, 0),
            _ => ((bits >> 113) & 0x3fff, bits & ((1u128 << 113) - 1)),
        };
        let coefficient = if coefficient > MAX_COEFFICIENT { 0 } else { coefficient };
        let exponent = exponent as i32 - EXPONENT_BIAS;
        let digits = coefficient.to_string();
        let adjusted = exponent + digits.len() as i32 - 1;

        f.write_str(sign)?;
        if exponent <= 0 && adjusted >= -6 {
            if exponent == 0 {
                return f.write_str(&digits);
            }
            let point = digits.len() as i32 + exponent;
            if point > 0 {
                let (int, frac) = digits.split_at(point as usize);
                write!(f, "{int}.{frac}")
            } else {
                write!(f, "0.{}{digits}", "0".repeat((-point) as usize))
            }
        } else {
            let (first, rest) = digits.split_at(1);
            f.write_str(first)?;
            if !rest.is_empty() {
                write!(f, ".{rest}")?;
            }
            write!(f, "E{}{adjusted}", if adjusted >= 0 { "+" } else { "" })
        }
    }
}

/// Deprecated DBPointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonDbPointer {
    pub namespace: String,
    pub id: BsonObjectId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BsonJavascriptCodeWithScope {
    pub code: String,
    pub scope: BsonDocument,
}

/// A single BSON value.
///
/// Equality is structural and bit-exact for `Float`: `NaN` equals itself and
/// `0.0` differs from `-0.0`. Use [`cmp_values`](crate::order::cmp_values) for the
/// numeric sort order.
#[derive(Debug, Clone)]
pub enum BsonValue {
    Float(f64),
    Str(String),
    Document(BsonDocument),
    Array(Vec<BsonValue>),
    Binary(BsonBinary),
    Undefined,
    ObjectId(BsonObjectId),
    Boolean(bool),
    DateTime(BsonDateTime),
    Null,
    Regex(BsonRegex),
    DbPointer(BsonDbPointer),
    JavaScriptCode(String),
    Symbol(String),
    JavaScriptCodeWithScope(BsonJavascriptCodeWithScope),
    Int32(i32),
    Timestamp(BsonTimestamp),
    Int64(i64),
    Decimal128(BsonDecimal128),
    MinKey,
    MaxKey,
}

impl PartialEq for BsonValue {
    fn eq(&self, other: &Self) -> bool {
        use BsonValue::*;
        match (self, other) {
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Str(a), Str(b))
            | (JavaScriptCode(a), JavaScriptCode(b))
            | (Symbol(a), Symbol(b)) => a == b,
            (Document(a), Document(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (ObjectId(a), ObjectId(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Regex(a), Regex(b)) => a == b,
            (DbPointer(a), DbPointer(b)) => a == b,
            (JavaScriptCodeWithScope(a), JavaScriptCodeWithScope(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Decimal128(a), Decimal128(b)) => a == b,
            (Undefined, Undefined) | (Null, Null) | (MinKey, MinKey) | (MaxKey, MaxKey) => true,
            _ => false,
        }
    }
}

impl BsonValue {
    /// The wire type tag of this value.
    pub fn element_type(&self) -> u8 {
        match self {
            BsonValue::Float(_) => TYPE_DOUBLE,
            BsonValue::Str(_) => TYPE_STRING,
            BsonValue::Document(_) => TYPE_DOCUMENT,
            BsonValue::Array(_) => TYPE_ARRAY,
            BsonValue::Binary(_) => TYPE_BINARY,
            BsonValue::Undefined => TYPE_UNDEFINED,
            BsonValue::ObjectId(_) => TYPE_OBJECT_ID,
            BsonValue::Boolean(_) => TYPE_BOOLEAN,
            BsonValue::DateTime(_) => TYPE_DATE_TIME,
            BsonValue::Null => TYPE_NULL,
            BsonValue::Regex(_) => TYPE_REGEX,
            BsonValue::DbPointer(_) => TYPE_DB_POINTER,
            BsonValue::JavaScriptCode(_) => TYPE_JAVASCRIPT_CODE,
            BsonValue::Symbol(_) => TYPE_SYMBOL,
            BsonValue::JavaScriptCodeWithScope(_) => TYPE_JAVASCRIPT_CODE_WITH_SCOPE,
            BsonValue::Int32(_) => TYPE_INT32,
            BsonValue::Timestamp(_) => TYPE_TIMESTAMP,
            BsonValue::Int64(_) => TYPE_INT64,
            BsonValue::Decimal128(_) => TYPE_DECIMAL128,
            BsonValue::MinKey => TYPE_MIN_KEY,
            BsonValue::MaxKey => TYPE_MAX_KEY,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BsonValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&BsonDocument> {
        match self {
            BsonValue::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[BsonValue]> {
        match self {
            BsonValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Numeric value as `f64` for Float, Int32 and Int64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            BsonValue::Float(f) => Some(f),
            BsonValue::Int32(i) => Some(i as f64),
            BsonValue::Int64(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BsonValue::Null)
    }
}

impl From<f64> for BsonValue {
    fn from(v: f64) -> Self {
        BsonValue::Float(v)
    }
}

impl From<i32> for BsonValue {
    fn from(v: i32) -> Self {
        BsonValue::Int32(v)
    }
}

impl From<i64> for BsonValue {
    fn from(v: i64) -> Self {
        BsonValue::Int64(v)
    }
}

impl From<bool> for BsonValue {
    fn from(v: bool) -> Self {
        BsonValue::Boolean(v)
    }
}

impl From<&str> for BsonValue {
    fn from(v: &str) -> Self {
        BsonValue::Str(v.to_owned())
    }
}

impl From<String> for BsonValue {
    fn from(v: String) -> Self {
        BsonValue::Str(v)
    }
}

impl From<BsonDocument> for BsonValue {
    fn from(v: BsonDocument) -> Self {
        BsonValue::Document(v)
    }
}

impl From<Vec<BsonValue>> for BsonValue {
    fn from(v: Vec<BsonValue>) -> Self {
        BsonValue::Array(v)
    }
}

impl From<BsonBinary> for BsonValue {
    fn from(v: BsonBinary) -> Self {
        BsonValue::Binary(v)
    }
}

impl From<BsonObjectId> for BsonValue {
    fn from(v: BsonObjectId) -> Self {
        BsonValue::ObjectId(v)
    }
}

impl From<BsonDateTime> for BsonValue {
    fn from(v: BsonDateTime) -> Self {
        BsonValue::DateTime(v)
    }
}

impl From<BsonRegex> for BsonValue {
    fn from(v: BsonRegex) -> Self {
        BsonValue::Regex(v)
    }
}

impl From<BsonTimestamp> for BsonValue {
    fn from(v: BsonTimestamp) -> Self {
        BsonValue::Timestamp(v)
    }
}

impl<T: Into<BsonValue>> From<Option<T>> for BsonValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(BsonValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(high: u64, low: u64) -> BsonDecimal128 {
        let bits = ((high as u128) << 64) | low as u128;
        BsonDecimal128 {
            bytes: bits.to_le_bytes(),
        }
    }

    #[test]
    fn decimal128_canonical_strings() {
        assert_eq!(decimal(0x3040_0000_0000_0000, 0).to_string(), "0");
        assert_eq!(decimal(0x3040_0000_0000_0000, 1).to_string(), "1");
        assert_eq!(decimal(0xb040_0000_0000_0000, 1).to_string(), "-1");
        assert_eq!(decimal(0x303c_0000_0000_0000, 1234).to_string(), "12.34");
        assert_eq!(decimal(0x3034_0000_0000_0000, 1).to_string(), "0.000001");
        assert_eq!(decimal(0x3032_0000_0000_0000, 1).to_string(), "1E-7");
        assert_eq!(decimal(0x3042_0000_0000_0000, 1).to_string(), "1E+1");
        assert_eq!(decimal(0x7c00_0000_0000_0000, 0).to_string(), "NaN");
        assert_eq!(decimal(0xf800_0000_0000_0000, 0).to_string(), "-Infinity");
    }

    #[test]
    fn element_types() {
        assert_eq!(BsonValue::from(1).element_type(), TYPE_INT32);
        assert_eq!(BsonValue::from(1i64).element_type(), TYPE_INT64);
        assert_eq!(BsonValue::from("x").element_type(), TYPE_STRING);
        assert_eq!(BsonValue::from(None::<i32>), BsonValue::Null);
        assert_eq!(BsonValue::MaxKey.element_type(), TYPE_MAX_KEY);
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(BsonValue::Float(f64::NAN), BsonValue::Float(f64::NAN));
        assert_ne!(BsonValue::Float(0.0), BsonValue::Float(-0.0));
        assert_eq!(BsonValue::Float(-0.0), BsonValue::Float(-0.0));
        assert_ne!(BsonValue::Float(1.0), BsonValue::Int32(1));
        assert_ne!(BsonValue::Str("a".into()), BsonValue::Symbol("a".into()));
    }
}
