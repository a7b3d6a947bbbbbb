//! Relaxed Extended JSON rendering.
//!
//! One-way conversion of documents into MongoDB Extended JSON v2 (relaxed
//! mode) for diagnostics. Key order is preserved.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Datelike, SecondsFormat};
use serde_json::{json, Map, Value};

use crate::document::BsonDocument;
use crate::values::{BsonDateTime, BsonValue};

/// Renders `doc` as a relaxed Extended JSON object.
pub fn to_relaxed_json(doc: &BsonDocument) -> Value {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        map.insert(key.clone(), value_to_relaxed_json(value));
    }
    Value::Object(map)
}

fn float_to_json(f: f64) -> Value {
    if f.is_nan() {
        json!({ "$numberDouble": "NaN" })
    } else if f.is_infinite() {
        let repr = if f > 0.0 { "Infinity" } else { "-Infinity" };
        json!({ "$numberDouble": repr })
    } else {
        serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

fn date_to_json(dt: BsonDateTime) -> Value {
    match dt.to_chrono() {
        Some(chrono_dt) if (1970..=9999).contains(&chrono_dt.year()) => {
            json!({ "$date": chrono_dt.to_rfc3339_opts(SecondsFormat::Millis, true) })
        }
        _ => json!({ "$date": { "$numberLong": dt.0.to_string() } }),
    }
}

/// Renders a single value.
pub fn value_to_relaxed_json(value: &BsonValue) -> Value {
    match value {
        BsonValue::Float(f) => float_to_json(*f),
        BsonValue::Str(s) => Value::String(s.clone()),
        BsonValue::Document(doc) => to_relaxed_json(doc),
        BsonValue::Array(items) => Value::Array(items.iter().map(value_to_relaxed_json).collect()),
        BsonValue::Binary(bin) => json!({
            "$binary": {
                "base64": STANDARD.encode(&bin.data),
                "subType": format!("{:02x}", bin.subtype),
            }
        }),
        BsonValue::Undefined => json!({ "$undefined": true }),
        BsonValue::ObjectId(id) => json!({ "$oid": id.to_hex() }),
        BsonValue::Boolean(b) => Value::Bool(*b),
        BsonValue::DateTime(dt) => date_to_json(*dt),
        BsonValue::Null => Value::Null,
        BsonValue::Regex(regex) => json!({
            "$regularExpression": { "pattern": regex.pattern, "options": regex.options }
        }),
        BsonValue::DbPointer(ptr) => json!({
            "$dbPointer": { "$ref": ptr.namespace, "$id": { "$oid": ptr.id.to_hex() } }
        }),
        BsonValue::JavaScriptCode(code) => json!({ "$code": code }),
        BsonValue::Symbol(symbol) => json!({ "$symbol": symbol }),
        BsonValue::JavaScriptCodeWithScope(cws) => json!({
            "$code": cws.code,
            "$scope": to_relaxed_json(&cws.scope),
        }),
        BsonValue::Int32(i) => json!(i),
        BsonValue::Timestamp(ts) => json!({ "$timestamp": { "t": ts.time, "i": ts.increment } }),
        BsonValue::Int64(i) => json!(i),
        BsonValue::Decimal128(dec) => json!({ "$numberDecimal": dec.to_string() }),
        BsonValue::MinKey => json!({ "$minKey": 1 }),
        BsonValue::MaxKey => json!({ "$maxKey": 1 }),
    }
}

impl fmt::Display for BsonDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_relaxed_json(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::BsonObjectId;
    use crate::values::{BsonBinary, BsonRegex};

    #[test]
    fn renders_relaxed_forms() {
        let mut doc = BsonDocument::new();
        doc.insert("id", BsonObjectId::from_bytes([0x11; 12]));
        doc.insert("n", 1);
        doc.insert("big", 1i64 << 40);
        doc.insert("f", 1.5);
        doc.insert("bin", BsonBinary { subtype: 0x80, data: vec![1, 2, 3] });
        doc.insert("re", BsonRegex::new("^a", "i"));
        doc.insert("when", BsonDateTime(0));
        doc.insert("nan", f64::NAN);
        let json = to_relaxed_json(&doc);
        assert_eq!(
            json,
            json!({
                "id": { "$oid": "111111111111111111111111" },
                "n": 1,
                "big": 1_099_511_627_776i64,
                "f": 1.5,
                "bin": { "$binary": { "base64": "AQID", "subType": "80" } },
                "re": { "$regularExpression": { "pattern": "^a", "options": "i" } },
                "when": { "$date": "1970-01-01T00:00:00.000Z" },
                "nan": { "$numberDouble": "NaN" },
            })
        );
    }

    #[test]
    fn pre_epoch_dates_use_number_long() {
        assert_eq!(
            date_to_json(BsonDateTime(-1)),
            json!({ "$date": { "$numberLong": "-1" } })
        );
    }

    #[test]
    fn display_keeps_key_order() {
        let doc: BsonDocument = [("b", 1), ("a", 2)].into_iter().collect();
        assert_eq!(doc.to_string(), r#"{"b":1,"a":2}"#);
    }
}
