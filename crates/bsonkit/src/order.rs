//! Total order over BSON values, following document-database sort rules.
//!
//! Values of different types are ordered by a canonical type rank. Integers
//! and doubles share one rank and compare by numeric value, so `Int32(2)`,
//! `Int64(2)` and `Float(2.0)` are equal. Strings and symbols share a rank and
//! compare bytewise.

use std::cmp::Ordering;

use crate::document::BsonDocument;
use crate::values::BsonValue;

/// Canonical sort rank of a value's type.
pub fn type_rank(value: &BsonValue) -> u8 {
    match value {
        BsonValue::MinKey => 0,
        BsonValue::Undefined => 1,
        BsonValue::Null => 2,
        BsonValue::Float(_)
        | BsonValue::Int32(_)
        | BsonValue::Int64(_)
        | BsonValue::Decimal128(_) => 3,
        BsonValue::Str(_) | BsonValue::Symbol(_) => 4,
        BsonValue::Document(_) => 5,
        BsonValue::Array(_) => 6,
        BsonValue::Binary(_) => 7,
        BsonValue::ObjectId(_) => 8,
        BsonValue::Boolean(_) => 9,
        BsonValue::DateTime(_) => 10,
        BsonValue::Timestamp(_) => 11,
        BsonValue::Regex(_) => 12,
        BsonValue::DbPointer(_) => 13,
        BsonValue::JavaScriptCode(_) => 14,
        BsonValue::JavaScriptCodeWithScope(_) => 15,
        BsonValue::MaxKey => 16,
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &BsonValue) -> Option<Number> {
    match *value {
        BsonValue::Int32(i) => Some(Number::Int(i as i64)),
        BsonValue::Int64(i) => Some(Number::Int(i)),
        BsonValue::Float(f) => Some(Number::Float(f)),
        _ => None,
    }
}

fn as_text(value: &BsonValue) -> Option<&str> {
    match value {
        BsonValue::Str(s) | BsonValue::Symbol(s) => Some(s),
        _ => None,
    }
}

/// NaN sorts below every other number and equals itself; `-0.0 == 0.0`.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer against a double, without rounding the
/// integer through `f64`.
fn cmp_i64_f64(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ord => ord,
    }
}

fn cmp_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => a.cmp(&b),
        (Number::Float(a), Number::Float(b)) => cmp_f64(a, b),
        (Number::Int(a), Number::Float(b)) => cmp_i64_f64(a, b),
        (Number::Float(a), Number::Int(b)) => cmp_i64_f64(b, a).reverse(),
    }
}

/// Compares two documents element by element: type rank, then key, then
/// value. A document that is a prefix of the other sorts first.
pub fn cmp_documents(a: &BsonDocument, b: &BsonDocument) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = type_rank(va)
            .cmp(&type_rank(vb))
            .then_with(|| ka.as_bytes().cmp(kb.as_bytes()))
            .then_with(|| cmp_values(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_arrays(a: &[BsonValue], b: &[BsonValue]) -> Ordering {
    for (va, vb) in a.iter().zip(b) {
        let ord = cmp_values(va, vb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Three-way comparison of two values.
pub fn cmp_values(a: &BsonValue, b: &BsonValue) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return cmp_numbers(x, y);
    }
    if let (Some(x), Some(y)) = (as_text(a), as_text(b)) {
        return x.as_bytes().cmp(y.as_bytes());
    }
    match (a, b) {
        // Decimal128 is kept opaque: it sorts after the other numeric types
        // and among itself by its encoded bytes.
        (BsonValue::Decimal128(x), BsonValue::Decimal128(y)) => x.bytes.cmp(&y.bytes),
        (BsonValue::Decimal128(_), _) => Ordering::Greater,
        (_, BsonValue::Decimal128(_)) => Ordering::Less,
        (BsonValue::Document(x), BsonValue::Document(y)) => cmp_documents(x, y),
        (BsonValue::Array(x), BsonValue::Array(y)) => cmp_arrays(x, y),
        (BsonValue::Binary(x), BsonValue::Binary(y)) => x
            .data
            .len()
            .cmp(&y.data.len())
            .then(x.subtype.cmp(&y.subtype))
            .then_with(|| x.data.cmp(&y.data)),
        (BsonValue::ObjectId(x), BsonValue::ObjectId(y)) => x.cmp(y),
        (BsonValue::Boolean(x), BsonValue::Boolean(y)) => x.cmp(y),
        (BsonValue::DateTime(x), BsonValue::DateTime(y)) => x.cmp(y),
        (BsonValue::Timestamp(x), BsonValue::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (BsonValue::Regex(x), BsonValue::Regex(y)) => x
            .pattern
            .as_bytes()
            .cmp(y.pattern.as_bytes())
            .then_with(|| x.options.as_bytes().cmp(y.options.as_bytes())),
        (BsonValue::DbPointer(x), BsonValue::DbPointer(y)) => x
            .namespace
            .as_bytes()
            .cmp(y.namespace.as_bytes())
            .then_with(|| x.id.cmp(&y.id)),
        (BsonValue::JavaScriptCode(x), BsonValue::JavaScriptCode(y)) => {
            x.as_bytes().cmp(y.as_bytes())
        }
        (BsonValue::JavaScriptCodeWithScope(x), BsonValue::JavaScriptCodeWithScope(y)) => x
            .code
            .as_bytes()
            .cmp(y.code.as_bytes())
            .then_with(|| cmp_documents(&x.scope, &y.scope)),
        // Same rank, no payload: MinKey, Undefined, Null, MaxKey.
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::BsonBinary;

    #[test]
    fn numbers_compare_across_widths() {
        assert_eq!(
            cmp_values(&BsonValue::Int32(2), &BsonValue::Int64(2)),
            Ordering::Equal
        );
        assert_eq!(
            cmp_values(&BsonValue::Int64(2), &BsonValue::Float(2.0)),
            Ordering::Equal
        );
        assert_eq!(
            cmp_values(&BsonValue::Int32(2), &BsonValue::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            cmp_values(&BsonValue::Float(-2.5), &BsonValue::Int32(-2)),
            Ordering::Less
        );
    }

    #[test]
    fn large_integers_are_not_rounded() {
        // 2^53 + 1 has no exact f64 representation.
        let big = (1i64 << 53) + 1;
        assert_eq!(
            cmp_values(&BsonValue::Int64(big), &BsonValue::Float((1i64 << 53) as f64)),
            Ordering::Greater
        );
        assert_eq!(
            cmp_values(&BsonValue::Int64(i64::MAX), &BsonValue::Float(f64::INFINITY)),
            Ordering::Less
        );
        assert_eq!(
            cmp_values(&BsonValue::Int64(i64::MIN), &BsonValue::Float(-9.3e18)),
            Ordering::Greater
        );
    }

    #[test]
    fn nan_sorts_below_numbers() {
        let nan = BsonValue::Float(f64::NAN);
        assert_eq!(cmp_values(&nan, &BsonValue::Float(f64::NEG_INFINITY)), Ordering::Less);
        assert_eq!(cmp_values(&nan, &BsonValue::Int64(i64::MIN)), Ordering::Less);
        assert_eq!(cmp_values(&nan, &nan), Ordering::Equal);
        assert_eq!(cmp_values(&BsonValue::Null, &nan), Ordering::Less);
    }

    #[test]
    fn type_ranks() {
        let ordered = [
            BsonValue::MinKey,
            BsonValue::Null,
            BsonValue::Int32(100),
            BsonValue::Str("a".into()),
            BsonValue::Document(BsonDocument::new()),
            BsonValue::Array(vec![]),
            BsonValue::Binary(BsonBinary::generic(vec![])),
            BsonValue::Boolean(false),
            BsonValue::MaxKey,
        ];
        for pair in ordered.windows(2) {
            assert_eq!(cmp_values(&pair[0], &pair[1]), Ordering::Less, "{pair:?}");
        }
    }

    #[test]
    fn binary_orders_by_length_first() {
        let short = BsonValue::Binary(BsonBinary { subtype: 0x80, data: vec![9] });
        let long = BsonValue::Binary(BsonBinary { subtype: 0x00, data: vec![0, 0] });
        assert_eq!(cmp_values(&short, &long), Ordering::Less);
    }

    #[test]
    fn documents_compare_elementwise() {
        let a: BsonDocument = [("a", 1)].into_iter().collect();
        let b: BsonDocument = [("a", 1), ("b", 0)].into_iter().collect();
        let c: BsonDocument = [("b", 0)].into_iter().collect();
        assert_eq!(cmp_documents(&a, &b), Ordering::Less);
        assert_eq!(cmp_documents(&b, &c), Ordering::Less);
        assert_eq!(cmp_documents(&a, &a.clone()), Ordering::Equal);
    }
}
