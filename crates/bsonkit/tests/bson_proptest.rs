//! Property tests: codec round-trips and comparator order laws.

use std::cmp::Ordering;

use bsonkit::{
    decode, encode, BsonBinary, BsonComparator, BsonDateTime, BsonDocument, BsonObjectId,
    BsonRegex, BsonTimestamp, BsonValue,
};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn leaf() -> impl Strategy<Value = BsonValue> {
    let scalars = prop_oneof![
        Just(BsonValue::Null),
        any::<bool>().prop_map(BsonValue::Boolean),
        any::<i32>().prop_map(BsonValue::Int32),
        any::<i64>().prop_map(BsonValue::Int64),
        (-1.0e12..1.0e12f64).prop_map(BsonValue::Float),
        prop_oneof![Just(f64::NAN), Just(0.0), Just(-0.0), Just(f64::NEG_INFINITY)]
            .prop_map(BsonValue::Float),
        ".{0,12}".prop_map(BsonValue::Str),
        Just(BsonValue::MinKey),
    ];
    let structured = prop_oneof![
        any::<[u8; 12]>().prop_map(|b| BsonValue::ObjectId(BsonObjectId::from_bytes(b))),
        any::<i64>().prop_map(|ms| BsonValue::DateTime(BsonDateTime(ms))),
        (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..8))
            .prop_map(|(subtype, data)| BsonValue::Binary(BsonBinary { subtype, data })),
        ("[a-z^$.*]{0,6}", "[imsx]{0,3}").prop_map(|(p, o)| BsonValue::Regex(BsonRegex::new(p, o))),
        (any::<u32>(), any::<u32>())
            .prop_map(|(time, increment)| BsonValue::Timestamp(BsonTimestamp { time, increment })),
        Just(BsonValue::MaxKey),
    ];
    prop_oneof![scalars, structured]
}

fn value() -> impl Strategy<Value = BsonValue> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(BsonValue::Array),
            proptest::collection::vec((key(), inner), 0..4)
                .prop_map(|fields| BsonValue::Document(fields.into_iter().collect())),
        ]
    })
}

fn document() -> impl Strategy<Value = BsonDocument> {
    proptest::collection::vec((key(), value()), 0..6)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Documents over a small value space so that ties are common.
fn sortable() -> impl Strategy<Value = BsonDocument> {
    let small = prop_oneof![
        Just(BsonValue::Null),
        (-2i32..3).prop_map(BsonValue::Int32),
        (-2i64..3).prop_map(BsonValue::Int64),
        prop_oneof![Just(-1.5f64), Just(0.0), Just(2.0)].prop_map(BsonValue::Float),
        "[ab]{0,2}".prop_map(BsonValue::Str),
        any::<bool>().prop_map(BsonValue::Boolean),
    ];
    proptest::collection::vec((prop_oneof![Just("x"), Just("y")], small), 0..3)
        .prop_map(|fields| fields.into_iter().collect())
}

fn spec() -> impl Strategy<Value = BsonDocument> {
    (any::<bool>(), any::<bool>()).prop_map(|(x_desc, y_desc)| {
        let dir = |desc: bool| BsonValue::Int32(if desc { -1 } else { 1 });
        [("x", dir(x_desc)), ("y", dir(y_desc))].into_iter().collect()
    })
}

proptest! {
    #[test]
    fn roundtrip(doc in document()) {
        let bytes = encode(&doc).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn length_prefix_matches(doc in document()) {
        let bytes = encode(&doc).unwrap();
        let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        prop_assert_eq!(declared as usize, bytes.len());
        prop_assert_eq!(bytes[bytes.len() - 1], 0);
    }

    #[test]
    fn truncation_never_decodes(doc in document(), cut in 1usize..8) {
        let bytes = encode(&doc).unwrap();
        let end = bytes.len().saturating_sub(cut);
        prop_assert!(decode(&bytes[..end]).is_err());
    }

    #[test]
    fn comparator_rejects_exactly_what_decode_rejects(
        doc in document(),
        at in any::<proptest::sample::Index>(),
        byte in any::<u8>(),
    ) {
        let mut bytes = encode(&doc).unwrap();
        let i = at.index(bytes.len());
        bytes[i] = byte;
        let cmp = BsonComparator::new(&[("x", 1)].into_iter().collect()).unwrap();
        prop_assert_eq!(
            cmp.compare(&bytes, &bytes).err(),
            decode(&bytes).err()
        );
    }

    #[test]
    fn comparator_is_reflexive_and_antisymmetric(spec in spec(), a in sortable(), b in sortable()) {
        let cmp = BsonComparator::new(&spec).unwrap();
        let (ea, eb) = (encode(&a).unwrap(), encode(&b).unwrap());
        prop_assert_eq!(cmp.compare(&ea, &ea).unwrap(), Ordering::Equal);
        prop_assert_eq!(cmp.compare(&ea, &eb).unwrap(), cmp.compare(&eb, &ea).unwrap().reverse());
    }

    #[test]
    fn comparator_is_transitive(spec in spec(), a in sortable(), b in sortable(), c in sortable()) {
        let cmp = BsonComparator::new(&spec).unwrap();
        let (ea, eb, ec) = (encode(&a).unwrap(), encode(&b).unwrap(), encode(&c).unwrap());
        let ab = cmp.compare(&ea, &eb).unwrap();
        let bc = cmp.compare(&eb, &ec).unwrap();
        if ab == bc || bc == Ordering::Equal {
            prop_assert_eq!(cmp.compare(&ea, &ec).unwrap(), ab);
        } else if ab == Ordering::Equal {
            prop_assert_eq!(cmp.compare(&ea, &ec).unwrap(), bc);
        }
    }

    #[test]
    fn descending_inverts_ascending(a in sortable(), b in sortable()) {
        let up: BsonDocument = [("x", 1)].into_iter().collect();
        let down: BsonDocument = [("x", -1)].into_iter().collect();
        let (ea, eb) = (encode(&a).unwrap(), encode(&b).unwrap());
        let asc = BsonComparator::new(&up).unwrap().compare(&ea, &eb).unwrap();
        let desc = BsonComparator::new(&down).unwrap().compare(&ea, &eb).unwrap();
        prop_assert_eq!(desc, asc.reverse());
    }
}
