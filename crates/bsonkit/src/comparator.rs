//! Sort-specification comparator.
//!
//! A specification is a document whose keys name fields (dot-separated paths
//! are allowed) and whose values give the direction: a positive number sorts
//! ascending, a negative number descending. Keys are applied in the
//! specification's order and the first one that differs decides.

use std::cmp::Ordering;

use tracing::debug;

use crate::decoder::BsonDecoder;
use crate::document::BsonDocument;
use crate::error::{BsonError, BsonResult};
use crate::order::cmp_values;
use crate::values::BsonValue;

static NULL: BsonValue = BsonValue::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn from_value(value: &BsonValue) -> Option<Self> {
        let sign = match *value {
            BsonValue::Int32(i) => i.signum() as f64,
            BsonValue::Int64(i) => i.signum() as f64,
            BsonValue::Float(f) if !f.is_nan() => f,
            _ => return None,
        };
        if sign > 0.0 {
            Some(SortDirection::Ascending)
        } else if sign < 0.0 {
            Some(SortDirection::Descending)
        } else {
            None
        }
    }

    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Compares encoded documents according to a validated sort specification.
#[derive(Debug, Clone)]
pub struct BsonComparator {
    keys: Vec<(String, SortDirection)>,
    decoder: BsonDecoder,
}

impl BsonComparator {
    /// Validates `specification` and builds a comparator from it.
    pub fn new(specification: &BsonDocument) -> BsonResult<Self> {
        if specification.is_empty() {
            debug!("rejected empty sort specification");
            return Err(BsonError::InvalidSpecification(
                "specification is empty".to_owned(),
            ));
        }
        let mut keys = Vec::with_capacity(specification.len());
        for (key, value) in specification {
            let Some(direction) = SortDirection::from_value(value) else {
                debug!(key = key.as_str(), "rejected sort direction");
                return Err(BsonError::InvalidSpecification(format!(
                    "direction for {key:?} must be a non-zero number, got {value:?}"
                )));
            };
            keys.push((key.clone(), direction));
        }
        Ok(Self {
            keys,
            decoder: BsonDecoder::new(),
        })
    }

    /// Builds a comparator from an encoded specification document.
    pub fn from_bytes(specification: &[u8]) -> BsonResult<Self> {
        let spec = BsonDecoder::new().decode(specification)?;
        Self::new(&spec)
    }

    /// Uses `decoder` (and its depth limit) to decode compared documents.
    pub fn with_decoder(mut self, decoder: BsonDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    /// Compares two encoded documents.
    ///
    /// Both documents are decoded in full with the comparator's decoder, so any
    /// input [`decode`](BsonDecoder::decode) rejects is rejected here too,
    /// whether or not the bad bytes lie on a sort path. A missing field
    /// compares as null.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> BsonResult<Ordering> {
        let a = self.decoder.decode(a)?;
        let b = self.decoder.decode(b)?;
        Ok(self.compare_documents(&a, &b))
    }

    /// Compares two decoded documents with the same rules as [`compare`](Self::compare).
    pub fn compare_documents(&self, a: &BsonDocument, b: &BsonDocument) -> Ordering {
        for (path, direction) in &self.keys {
            let va = a.get_path(path).unwrap_or(&NULL);
            let vb = b.get_path(path).unwrap_or(&NULL);
            let ord = direction.apply(cmp_values(va, vb));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable in-place sort of decoded documents.
    pub fn sort_documents(&self, docs: &mut [BsonDocument]) {
        docs.sort_by(|a, b| self.compare_documents(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(entries: &[(&str, BsonValue)]) -> BsonDocument {
        entries.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn directions() {
        let cmp = BsonComparator::new(&spec(&[
            ("a", BsonValue::Int32(1)),
            ("b", BsonValue::Int64(-1)),
            ("c", BsonValue::Float(-0.5)),
        ]))
        .unwrap();
        let dirs: Vec<_> = cmp.keys().iter().map(|(_, d)| *d).collect();
        assert_eq!(
            dirs,
            vec![
                SortDirection::Ascending,
                SortDirection::Descending,
                SortDirection::Descending
            ]
        );
    }

    #[test]
    fn rejects_unusable_specifications() {
        for bad in [
            BsonValue::Int32(0),
            BsonValue::Float(f64::NAN),
            BsonValue::Float(0.0),
            BsonValue::Str("asc".into()),
            BsonValue::Boolean(true),
            BsonValue::Null,
        ] {
            let err = BsonComparator::new(&spec(&[("a", bad)])).unwrap_err();
            assert!(matches!(err, BsonError::InvalidSpecification(_)));
        }
        assert!(matches!(
            BsonComparator::new(&BsonDocument::new()),
            Err(BsonError::InvalidSpecification(_))
        ));
    }
}
