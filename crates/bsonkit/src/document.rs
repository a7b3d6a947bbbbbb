//! Ordered BSON document.

use indexmap::map::{IntoIter, Iter, Keys};
use indexmap::IndexMap;

use crate::values::BsonValue;

/// An ordered mapping from string keys to [`BsonValue`]s.
///
/// Keys are unique. Inserting an existing key replaces its value but keeps the
/// entry at the position of the first insertion; the decoder applies the same
/// rule to duplicate keys found on the wire. Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct BsonDocument {
    inner: IndexMap<String, BsonValue>,
}

impl BsonDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts `value` under `key`, returning the replaced value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<BsonValue>) -> Option<BsonValue> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&BsonValue> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BsonValue> {
        self.inner.get_mut(key)
    }

    /// Looks up a dot-separated path such as `"a.b.0"`.
    ///
    /// Each segment selects a key of an embedded document, or an element of
    /// an array when the segment is a decimal index.
    pub fn get_path(&self, path: &str) -> Option<&BsonValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                BsonValue::Document(doc) => doc.get(segment)?,
                BsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Removes `key`, shifting later entries down to keep their order.
    pub fn remove(&mut self, key: &str) -> Option<BsonValue> {
        self.inner.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> Keys<'_, String, BsonValue> {
        self.inner.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, BsonValue> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PartialEq for BsonDocument {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Into<String>, V: Into<BsonValue>> FromIterator<(K, V)> for BsonDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = BsonDocument::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl<K: Into<String>, V: Into<BsonValue>> Extend<(K, V)> for BsonDocument {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for BsonDocument {
    type Item = (String, BsonValue);
    type IntoIter = IntoIter<String, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a BsonDocument {
    type Item = (&'a String, &'a BsonValue);
    type IntoIter = Iter<'a, String, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut doc = BsonDocument::new();
        doc.insert("x", 1);
        doc.insert("y", 2);
        assert_eq!(doc.insert("x", 3), Some(BsonValue::Int32(1)));
        let keys: Vec<_> = doc.keys().cloned().collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(doc.get("x"), Some(&BsonValue::Int32(3)));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: BsonDocument = [("a", 1), ("b", 2)].into_iter().collect();
        let b: BsonDocument = [("b", 2), ("a", 1)].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn get_path_descends_documents_and_arrays() {
        let inner: BsonDocument = [("c", "deep")].into_iter().collect();
        let mut doc = BsonDocument::new();
        doc.insert("a", inner.clone());
        doc.insert(
            "list",
            vec![BsonValue::Int32(10), BsonValue::Document(inner)],
        );
        assert_eq!(doc.get_path("a.c"), Some(&BsonValue::from("deep")));
        assert_eq!(doc.get_path("list.0"), Some(&BsonValue::Int32(10)));
        assert_eq!(doc.get_path("list.1.c"), Some(&BsonValue::from("deep")));
        assert_eq!(doc.get_path("list.2"), None);
        assert_eq!(doc.get_path("a.c.d"), None);
        assert_eq!(doc.get_path("missing"), None);
    }

    #[test]
    fn remove_preserves_order() {
        let mut doc: BsonDocument = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        doc.remove("a");
        let keys: Vec<_> = doc.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
