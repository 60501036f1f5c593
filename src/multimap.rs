use std::collections::HashMap;
use std::iter::FromIterator;

/// An insertion-ordered mapping from keys to one or more values.
///
/// Keys iterate in the order they were first inserted and each key's values
/// in the order they were added. This is the order records are written in by
/// [`encode`](crate::encode), so equal maps always produce identical files.
#[derive(Clone, Debug, Default)]
pub struct MultiMap {
    entries: Vec<(Vec<u8>, Vec<Vec<u8>>)>,
    index: HashMap<Vec<u8>, usize>,
}

impl MultiMap {
    pub fn new() -> MultiMap {
        MultiMap::default()
    }

    /// Append `value` to the values of `key`.
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: AsRef<[u8]>,
        V: Into<Vec<u8>>,
    {
        let key = key.as_ref();
        match self.index.get(key) {
            Some(&i) => self.entries[i].1.push(value.into()),
            None => {
                self.index.insert(key.to_vec(), self.entries.len());
                self.entries.push((key.to_vec(), vec![value.into()]));
            }
        }
    }

    /// All values of `key`, in insertion order.
    pub fn get(&self, key: &[u8]) -> Option<&[Vec<u8>]> {
        self.index.get(key).map(|&i| &self.entries[i].1[..])
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of (key, value) records, counting repeated keys.
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[Vec<u8>])> {
        self.entries.iter().map(|(k, v)| (&k[..], &v[..]))
    }

    /// Every (key, value) record, in the order they are encoded.
    pub fn records(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (&k[..], &v[..])))
    }
}

/// Maps are equal when each key has the same values in the same order;
/// the order of distinct keys does not matter.
impl PartialEq for MultiMap {
    fn eq(&self, other: &MultiMap) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, values)| other.get(key) == Some(values))
    }
}

impl Eq for MultiMap {}

impl<K: AsRef<[u8]>, V: Into<Vec<u8>>> FromIterator<(K, V)> for MultiMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> MultiMap {
        let mut map = MultiMap::new();
        map.extend(iter);
        map
    }
}

impl<K: AsRef<[u8]>, V: Into<Vec<u8>>> Extend<(K, V)> for MultiMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let map: MultiMap = vec![
            (&b"b"[..], &b"1"[..]),
            (&b"a"[..], &b"2"[..]),
            (&b"b"[..], &b"3"[..]),
        ]
        .into_iter()
        .collect();
        let keys: Vec<&[u8]> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"b"[..], &b"a"[..]]);
        assert_eq!(map.get(b"b").unwrap(), &[b"1".to_vec(), b"3".to_vec()]);
        assert_eq!(map.record_count(), 3);
        let records: Vec<_> = map.records().collect();
        assert_eq!(records[1], (&b"b"[..], &b"3"[..]));
    }

    #[test]
    fn equality_ignores_key_order() {
        let mut a = MultiMap::new();
        a.insert("x", "1");
        a.insert("y", "2");
        let mut b = MultiMap::new();
        b.insert("y", "2");
        b.insert("x", "1");
        assert_eq!(a, b);
        b.insert("x", "3");
        assert_ne!(a, b);
    }
}
