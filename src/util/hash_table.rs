//! Separate-chaining hash table from text keys to text values.
//!
//! Backs both the per-request header set and the MIME registry. Buckets are
//! chosen with a left-to-right polynomial hash (`acc = (37 * acc + byte) % n`),
//! and the table doubles its bucket count once it holds more than two items
//! per bucket. Iteration order is unspecified.

const INITIAL_BUCKETS: usize = 8;
const MAX_LOAD_FACTOR: usize = 2;
const GROWTH_FACTOR: usize = 2;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
}

/// Owning map of `String` keys to `String` values.
#[derive(Debug, Clone)]
pub struct HashTable {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

impl HashTable {
    /// Creates an empty table with the initial eight buckets.
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(INITIAL_BUCKETS),
            len: 0,
        }
    }

    /// Inserts `value` under `key`, replacing any previous value in place.
    ///
    /// Returns `true` when the key was already present.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        let index = bucket_index(&key, self.buckets.len());

        if let Some(entry) = self.buckets[index].iter_mut().find(|e| e.key == key) {
            entry.value = value;
            return true;
        }

        self.buckets[index].push(Entry { key, value });
        self.len += 1;

        if self.len > MAX_LOAD_FACTOR * self.buckets.len() {
            self.resize(GROWTH_FACTOR * self.buckets.len());
        }
        false
    }

    /// Looks up `key`. Missing keys yield `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        let index = bucket_index(key, self.buckets.len());
        self.buckets[index]
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets. Only grows.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drops every stored key and value, keeping the current bucket count.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Iterates over all entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buckets
            .iter()
            .flatten()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    fn resize(&mut self, size: usize) {
        let old = std::mem::replace(&mut self.buckets, empty_buckets(size));
        for entry in old.into_iter().flatten() {
            let index = bucket_index(&entry.key, size);
            self.buckets[index].push(entry);
        }
    }
}

impl Default for HashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for HashTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HashTable::new();
        for (k, v) in iter {
            table.put(k, v);
        }
        table
    }
}

fn empty_buckets(size: usize) -> Vec<Vec<Entry>> {
    (0..size).map(|_| Vec::new()).collect()
}

fn bucket_index(key: &str, size: usize) -> usize {
    let size = size as u64;
    let mut acc: u64 = 0;
    for byte in key.bytes() {
        acc = (37 * acc + u64::from(byte)) % size;
    }
    acc as usize
}
