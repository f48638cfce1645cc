//! Growable byte buffer with formatted append.

use bytes::{Bytes, BytesMut};
use std::fmt;

const INITIAL_CAPACITY: usize = 128;

/// Append-only text buffer used for header blocks and log lines.
///
/// Backed by [`BytesMut`], so appends are amortized O(1) and
/// `len() <= capacity()` always holds. Use `write!` to append formatted text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StrBuf {
    inner: BytesMut,
}

impl StrBuf {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.inner.extend_from_slice(s.as_bytes());
    }

    /// Appends a `Name: Value\r\n` header line.
    pub fn push_header(&mut self, name: &str, value: &str) {
        self.push_str(name);
        self.push_str(": ");
        self.push_str(value);
        self.push_str("\r\n");
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Views the contents as text. Only `&str` is ever appended, so this
    /// cannot fail.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.inner).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Converts into an immutable, cheaply clonable buffer.
    pub fn freeze(self) -> Bytes {
        self.inner.freeze()
    }
}

impl fmt::Write for StrBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl fmt::Display for StrBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
