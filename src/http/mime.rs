//! MIME type detection based on file extensions.
//!
//! The registry is loaded once from a `mime.types` style database and then
//! extended at runtime: an extension the database does not know is sniffed
//! once and cached for the life of the process.
//!
//! All connection tasks share one registry. Lookups take the read lock. On a
//! miss the file is sniffed with no lock held and the result is inserted under
//! the write lock, so two tasks missing on the same extension may both sniff
//! and both insert. They insert the same value and the second insert simply
//! replaces the first.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use crate::files::sniff;
use crate::util::HashTable;

#[derive(Debug, Default)]
pub struct MimeRegistry {
    types: RwLock<HashTable>,
}

impl MimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the first readable database from `candidates`.
    ///
    /// None readable gives an empty registry; every type is then sniffed.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Self {
        for path in candidates {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    let registry = Self::parse(&text);
                    info!(path = %path.display(), types = registry.len(), "Loaded MIME database");
                    return registry;
                }
                Err(e) => debug!(path = %path.display(), error = %e, "MIME database unavailable"),
            }
        }
        info!("No MIME database found, falling back to content sniffing");
        Self::new()
    }

    /// Parses `type ext1 ext2 ...` lines. Blank lines, `#` comments, and
    /// types listed without extensions are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = HashTable::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(mime) = fields.next() else { continue };
            for ext in fields {
                table.put(ext.to_ascii_lowercase(), mime);
            }
        }
        Self {
            types: RwLock::new(table),
        }
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a cached type by extension (case-insensitive, no dot).
    pub fn get(&self, ext: &str) -> Option<String> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(&ext.to_ascii_lowercase()).map(str::to_string)
    }

    pub fn insert(&self, ext: &str, mime: &str) {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        types.put(ext.to_ascii_lowercase(), mime);
    }

    /// Content-Type for the file at `path` whose leading bytes are `content`.
    ///
    /// Registry hits are returned directly. Misses are sniffed and, when the
    /// file has an extension, cached under it.
    pub fn content_type(&self, path: &Path, content: &[u8]) -> String {
        let ext = extension(path);
        if let Some(mime) = ext.as_deref().and_then(|e| self.get(e)) {
            return mime;
        }

        let mime = sniff::sniff(path, content);
        if let Some(ext) = ext {
            debug!(ext = %ext, mime = %mime, "Caching sniffed MIME type");
            self.insert(&ext, &mime);
        }
        mime
    }
}

/// Default database locations, in lookup order.
pub fn default_databases() -> Vec<PathBuf> {
    vec![PathBuf::from("mime.types"), PathBuf::from("/etc/mime.types")]
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}
