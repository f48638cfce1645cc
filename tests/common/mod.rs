//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use threaded_server::files::FileResolver;
use threaded_server::http::mime::MimeRegistry;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub const INDEX_BODY: &[u8] = b"Hello, world!";

/// A scratch directory removed on drop. The served root is `<dir>/root`, so
/// files placed in `<dir>` are outside it.
pub struct Fixture {
    pub dir: PathBuf,
    pub root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("threaded-server-test-{}-{}", std::process::id(), id));
        let root = dir.join("root");
        std::fs::create_dir_all(&root).unwrap();
        Self { dir, root }
    }

    /// Root with a 13-byte `index.html`.
    pub fn with_index() -> Self {
        let fixture = Self::new();
        fixture.write("index.html", INDEX_BODY);
        fixture
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        write_file(&self.root.join(rel), contents)
    }

    /// Writes next to the root rather than inside it.
    pub fn write_outside(&self, rel: &str, contents: &[u8]) -> PathBuf {
        write_file(&self.dir.join(rel), contents)
    }

    pub fn resolver(&self) -> Arc<FileResolver> {
        self.resolver_with(MimeRegistry::parse("text/html html htm\ntext/plain txt\n"))
    }

    pub fn resolver_with(&self, mime: MimeRegistry) -> Arc<FileResolver> {
        Arc::new(FileResolver::new(&self.root, "index.html", Arc::new(mime)).unwrap())
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn write_file(path: &Path, contents: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
    path.to_path_buf()
}
