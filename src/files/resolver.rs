//! Maps request paths onto files under the server root.
//!
//! Every candidate path is canonicalized and must still lie under the
//! canonical root, so neither `..` segments nor symlinks can escape it.
//! Directories are served through their index file. Files are memory-mapped
//! so the body is sent straight from the page cache.

use std::fs::{File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use memmap2::MmapOptions;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::StaticFilesConfig;
use crate::http::mime::MimeRegistry;
use crate::http::request::{Headers, Request};
use crate::http::response::{Body, Response, StatusCode};

/// Per-process descriptor table is full. Same value on Linux, macOS and the BSDs.
#[cfg(unix)]
const EMFILE: i32 = 24;
/// System-wide file table is full.
#[cfg(unix)]
const ENFILE: i32 = 23;

/// Why a request path could not be turned into a file body.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no such file")]
    NotFound,

    #[error("path escapes the server root")]
    OutsideRoot,

    #[error("permission denied")]
    Forbidden,

    #[error("file descriptors exhausted")]
    DescriptorsExhausted,

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        source: io::Error,
    },
}

impl ResolveError {
    /// Classifies a failure to stat or canonicalize a path.
    pub fn from_stat_error(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
                ResolveError::NotFound
            }
            io::ErrorKind::PermissionDenied => ResolveError::Forbidden,
            _ => ResolveError::Io {
                context: "stat failed",
                source: err,
            },
        }
    }

    /// Classifies a failure to open a file that was just stat'ed.
    pub fn from_open_error(err: io::Error) -> Self {
        if descriptors_exhausted(&err) {
            return ResolveError::DescriptorsExhausted;
        }
        match err.kind() {
            io::ErrorKind::PermissionDenied => ResolveError::Forbidden,
            io::ErrorKind::NotFound => ResolveError::NotFound,
            _ => ResolveError::Io {
                context: "could not open file",
                source: err,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound | ResolveError::OutsideRoot => StatusCode::NotFound,
            ResolveError::Forbidden => StatusCode::Forbidden,
            ResolveError::DescriptorsExhausted => StatusCode::TryAgain,
            ResolveError::Io { .. } => StatusCode::InternalError,
        }
    }
}

#[cfg(unix)]
fn descriptors_exhausted(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(EMFILE | ENFILE))
}

#[cfg(not(unix))]
fn descriptors_exhausted(_err: &io::Error) -> bool {
    false
}

impl From<ResolveError> for Response {
    fn from(err: ResolveError) -> Self {
        match err.status() {
            StatusCode::TryAgain => Response::try_again(),
            status => Response::status(status),
        }
    }
}

/// Resolves requests against one root directory.
#[derive(Debug)]
pub struct FileResolver {
    root: PathBuf,
    index: String,
    mime: Arc<MimeRegistry>,
}

impl FileResolver {
    /// Creates a resolver for `root`, which must exist.
    pub fn new(root: impl AsRef<Path>, index: impl Into<String>, mime: Arc<MimeRegistry>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
            index: index.into(),
            mime,
        })
    }

    /// Builds a resolver from configuration, loading the MIME database.
    /// Without a configured root the working directory is served.
    pub fn from_config(cfg: &StaticFilesConfig) -> anyhow::Result<Self> {
        let root = match &cfg.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Could not determine working directory")?,
        };
        let mime = Arc::new(MimeRegistry::load(&cfg.mime_types));
        Self::new(&root, cfg.index.clone(), mime)
            .with_context(|| format!("Invalid server root {}", root.display()))
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mime(&self) -> &MimeRegistry {
        &self.mime
    }

    /// Turns a GET or HEAD request into a response.
    ///
    /// For HEAD the file is still opened and mapped, so access errors surface
    /// exactly as for GET, but the mapping is released before returning.
    pub fn resolve(&self, request: &Request, _headers: &Headers) -> Response {
        let result = self
            .locate(request.path())
            .and_then(|path| self.open(&path));

        match result {
            Ok(mut response) => {
                if request.is_head() {
                    response.body = Body::Empty;
                }
                response
            }
            Err(err) => {
                match &err {
                    ResolveError::Io { .. } => error!(path = %request.url, error = %err, "Failed to serve file"),
                    ResolveError::OutsideRoot => warn!(path = %request.url, "Rejected path outside root"),
                    ResolveError::DescriptorsExhausted => warn!(path = %request.url, "Out of file descriptors"),
                    _ => debug!(path = %request.url, error = %err, "File not served"),
                }
                err.into()
            }
        }
    }

    /// Finds the file a URL path refers to, applying the directory index.
    pub fn locate(&self, url_path: &str) -> Result<PathBuf, ResolveError> {
        let candidate = self.root.join(url_path.trim_start_matches('/'));
        let (path, meta) = self.checked(&candidate)?;

        let (path, meta) = if meta.is_dir() {
            self.checked(&path.join(&self.index))?
        } else {
            (path, meta)
        };

        if !meta.is_file() {
            return Err(ResolveError::NotFound);
        }
        Ok(path)
    }

    /// Canonicalizes `candidate`, verifies it is under the root, and stats it.
    fn checked(&self, candidate: &Path) -> Result<(PathBuf, Metadata), ResolveError> {
        let path = candidate.canonicalize().map_err(ResolveError::from_stat_error)?;
        if !path.starts_with(&self.root) {
            return Err(ResolveError::OutsideRoot);
        }
        let meta = std::fs::metadata(&path).map_err(ResolveError::from_stat_error)?;
        Ok((path, meta))
    }

    fn open(&self, path: &Path) -> Result<Response, ResolveError> {
        let file = File::open(path).map_err(ResolveError::from_open_error)?;
        let meta = file.metadata().map_err(|source| ResolveError::Io {
            context: "stat failed",
            source,
        })?;

        let len = usize::try_from(meta.len()).map_err(|_| ResolveError::Io {
            context: "file too large to map",
            source: io::Error::from(io::ErrorKind::FileTooLarge),
        })?;

        let body = if len == 0 {
            Body::Empty
        } else {
            // Exactly the stat'ed length; Content-Length is read off the body.
            // SAFETY: the map is read-only and owned by the response body.
            // A file truncated while mapped is outside what this server guards.
            let map = unsafe { MmapOptions::new().len(len).map(&file) }
                .map_err(|source| ResolveError::Io {
                    context: "could not mmap file",
                    source,
                })?;
            Body::Mapped(map)
        };

        let content_type = self.mime.content_type(path, body.as_bytes());
        let mut builder = Response::new(StatusCode::Ok)
            .header("Content-Type", content_type)
            .header("Content-Length", body.len().to_string());
        if let Ok(modified) = meta.modified() {
            builder = builder.header("Last-Modified", httpdate::fmt_http_date(modified));
        }
        Ok(builder.body(body).build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn descriptor_exhaustion_is_retryable() {
        let err = ResolveError::from_open_error(io::Error::from_raw_os_error(EMFILE));
        assert_eq!(err.status(), StatusCode::TryAgain);

        let response = Response::from(err);
        assert_eq!(response.headers.get("Retry-After"), Some("1"));
    }

    #[cfg(unix)]
    #[test]
    fn other_open_errors_are_not_exhaustion() {
        // EACCES and EIO
        let denied = ResolveError::from_open_error(io::Error::from_raw_os_error(13));
        let io_error = ResolveError::from_open_error(io::Error::from_raw_os_error(5));

        assert_eq!(denied.status(), StatusCode::Forbidden);
        assert_eq!(io_error.status(), StatusCode::InternalError);
    }

    #[test]
    fn stat_errors_are_classified() {
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let other = io::Error::other("disk on fire");

        assert_eq!(ResolveError::from_stat_error(not_found).status(), StatusCode::NotFound);
        assert_eq!(ResolveError::from_stat_error(denied).status(), StatusCode::Forbidden);
        assert_eq!(ResolveError::from_stat_error(other).status(), StatusCode::InternalError);
    }
}
