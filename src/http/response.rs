use bytes::Bytes;
use memmap2::Mmap;

use crate::http::request::Headers;

/// HTTP status codes this server emits.
///
/// - `Ok` (200): File found and mapped
/// - `NoContent` (204): Success with no body
/// - `BadRequest` (400): Unparseable request line or oversized head
/// - `Forbidden` (403): The OS denied access to the file
/// - `NotFound` (404): No such file, or the path escapes the root
/// - `InternalError` (500): Any other I/O or mapping failure
/// - `NotImplemented` (501): Method other than GET or HEAD
/// - `TryAgain` (503): File descriptors exhausted, client should retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 204 No Content
    NoContent,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Error
    InternalError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    TryAgain,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use threaded_server::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::TryAgain.as_u16(), 503);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::TryAgain => 503,
        }
    }

    /// Returns the reason phrase sent on the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use threaded_server::http::response::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// assert_eq!(StatusCode::InternalError.reason_phrase(), "Internal Error");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalError => "Internal Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::TryAgain => "Service Unavailable",
        }
    }

    /// 2xx codes carry their own body (or none); every other code gets the
    /// canned error page.
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::NoContent)
    }
}

/// A response body. Dropping it releases the storage: a mapped view is
/// unmapped, an owned buffer is freed.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Read-only view of a file's bytes
    Mapped(Mmap),
    /// Heap buffer, e.g. a generated error page
    Owned(Bytes),
}

impl Body {
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Body::Mapped(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Mapped(map) => &map[..],
            Body::Owned(bytes) => &bytes[..],
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        if v.is_empty() {
            Body::Empty
        } else {
            Body::Owned(Bytes::from(v))
        }
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::from(s.as_bytes().to_vec())
    }
}

/// Outcome of resolving a request, before serialization.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Per-resource headers (Content-Type, Content-Length, ...)
    pub headers: Headers,
    /// Response body
    pub body: Body,
}

/// Builder for constructing responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(b"hi".to_vec())
///     .build();
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.put(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Adds Content-Length from the body size unless one is already set.
    /// 204 responses never get one.
    pub fn build(mut self) -> Response {
        if self.status != StatusCode::NoContent && !self.headers.contains_key("Content-Length") {
            self.headers.put("Content-Length", self.body.len().to_string());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    pub fn new(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// A response with just a status; the assembler fills in the error page.
    pub fn status(status: StatusCode) -> Self {
        Response {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::status(StatusCode::NotFound)
    }

    /// Creates a 500 Internal Error response.
    pub fn internal_error() -> Self {
        Self::status(StatusCode::InternalError)
    }

    /// Creates a 503 response asking the client to retry after a second.
    pub fn try_again() -> Self {
        let mut response = Self::status(StatusCode::TryAgain);
        response.headers.put("Retry-After", "1");
        response
    }
}

const ERROR_DETAIL: &str = "An error occurred while processing your request";

/// Renders the HTML page sent with every non-2xx status.
pub fn error_page(status: StatusCode) -> String {
    let title = format!("{} {}", status.as_u16(), status.reason_phrase());
    format!(
        "<!doctype html>\r\n\
         <html><head>\r\n\
         <title>{title}</title>\r\n\
         </head><body>\r\n\
         <h1>{title}</h1><p>{ERROR_DETAIL}<br /></p>\r\n\
         </body></html>\r\n"
    )
}
