use crate::util::HashTable;

/// Request headers, keyed by name exactly as received. A repeated name keeps
/// the last value.
pub type Headers = HashTable;

/// Version assumed when the request line carries no version token.
pub const DEFAULT_VERSION: &str = "HTTP/1.0";

/// HTTP request methods, as far as this server distinguishes them.
///
/// Only GET and HEAD are served. Any other token is `NotRecognized` (501),
/// and a request line without both a method and a target is `Error` (400).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// Any other method token
    NotRecognized,
    /// The request line could not be parsed
    Error,
}

/// A parsed HTTP request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target (e.g., "/index.html"); non-empty unless `method` is `Error`
    pub url: String,
    /// HTTP version token, "HTTP/1.0" when the client sent none
    pub version: String,
}

/// Builder for constructing Request objects.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    version: Option<String>,
}

impl Method {
    /// Classifies a method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use threaded_server::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("get"), Method::NotRecognized);
    /// ```
    pub fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            _ => Method::NotRecognized,
        }
    }

    /// GET and HEAD are resolved against the filesystem; everything else is not.
    pub fn is_servable(&self) -> bool {
        matches!(self, Method::GET | Method::HEAD)
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.ok_or("method missing")?;
        let url = self.url.unwrap_or_default();
        if method != Method::Error && url.is_empty() {
            return Err("url missing");
        }
        Ok(Request {
            method,
            url,
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        })
    }
}

impl Request {
    /// The request that stands in for an unparseable request line.
    pub fn error() -> Self {
        Self {
            method: Method::Error,
            url: String::new(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Whether the connection may be reused after answering this request.
    ///
    /// HTTP/1.0 closes; every other version persists. Unparseable requests
    /// always close.
    pub fn persist_connection(&self) -> bool {
        self.method != Method::Error && self.version != DEFAULT_VERSION
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// The target with any query string or fragment removed.
    pub fn path(&self) -> &str {
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        &self.url[..end]
    }
}
