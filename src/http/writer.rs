use std::fmt::Write as _;
use std::time::SystemTime;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::{Method, Request};
use crate::http::response::{Body, Response, StatusCode, error_page};
use crate::util::StrBuf;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Value of the Server header.
pub const SERVER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Headers written first, in this order. Anything else follows sorted by name.
const HEADER_ORDER: &[&str] = &[
    "Content-Type",
    "Content-Length",
    "Last-Modified",
    "Retry-After",
    "Server",
    "Date",
];

/// A fully serialized response, ready for the socket.
///
/// Owns the body; dropping the `WireResponse` releases it (unmap or free).
#[derive(Debug)]
pub struct WireResponse {
    pub status: StatusCode,
    /// `HTTP/1.1 <code> <reason>\r\n`
    pub status_line: String,
    /// Every header line followed by the terminating blank line
    pub header_block: Bytes,
    pub body: Body,
    pub persist_connection: bool,
}

impl WireResponse {
    /// Number of body bytes that will be transmitted.
    pub fn length(&self) -> usize {
        self.body.len()
    }

    /// Writes status line, headers, and body.
    pub async fn write_to_stream<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(self.status_line.as_bytes()).await?;
        stream.write_all(&self.header_block).await?;
        if !self.body.is_empty() {
            stream.write_all(self.body.as_bytes()).await?;
        }
        stream.flush().await?;
        Ok(())
    }
}

/// Builds the wire response for `response`, answering `request`, at time `now`.
///
/// Non-2xx statuses get the HTML error page with matching Content-Type and
/// Content-Length. For HEAD the page is measured but not attached.
pub fn assemble(mut response: Response, request: &Request, now: SystemTime) -> WireResponse {
    let status = response.status;

    if !status.is_success() {
        let page = error_page(status);
        response.headers.put("Content-Type", "text/html; charset=utf-8");
        response.headers.put("Content-Length", page.len().to_string());
        response.body = if request.method == Method::HEAD {
            Body::Empty
        } else {
            Body::Owned(Bytes::from(page))
        };
    }

    response.headers.put("Server", SERVER_AGENT);
    response.headers.put("Date", httpdate::fmt_http_date(now));

    let mut status_line = String::with_capacity(32);
    let _ = write!(status_line, "{HTTP_VERSION} {} {}\r\n", status.as_u16(), status.reason_phrase());

    let persist_connection = request.persist_connection()
        && !matches!(status, StatusCode::BadRequest | StatusCode::TryAgain);

    WireResponse {
        status,
        status_line,
        header_block: serialize_headers(&response),
        body: response.body,
        persist_connection,
    }
}

fn serialize_headers(response: &Response) -> Bytes {
    let mut buf = StrBuf::with_capacity(256);

    for name in HEADER_ORDER {
        if let Some(value) = response.headers.get(name) {
            buf.push_header(name, value);
        }
    }

    let mut rest: Vec<(&str, &str)> = response
        .headers
        .iter()
        .filter(|(name, _)| !HEADER_ORDER.contains(name))
        .collect();
    rest.sort_unstable();
    for (name, value) in rest {
        buf.push_header(name, value);
    }

    // Header/body separator
    buf.push_str("\r\n");
    buf.freeze()
}
