use crate::http::request::{DEFAULT_VERSION, Headers, Method, Request};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";
const HEAD_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request head is incomplete")]
    Incomplete,

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
}

/// Parses one request head (request line plus headers) from the front of `buf`.
///
/// Returns the request, its headers, and the number of bytes the head took,
/// including the blank line. No body is consumed. An unparseable request line
/// is not an error here: it comes back as [`Method::Error`].
pub fn parse_http_request(
    buf: &[u8],
    max_head: usize,
) -> Result<(Request, Headers, usize), ParseError> {
    let Some(headers_end) = find(buf, HEAD_END) else {
        return Err(if buf.len() > max_head {
            ParseError::HeadTooLarge { limit: max_head }
        } else {
            ParseError::Incomplete
        });
    };

    let total = headers_end + HEAD_END.len();
    if total > max_head {
        return Err(ParseError::HeadTooLarge { limit: max_head });
    }

    let head = &buf[..total];
    let (request, line_len) = parse_request_line(head);
    if request.method == Method::Error {
        return Ok((request, Headers::new(), total));
    }

    let (headers, _) = parse_headers(&head[line_len..]);
    Ok((request, headers, total))
}

/// Parses `METHOD SP target [SP version] CRLF`.
///
/// Returns the request and the bytes consumed, CRLF included. Without a CRLF,
/// or without both a method and a target, the request is [`Method::Error`].
pub fn parse_request_line(buf: &[u8]) -> (Request, usize) {
    let Some(line_end) = find(buf, CRLF) else {
        return (Request::error(), 0);
    };
    let consumed = line_end + CRLF.len();

    let Ok(line) = std::str::from_utf8(&buf[..line_end]) else {
        return (Request::error(), consumed);
    };

    let mut parts = line.split(' ').filter(|t| !t.is_empty());
    let (Some(method), Some(url)) = (parts.next(), parts.next()) else {
        return (Request::error(), consumed);
    };
    let version = parts.next().unwrap_or(DEFAULT_VERSION);

    let request = Request {
        method: Method::from_token(method),
        url: url.to_string(),
        version: version.to_string(),
    };
    (request, consumed)
}

/// Parses `Name: value` lines up to and including the blank line.
///
/// Stops silently at the first line that does not match; headers read so far
/// are kept. Returns the headers and the bytes consumed.
pub fn parse_headers(buf: &[u8]) -> (Headers, usize) {
    let mut headers = Headers::new();
    let mut consumed = 0;

    while let Some(line_end) = find(&buf[consumed..], CRLF) {
        let line = &buf[consumed..consumed + line_end];
        if line.is_empty() {
            consumed += CRLF.len();
            break;
        }

        let Some((name, value)) = split_header(line) else {
            break;
        };
        headers.put(name, value);
        consumed += line_end + CRLF.len();
    }

    (headers, consumed)
}

fn split_header(line: &[u8]) -> Option<(&str, &str)> {
    let line = std::str::from_utf8(line).ok()?;
    let (name, value) = line.split_once(':')?;
    if name.is_empty() || name.contains(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    Some((name, value.trim()))
}

fn find(buf: &[u8], needle: &[u8]) -> Option<usize> {
    buf.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, headers, consumed) = parse_http_request(req, 8192).unwrap();

        assert_eq!(parsed.url, "/");
        assert_eq!(headers.get("Host"), Some("example.com"));
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn headers_stop_at_blank_line() {
        let (headers, consumed) = parse_headers(b"A: 1\r\n\r\nbody");
        assert_eq!(headers.len(), 1);
        assert_eq!(consumed, 8);
    }
}
