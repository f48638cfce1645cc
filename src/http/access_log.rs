//! One line per completed request, in a common-log-like format:
//!
//! ```text
//! [Thu, 01 Jan 1970 00:00:00 GMT] "GET / HTTP/1.1" 200 13 "curl/8.5.0"
//! ```

use std::fmt::Write as _;
use std::time::SystemTime;

use crate::http::request::Headers;
use crate::util::StrBuf;

const PLACEHOLDER: &str = "-";

#[derive(Debug)]
pub struct AccessLogEntry<'a> {
    pub time: SystemTime,
    /// The request line as received, without its CRLF
    pub request_line: &'a str,
    pub status: u16,
    pub length: usize,
    pub user_agent: Option<&'a str>,
}

impl<'a> AccessLogEntry<'a> {
    pub fn new(request_line: &'a str, headers: &'a Headers, status: u16, length: usize) -> Self {
        Self {
            time: SystemTime::now(),
            request_line,
            status,
            length,
            user_agent: headers.get("User-Agent"),
        }
    }

    pub fn format(&self) -> StrBuf {
        let mut line = StrBuf::new();
        let _ = write!(
            line,
            "[{}] \"{}\" {} {} \"{}\"",
            httpdate::fmt_http_date(self.time),
            self.request_line,
            self.status,
            self.length,
            self.user_agent.unwrap_or(PLACEHOLDER),
        );
        line
    }

    /// Sends the line to the `access` tracing target.
    pub fn emit(&self) {
        tracing::info!(target: "access", "{}", self.format());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_agent_uses_placeholder() {
        let headers = Headers::new();
        let mut entry = AccessLogEntry::new("GET / HTTP/1.1", &headers, 404, 120);
        entry.time = SystemTime::UNIX_EPOCH;

        assert_eq!(
            entry.format().as_str(),
            "[Thu, 01 Jan 1970 00:00:00 GMT] \"GET / HTTP/1.1\" 404 120 \"-\""
        );
    }
}
