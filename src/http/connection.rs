use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::files::FileResolver;
use crate::http::access_log::AccessLogEntry;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Headers, Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::{WireResponse, assemble};

const READ_CHUNK: usize = 4096;

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub idle_timeout: Duration,
    pub max_head_bytes: usize,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_head_bytes: cfg.max_head_bytes,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// A request head taken off the wire.
#[derive(Debug)]
pub struct Incoming {
    pub request: Request,
    pub headers: Headers,
    /// First line as received, for the access log
    pub request_line: String,
}

pub struct Connection<S = TcpStream> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    resolver: Arc<FileResolver>,
    settings: ConnectionSettings,
    shutdown: watch::Receiver<bool>,
}

pub enum ConnectionState {
    Reading,
    Processing(Incoming),
    Writing(WireResponse),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        resolver: Arc<FileResolver>,
        settings: ConnectionSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            resolver,
            settings,
            shutdown,
        }
    }

    /// Serves requests until the client goes away, goes idle, asks for a
    /// non-persistent exchange, or the server shuts down.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        // Releases a response that was never fully written.
        self.state = ConnectionState::Closed;
        let _ = self.stream.shutdown().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(incoming) => ConnectionState::Processing(incoming),
                    None => ConnectionState::Closed,
                },

                ConnectionState::Processing(incoming) => {
                    ConnectionState::Writing(self.process(incoming).await)
                }

                ConnectionState::Writing(wire) => {
                    wire.write_to_stream(&mut self.stream).await?;

                    if wire.persist_connection && !self.shutting_down() {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Waits for a complete request head.
    ///
    /// Returns `None` when the peer closes, the idle timeout expires, or the
    /// server starts shutting down while nothing is in flight.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Incoming>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer, self.settings.max_head_bytes) {
                Ok((request, headers, consumed)) => {
                    let request_line = request_line(&self.buffer[..consumed]);
                    self.buffer.advance(consumed);
                    return Ok(Some(Incoming {
                        request,
                        headers,
                        request_line,
                    }));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e @ ParseError::HeadTooLarge { .. }) => {
                    warn!(error = %e, "Rejecting request");
                    let request_line = request_line(&self.buffer);
                    self.buffer.clear();
                    return Ok(Some(Incoming {
                        request: Request::error(),
                        headers: Headers::new(),
                        request_line,
                    }));
                }
            }

            if self.shutting_down() {
                return Ok(None);
            }

            tokio::select! {
                read = timeout(self.settings.idle_timeout, self.stream.read_buf(&mut self.buffer)) => {
                    match read {
                        Err(_) => {
                            debug!("Idle timeout, closing connection");
                            return Ok(None);
                        }
                        // Client closed connection
                        Ok(Ok(0)) => return Ok(None),
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => return Err(e.into()),
                    }
                }
                _ = self.shutdown.changed() => return Ok(None),
            }
        }
    }

    async fn process(&self, incoming: Incoming) -> WireResponse {
        let response = handle_request(&self.resolver, &incoming.request, &incoming.headers).await;
        let wire = assemble(response, &incoming.request, SystemTime::now());

        AccessLogEntry::new(
            &incoming.request_line,
            &incoming.headers,
            wire.status.as_u16(),
            wire.length(),
        )
        .emit();

        wire
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Produces the resolution outcome for one request.
///
/// File access blocks, so it runs on the blocking pool.
pub async fn handle_request(resolver: &Arc<FileResolver>, request: &Request, headers: &Headers) -> Response {
    match request.method {
        Method::Error => Response::status(StatusCode::BadRequest),
        Method::NotRecognized => Response::status(StatusCode::NotImplemented),
        Method::GET | Method::HEAD => {
            let resolver = Arc::clone(resolver);
            let request = request.clone();
            let headers = headers.clone();
            match tokio::task::spawn_blocking(move || resolver.resolve(&request, &headers)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "File resolution task failed");
                    Response::internal_error()
                }
            }
        }
    }
}

fn request_line(head: &[u8]) -> String {
    let end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(head.len());
    String::from_utf8_lossy(&head[..end]).into_owned()
}
