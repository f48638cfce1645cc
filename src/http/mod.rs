//! HTTP protocol implementation.
//!
//! This module implements a small HTTP/1.x static-file server with support
//! for keep-alive connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Parses the request line and headers from byte buffers
//! - **`request`**: HTTP request representation
//! - **`response`**: Status codes, bodies, and the resolution outcome
//! - **`writer`**: Assembles the wire response and writes it to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`access_log`**: One log line per completed request
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data (idle timeout)
//!        └──────┬──────┘
//!               │ Request head received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve the file, assemble the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Persistent, not shutting down → Reading (same connection)
//!               └─ Otherwise → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use threaded_server::files::FileResolver;
//! use threaded_server::http::connection::{Connection, ConnectionSettings};
//! use threaded_server::http::mime::MimeRegistry;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = Arc::new(FileResolver::new(".", "index.html", Arc::new(MimeRegistry::new()))?);
//!     let (_tx, shutdown) = tokio::sync::watch::channel(false);
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let mut conn = Connection::new(socket, resolver.clone(), ConnectionSettings::default(), shutdown.clone());
//!         tokio::spawn(async move {
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod access_log;
pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
