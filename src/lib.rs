//! threaded_server - static file HTTP/1.x server
//!
//! Serves one directory tree to many concurrent clients, one task per
//! connection, with memory-mapped file bodies.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
pub mod util;
