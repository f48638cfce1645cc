//! Static file access
//!
//! This module maps request paths to files under the server root and
//! provides the content-sniffing fallback for unknown MIME types.

pub mod resolver;
pub mod sniff;

pub use resolver::{FileResolver, ResolveError};
