//! Content sniffing for files the MIME registry does not know.

use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Leading bytes of common binary formats.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"\x7fELF", "application/x-executable"),
];

const HTML_MARKERS: &[&[u8]] = &[b"<!doctype html", b"<html"];

/// How many bytes are inspected for HTML markers and text detection.
const SNIFF_LEN: usize = 512;

/// Guesses a MIME type from the file name, then from its contents.
pub fn sniff(path: &Path, content: &[u8]) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }
    sniff_content(content).to_string()
}

/// Guesses a MIME type purely from leading bytes.
pub fn sniff_content(content: &[u8]) -> &'static str {
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| content.starts_with(magic)) {
        return *mime;
    }

    let head = &content[..content.len().min(SNIFF_LEN)];
    if looks_like_html(head) {
        return "text/html; charset=utf-8";
    }
    if is_text(head) {
        return TEXT_PLAIN;
    }
    OCTET_STREAM
}

fn looks_like_html(head: &[u8]) -> bool {
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    HTML_MARKERS
        .iter()
        .any(|marker| head.len() >= marker.len() && head[..marker.len()].eq_ignore_ascii_case(marker))
}

fn is_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte character cut at the sniff boundary is still text.
        Err(e) => e.error_len().is_none(),
    }
}
