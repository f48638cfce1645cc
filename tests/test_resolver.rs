mod common;

use std::time::{Duration, SystemTime};

use common::{Fixture, INDEX_BODY};
use threaded_server::files::{FileResolver, ResolveError};
use threaded_server::http::mime::MimeRegistry;
use threaded_server::http::request::{Headers, Method, Request};
use threaded_server::http::response::{Body, Response, StatusCode};

fn get(url: &str) -> Request {
    Request {
        method: Method::GET,
        url: url.to_string(),
        version: "HTTP/1.1".to_string(),
    }
}

fn head(url: &str) -> Request {
    Request {
        method: Method::HEAD,
        ..get(url)
    }
}

fn resolve(resolver: &FileResolver, request: &Request) -> Response {
    resolver.resolve(request, &Headers::new())
}

#[test]
fn test_resolve_existing_file_is_mapped() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &get("/index.html"));

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_mapped());
    assert_eq!(response.body.as_bytes(), INDEX_BODY);
    assert_eq!(response.headers.get("Content-Length"), Some("13"));
    assert_eq!(response.headers.get("Content-Type"), Some("text/html"));
    assert!(response.headers.get("Last-Modified").is_some());
}

#[test]
fn test_resolve_missing_file_is_not_found() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &get("/missing.txt"));

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(matches!(response.body, Body::Empty));
}

#[test]
fn test_resolve_root_uses_index() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &get("/"));

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body.as_bytes(), INDEX_BODY);
}

#[test]
fn test_resolve_subdirectory_without_trailing_slash_uses_index() {
    let fixture = Fixture::new();
    fixture.write("docs/index.html", b"docs");
    let resolver = fixture.resolver();

    for url in ["/docs", "/docs/"] {
        let response = resolve(&resolver, &get(url));
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body.as_bytes(), b"docs");
    }
}

#[test]
fn test_resolve_directory_without_index_is_not_found() {
    let fixture = Fixture::new();
    fixture.write("empty/readme.txt", b"x");

    let response = resolve(&fixture.resolver(), &get("/empty"));
    assert_eq!(response.status, StatusCode::NotFound);
}

#[test]
fn test_resolve_file_used_as_directory_is_not_found() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &get("/index.html/child"));
    assert_eq!(response.status, StatusCode::NotFound);
}

#[test]
fn test_resolve_traversal_is_not_found() {
    let fixture = Fixture::with_index();
    fixture.write_outside("secret.txt", b"top secret");
    let resolver = fixture.resolver();

    for url in ["/../secret.txt", "/../../secret.txt", "/sub/../../secret.txt", "../secret.txt"] {
        let response = resolve(&resolver, &get(url));
        assert_eq!(response.status, StatusCode::NotFound, "{url}");
        assert!(response.body.is_empty());
    }
}

#[test]
fn test_resolve_dot_segments_inside_root_are_allowed() {
    let fixture = Fixture::with_index();
    fixture.write("a/b.txt", b"b");

    let response = resolve(&fixture.resolver(), &get("/a/../a/./b.txt"));
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body.as_bytes(), b"b");
}

#[cfg(unix)]
#[test]
fn test_resolve_symlink_out_of_root_is_not_found() {
    let fixture = Fixture::with_index();
    let secret = fixture.write_outside("secret.txt", b"top secret");
    std::os::unix::fs::symlink(&secret, fixture.root.join("link.txt")).unwrap();

    let response = resolve(&fixture.resolver(), &get("/link.txt"));
    assert_eq!(response.status, StatusCode::NotFound);
}

#[cfg(unix)]
#[test]
fn test_resolve_unreadable_file_is_forbidden() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new();
    let path = fixture.write("private.txt", b"private");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users ignore file modes; nothing to check then.
    if std::fs::read(&path).is_ok() {
        return;
    }

    let response = resolve(&fixture.resolver(), &get("/private.txt"));
    assert_eq!(response.status, StatusCode::Forbidden);
}

#[test]
fn test_resolve_head_drops_body_keeps_length() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &head("/index.html"));

    assert_eq!(response.status, StatusCode::Ok);
    assert!(matches!(response.body, Body::Empty));
    assert_eq!(response.headers.get("Content-Length"), Some("13"));
}

#[test]
fn test_resolve_ignores_query_string() {
    let fixture = Fixture::with_index();
    let response = resolve(&fixture.resolver(), &get("/index.html?v=2"));
    assert_eq!(response.status, StatusCode::Ok);
}

#[test]
fn test_resolve_content_length_matches_mapped_body() {
    let fixture = Fixture::new();
    let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    fixture.write("data.bin", &contents);

    let response = resolve(&fixture.resolver(), &get("/data.bin"));

    assert!(response.body.is_mapped());
    assert_eq!(response.body.as_bytes(), contents.as_slice());
    assert_eq!(response.headers.get("Content-Length"), Some("10000"));
}

#[test]
fn test_resolve_empty_file() {
    let fixture = Fixture::new();
    fixture.write("empty.txt", b"");

    let response = resolve(&fixture.resolver(), &get("/empty.txt"));
    assert_eq!(response.status, StatusCode::Ok);
    assert!(matches!(response.body, Body::Empty));
    assert_eq!(response.headers.get("Content-Length"), Some("0"));
}

#[test]
fn test_resolve_is_idempotent() {
    let fixture = Fixture::with_index();
    let resolver = fixture.resolver();

    let first = resolve(&resolver, &get("/index.html"));
    let second = resolve(&resolver, &get("/index.html"));

    for header in ["Content-Length", "Content-Type", "Last-Modified"] {
        assert_eq!(first.headers.get(header), second.headers.get(header), "{header}");
    }
}

#[test]
fn test_resolve_last_modified_tracks_mtime() {
    let fixture = Fixture::with_index();
    let path = fixture.root.join("index.html");
    let resolver = fixture.resolver();

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    std::fs::File::options().write(true).open(&path).unwrap().set_modified(stamp).unwrap();
    let before = resolve(&resolver, &get("/index.html"));
    assert_eq!(before.headers.get("Last-Modified"), Some("Sun, 09 Sep 2001 01:46:40 GMT"));

    let later = stamp + Duration::from_secs(60);
    std::fs::File::options().write(true).open(&path).unwrap().set_modified(later).unwrap();
    let after = resolve(&resolver, &get("/index.html"));
    assert_eq!(after.headers.get("Last-Modified"), Some("Sun, 09 Sep 2001 01:47:40 GMT"));
}

#[test]
fn test_resolve_sniffs_and_caches_unknown_extension() {
    let fixture = Fixture::new();
    fixture.write("logo.png", b"\x89PNG\r\n\x1a\nrest-of-image");
    let resolver = fixture.resolver_with(MimeRegistry::new());

    assert_eq!(resolver.mime().get("png"), None);
    let response = resolve(&resolver, &get("/logo.png"));

    assert_eq!(response.headers.get("Content-Type"), Some("image/png"));
    assert_eq!(resolver.mime().get("png").as_deref(), Some("image/png"));
}

#[test]
fn test_resolve_registry_wins_over_sniffing() {
    let fixture = Fixture::new();
    fixture.write("data.bin", b"\x89PNG\r\n\x1a\n");
    let resolver = fixture.resolver_with(MimeRegistry::parse("application/x-custom bin\n"));

    let response = resolve(&resolver, &get("/data.bin"));
    assert_eq!(response.headers.get("Content-Type"), Some("application/x-custom"));
}

#[test]
fn test_resolve_error_statuses() {
    assert_eq!(ResolveError::NotFound.status(), StatusCode::NotFound);
    assert_eq!(ResolveError::OutsideRoot.status(), StatusCode::NotFound);
    assert_eq!(ResolveError::Forbidden.status(), StatusCode::Forbidden);
    assert_eq!(ResolveError::DescriptorsExhausted.status(), StatusCode::TryAgain);
}

#[cfg(unix)]
#[test]
fn test_open_error_classification() {
    let emfile = std::io::Error::from_raw_os_error(24);
    let enfile = std::io::Error::from_raw_os_error(23);

    assert!(matches!(ResolveError::from_open_error(emfile), ResolveError::DescriptorsExhausted));
    assert!(matches!(ResolveError::from_open_error(enfile), ResolveError::DescriptorsExhausted));

    let response = Response::from(ResolveError::DescriptorsExhausted);
    assert_eq!(response.status, StatusCode::TryAgain);
    assert_eq!(response.headers.get("Retry-After"), Some("1"));
}

#[test]
fn test_resolver_rejects_missing_root() {
    let result = FileResolver::new("/nonexistent/threaded-server-root", "index.html", Default::default());
    assert!(result.is_err());
}
