use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use citadel::fs::listing;
use citadel::fs::resolver::{resolve, Resolved};

fn write_readable(path: &Path, content: &[u8]) {
    fs::write(path, content).unwrap();
    fs::set_permissions(path, Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn test_resolve_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(resolve(dir.path(), "/missing"), Resolved::Missing));
}

#[test]
fn test_resolve_regular_file_maps_contents() {
    let dir = tempfile::tempdir().unwrap();
    write_readable(&dir.path().join("hello.txt"), b"hello world");

    match resolve(dir.path(), "/hello.txt") {
        Resolved::File { map, content_type } => {
            assert_eq!(map.as_slice(), b"hello world");
            assert_eq!(map.len(), 11);
            assert_eq!(content_type, "text/plain; charset=utf-8");
        }
        other => panic!("expected file, got {other:?}"),
    }
}

#[test]
fn test_resolve_content_type_follows_extension() {
    let dir = tempfile::tempdir().unwrap();
    write_readable(&dir.path().join("page.html"), b"<html></html>");

    match resolve(dir.path(), "/page.html") {
        Resolved::File { content_type, .. } => assert_eq!(content_type, "text/html"),
        other => panic!("expected file, got {other:?}"),
    }
}

#[test]
fn test_resolve_percent_encoded_path() {
    let dir = tempfile::tempdir().unwrap();
    write_readable(&dir.path().join("a b.txt"), b"data");

    match resolve(dir.path(), "/a%20b.txt") {
        Resolved::File { map, .. } => assert_eq!(map.as_slice(), b"data"),
        other => panic!("expected file, got {other:?}"),
    }
}

#[test]
fn test_resolve_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    write_readable(&dir.path().join("empty"), b"");

    assert!(matches!(resolve(dir.path(), "/empty"), Resolved::EmptyFile));
}

#[test]
fn test_resolve_unreadable_file_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret.txt");
    fs::write(&path, b"secret").unwrap();
    fs::set_permissions(&path, Permissions::from_mode(0o600)).unwrap();

    assert!(matches!(
        resolve(dir.path(), "/secret.txt"),
        Resolved::Forbidden
    ));
}

#[test]
fn test_resolve_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("docs");
    fs::create_dir(&sub).unwrap();
    fs::set_permissions(&sub, Permissions::from_mode(0o755)).unwrap();

    match resolve(dir.path(), "/docs") {
        Resolved::Directory(path) => assert_eq!(path, sub),
        other => panic!("expected directory, got {other:?}"),
    }
}

#[test]
fn test_resolve_root_path_is_document_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::set_permissions(dir.path(), Permissions::from_mode(0o755)).unwrap();

    match resolve(dir.path(), "/") {
        Resolved::Directory(path) => assert_eq!(path, dir.path()),
        other => panic!("expected directory, got {other:?}"),
    }
}

#[test]
fn test_listing_rows_are_sorted_with_sizes_and_encoded_hrefs() {
    let dir = tempfile::tempdir().unwrap();
    write_readable(&dir.path().join("b.txt"), b"abc");
    write_readable(&dir.path().join("a b.txt"), b"data");
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::set_permissions(&sub, Permissions::from_mode(0o755)).unwrap();

    let html = listing::render(dir.path()).unwrap();
    let html = std::str::from_utf8(&html).unwrap();

    assert!(html.contains("<title>Index of "));
    assert!(html.contains("<a href=\"a%20b.txt\">a b.txt</a></td><td>4</td>"));
    assert!(html.contains("<a href=\"b.txt\">b.txt</a></td><td>3</td>"));
    assert!(html.contains("<a href=\"sub/\">sub/</a>"));

    // Alphabetical order: "a b.txt" < "b.txt" < "sub".
    let first = html.find("a%20b.txt").unwrap();
    let second = html.find("b.txt\">b.txt").unwrap();
    let third = html.find("sub/").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn test_listing_of_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let html = listing::render(dir.path()).unwrap();
    let html = std::str::from_utf8(&html).unwrap();

    assert!(html.contains("<table></table>"));
}
