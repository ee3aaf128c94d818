use std::fs::{self, Permissions};
use std::io::{Read as _, Write as _};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use citadel::http::connection::{Connection, Verdict, WriteOutcome};
use citadel::http::response::{BAD_REQUEST_BODY, NOT_FOUND_BODY};

const DEADLINE: Duration = Duration::from_secs(5);

/// A connected pair: the server side wrapped in a `Connection`, the client
/// side a plain blocking stream.
fn connect(root: Arc<PathBuf>) -> (Connection, std::net::TcpStream) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let client = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    client
        .set_read_timeout(Some(DEADLINE))
        .unwrap();
    let (server, _) = listener.accept().unwrap();
    server.set_nonblocking(true).unwrap();
    let stream = mio::net::TcpStream::from_std(server);
    (Connection::new(stream, root), client)
}

/// Read-then-process until the request is fully buffered, standing in for
/// the reactor's rearm-for-read cycle.
fn drive(conn: &mut Connection) -> Verdict {
    let deadline = Instant::now() + DEADLINE;
    loop {
        conn.read().expect("read failed");
        match conn.process() {
            Verdict::RearmRead => {
                assert!(Instant::now() < deadline, "timed out waiting for request");
                std::thread::sleep(Duration::from_millis(5));
            }
            verdict => return verdict,
        }
    }
}

/// Write until the plan drains, standing in for write-readiness events.
fn drain(conn: &mut Connection) -> WriteOutcome {
    let deadline = Instant::now() + DEADLINE;
    loop {
        match conn.write() {
            WriteOutcome::Again => {
                assert!(Instant::now() < deadline, "timed out draining response");
                std::thread::sleep(Duration::from_millis(5));
            }
            outcome => return outcome,
        }
    }
}

fn read_exact(client: &mut std::net::TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    client.read_exact(&mut buf).unwrap();
    buf
}

#[test]
fn test_keep_alive_file_request_then_reset() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a b.txt");
    fs::write(&file, b"data").unwrap();
    fs::set_permissions(&file, Permissions::from_mode(0o644)).unwrap();

    let root = Arc::new(dir.path().to_path_buf());
    let (mut conn, mut client) = connect(root);

    client
        .write_all(b"GET /a%20b.txt HTTP/1.1\r\nHost: x\r\nConnection: keep-alive\r\n\r\n")
        .unwrap();

    assert_eq!(drive(&mut conn), Verdict::StartWrite);
    assert!(conn.has_backlog());
    assert_eq!(drain(&mut conn), WriteOutcome::KeepAlive);
    assert!(!conn.has_backlog());

    let expected = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/plain; charset=utf-8\r\n\
                    Content-Length: 4\r\n\
                    Connection: keep-alive\r\n\r\n\
                    data";
    assert_eq!(read_exact(&mut client, expected.len()), expected.as_bytes());

    // The connection was reset in place; a second exchange works.
    client.write_all(b"GET /missing HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(drive(&mut conn), Verdict::StartWrite);
    assert_eq!(drain(&mut conn), WriteOutcome::Close);

    let expected = format!(
        "HTTP/1.1 404 Not Found\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n\
         {}",
        NOT_FOUND_BODY.len(),
        NOT_FOUND_BODY
    );
    assert_eq!(read_exact(&mut client, expected.len()), expected.as_bytes());
}

#[test]
fn test_malformed_request_answers_400_close() {
    let dir = tempfile::tempdir().unwrap();
    let root = Arc::new(dir.path().to_path_buf());
    let (mut conn, mut client) = connect(root);

    client
        .write_all(b"POST /upload HTTP/1.1\r\nHost: x\r\n\r\n")
        .unwrap();

    assert_eq!(drive(&mut conn), Verdict::StartWrite);
    assert_eq!(drain(&mut conn), WriteOutcome::Close);

    let expected = format!(
        "HTTP/1.1 400 Bad Request\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n\
         {}",
        BAD_REQUEST_BODY.len(),
        BAD_REQUEST_BODY
    );
    assert_eq!(read_exact(&mut client, expected.len()), expected.as_bytes());
}

#[test]
fn test_peer_close_fails_read() {
    let dir = tempfile::tempdir().unwrap();
    let root = Arc::new(dir.path().to_path_buf());
    let (mut conn, client) = connect(root);

    drop(client);
    // Wait for the FIN to land.
    let deadline = Instant::now() + DEADLINE;
    loop {
        match conn.read() {
            Err(_) => break,
            Ok(()) => {
                assert!(Instant::now() < deadline, "peer close never surfaced");
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }
}

#[test]
fn test_incomplete_request_keeps_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let root = Arc::new(dir.path().to_path_buf());
    let (mut conn, mut client) = connect(root);

    client.write_all(b"GET / HTTP/1.1\r\nHost:").unwrap();
    std::thread::sleep(Duration::from_millis(50));
    conn.read().unwrap();
    assert_eq!(conn.process(), Verdict::RearmRead);
}
