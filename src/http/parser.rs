//! Incremental HTTP/1.1 request parser.
//!
//! The parser is a three-state machine (request line → headers → body)
//! driven by the line scanner. It can be re-invoked any number of times as
//! more bytes arrive; progress is kept in the buffer cursors and the parser
//! fields, so a request split at any byte boundary parses identically to one
//! delivered whole.

use tracing::trace;

use crate::http::request::{Method, Request};
use crate::http::scan::{ReadBuf, ScanStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RequestLine,
    Headers,
    Body,
}

/// Outcome of driving the parser over the currently buffered bytes.
#[derive(Debug)]
pub enum ParseOutcome {
    /// A full request was consumed.
    Complete(Request),
    /// More bytes are needed from the socket.
    NeedMore,
    /// The request violates the protocol; answer 400 and stop parsing.
    Malformed,
}

pub struct RequestParser {
    state: State,
    method: Method,
    path: String,
    host: Option<String>,
    content_length: usize,
    keep_alive: bool,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: State::RequestLine,
            method: Method::Get,
            path: String::new(),
            host: None,
            content_length: 0,
            keep_alive: false,
        }
    }

    /// Rewinds to the initial state for the next request.
    pub fn reset(&mut self) {
        self.state = State::RequestLine;
        self.method = Method::Get;
        self.path.clear();
        self.host = None;
        self.content_length = 0;
        self.keep_alive = false;
    }

    /// Consumes as many buffered lines as possible, returning a terminal
    /// outcome or `NeedMore` when the scanner runs out of data.
    pub fn advance(&mut self, buf: &mut ReadBuf) -> ParseOutcome {
        loop {
            if self.state == State::Body {
                if buf.body_available() < self.content_length {
                    return ParseOutcome::NeedMore;
                }
                // Body bytes are accepted but not interpreted.
                buf.consume_body(self.content_length);
                return ParseOutcome::Complete(self.take_request());
            }

            match buf.scan_line() {
                ScanStatus::Incomplete => return ParseOutcome::NeedMore,
                ScanStatus::Malformed => return ParseOutcome::Malformed,
                ScanStatus::Complete => {}
            }
            let line = buf.take_line();

            if self.state == State::RequestLine {
                if !self.consume_request_line(line) {
                    return ParseOutcome::Malformed;
                }
            } else if line.is_empty() {
                // Blank line ends the headers.
                if self.content_length == 0 {
                    return ParseOutcome::Complete(self.take_request());
                }
                self.state = State::Body;
            } else {
                self.consume_header_line(line);
            }
        }
    }

    /// Splits the request line into method, target and version.
    ///
    /// Only `GET` and `HTTP/1.1` are accepted, both case-insensitively. An
    /// absolute target (`http://host/path`) is reduced to its path part.
    fn consume_request_line(&mut self, line: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(line) else {
            return false;
        };
        let mut parts = text.split_ascii_whitespace();
        let (Some(method), Some(target), Some(version)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if parts.next().is_some() {
            return false;
        }
        let Some(method) = Method::from_token(method.as_bytes()) else {
            return false;
        };
        if !version.eq_ignore_ascii_case("HTTP/1.1") {
            return false;
        }
        let target = if target.len() >= 7 && target[..7].eq_ignore_ascii_case("http://") {
            match target[7..].find('/') {
                Some(at) => &target[7 + at..],
                None => return false,
            }
        } else {
            target
        };
        if !target.starts_with('/') {
            return false;
        }

        self.method = method;
        self.path.clear();
        self.path.push_str(target);
        self.state = State::Headers;
        true
    }

    /// Records the headers the server cares about; everything else is
    /// ignored without error, including lines that do not look like headers.
    fn consume_header_line(&mut self, line: &[u8]) {
        let Ok(text) = std::str::from_utf8(line) else {
            return;
        };
        let Some((name, value)) = text.split_once(':') else {
            trace!("ignoring malformed header line: {text}");
            return;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("Host") {
            self.host = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("Connection") {
            if value.eq_ignore_ascii_case("keep-alive") {
                self.keep_alive = true;
            }
        } else if name.eq_ignore_ascii_case("Content-Length") {
            if let Ok(n) = value.parse::<usize>() {
                self.content_length = n;
            }
        } else {
            trace!("ignoring header: {name}");
        }
    }

    fn take_request(&mut self) -> Request {
        Request {
            method: self.method,
            path: std::mem::take(&mut self.path),
            host: self.host.take(),
            content_length: self.content_length,
            keep_alive: self.keep_alive,
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let mut buf = ReadBuf::with_capacity(2048);
        buf.fill(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
        let mut parser = RequestParser::new();

        match parser.advance(&mut buf) {
            ParseOutcome::Complete(req) => {
                assert_eq!(req.path, "/");
                assert_eq!(req.host.as_deref(), Some("example.com"));
            }
            other => panic!("expected complete request, got {other:?}"),
        }
    }
}
