//! Response assembly: status codes, canned bodies and the head builder.

use std::fmt::{self, Write as _};

use bytes::Bytes;

use crate::fs::resolver::MappedFile;

/// HTTP status codes the server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use citadel::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Canned body for 400 replies.
pub const BAD_REQUEST_BODY: &str =
    "Your request has bad syntax or is inherently impossible to satisfy.\n";
/// Canned body for 403 replies.
pub const FORBIDDEN_BODY: &str =
    "You do not have permission to get file from this server.\n";
/// Canned body for 404 replies.
pub const NOT_FOUND_BODY: &str = "The requested file was not found on this server.\n";
/// Canned body for 500 replies.
pub const INTERNAL_ERROR_BODY: &str =
    "There was an unusual problem serving the requested file.\n";
/// Body sent for a successfully resolved but empty file.
pub const EMPTY_FILE_BODY: &str = "<html><body></body></html>";

/// The rendered head does not fit the fixed-size write buffer.
///
/// Treated as an internal failure: the caller degrades to a 500 reply, or
/// closes the connection outright if even that cannot be staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadOverflow;

/// Fixed-capacity staging buffer for response head bytes.
pub struct WriteBuf {
    buf: Box<[u8]>,
    len: usize,
}

impl WriteBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn push(&mut self, bytes: &[u8]) -> Result<(), HeadOverflow> {
        if self.len + bytes.len() > self.buf.len() {
            return Err(HeadOverflow);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

impl fmt::Write for WriteBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// The typed fields of a response head, serialized in one pass.
///
/// Replaces ad-hoc line formatting: the head always carries exactly these
/// four fields plus the blank separator line.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub content_length: usize,
    pub content_type: &'static str,
    pub keep_alive: bool,
}

impl ResponseHead {
    /// Renders the status line, headers and blank separator into `out`.
    pub fn render(&self, out: &mut WriteBuf) -> Result<(), HeadOverflow> {
        out.clear();
        write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason_phrase()
        )
        .map_err(|_| HeadOverflow)?;
        write!(out, "Content-Type: {}\r\n", self.content_type).map_err(|_| HeadOverflow)?;
        write!(out, "Content-Length: {}\r\n", self.content_length).map_err(|_| HeadOverflow)?;
        write!(
            out,
            "Connection: {}\r\n",
            if self.keep_alive { "keep-alive" } else { "close" }
        )
        .map_err(|_| HeadOverflow)?;
        out.push(b"\r\n")
    }
}

/// The body payload of a staged response.
///
/// A connection holds exactly one of these per request cycle; the mapped
/// variant owns the file mapping and releases it when the payload is
/// replaced or dropped.
pub enum Body {
    /// No body bytes (nothing staged yet).
    Empty,
    /// A generated buffer: directory listing, canned page, empty-file page.
    Generated(Bytes),
    /// A memory-mapped file region, transmitted without copying.
    Mapped(MappedFile),
}

impl Body {
    pub fn len(&self) -> usize {
        match self {
            Body::Empty => 0,
            Body::Generated(bytes) => bytes.len(),
            Body::Mapped(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Generated(bytes) => bytes,
            Body::Mapped(map) => map.as_slice(),
        }
    }
}
