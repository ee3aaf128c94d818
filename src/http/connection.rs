//! The per-connection request/response state machine.
//!
//! A `Connection` owns one socket plus all mutable state for a request
//! cycle: the read buffer and parser, the staged response head, the body
//! payload and the vectored write plan. The reactor's single-shot arming
//! discipline guarantees at most one thread touches a connection at a time,
//! so none of this needs a lock.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use mio::net::TcpStream;
use tracing::debug;

use crate::fs::listing;
use crate::fs::resolver::{self, Resolved};
use crate::http::mime;
use crate::http::parser::{ParseOutcome, RequestParser};
use crate::http::request::Request;
use crate::http::response::{self, Body, HeadOverflow, ResponseHead, StatusCode, WriteBuf};
use crate::http::scan::ReadBuf;
use crate::http::writer::WritePlan;

/// Capacity of the per-connection read buffer.
pub const READ_BUF_SIZE: usize = 2048;
/// Capacity of the per-connection head staging buffer.
pub const WRITE_BUF_SIZE: usize = 2048;

/// What the reactor should do with a connection after `process()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The buffered request is incomplete; re-arm for read readiness.
    RearmRead,
    /// A reply is staged; arm for write readiness.
    StartWrite,
    /// Unrecoverable; tear the connection down.
    Close,
}

/// What the reactor should do with a connection after `write()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The socket would block mid-plan; re-arm for write readiness.
    Again,
    /// Response fully sent and the connection reset for the next request.
    KeepAlive,
    /// Response finished (or failed); tear the connection down.
    Close,
}

pub struct Connection {
    stream: TcpStream,
    root: Arc<PathBuf>,
    read_buf: ReadBuf,
    parser: RequestParser,
    write_buf: WriteBuf,
    body: Body,
    plan: WritePlan,
    keep_alive: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, root: Arc<PathBuf>) -> Self {
        Self {
            stream,
            root,
            read_buf: ReadBuf::with_capacity(READ_BUF_SIZE),
            parser: RequestParser::new(),
            write_buf: WriteBuf::with_capacity(WRITE_BUF_SIZE),
            body: Body::Empty,
            plan: WritePlan::empty(),
            keep_alive: false,
        }
    }

    /// The event source for registry operations.
    pub fn source(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// True while the staged response has unsent bytes.
    pub fn has_backlog(&self) -> bool {
        !self.plan.is_done()
    }

    /// Drains the socket into the read buffer until it would block.
    ///
    /// Fails on peer close, on any error other than would-block, and when
    /// the buffer fills without a complete request.
    pub fn read(&mut self) -> io::Result<()> {
        loop {
            if self.read_buf.is_full() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "request exceeds read buffer",
                ));
            }
            match self.stream.read(self.read_buf.spare_mut()) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed"));
                }
                Ok(n) => self.read_buf.commit(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs the parser over the buffered bytes and, on a terminal outcome,
    /// stages the reply. Does no socket I/O.
    pub fn process(&mut self) -> Verdict {
        let staged = match self.parser.advance(&mut self.read_buf) {
            ParseOutcome::NeedMore => return Verdict::RearmRead,
            ParseOutcome::Malformed => {
                self.keep_alive = false;
                self.stage_error(StatusCode::BadRequest, response::BAD_REQUEST_BODY)
            }
            ParseOutcome::Complete(request) => {
                self.keep_alive = request.keep_alive;
                self.stage_resource(&request)
            }
        };
        if staged.is_err() {
            // Reply too large for the head buffer: degrade to a 500, and give
            // up on the connection if even that does not fit.
            self.keep_alive = false;
            if self
                .stage_error(StatusCode::InternalServerError, response::INTERNAL_ERROR_BODY)
                .is_err()
            {
                return Verdict::Close;
            }
        }
        Verdict::StartWrite
    }

    /// Drains the vectored plan until done or the socket would block.
    pub fn write(&mut self) -> WriteOutcome {
        if self.plan.is_done() {
            return self.finish();
        }
        loop {
            let head = self.write_buf.as_slice();
            let body = self.body.as_slice();
            let bufs = self.plan.slices(head, body);
            match self.stream.write_vectored(&bufs) {
                Ok(0) => {
                    self.body = Body::Empty;
                    return WriteOutcome::Close;
                }
                Ok(n) => {
                    self.plan.advance(n);
                    if self.plan.is_done() {
                        return self.finish();
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return WriteOutcome::Again,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("write failed: {e}");
                    self.body = Body::Empty;
                    return WriteOutcome::Close;
                }
            }
        }
    }

    /// Releases the body payload (and with it any file mapping) and either
    /// resets for the next request or reports the connection done.
    fn finish(&mut self) -> WriteOutcome {
        self.body = Body::Empty;
        if self.keep_alive {
            self.reset();
            WriteOutcome::KeepAlive
        } else {
            WriteOutcome::Close
        }
    }

    /// Re-initializes all request-cycle state in place.
    fn reset(&mut self) {
        self.read_buf.reset();
        self.parser.reset();
        self.write_buf.clear();
        self.plan = WritePlan::empty();
        self.keep_alive = false;
    }

    fn stage_resource(&mut self, request: &Request) -> Result<(), HeadOverflow> {
        match resolver::resolve(&self.root, &request.path) {
            Resolved::Missing => self.stage_error(StatusCode::NotFound, response::NOT_FOUND_BODY),
            Resolved::Forbidden => self.stage_error(StatusCode::Forbidden, response::FORBIDDEN_BODY),
            Resolved::Failed => {
                self.stage_error(StatusCode::InternalServerError, response::INTERNAL_ERROR_BODY)
            }
            Resolved::Directory(path) => match listing::render(&path) {
                Ok(html) => self.stage(StatusCode::Ok, mime::HTML, Body::Generated(html)),
                Err(e) => {
                    debug!("listing {} failed: {e}", path.display());
                    self.stage_error(StatusCode::InternalServerError, response::INTERNAL_ERROR_BODY)
                }
            },
            Resolved::EmptyFile => self.stage(
                StatusCode::Ok,
                mime::HTML,
                Body::Generated(Bytes::from_static(response::EMPTY_FILE_BODY.as_bytes())),
            ),
            Resolved::File { map, content_type } => {
                self.stage(StatusCode::Ok, content_type, Body::Mapped(map))
            }
        }
    }

    fn stage_error(&mut self, status: StatusCode, text: &'static str) -> Result<(), HeadOverflow> {
        self.stage(
            status,
            mime::HTML,
            Body::Generated(Bytes::from_static(text.as_bytes())),
        )
    }

    /// Renders the head into the write buffer and installs the write plan.
    /// File bytes are never copied into the head buffer; the plan's second
    /// segment points straight at the body payload.
    fn stage(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: Body,
    ) -> Result<(), HeadOverflow> {
        let head = ResponseHead {
            status,
            content_length: body.len(),
            content_type,
            keep_alive: self.keep_alive,
        };
        head.render(&mut self.write_buf)?;
        self.plan = WritePlan::new(self.write_buf.len(), body.len());
        self.body = body;
        Ok(())
    }
}
