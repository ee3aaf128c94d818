//! HTTP protocol implementation.
//!
//! This module implements the per-connection half of an HTTP/1.1 static file
//! server: an incremental request parser that is resumable across partial
//! socket reads, and a response assembly pipeline that transmits file bodies
//! without copying them into the header buffer.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`scan`**: Fixed-capacity read buffer with an incremental CRLF line scanner
//! - **`parser`**: The request finite state machine driven by scanned lines
//! - **`request`**: Parsed HTTP request representation
//! - **`percent`**: URL percent-encoding and decoding of path segments
//! - **`mime`**: Content-Type detection based on file extensions
//! - **`response`**: Status codes, canned bodies and the response head builder
//! - **`writer`**: The vectored write plan with partial-write continuation
//! - **`connection`**: The connection object tying buffers, parser and plan together
//!
//! # Connection State Machine
//!
//! Each client connection goes through a request cycle:
//!
//! ```text
//!        ┌───────────────┐
//!        │   Reading     │ ← drain socket into the read buffer
//!        └───────┬───────┘
//!                │ data buffered
//!                ▼
//!        ┌───────────────┐
//!        │  Processing   │ ← parser FSM; on completion resolve + build reply
//!        └───────┬───────┘
//!                │ reply staged
//!                ▼
//!        ┌───────────────┐
//!        │   Writing     │ ← drain the vectored plan, resuming on readiness
//!        └───────┬───────┘
//!                │ response sent
//!                ├─ Keep-Alive → Reading (same connection, state reset)
//!                └─ Close → Closed
//! ```
//!
//! The parser itself is a second, inner state machine
//! (request line → headers → body) so that a request split across any number
//! of socket reads parses identically to the same bytes delivered at once.

pub mod connection;
pub mod mime;
pub mod parser;
pub mod percent;
pub mod request;
pub mod response;
pub mod scan;
pub mod writer;
