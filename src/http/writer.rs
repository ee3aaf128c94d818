//! Vectored write plan with partial-write continuation.

use std::io::IoSlice;

/// Transmission cursor over a two-segment response: head bytes followed by
/// body bytes.
///
/// As the socket acknowledges bytes, the cursor advances and the segments
/// shrink from the front; they are never reordered. The invariant
/// `sent <= total` holds at all times, and the plan survives any number of
/// would-block suspensions between readiness events.
#[derive(Debug, Clone, Copy)]
pub struct WritePlan {
    sent: usize,
    head_len: usize,
    total: usize,
}

impl WritePlan {
    pub fn new(head_len: usize, body_len: usize) -> Self {
        Self {
            sent: 0,
            head_len,
            total: head_len + body_len,
        }
    }

    /// A plan with nothing to send; the state of an idle connection.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn is_done(&self) -> bool {
        self.sent >= self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.sent
    }

    /// Records `n` more bytes as acknowledged by the socket.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.sent + n <= self.total);
        self.sent += n;
    }

    /// The unsent portions of the head and body, ready for a vectored write.
    ///
    /// Segments already drained come back empty; `writev` ignores
    /// zero-length entries.
    pub fn slices<'a>(&self, head: &'a [u8], body: &'a [u8]) -> [IoSlice<'a>; 2] {
        debug_assert_eq!(head.len(), self.head_len);
        debug_assert_eq!(body.len(), self.total - self.head_len);
        if self.sent < self.head_len {
            [IoSlice::new(&head[self.sent..]), IoSlice::new(body)]
        } else {
            let body_off = (self.sent - self.head_len).min(body.len());
            [IoSlice::new(&[]), IoSlice::new(&body[body_off..])]
        }
    }
}
