//! Fixed-capacity read buffer with an incremental line scanner.

/// Result of one incremental scan for a line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// A full `\r\n`-terminated line is available via [`ReadBuf::take_line`].
    Complete,
    /// The buffered bytes contain no terminator yet; more data is needed.
    Incomplete,
    /// The bytes violate the line framing (a stray `\r` or bare `\n`).
    Malformed,
}

/// Read buffer for one connection.
///
/// Three cursors track progress through the buffered bytes. The invariant
/// `0 <= line_start <= scan_pos <= read_end <= capacity` holds at all times:
/// `read_end` is the extent of valid bytes, `scan_pos` is how far the line
/// scanner has looked, and `line_start` is the beginning of the line
/// currently being interpreted.
pub struct ReadBuf {
    buf: Box<[u8]>,
    read_end: usize,
    scan_pos: usize,
    line_start: usize,
}

impl ReadBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            read_end: 0,
            scan_pos: 0,
            line_start: 0,
        }
    }

    /// Rewinds all cursors for the next request on a kept-alive connection.
    pub fn reset(&mut self) {
        self.read_end = 0;
        self.scan_pos = 0;
        self.line_start = 0;
    }

    pub fn is_full(&self) -> bool {
        self.read_end == self.buf.len()
    }

    /// The writable tail of the buffer; pair with [`ReadBuf::commit`].
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.read_end..]
    }

    /// Marks `n` bytes of the spare region as valid data.
    pub fn commit(&mut self, n: usize) {
        debug_assert!(self.read_end + n <= self.buf.len());
        self.read_end += n;
    }

    /// Copies as much of `src` as fits, returning the number of bytes taken.
    pub fn fill(&mut self, src: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = spare.len().min(src.len());
        spare[..n].copy_from_slice(&src[..n]);
        self.commit(n);
        n
    }

    pub fn read_end(&self) -> usize {
        self.read_end
    }

    pub fn scan_pos(&self) -> usize {
        self.scan_pos
    }

    pub fn line_start(&self) -> usize {
        self.line_start
    }

    /// Scans forward from `scan_pos` for a CRLF terminator.
    ///
    /// A `\r` that is the last buffered byte is `Incomplete` (the `\n` may be
    /// in flight), a `\r` followed by anything other than `\n` is
    /// `Malformed`, and a bare `\n` without a preceding `\r` is `Malformed`.
    /// On `Complete` the scanner has consumed the terminator and the line
    /// text is available from [`ReadBuf::take_line`].
    pub fn scan_line(&mut self) -> ScanStatus {
        while self.scan_pos < self.read_end {
            match self.buf[self.scan_pos] {
                b'\r' => {
                    if self.scan_pos + 1 == self.read_end {
                        return ScanStatus::Incomplete;
                    }
                    if self.buf[self.scan_pos + 1] == b'\n' {
                        self.scan_pos += 2;
                        return ScanStatus::Complete;
                    }
                    return ScanStatus::Malformed;
                }
                b'\n' => {
                    if self.scan_pos > 0 && self.buf[self.scan_pos - 1] == b'\r' {
                        self.scan_pos += 1;
                        return ScanStatus::Complete;
                    }
                    return ScanStatus::Malformed;
                }
                _ => self.scan_pos += 1,
            }
        }
        ScanStatus::Incomplete
    }

    /// Returns the line completed by the last scan, excluding its terminator,
    /// and advances `line_start` past it.
    ///
    /// Only meaningful directly after [`ReadBuf::scan_line`] returned
    /// `Complete`. The slice stays address-stable until the buffer is next
    /// written to.
    pub fn take_line(&mut self) -> &[u8] {
        debug_assert!(self.scan_pos >= 2 && self.scan_pos >= self.line_start + 2);
        let start = self.line_start;
        let end = self.scan_pos - 2;
        self.line_start = self.scan_pos;
        &self.buf[start..end]
    }

    /// Bytes buffered beyond the scanned region, i.e. the body so far.
    pub fn body_available(&self) -> usize {
        self.read_end - self.scan_pos
    }

    /// Consumes `n` body bytes without interpreting them.
    pub fn consume_body(&mut self, n: usize) {
        debug_assert!(self.scan_pos + n <= self.read_end);
        self.scan_pos += n;
        self.line_start = self.scan_pos;
    }
}
