//! URL percent-encoding of path segments.
//!
//! `decode` is applied to incoming request paths before resolution; `encode`
//! is only used when rendering directory-entry links. The two are inverses
//! for any byte sequence containing no NUL.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Decodes `%XX` escapes in place, shrinking the buffer.
///
/// A `%` followed by two hex digits is replaced by the decoded byte; every
/// other byte passes through unchanged, including `%` sequences with invalid
/// or missing digits.
pub fn decode(buf: &mut Vec<u8>) {
    let mut read = 0;
    let mut write = 0;
    while read < buf.len() {
        if buf[read] == b'%' && read + 2 < buf.len() {
            if let (Some(hi), Some(lo)) = (hex_value(buf[read + 1]), hex_value(buf[read + 2])) {
                buf[write] = hi * 16 + lo;
                read += 3;
                write += 1;
                continue;
            }
        }
        buf[write] = buf[read];
        read += 1;
        write += 1;
    }
    buf.truncate(write);
}

/// Percent-encodes a raw name for use as an href target.
///
/// Alphanumeric bytes and `/ _ . - ~` pass through; everything else becomes
/// a lowercase `%XX` escape.
pub fn encode(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &b in raw {
        if b.is_ascii_alphanumeric() || matches!(b, b'/' | b'_' | b'.' | b'-' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
