//! Size-limited payload reading.

use std::error::Error;
use std::fmt;
use std::io::{self, Read};

use talos_core::ContentError;

/// Marker error surfaced through `io::Error` when a read crosses the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitExceeded {
    /// The configured byte cap.
    pub limit: u64,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload exceeds {} bytes", self.limit)
    }
}

impl Error for LimitExceeded {}

/// A reader that fails as soon as more than `limit` bytes are produced.
///
/// Unlike `std::io::Take`, exceeding the cap is an error rather than a
/// silent truncation: the first read past the limit probes the inner reader
/// and raises [`LimitExceeded`] if any byte remains. This bounds memory for
/// untrusted payloads without buffering them first.
pub struct LimitedReader<R> {
    inner: R,
    remaining: u64,
    limit: u64,
}

impl<R: Read> LimitedReader<R> {
    /// Caps `inner` at `limit` bytes.
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            limit,
        }
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let mut probe = [0_u8; 1];
            return if self.inner.read(&mut probe)? == 0 {
                Ok(0)
            } else {
                Err(io::Error::other(LimitExceeded { limit: self.limit }))
            };
        }
        let cap = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = self.inner.read(&mut buf[..cap])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Maps a payload read failure onto the content error taxonomy.
///
/// Limit violations become [`ContentError::PayloadTooLarge`]; decode-level
/// failures (bad Base64 and the like surface as `InvalidData`) become
/// [`ContentError::Malformed`]; anything else stays an I/O error.
#[must_use]
pub fn map_read_error(err: io::Error) -> ContentError {
    if let Some(exceeded) = err.get_ref().and_then(|e| e.downcast_ref::<LimitExceeded>()) {
        return ContentError::PayloadTooLarge {
            limit: exceeded.limit,
        };
    }
    if err.kind() == io::ErrorKind::InvalidData {
        return ContentError::Malformed {
            message: err.to_string(),
        };
    }
    ContentError::Io(err)
}
