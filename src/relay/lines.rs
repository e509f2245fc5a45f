//! Newline-delimited reader over the upstream body
//!
//! The body arrives in arbitrary network chunks. It is adapted into an
//! `AsyncBufRead` and read back one line at a time without waiting for the
//! whole response.

use crate::relay::error::RelayError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, Take};

/// Longest line accepted from the upstream, terminator included
pub const MAX_LINE_BYTES: u64 = 1024 * 1024;

/// Line reader over any buffered async source
///
/// Wrap a byte stream with `tokio_util::io::StreamReader` first.
pub struct LineReader<R> {
    inner: Take<R>,
    buffer: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wrap a buffered reader
    pub fn new(inner: R) -> Self {
        Self {
            inner: inner.take(MAX_LINE_BYTES),
            buffer: Vec::new(),
        }
    }

    /// Read the next line, without its terminator
    ///
    /// Returns `Ok(None)` once the source is exhausted. A trailing line with
    /// no newline is still returned. Invalid UTF-8 is replaced rather than
    /// rejected; such lines fail JSON parsing later and get skipped.
    pub async fn next_line(&mut self) -> Result<Option<String>, RelayError> {
        self.buffer.clear();
        self.inner.set_limit(MAX_LINE_BYTES);

        let read = self
            .inner
            .read_until(b'\n', &mut self.buffer)
            .await
            .map_err(|e| RelayError::Read(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        } else if read as u64 == MAX_LINE_BYTES {
            return Err(RelayError::Read(format!("line exceeds {} bytes", MAX_LINE_BYTES)));
        }

        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}
