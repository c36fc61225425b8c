//! Trait abstraction for side-channel line input to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::SerialStream;

/// Read buffer size for one poll of the underlying channel
const READ_CHUNK_SIZE: usize = 256;

/// A source of newline-terminated text lines
#[async_trait]
pub trait LineSource: Send {
    /// Read the next complete line, without its end-of-line marker
    ///
    /// Returns `Ok(None)` when the channel has closed.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Line splitter over any async byte stream
///
/// Bytes read ahead of the next newline stay buffered across calls, so a
/// caller cancelling a pending `next_line` (poll timeout) loses nothing:
/// a partially received line completes on the next call.
pub struct ReaderLineSource<R> {
    reader: R,
    pending: Vec<u8>,
}

/// Line source over the serial side channel
pub type SerialLineSource = ReaderLineSource<SerialStream>;

impl<R: AsyncRead + Unpin + Send> ReaderLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }

    fn take_buffered_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&raw);
        Some(text.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for ReaderLineSource<R> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(Some(line));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                // Channel closed; anything buffered is an unterminated
                // fragment and is dropped
                return Ok(None);
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}
