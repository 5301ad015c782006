//! Assembly of newline-terminated lines from raw serial data.

use tracing::warn;

/// Longest run of bytes without a newline that is kept.
pub const MAX_LINE_LEN: usize = 4096;

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer::default()
    }

    /// Appends data received from the device.
    ///
    /// An unterminated line longer than [`MAX_LINE_LEN`] is discarded. Complete lines are kept.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);

        let start = self.buf.iter().rposition(|&c| c == b'\n').map_or(0, |end| end + 1);
        let partial = self.buf.len() - start;
        if partial > MAX_LINE_LEN {
            warn!("Discarding {} bytes of serial data without a line ending", partial);
            self.buf.truncate(start);
        }
    }

    /// Removes and returns the oldest complete line without its terminator, or `None` if no
    /// newline has been received yet. Invalid UTF-8 is replaced.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&c| c == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=end).collect();
        let line = String::from_utf8_lossy(&line);

        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Returns the number of buffered bytes that are not yet part of a complete line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
