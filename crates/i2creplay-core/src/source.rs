use crate::error::Result;
use std::io::BufRead;

/// A stream of raw analyzer output lines.
pub trait LineSource {
    /// Replace `buf` with the next line, terminator included.
    /// Returns `false` once the stream has ended.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool>;
}

/// Lines from any buffered reader, e.g. locked stdin or a capture file.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.clear();
        Ok(self.reader.read_until(b'\n', buf)? > 0)
    }
}
