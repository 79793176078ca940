//! Module for sources which allow looking ahead at data before consuming it
//!
//! [`TokenArrayReader`](crate::filter::TokenArrayReader) decides what to do with bytes only after
//! it has inspected them, so instead of a plain [`Read`] it requires a [`PeekRead`]. Any `Read`
//! can be turned into one with [`PeekReader`].

use std::io::{ErrorKind, Read};

type IoError = std::io::Error;

/// A source of bytes which supports peeking at upcoming bytes before consuming them
///
/// Reading happens in two phases: First [`peek`](Self::peek) makes the next bytes available
/// without consuming them, then [`consume`](Self::consume) commits to a number of those bytes.
/// Peeked bytes which are not consumed are returned again by the next `peek` call.
pub trait PeekRead {
    /// Peeks at the next `len` bytes without consuming them
    ///
    /// Fewer than `len` bytes are only returned if the end of the data has been reached.
    /// An empty slice is returned if there is no data left.
    ///
    /// # Errors
    /// Errors from the underlying data source are returned unchanged.
    fn peek(&mut self, len: usize) -> Result<&[u8], IoError>;

    /// Consumes `count` bytes
    ///
    /// # Panics
    /// Panics if `count` is larger than the number of bytes returned by the last
    /// [`peek`](Self::peek) call.
    fn consume(&mut self, count: usize);
}

impl PeekRead for &[u8] {
    fn peek(&mut self, len: usize) -> Result<&[u8], IoError> {
        Ok(&self[..len.min(self.len())])
    }

    fn consume(&mut self, count: usize) {
        *self = &self[count..];
    }
}

const INITIAL_BUF_CAPACITY: usize = 1024;

/// A [`PeekRead`] which buffers the data of a [`Read`]
///
/// The internal buffer grows as needed to hold the peeked bytes. If the underlying reader
/// returns an error of kind [`ErrorKind::Interrupted`], this reader will keep retrying to
/// read data.
pub struct PeekReader<R: Read> {
    reader: R,
    buf: Vec<u8>,
    /// Start index (inclusive) at which not yet consumed data in [`buf`](Self::buf) starts
    buf_pos: usize,
    reached_eof: bool,
}

impl<R: Read> PeekReader<R> {
    /// Creates a peek reader for the given reader
    pub fn new(reader: R) -> Self {
        PeekReader {
            reader,
            buf: Vec::with_capacity(INITIAL_BUF_CAPACITY),
            buf_pos: 0,
            reached_eof: false,
        }
    }

    /// Gets the underlying reader
    ///
    /// Buffered data which has been peeked but not consumed yet is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn available(&self) -> usize {
        self.buf.len() - self.buf_pos
    }

    /// Reads from the underlying reader until at least `len` bytes are buffered or the end
    /// of the data has been reached
    fn fill_buffer(&mut self, len: usize) -> Result<(), IoError> {
        if self.buf_pos > 0 {
            self.buf.drain(..self.buf_pos);
            self.buf_pos = 0;
        }

        let mut chunk = [0_u8; INITIAL_BUF_CAPACITY];
        while !self.reached_eof && self.buf.len() < len {
            let max_count = (len - self.buf.len()).min(chunk.len());
            let read_bytes_count = match self.reader.read(&mut chunk[..max_count]) {
                Ok(read_bytes_count) => read_bytes_count,
                // Retry if interrupted
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if read_bytes_count == 0 {
                self.reached_eof = true;
            } else {
                self.buf.extend_from_slice(&chunk[..read_bytes_count]);
            }
        }
        Ok(())
    }
}

impl<R: Read> PeekRead for PeekReader<R> {
    fn peek(&mut self, len: usize) -> Result<&[u8], IoError> {
        if self.available() < len {
            self.fill_buffer(len)?;
        }
        let end = self.buf_pos + len.min(self.available());
        Ok(&self.buf[self.buf_pos..end])
    }

    fn consume(&mut self, count: usize) {
        assert!(
            count <= self.available(),
            "Cannot consume {count} bytes, only {} are available",
            self.available()
        );
        self.buf_pos += count;
    }
}

impl<R: Read + std::fmt::Debug> std::fmt::Debug for PeekReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeekReader")
            .field("reader", &self.reader)
            .field("buf_count", &self.available())
            .field("reached_eof", &self.reached_eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Reader which returns at most `chunk_size` bytes per call, and an
    /// [`ErrorKind::Interrupted`] error before every chunk
    struct InterruptingReader<'a> {
        data: &'a [u8],
        chunk_size: usize,
        interrupt: bool,
    }

    impl Read for InterruptingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(IoError::from(ErrorKind::Interrupted));
            }
            let count = self.chunk_size.min(buf.len()).min(self.data.len());
            buf[..count].copy_from_slice(&self.data[..count]);
            self.data = &self.data[count..];
            Ok(count)
        }
    }

    #[test]
    fn peek_consume() -> TestResult {
        let mut reader = PeekReader::new(InterruptingReader {
            data: b"abcdefgh",
            chunk_size: 3,
            interrupt: false,
        });

        assert_eq!(b"abcde", reader.peek(5)?);
        // Peeking again returns the same data
        assert_eq!(b"ab", reader.peek(2)?);
        reader.consume(2);
        assert_eq!(b"cdefgh", reader.peek(20)?);
        reader.consume(6);
        assert_eq!(b"", reader.peek(1)?);
        Ok(())
    }

    #[test]
    fn peek_io_error() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(IoError::new(ErrorKind::Other, "custom error"))
            }
        }

        let mut reader = PeekReader::new(FailingReader);
        match reader.peek(1) {
            Err(e) => assert_eq!("custom error", e.to_string()),
            r => panic!("Unexpected result: {r:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "Cannot consume 3 bytes, only 2 are available")]
    fn consume_too_much() {
        let mut reader = PeekReader::new("ab".as_bytes());
        let _ = reader.peek(2);
        reader.consume(3);
    }

    #[test]
    fn slice_peek_consume() -> TestResult {
        let mut source: &[u8] = b"abc";
        assert_eq!(b"ab", source.peek(2)?);
        source.consume(1);
        assert_eq!(b"bc", source.peek(5)?);
        Ok(())
    }
}
