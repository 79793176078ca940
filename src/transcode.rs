//! Module for converting data in other charsets to UTF-8
//!
//! JSON readers such as the one of the `struson` crate expect UTF-8 data, but the filtered
//! array is provided in the charset of the source document.

use std::io::{ErrorKind, Read};

use crate::charset::Charset;

const READ_BUF_SIZE: usize = 1024;

/// A reader which decodes data in a specific charset and provides it as UTF-8
///
/// Malformed data is replaced with the Unicode replacement character `U+FFFD`.
/// If the underlying reader returns an error of kind [`ErrorKind::Interrupted`], this
/// reader will keep retrying to read data.
///
/// # Examples
/// ```
/// # use std::io::Read;
/// # use keyed_json_array::{charset::Charset, transcode::DecodingReader};
/// let utf16: Vec<u8> = "[\"\u{e4}\"]".encode_utf16().flat_map(u16::to_le_bytes).collect();
/// let mut reader = DecodingReader::new(utf16.as_slice(), Charset::Utf16Le);
///
/// let mut decoded = String::new();
/// reader.read_to_string(&mut decoded)?;
/// assert_eq!("[\"\u{e4}\"]", decoded);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct DecodingReader<R: Read> {
    reader: R,
    charset: Charset,
    /// Source bytes which have been read but not decoded yet
    undecoded: Vec<u8>,
    /// UTF-8 bytes which have been decoded but not read yet
    decoded: Vec<u8>,
    decoded_pos: usize,
    reached_eof: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Creates a reader which decodes the data of `reader` using `charset`
    pub fn new(reader: R, charset: Charset) -> Self {
        DecodingReader {
            reader,
            charset,
            undecoded: Vec::new(),
            decoded: Vec::new(),
            decoded_pos: 0,
            reached_eof: false,
        }
    }

    /// Gets the charset the data is decoded from
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Reads and decodes more data; returns `false` if the end of the data has been reached
    fn decode_more(&mut self) -> std::io::Result<bool> {
        while !self.reached_eof {
            let mut buf = [0_u8; READ_BUF_SIZE];
            let read_bytes_count = match self.reader.read(&mut buf) {
                Ok(read_bytes_count) => read_bytes_count,
                // Retry if interrupted
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.reached_eof = read_bytes_count == 0;
            self.undecoded.extend_from_slice(&buf[..read_bytes_count]);

            let window = self
                .charset
                .decode_window(&self.undecoded, self.reached_eof);
            self.undecoded.drain(..window.byte_len());
            if !window.text().is_empty() {
                self.decoded.clear();
                self.decoded.extend_from_slice(window.text().as_bytes());
                self.decoded_pos = 0;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.decoded_pos >= self.decoded.len() && !self.decode_more()? {
            return Ok(0);
        }

        let available = &self.decoded[self.decoded_pos..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.decoded_pos += count;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader which returns a single byte per call
    struct ByteReader<'a>(&'a [u8]);

    impl Read for ByteReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.split_first() {
                Some((b, rest)) if !buf.is_empty() => {
                    buf[0] = *b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn decode_split_chars() -> std::io::Result<()> {
        let text = "[\"\u{1D11E}\", \"\u{0424}\"]";
        let utf32: Vec<u8> = text
            .chars()
            .flat_map(|c| u32::from(c).to_be_bytes())
            .collect();

        let mut reader = DecodingReader::new(ByteReader(&utf32), Charset::Utf32Be);
        assert_eq!(Charset::Utf32Be, reader.charset());
        let mut decoded = String::new();
        reader.read_to_string(&mut decoded)?;
        assert_eq!(text, decoded);
        Ok(())
    }

    #[test]
    fn decode_incomplete_end() -> std::io::Result<()> {
        let mut reader = DecodingReader::new(&b"a\x00b"[..], Charset::Utf16Le);
        let mut decoded = String::new();
        reader.read_to_string(&mut decoded)?;
        assert_eq!("a\u{FFFD}", decoded);
        Ok(())
    }
}
