//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

// Not every integration test uses all functions
#![allow(dead_code)]

use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
};

use keyed_json_array::charset::Charset;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const EMPTY_ARRAY_PATH: &str = "empty.json";
pub const FILLED_ARRAY_PATH: &str = "filled.json";
pub const CYRILLIC_ARRAY_PATH: &str = "edgesAfterCyrillic.json";
/// UTF-16LE with byte order mark
pub const SPECIAL_CHARSET_ARRAY_PATH: &str = "specialCharset.json";
pub const ARRAY_NOT_FOUND_PATH: &str = "object.json";
pub const SPLIT_TOKEN_PATH: &str = "splitToken.json";

pub fn get_test_data_file_path(name: &str) -> PathBuf {
    // Get path of test file, see https://stackoverflow.com/a/30004252
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/test_data");
    path.push(name);
    path
}

pub fn open_test_data_file(name: &str) -> std::io::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(get_test_data_file_path(name))?))
}

/// Reader which returns at most `chunk_size` bytes per `read` call
pub struct ChunkedReader<R: Read> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0);
        ChunkedReader { reader, chunk_size }
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let max_len = buf.len().min(self.chunk_size);
        self.reader.read(&mut buf[..max_len])
    }
}

pub const FAILING_READER_MESSAGE: &str = "custom error";

/// Reader which provides the data and afterwards fails with an IO error
/// (message [`FAILING_READER_MESSAGE`]) instead of indicating the end of the data
pub struct FailingReader<'a> {
    data: &'a [u8],
}

impl<'a> FailingReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        FailingReader { data }
    }
}

impl Read for FailingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.data.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                FAILING_READER_MESSAGE,
            ));
        }
        self.data.read(buf)
    }
}

/// Reads all data, using a buffer of size `buf_size` for every `read` call
pub fn read_with_buf_size<R: Read>(reader: &mut R, buf_size: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0; buf_size];
    let mut result = Vec::new();
    loop {
        let count = reader.read(&mut buf)?;
        if count == 0 {
            return Ok(result);
        }
        result.extend_from_slice(&buf[..count]);
    }
}

/// Encodes the text in the charset, without byte order mark
pub fn encode(charset: Charset, text: &str) -> Vec<u8> {
    match charset {
        Charset::Utf8 => text.as_bytes().to_vec(),
        Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        Charset::Utf32Le => text
            .chars()
            .flat_map(|c| u32::from(c).to_le_bytes())
            .collect(),
        Charset::Utf32Be => text
            .chars()
            .flat_map(|c| u32::from(c).to_be_bytes())
            .collect(),
    }
}

/// Encodes the text in the charset, with leading byte order mark
pub fn encode_with_bom(charset: Charset, text: &str) -> Vec<u8> {
    let mut bytes = charset.bom().to_vec();
    bytes.extend(encode(charset, text));
    bytes
}
