//! Module for filtering a JSON document down to a single array
//!
//! [`TokenArrayReader`] wraps the data of a JSON document and, when read, only provides the
//! bytes of the array value of one specific object member. Everything in front of the member
//! name, the member name itself and everything after the closing `]` of the array is skipped.
//!
//! # Examples
//! ```
//! # use std::io::Read;
//! # use keyed_json_array::filter::TokenArrayReader;
//! let json = r#"{"count": 2, "names": ["a", ["b"]], "other": [3]}"#;
//! let mut reader = TokenArrayReader::new(json.as_bytes(), "names")?;
//!
//! let mut array = String::new();
//! reader.read_to_string(&mut array)?;
//! assert_eq!(r#"["a", ["b"]]"#, array);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Read;

use tracing::{debug, trace};

use self::depth::{ArrayDepth, ArrayScan};
use self::matcher::{KeyMatch, KeyPattern};
use crate::charset::{Charset, BOM_PEEK_LEN, MAX_BYTES_PER_CHAR};
use crate::source::{PeekRead, PeekReader};

mod depth;
mod matcher;

pub use matcher::KeyError;

type IoError = std::io::Error;

/// Minimum size of a window; ensures that every window can hold at least one char
const MIN_WINDOW_SIZE: usize = 4 * MAX_BYTES_PER_CHAR;

/// Current state of a [`TokenArrayReader`]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum StreamMode {
    /// The member name has not been found yet
    Searching,
    /// The member name has been found, and the bytes of the array are provided
    InArray,
    /// The closing bracket of the array has been found; no further bytes are provided
    /// once the remaining bytes of the array have been read
    Done,
}

/// Settings to customize the filtering behavior
///
/// These settings are used by [`TokenArrayReader::new_custom`]. To avoid repeating the
/// default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use keyed_json_array::{charset::Charset, filter::FilterSettings};
/// FilterSettings {
///     default_charset: Charset::Utf16Le,
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
pub struct FilterSettings {
    /// Charset of the data in case it does not start with a byte order mark
    pub default_charset: Charset,

    /// Whether to detect the charset from a byte order mark at the start of the data
    ///
    /// When enabled and a byte order mark is present, the mark is skipped and is not part
    /// of the filtered bytes. When disabled [`default_charset`](Self::default_charset) is
    /// always used.
    pub detect_bom: bool,

    /// Minimum number of bytes which are inspected at once
    ///
    /// Larger windows reduce the number of times data is decoded, but require more memory
    /// for buffering. Values smaller than 16 are treated as 16.
    pub min_window_size: usize,
}

impl Default for FilterSettings {
    /// Creates the default filter settings
    ///
    /// - default charset: UTF-8
    /// - detect BOM: enabled
    /// - min window size: 1024 bytes
    fn default() -> Self {
        FilterSettings {
            default_charset: Charset::Utf8,
            detect_bom: true,
            min_window_size: 1024,
        }
    }
}

/// Returns the index behind the last word separator in `text`, or the length of `text` if
/// it contains no word separator
///
/// Cutting `text` at this index does not split any word of it.
fn safe_boundary(text: &str) -> usize {
    text.char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || c.is_control())
        .map_or(text.len(), |(index, c)| index + c.len_utf8())
}

/// A reader which only provides the bytes of the JSON array value of one object member
///
/// The reader searches the data of the underlying source for the member name (the _key_) in
/// the form `"key":`, optionally followed by a single space. Afterwards it provides all bytes
/// up to and including the `]` which closes the array. Reading any further returns end of
/// data, even if the underlying source has more data. If the key is not found, no bytes at all
/// are provided.
///
/// The bytes are provided in the charset of the source data, except that a leading byte
/// order mark is removed. Which bytes are provided does not depend on the size of the buffers
/// used for reading.
///
/// # Limitations
/// This reader does not parse the JSON document, it only searches for text patterns:
/// - The first occurrence of the key pattern is used, even if it is part of a string value
///   or belongs to a nested object.
/// - Only square brackets are used to find the end of the array. Unpaired brackets within
///   string values of the array lead to an incorrect end.
/// - If the member value is not an array, the provided bytes are not a JSON array either.
pub struct TokenArrayReader<S: PeekRead> {
    source: S,
    pattern: KeyPattern,
    settings: FilterSettings,
    /// `None` until the charset has been detected
    charset: Option<Charset>,
    mode: StreamMode,
    depth: ArrayDepth,
    /// Number of bytes at the start of `source` which have been classified as part of the
    /// array but have not been read yet
    pending: usize,
    window_size: usize,
}

impl<R: Read> TokenArrayReader<PeekReader<R>> {
    /// Creates a reader for the array of the member `key`, with [default settings](FilterSettings::default)
    ///
    /// `key` may be enclosed in double quotes, for example `names` and `"names"` are equivalent.
    ///
    /// # Errors
    /// Returns an error if `key` contains whitespace.
    pub fn new(reader: R, key: &str) -> Result<Self, KeyError> {
        TokenArrayReader::new_custom(reader, key, FilterSettings::default())
    }

    /// Creates a reader for the array of the member `key`, with custom settings
    ///
    /// # Errors
    /// Returns an error if `key` contains whitespace.
    pub fn new_custom(reader: R, key: &str, settings: FilterSettings) -> Result<Self, KeyError> {
        TokenArrayReader::with_source(PeekReader::new(reader), key, settings)
    }
}

impl<S: PeekRead> TokenArrayReader<S> {
    /// Creates a reader for the array of the member `key` from a source which supports peeking
    ///
    /// # Errors
    /// Returns an error if `key` contains whitespace.
    pub fn with_source(source: S, key: &str, settings: FilterSettings) -> Result<Self, KeyError> {
        let pattern = KeyPattern::new(key)?;
        let window_size = settings.min_window_size.max(MIN_WINDOW_SIZE);
        Ok(TokenArrayReader {
            source,
            pattern,
            settings,
            charset: None,
            mode: StreamMode::Searching,
            depth: ArrayDepth::default(),
            pending: 0,
            window_size,
        })
    }

    /// Gets the key, without surrounding quotes
    pub fn key(&self) -> &str {
        self.pattern.key()
    }

    /// Gets the current mode
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Gets the underlying source
    ///
    /// The source is positioned behind the last byte which has been read or skipped.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Gets the charset of the data
    ///
    /// If the charset has not been detected yet, this peeks at the start of the data
    /// and skips a byte order mark, if present.
    ///
    /// # Errors
    /// Errors from the underlying source are returned unchanged.
    pub fn charset(&mut self) -> Result<Charset, IoError> {
        if let Some(charset) = self.charset {
            return Ok(charset);
        }

        let mut charset = self.settings.default_charset;
        if self.settings.detect_bom {
            if let Some(detected) = Charset::detect_bom(self.source.peek(BOM_PEEK_LEN)?) {
                self.source.consume(detected.bom().len());
                charset = detected;
            }
        }
        debug!(%charset, "determined charset");
        self.charset = Some(charset);
        Ok(charset)
    }

    /// Skips data until the key has been found
    ///
    /// Returns whether the key was found; if `false` the end of the data was reached
    /// without finding the key. Calling this method is not necessary before reading, but it
    /// allows checking whether the array exists before processing it.
    ///
    /// # Errors
    /// Errors from the underlying source are returned unchanged.
    pub fn find_array(&mut self) -> Result<bool, IoError> {
        while self.mode == StreamMode::Searching {
            if !self.classify_next_window(0)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Inspects the next window of data and either skips or approves bytes
    ///
    /// Returns `false` if no further bytes are available.
    fn classify_next_window(&mut self, requested_len: usize) -> Result<bool, IoError> {
        debug_assert_eq!(0, self.pending);
        let charset = self.charset()?;

        let window_size = self.window_size.max(requested_len);
        let bytes = self.source.peek(window_size)?;
        if bytes.is_empty() {
            if self.mode == StreamMode::Searching {
                debug!(key = self.key(), "reached end of data without finding key");
            }
            return Ok(false);
        }
        let is_end = bytes.len() < window_size;
        let window = charset.decode_window(bytes, is_end);

        let safe_len = safe_boundary(window.text());
        let text = &window.text()[..safe_len];
        trace!(mode = %self.mode, bytes = window.byte_len(), text, "classifying window");

        match self.mode {
            StreamMode::InArray => match self.depth.scan(text) {
                ArrayScan::Complete(end_index) => {
                    debug!("found end of array");
                    self.mode = StreamMode::Done;
                    // Include the closing bracket
                    self.pending = window.byte_offset(end_index + 1);
                }
                ArrayScan::Continues => {
                    self.pending = window.byte_offset(safe_len);
                }
            },
            StreamMode::Searching => match self.pattern.find(text, is_end) {
                KeyMatch::Found(end_index) => {
                    debug!(key = self.key(), "found key");
                    let skipped = window.byte_offset(end_index);
                    self.source.consume(skipped);
                    self.mode = StreamMode::InArray;
                    self.depth = ArrayDepth::default();
                }
                KeyMatch::NotFound { keep_from } => {
                    let skipped = window.byte_offset(keep_from);
                    if skipped > 0 {
                        self.source.consume(skipped);
                    } else if is_end {
                        // Remaining data cannot be decoded into anything useful
                        let remaining = window.byte_len();
                        self.source.consume(remaining);
                        return Ok(remaining > 0);
                    } else {
                        // The complete window might be the start of the key
                        self.window_size *= 2;
                    }
                }
            },
            StreamMode::Done => return Ok(false),
        }
        Ok(true)
    }
}

impl<S: PeekRead> Read for TokenArrayReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.pending > 0 {
                let bytes = self.source.peek(self.pending.min(buf.len()))?;
                let count = bytes.len();
                buf[..count].copy_from_slice(bytes);
                self.source.consume(count);
                self.pending -= count;
                return Ok(count);
            }
            if self.mode == StreamMode::Done {
                return Ok(0);
            }
            if !self.classify_next_window(buf.len())? {
                return Ok(0);
            }
        }
    }
}

impl<S: PeekRead + std::fmt::Debug> std::fmt::Debug for TokenArrayReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenArrayReader")
            .field("source", &self.source)
            .field("key", &self.pattern.key())
            .field("charset", &self.charset)
            .field("mode", &self.mode)
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .field("settings", &self.settings)
            .finish()
    }
}
