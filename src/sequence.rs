//! Lazy decoding of the filtered array with [Serde](https://docs.rs/serde/latest/serde/)
//!
//! [`decode_array_to_sequence`] filters a JSON document down to the array of one object member
//! and returns an [`ArraySequence`], an iterator which deserializes one array item at a time.
//! Neither the document nor the array are loaded into memory completely.
//!
//! To enable this optional integration, specify the `serde` feature (enabled by default)
//! for the dependency on this crate.
//!
//! # Examples
//! ```
//! # use keyed_json_array::sequence::decode_array_to_sequence;
//! #[derive(serde::Deserialize, PartialEq, Debug)]
//! struct Edge {
//!     from: u32,
//!     to: u32,
//! }
//!
//! // In this example JSON data comes from a string;
//! // normally it would come from a file or a network connection
//! let json = r#"{"nodes": [1, 2, 3], "edges": [{"from": 1, "to": 2}, {"from": 2, "to": 3}]}"#;
//! let edges = decode_array_to_sequence::<Edge, _>(json.as_bytes(), "edges")?;
//!
//! let edges = edges.collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(vec![Edge { from: 1, to: 2 }, Edge { from: 2, to: 3 }], edges);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fmt::Debug, io::Read, marker::PhantomData};

use serde::de::DeserializeOwned;
use struson::{
    reader::{JsonReader, JsonStreamReader, ReaderError},
    serde::DeserializerError,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    charset::Charset,
    filter::{FilterSettings, KeyError, TokenArrayReader},
    source::{PeekRead, PeekReader},
    transcode::DecodingReader,
};

type IoError = std::io::Error;

/// Error which occurred while decoding the array
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The key cannot be used for filtering
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
    /// The end of the data was reached without finding the key
    #[error("no array found for key {key:?}")]
    NoArrayBody {
        /// The key which was not found
        key: String,
    },
    /// An IO error occurred while searching for the key
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    /// The JSON reader failed, for example because the value of the key is not an array
    #[error("reader error: {0}")]
    ReaderError(#[from] ReaderError),
    /// An array item could not be deserialized
    #[error("deserializer error: {0}")]
    DeserializerError(#[from] DeserializerError),
}

/// Filtered data, converted to UTF-8 if necessary
enum SequenceInput<S: PeekRead> {
    Utf8(TokenArrayReader<S>),
    Decoded(DecodingReader<TokenArrayReader<S>>),
}

impl<S: PeekRead> Read for SequenceInput<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SequenceInput::Utf8(reader) => reader.read(buf),
            SequenceInput::Decoded(reader) => reader.read(buf),
        }
    }
}

/// Iterator over the deserialized items of a filtered JSON array
///
/// Items are read and deserialized lazily, one per call to [`next`](Iterator::next). The
/// iterator can only be consumed once; after the end of the array or after an error it only
/// returns `None`.
pub struct ArraySequence<T, S: PeekRead> {
    /// `None` once the end of the array or an error was reached
    json_reader: Option<JsonStreamReader<SequenceInput<S>>>,
    index: usize,
    _item: PhantomData<fn() -> T>,
}

/// Decodes the items of the array of the member `key` of a JSON document
///
/// This is a convenience function for [`ArraySequence::new`] with [default settings](FilterSettings::default).
///
/// # Errors
/// Returns an error if `key` is invalid, if `key` is not found or if its value is not a
/// JSON array.
pub fn decode_array_to_sequence<T: DeserializeOwned, R: Read>(
    reader: R,
    key: &str,
) -> Result<ArraySequence<T, PeekReader<R>>, DecodeError> {
    decode_array_to_sequence_custom(reader, key, FilterSettings::default())
}

/// Decodes the items of the array of the member `key` of a JSON document, with custom settings
///
/// # Errors
/// Returns an error if `key` is invalid, if `key` is not found or if its value is not a
/// JSON array.
pub fn decode_array_to_sequence_custom<T: DeserializeOwned, R: Read>(
    reader: R,
    key: &str,
    settings: FilterSettings,
) -> Result<ArraySequence<T, PeekReader<R>>, DecodeError> {
    ArraySequence::new(TokenArrayReader::new_custom(reader, key, settings)?)
}

impl<T: DeserializeOwned, S: PeekRead> ArraySequence<T, S> {
    /// Creates a sequence for the array of an existing filtering reader
    ///
    /// The reader must not have been read from yet. This searches for the key and consumes
    /// the opening bracket of the array; the items themselves are only read when iterating.
    ///
    /// # Errors
    /// Returns [`DecodeError::NoArrayBody`] if the key is not found, and an error of the
    /// JSON reader if the value of the key is not a JSON array.
    pub fn new(mut filter: TokenArrayReader<S>) -> Result<Self, DecodeError> {
        if !filter.find_array()? {
            return Err(DecodeError::NoArrayBody {
                key: filter.key().to_owned(),
            });
        }

        let input = match filter.charset()? {
            Charset::Utf8 => SequenceInput::Utf8(filter),
            charset => {
                debug!(%charset, "decoding filtered array as UTF-8");
                SequenceInput::Decoded(DecodingReader::new(filter, charset))
            }
        };
        let mut json_reader = JsonStreamReader::new(input);
        json_reader.begin_array()?;

        Ok(ArraySequence {
            json_reader: Some(json_reader),
            index: 0,
            _item: PhantomData,
        })
    }
}

impl<T: DeserializeOwned, S: PeekRead> ArraySequence<T, S> {
    fn next_item(
        json_reader: &mut JsonStreamReader<SequenceInput<S>>,
    ) -> Result<Option<T>, DecodeError> {
        if json_reader.has_next()? {
            Ok(Some(json_reader.deserialize_next()?))
        } else {
            json_reader.end_array()?;
            Ok(None)
        }
    }
}

impl<T: DeserializeOwned, S: PeekRead> Iterator for ArraySequence<T, S> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let json_reader = self.json_reader.as_mut()?;
        match Self::next_item(json_reader) {
            Ok(Some(item)) => {
                self.index += 1;
                Some(Ok(item))
            }
            Ok(None) => {
                debug!(items = self.index, "decoded all array items");
                // Filtered data ends with the closing bracket, so this only fails for malformed data
                let json_reader = self.json_reader.take()?;
                json_reader
                    .consume_trailing_whitespace()
                    .err()
                    .map(|e| Err(e.into()))
            }
            Err(e) => {
                self.json_reader = None;
                Some(Err(e))
            }
        }
    }
}

impl<T, S: PeekRead> std::iter::FusedIterator for ArraySequence<T, S> where T: DeserializeOwned {}

impl<T, S: PeekRead> Debug for ArraySequence<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArraySequence")
            .field("index", &self.index)
            .field("finished", &self.json_reader.is_none())
            .finish()
    }
}
