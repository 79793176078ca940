#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]
// When `docsrs` configuration flag is set enable banner for features in documentation
// See https://stackoverflow.com/q/61417452
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Keyed JSON Array extracts the array value of a single object member from a JSON document
//! in a streaming way.
//!
//! Its main purpose is processing one field of a huge JSON document without having to store
//! the complete document in memory, and without having to parse the parts of the document
//! which are not of interest. The member is selected by its name (the _key_); the JSON data
//! is searched for the text `"key":` and afterwards the array which follows it is provided,
//! up to its closing bracket.
//!
//! This crate does *not* parse JSON. For decoding the items of the filtered array, the
//! [Struson](https://docs.rs/struson/latest/struson/) JSON reader and
//! [Serde](https://docs.rs/serde/latest/serde/) are used, see the [`sequence`] module.
//!
//! # Terminology
//!
//! - *key*: Name of the JSON object member whose value is the array, for example `names` for
//!   `{"names": ["a", "b"]}`
//! - *window*: Bytes which are inspected at once; the key or the end of the array can be
//!   split across multiple windows
//! - *byte order mark* (BOM): Bytes at the start of the data indicating its charset
//!
//! # Usage examples
//!
//! ## Filtering
//!
//! ```
//! # use std::io::Read;
//! # use keyed_json_array::filter::TokenArrayReader;
//! // In this example JSON data comes from a string;
//! // normally it would come from a file or a network connection
//! let json = r#"{"first": [1, 2], "names": ["a", "b"], "last": {}}"#;
//! let mut reader = TokenArrayReader::new(json.as_bytes(), "names")?;
//!
//! let mut array = String::new();
//! reader.read_to_string(&mut array)?;
//! assert_eq!(r#"["a", "b"]"#, array);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Decoding
//!
//! ```
//! # use keyed_json_array::sequence::decode_array_to_sequence;
//! let json = r#"{"first": [1, 2], "names": ["a", "b"], "last": {}}"#;
//! let mut names = decode_array_to_sequence::<String, _>(json.as_bytes(), "names")?;
//!
//! assert_eq!("a", names.next().unwrap()?);
//! assert_eq!("b", names.next().unwrap()?);
//! assert!(names.next().is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod charset;
pub mod filter;
pub mod source;
pub mod transcode;

#[cfg(feature = "serde")]
pub mod sequence;
