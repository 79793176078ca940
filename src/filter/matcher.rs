//! Matching of the member name which precedes the array

use thiserror::Error;

/// Error for a member name which cannot be used for filtering
#[non_exhaustive]
#[derive(Error, PartialEq, Eq, Clone, Debug)]
pub enum KeyError {
    /// The key contains whitespace
    ///
    /// The key is matched as exact text in the JSON data, so whitespace in it would make
    /// matching depend on the formatting of the document.
    #[error("key must not contain whitespace: {key:?}")]
    ContainsWhitespace {
        /// The rejected key
        key: String,
    },
}

/// Result of searching for the key in a text window
#[derive(PartialEq, Eq, Debug)]
pub(crate) enum KeyMatch {
    /// Key was found; contains the index right behind `"key":` and the optional space
    Found(usize),
    /// Key was not found; text starting at `keep_from` might be the start of the key
    /// and must be searched again once more data is available
    NotFound { keep_from: usize },
}

/// The key formatted as JSON member name, for example `"names":`
#[derive(Clone, Debug)]
pub(crate) struct KeyPattern {
    key: String,
    pattern: String,
}

const QUOTE: char = '"';

impl KeyPattern {
    /// Creates the pattern for a key, with or without surrounding double quotes
    pub(crate) fn new(key: &str) -> Result<Self, KeyError> {
        if key.chars().any(char::is_whitespace) {
            return Err(KeyError::ContainsWhitespace {
                key: key.to_owned(),
            });
        }

        let key = key
            .strip_prefix(QUOTE)
            .and_then(|k| k.strip_suffix(QUOTE))
            .unwrap_or(key);
        Ok(KeyPattern {
            key: key.to_owned(),
            pattern: format!("{QUOTE}{key}{QUOTE}:"),
        })
    }

    /// The key without surrounding quotes
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Searches for the first occurrence of the pattern in `text`
    ///
    /// `is_end` indicates whether `text` is the end of the data; otherwise a match at the
    /// very end of `text` is not reported, since it cannot be determined yet whether the
    /// optional space follows it.
    pub(crate) fn find(&self, text: &str, is_end: bool) -> KeyMatch {
        if let Some(start) = text.find(&self.pattern) {
            let mut end = start + self.pattern.len();
            if text[end..].starts_with(' ') {
                end += 1;
            } else if end == text.len() && !is_end {
                return KeyMatch::NotFound { keep_from: start };
            }
            return KeyMatch::Found(end);
        }

        if is_end {
            return KeyMatch::NotFound {
                keep_from: text.len(),
            };
        }
        // Only a proper prefix of the pattern can be a match which continues in the next window
        let min_start = text.len().saturating_sub(self.pattern.len() - 1);
        let keep_from = text
            .char_indices()
            .map(|(index, _)| index)
            .filter(|index| *index >= min_start)
            .find(|index| self.pattern.starts_with(&text[*index..]))
            .unwrap_or(text.len());
        KeyMatch::NotFound { keep_from }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(key: &str) -> KeyPattern {
        KeyPattern::new(key).unwrap()
    }

    #[test]
    fn new_invalid() {
        for key in ["a b", " a", "a\n", "\t", "\u{2003}"] {
            assert_eq!(
                Err(KeyError::ContainsWhitespace {
                    key: key.to_owned()
                }),
                KeyPattern::new(key).map(|p| p.key().to_owned()),
                "For {key:?}"
            );
        }
    }

    #[test]
    fn new_strips_quotes() {
        assert_eq!("names", pattern("names").key());
        assert_eq!("names", pattern("\"names\"").key());
        assert_eq!("", pattern("\"\"").key());
        // Only stripped if present on both sides
        assert_eq!("\"names", pattern("\"names").key());
        assert_eq!("\"", pattern("\"").key());
    }

    #[test]
    fn find() {
        let pattern = pattern("edges");
        assert_eq!(
            KeyMatch::Found(10),
            pattern.find(r#"{"edges": [1]}"#, false)
        );
        assert_eq!(KeyMatch::Found(9), pattern.find(r#"{"edges":[1]}"#, false));
        assert_eq!(
            KeyMatch::Found(9),
            pattern.find("{\"edges\":\n[1]}", false)
        );
        // First occurrence wins
        assert_eq!(
            KeyMatch::Found(10),
            pattern.find(r#"{"edges": [], "edges": [1]}"#, false)
        );
        // Case-sensitive
        assert_eq!(
            KeyMatch::NotFound { keep_from: 14 },
            pattern.find(r#"{"Edges": [1]}"#, false)
        );
        // Not followed by colon
        assert_eq!(
            KeyMatch::NotFound { keep_from: 16 },
            pattern.find(r#"["edges", "a"]  "#, false)
        );
        // Non-ASCII text before the key
        assert_eq!(
            KeyMatch::Found(r#"{"ключ": 1, "edges": "#.len()),
            pattern.find(r#"{"ключ": 1, "edges": []}"#, false)
        );
    }

    #[test]
    fn find_at_window_end() {
        let pattern = pattern("edges");

        // Possibly followed by space in the next window
        assert_eq!(
            KeyMatch::NotFound { keep_from: 1 },
            pattern.find(r#"{"edges":"#, false)
        );
        assert_eq!(KeyMatch::Found(9), pattern.find(r#"{"edges":"#, true));
        assert_eq!(KeyMatch::Found(10), pattern.find(r#"{"edges": "#, false));

        // Partial key at the end
        for (text, keep_from) in [
            (r#"{"nodes": [], "edg"#, 14),
            (r#"{"nodes": [], ""#, 14),
            (r#"{"nodes": [], "edges"#, 14),
            (r#"{"nodes": [], "edges""#, 14),
            (r#"{"nodes": [], "#, 14),
            (r#"{"nodes": [], "ed""#, 17),
        ] {
            assert_eq!(
                KeyMatch::NotFound { keep_from },
                pattern.find(text, false),
                "For {text:?}"
            );
        }
        assert_eq!(
            KeyMatch::NotFound { keep_from: 18 },
            pattern.find(r#"{"nodes": [], "edg"#, true)
        );
    }
}
