//! Module for detecting and decoding the text encoding of the source data
//!
//! The encoding of a JSON document is determined once from an optional byte order mark (BOM)
//! at the start of the data. Afterwards the data is decoded in windows of bytes, see
//! [`Charset::decode_window`], which keep track of how many source bytes each decoded
//! character occupied so that positions in the text can be mapped back to byte positions.

/// Maximum number of bytes inspected for a byte order mark
pub(crate) const BOM_PEEK_LEN: usize = 8;

/// Maximum number of bytes needed to encode one Unicode `char`, in any supported charset
pub(crate) const MAX_BYTES_PER_CHAR: usize = 4;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32_LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Text encoding of the source data
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum Charset {
    /// UTF-8
    #[strum(serialize = "UTF-8")]
    Utf8,
    /// UTF-16, little endian
    #[strum(serialize = "UTF-16LE")]
    Utf16Le,
    /// UTF-16, big endian
    #[strum(serialize = "UTF-16BE")]
    Utf16Be,
    /// UTF-32, little endian
    #[strum(serialize = "UTF-32LE")]
    Utf32Le,
    /// UTF-32, big endian
    #[strum(serialize = "UTF-32BE")]
    Utf32Be,
}

impl Charset {
    /// Gets the byte order mark of this charset
    ///
    /// # Examples
    /// ```
    /// # use keyed_json_array::charset::Charset;
    /// assert_eq!(&[0xEF, 0xBB, 0xBF], Charset::Utf8.bom());
    /// ```
    pub fn bom(self) -> &'static [u8] {
        match self {
            Charset::Utf8 => UTF8_BOM,
            Charset::Utf16Le => UTF16_LE_BOM,
            Charset::Utf16Be => UTF16_BE_BOM,
            Charset::Utf32Le => UTF32_LE_BOM,
            Charset::Utf32Be => UTF32_BE_BOM,
        }
    }

    /// Detects the charset from the byte order mark at the start of `prefix`
    ///
    /// Returns `None` if `prefix` does not start with a known byte order mark. `prefix`
    /// should contain at least 4 bytes, unless the data is shorter than that; otherwise
    /// a UTF-32 byte order mark might be mistaken for a UTF-16 one.
    ///
    /// # Examples
    /// ```
    /// # use keyed_json_array::charset::Charset;
    /// assert_eq!(Some(Charset::Utf16Be), Charset::detect_bom(b"\xFE\xFF\x00{"));
    /// assert_eq!(None, Charset::detect_bom(b"{}"));
    /// ```
    pub fn detect_bom(prefix: &[u8]) -> Option<Charset> {
        // UTF-32LE must be checked before UTF-16LE, its BOM starts with the UTF-16LE BOM
        [
            Charset::Utf32Le,
            Charset::Utf32Be,
            Charset::Utf8,
            Charset::Utf16Le,
            Charset::Utf16Be,
        ]
        .into_iter()
        .find(|charset| prefix.starts_with(charset.bom()))
    }

    /// Decodes the complete characters at the start of `bytes`
    ///
    /// If `bytes` ends with an incomplete character it is left out, unless `is_end` is `true`,
    /// in which case it is decoded as [`char::REPLACEMENT_CHARACTER`]. Malformed data is
    /// decoded as replacement character as well.
    pub(crate) fn decode_window(self, bytes: &[u8], is_end: bool) -> DecodedWindow {
        let mut window = DecodedWindow::with_capacity(bytes.len());
        match self {
            Charset::Utf8 => decode_utf8(bytes, is_end, &mut window),
            Charset::Utf16Le => decode_utf16(bytes, is_end, u16::from_le_bytes, &mut window),
            Charset::Utf16Be => decode_utf16(bytes, is_end, u16::from_be_bytes, &mut window),
            Charset::Utf32Le => decode_utf32(bytes, is_end, u32::from_le_bytes, &mut window),
            Charset::Utf32Be => decode_utf32(bytes, is_end, u32::from_be_bytes, &mut window),
        }
        window
    }
}

/// Text decoded from a window of source bytes
#[derive(Debug)]
pub(crate) struct DecodedWindow {
    text: String,
    /// For every char of [`text`](Self::text) the byte position (exclusive) in the source
    /// data at which it ends
    char_ends: Vec<usize>,
}

impl DecodedWindow {
    fn with_capacity(byte_count: usize) -> Self {
        DecodedWindow {
            text: String::with_capacity(byte_count),
            char_ends: Vec::with_capacity(byte_count),
        }
    }

    fn push(&mut self, c: char, byte_count: usize) {
        let end = self.byte_len() + byte_count;
        self.text.push(c);
        self.char_ends.push(end);
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Number of source bytes which were decoded
    pub(crate) fn byte_len(&self) -> usize {
        self.char_ends.last().copied().unwrap_or(0)
    }

    /// Converts an index in [`text`](Self::text) to the corresponding position in the source bytes
    ///
    /// `text_index` must be at a char boundary.
    pub(crate) fn byte_offset(&self, text_index: usize) -> usize {
        debug_assert!(self.text.is_char_boundary(text_index));
        let char_count = self.text[..text_index].chars().count();
        match char_count {
            0 => 0,
            n => self.char_ends[n - 1],
        }
    }
}

fn decode_utf8(bytes: &[u8], is_end: bool, window: &mut DecodedWindow) {
    let mut remaining = bytes;
    loop {
        let (valid, error) = match std::str::from_utf8(remaining) {
            Ok(s) => (s, None),
            Err(e) => {
                // Cannot fail, bytes up to `valid_up_to` are valid UTF-8
                let valid = std::str::from_utf8(&remaining[..e.valid_up_to()]).unwrap_or("");
                (valid, Some(e))
            }
        };
        for c in valid.chars() {
            window.push(c, c.len_utf8());
        }

        let Some(error) = error else {
            return;
        };
        remaining = &remaining[error.valid_up_to()..];
        match error.error_len() {
            Some(invalid_len) => {
                window.push(char::REPLACEMENT_CHARACTER, invalid_len);
                remaining = &remaining[invalid_len..];
            }
            // Incomplete char at the end
            None => {
                if is_end {
                    window.push(char::REPLACEMENT_CHARACTER, remaining.len());
                }
                return;
            }
        }
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

fn decode_utf16(
    bytes: &[u8],
    is_end: bool,
    to_unit: fn([u8; 2]) -> u16,
    window: &mut DecodedWindow,
) {
    let unit_at = |pos: usize| to_unit([bytes[pos], bytes[pos + 1]]);

    let mut pos = 0;
    while pos + 2 <= bytes.len() {
        let unit = unit_at(pos);
        if is_high_surrogate(unit) {
            if pos + 4 > bytes.len() {
                // Low surrogate has not been read yet
                break;
            }
            let low = unit_at(pos + 2);
            if is_low_surrogate(low) {
                let code_point =
                    0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                let c = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
                window.push(c, 4);
                pos += 4;
                continue;
            }
        }
        // Unpaired surrogates are not valid chars and are replaced
        let c = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
        window.push(c, 2);
        pos += 2;
    }

    if is_end && pos < bytes.len() {
        window.push(char::REPLACEMENT_CHARACTER, bytes.len() - pos);
    }
}

fn decode_utf32(
    bytes: &[u8],
    is_end: bool,
    to_code_point: fn([u8; 4]) -> u32,
    window: &mut DecodedWindow,
) {
    let mut chunks = bytes.chunks_exact(MAX_BYTES_PER_CHAR);
    for chunk in &mut chunks {
        let code_point = to_code_point([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let c = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
        window.push(c, MAX_BYTES_PER_CHAR);
    }

    let remainder = chunks.remainder();
    if is_end && !remainder.is_empty() {
        window.push(char::REPLACEMENT_CHARACTER, remainder.len());
    }
}
