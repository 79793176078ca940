//! Tracking of the bracket nesting depth of the filtered array

const ARRAY_START: char = '[';
const ARRAY_END: char = ']';

/// Result of scanning a text window of array content
#[derive(PartialEq, Eq, Debug)]
pub(crate) enum ArrayScan {
    /// The array ends in this window; contains the index of its closing `]`
    Complete(usize),
    /// The array continues after this window
    Continues,
}

/// Nesting depth of square brackets
///
/// Only `[` and `]` are considered; brackets inside JSON string values are counted as well,
/// so a string value containing an unpaired bracket leads to an incorrect result.
#[derive(Default, Clone, Copy, Debug)]
pub(crate) struct ArrayDepth {
    depth: u32,
}

impl ArrayDepth {
    /// Scans the text, continuing with the depth of the previous call
    ///
    /// A `]` which is encountered when the depth is already 0 is treated as end of the array.
    pub(crate) fn scan(&mut self, text: &str) -> ArrayScan {
        for (index, c) in text.char_indices() {
            match c {
                ARRAY_START => self.depth = self.depth.saturating_add(1),
                ARRAY_END => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return ArrayScan::Complete(index);
                    }
                }
                _ => {}
            }
        }
        ArrayScan::Continues
    }
}
