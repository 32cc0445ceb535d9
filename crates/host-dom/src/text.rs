//! UTF-16 offset helpers.
//!
//! Host fields report caret and range positions in UTF-16 code units. Rust
//! strings are indexed by byte, so every offset crossing the port boundary goes
//! through these conversions.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte index of the UTF-16 `offset` inside `text`.
///
/// Returns `None` when the offset is past the end or splits a surrogate pair.
pub fn utf16_to_byte(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0usize;
    for (byte, ch) in text.char_indices() {
        if units == offset {
            return Some(byte);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(text.len())
}
