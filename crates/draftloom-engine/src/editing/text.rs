//! UTF-16 offset arithmetic over UTF-8 strings.
//!
//! Markup ranges and selection bounds are expressed in UTF-16 code units
//! (the offset space the editing surface reports). These helpers convert and
//! slice without panicking: out-of-bounds offsets clamp to the text end and
//! offsets landing inside a surrogate pair snap past it.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Convert a UTF-16 code-unit offset to a byte offset into `text`.
///
/// Clamps to `text.len()` when the offset is past the end. An offset inside
/// a surrogate pair resolves to the start of the following character.
pub fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte_idx, ch) in text.char_indices() {
        if units >= offset {
            return byte_idx;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Slice `text` by a half-open UTF-16 code-unit range.
///
/// Both bounds clamp to the text end; an inverted range yields `""`.
pub fn slice_utf16(text: &str, from: usize, to: usize) -> &str {
    if to <= from {
        return "";
    }
    let start = utf16_to_byte(text, from);
    let end = utf16_to_byte(text, to);
    &text[start..end.max(start)]
}

/// Strip leading whitespace from `text`.
///
/// Both halves of a block split go through this; a return pressed right
/// after leading spaces loses them. That is the editor's long-standing
/// policy, asserted by tests rather than changed here.
pub fn trim_leading_whitespace(text: &str) -> &str {
    text.trim_start()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ UTF-16 length tests ============

    #[test]
    fn test_utf16_len_ascii() {
        assert_eq!(utf16_len("hello"), 5);
        assert_eq!(utf16_len(""), 0);
    }

    #[test]
    fn test_utf16_len_multibyte() {
        // Arabic letters are one UTF-16 unit but two UTF-8 bytes
        assert_eq!(utf16_len("مرحبا"), 5);
        // Emoji outside the BMP take two UTF-16 units
        assert_eq!(utf16_len("a😀b"), 4);
    }

    // ============ Offset conversion tests ============

    #[test]
    fn test_utf16_to_byte_ascii() {
        let text = "hello";
        assert_eq!(utf16_to_byte(text, 0), 0);
        assert_eq!(utf16_to_byte(text, 3), 3);
        assert_eq!(utf16_to_byte(text, 5), 5);
    }

    #[test]
    fn test_utf16_to_byte_clamps_past_end() {
        assert_eq!(utf16_to_byte("abc", 99), 3);
        assert_eq!(utf16_to_byte("", 1), 0);
    }

    #[test]
    fn test_utf16_to_byte_multibyte() {
        let text = "aβc";
        // β is 2 bytes in UTF-8 but one UTF-16 unit
        assert_eq!(utf16_to_byte(text, 1), 1);
        assert_eq!(utf16_to_byte(text, 2), 3);
        assert_eq!(utf16_to_byte(text, 3), 4);
    }

    #[test]
    fn test_utf16_to_byte_surrogate_pair_interior() {
        let text = "a😀b";
        // Offset 2 lands inside the emoji's surrogate pair and snaps past it
        assert_eq!(utf16_to_byte(text, 1), 1);
        assert_eq!(utf16_to_byte(text, 2), 5);
        assert_eq!(utf16_to_byte(text, 3), 5);
        assert_eq!(utf16_to_byte(text, 4), 6);
    }

    // ============ Slicing tests ============

    #[test]
    fn test_slice_utf16_basic() {
        assert_eq!(slice_utf16("hello world", 0, 5), "hello");
        assert_eq!(slice_utf16("hello world", 6, 11), "world");
    }

    #[test]
    fn test_slice_utf16_out_of_bounds_clamps() {
        assert_eq!(slice_utf16("abc", 1, 99), "bc");
        assert_eq!(slice_utf16("abc", 99, 120), "");
    }

    #[test]
    fn test_slice_utf16_inverted_range_is_empty() {
        assert_eq!(slice_utf16("abc", 2, 1), "");
    }

    // ============ Trim tests ============

    #[test]
    fn test_trim_leading_whitespace() {
        assert_eq!(trim_leading_whitespace("  hello"), "hello");
        assert_eq!(trim_leading_whitespace("\t x"), "x");
        assert_eq!(trim_leading_whitespace("no-lead "), "no-lead ");
        assert_eq!(trim_leading_whitespace("   "), "");
    }
}
