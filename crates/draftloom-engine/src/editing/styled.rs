//! Resolved rich-text representation for a single block.
//!
//! `StyledText` is what the MarkupRange engine produces and the rendering
//! surface consumes: the plain string plus the presentation spans that fall
//! out of replaying the block's markup ranges. Spans are kept sorted and
//! non-overlapping; every write is destructive over the span it covers, the
//! same way attribute writes behave on an attributed string. Styling is
//! always rebuilt from the range list, so a `StyledText` never carries stale
//! attributes from a previous revision of the text.

use crate::editing::text::utf16_len;

/// Semantic font face produced by style markup.
///
/// The presentation layer decides what these look like; the engine only
/// tracks which of the four states a span is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

/// A run of text rendered with a non-regular face. Offsets are UTF-16 units.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpan {
    pub from: usize,
    pub to: usize,
    pub face: FontFace,
}

/// A hyperlinked run. Offsets are UTF-16 units.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpan {
    pub from: usize,
    pub to: usize,
    pub url: String,
    pub underline: bool,
}

/// Plain text plus the spans resolved from markup replay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    text: String,
    style_spans: Vec<StyleSpan>,
    link_spans: Vec<LinkSpan>,
}

impl StyledText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style_spans: Vec::new(),
            link_spans: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units, the unit all span offsets use.
    pub fn len_utf16(&self) -> usize {
        utf16_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn style_spans(&self) -> &[StyleSpan] {
        &self.style_spans
    }

    pub fn link_spans(&self) -> &[LinkSpan] {
        &self.link_spans
    }

    /// Replace the text and drop every span. Replay starts from a clean
    /// slate so newly typed text never inherits link or underline
    /// attributes from the previous revision.
    pub fn reset_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.style_spans.clear();
        self.link_spans.clear();
    }

    /// Write `face` over `[from, to)`, overwriting whatever was there.
    ///
    /// Writing `Regular` erases back to the base face without adding a span.
    pub fn write_face(&mut self, from: usize, to: usize, face: FontFace) {
        if to <= from {
            return;
        }
        let mut next = Vec::with_capacity(self.style_spans.len() + 1);
        for span in self.style_spans.drain(..) {
            if span.to <= from || span.from >= to {
                next.push(span);
                continue;
            }
            if span.from < from {
                next.push(StyleSpan {
                    from: span.from,
                    to: from,
                    face: span.face,
                });
            }
            if span.to > to {
                next.push(StyleSpan {
                    from: to,
                    to: span.to,
                    face: span.face,
                });
            }
        }
        if face != FontFace::Regular {
            next.push(StyleSpan { from, to, face });
        }
        next.sort_by_key(|s| s.from);
        self.style_spans = next;
    }

    /// Write a link (with underline) over `[from, to)`, overwriting any
    /// link previously covering that span. Font spans are untouched; link
    /// state is independent of bold/italic state.
    pub fn write_link(&mut self, from: usize, to: usize, url: impl Into<String>) {
        if to <= from {
            return;
        }
        self.clear_link(from, to);
        self.link_spans.push(LinkSpan {
            from,
            to,
            url: url.into(),
            underline: true,
        });
        self.link_spans.sort_by_key(|s| s.from);
    }

    /// Remove link and underline attributes from `[from, to)`.
    ///
    /// Used both by destructive link writes and by invalid-range pruning,
    /// which strips a dead link's presentation from the clamped remainder
    /// before discarding the range entry.
    pub fn clear_link(&mut self, from: usize, to: usize) {
        if to <= from {
            return;
        }
        let mut next = Vec::with_capacity(self.link_spans.len());
        for span in self.link_spans.drain(..) {
            if span.to <= from || span.from >= to {
                next.push(span);
                continue;
            }
            if span.from < from {
                next.push(LinkSpan {
                    from: span.from,
                    to: from,
                    url: span.url.clone(),
                    underline: span.underline,
                });
            }
            if span.to > to {
                next.push(LinkSpan {
                    from: to,
                    to: span.to,
                    url: span.url,
                    underline: span.underline,
                });
            }
        }
        self.link_spans = next;
    }

    /// Effective face at a UTF-16 offset, `Regular` where no span covers it.
    pub fn face_at(&self, offset: usize) -> FontFace {
        self.style_spans
            .iter()
            .find(|s| s.from <= offset && offset < s.to)
            .map(|s| s.face)
            .unwrap_or(FontFace::Regular)
    }

    /// Link url covering a UTF-16 offset, if any.
    pub fn link_at(&self, offset: usize) -> Option<&str> {
        self.link_spans
            .iter()
            .find(|s| s.from <= offset && offset < s.to)
            .map(|s| s.url.as_str())
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============ Face write tests ============

    #[test]
    fn test_write_face_single_span() {
        let mut styled = StyledText::new("hello world");
        styled.write_face(0, 5, FontFace::Bold);

        assert_eq!(
            styled.style_spans(),
            &[StyleSpan {
                from: 0,
                to: 5,
                face: FontFace::Bold
            }]
        );
        assert_eq!(styled.face_at(2), FontFace::Bold);
        assert_eq!(styled.face_at(5), FontFace::Regular);
    }

    #[test]
    fn test_write_face_overwrites_overlap() {
        let mut styled = StyledText::new("hello world");
        styled.write_face(0, 8, FontFace::Bold);
        styled.write_face(4, 11, FontFace::Italic);

        assert_eq!(styled.face_at(2), FontFace::Bold);
        assert_eq!(styled.face_at(4), FontFace::Italic);
        assert_eq!(styled.face_at(7), FontFace::Italic);
        assert_eq!(styled.face_at(10), FontFace::Italic);
        // The bold span was clipped, not deleted
        assert_eq!(
            styled.style_spans()[0],
            StyleSpan {
                from: 0,
                to: 4,
                face: FontFace::Bold
            }
        );
    }

    #[test]
    fn test_write_face_splits_containing_span() {
        let mut styled = StyledText::new("hello world");
        styled.write_face(0, 11, FontFace::Bold);
        styled.write_face(3, 6, FontFace::BoldItalic);

        assert_eq!(styled.face_at(0), FontFace::Bold);
        assert_eq!(styled.face_at(4), FontFace::BoldItalic);
        assert_eq!(styled.face_at(8), FontFace::Bold);
        assert_eq!(styled.style_spans().len(), 3);
    }

    #[test]
    fn test_write_regular_erases() {
        let mut styled = StyledText::new("hello");
        styled.write_face(0, 5, FontFace::Bold);
        styled.write_face(1, 4, FontFace::Regular);

        assert_eq!(styled.face_at(0), FontFace::Bold);
        assert_eq!(styled.face_at(2), FontFace::Regular);
        assert_eq!(styled.face_at(4), FontFace::Bold);
    }

    #[test]
    fn test_write_face_empty_range_is_noop() {
        let mut styled = StyledText::new("hello");
        styled.write_face(3, 3, FontFace::Bold);
        styled.write_face(4, 2, FontFace::Bold);
        assert!(styled.style_spans().is_empty());
    }

    // ============ Link span tests ============

    #[test]
    fn test_write_link_and_lookup() {
        let mut styled = StyledText::new("see the docs here");
        styled.write_link(8, 12, "https://example.com");

        assert_eq!(styled.link_at(9), Some("https://example.com"));
        assert_eq!(styled.link_at(3), None);
        assert!(styled.link_spans()[0].underline);
    }

    #[test]
    fn test_write_link_overwrites_previous_link() {
        let mut styled = StyledText::new("0123456789");
        styled.write_link(0, 8, "https://a.example");
        styled.write_link(4, 10, "https://b.example");

        assert_eq!(styled.link_at(2), Some("https://a.example"));
        assert_eq!(styled.link_at(6), Some("https://b.example"));
    }

    #[test]
    fn test_links_independent_of_faces() {
        let mut styled = StyledText::new("0123456789");
        styled.write_face(0, 10, FontFace::Bold);
        styled.write_link(2, 6, "https://example.com");

        assert_eq!(styled.face_at(4), FontFace::Bold);
        assert_eq!(styled.link_at(4), Some("https://example.com"));
    }

    #[test]
    fn test_clear_link_strips_middle() {
        let mut styled = StyledText::new("0123456789");
        styled.write_link(0, 10, "https://example.com");
        styled.clear_link(3, 7);

        assert_eq!(styled.link_at(1), Some("https://example.com"));
        assert_eq!(styled.link_at(5), None);
        assert_eq!(styled.link_at(8), Some("https://example.com"));
    }

    // ============ Reset tests ============

    #[test]
    fn test_reset_text_drops_all_spans() {
        let mut styled = StyledText::new("hello");
        styled.write_face(0, 5, FontFace::Bold);
        styled.write_link(0, 5, "https://example.com");

        styled.reset_text("fresh");

        assert_eq!(styled.text(), "fresh");
        assert!(styled.style_spans().is_empty());
        assert!(styled.link_spans().is_empty());
    }
}
