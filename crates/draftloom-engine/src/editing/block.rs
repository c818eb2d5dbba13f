//! Typed content blocks and their projections.
//!
//! A document is an ordered sequence of [`Block`]s, each carrying exactly one
//! [`BlockContent`] variant. The variant decides which projections exist:
//! every block has a plain-text projection, only the markup-capable variants
//! have a styled-text projection, and every variant maps to a stable kind
//! tag consumed by UI affordance logic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::styled::StyledText;

/// Plain-text label a divider projects to.
pub const DIVIDER_LABEL: &str = ". . .";

/// Stable identity of a block. Assigned at creation, never reused; survives
/// type conversion (the replacement block keeps the id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

/// Secondary identity used only to force view re-mounting.
///
/// Regenerated whenever a block's content variant changes, so a rendering
/// surface keyed on it rebuilds the view instead of patching it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedId(pub Uuid);

impl TrackedId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackedId {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference to an uploaded image. The engine never holds pixel data; the
/// payload goes to the media collaborator at insertion and only this
/// reference stays in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset_id: Uuid,
    pub alt: String,
    pub caption: String,
}

/// The tagged union of block payloads. Exactly one variant is active per
/// block; matches are exhaustive on purpose so adding a variant forces every
/// projection to decide what it means.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    /// The document's leading title. Plain text, never styled.
    MainTitle(String),
    Title(StyledText),
    Subtitle(StyledText),
    Paragraph(StyledText),
    /// Monospaced code. Plain text; markup never applies.
    Code(String),
    OrderedItem(StyledText),
    BulletedItem(StyledText),
    Quote(StyledText),
    HighlightedQuote(StyledText),
    LineBreak,
    Divider,
    Image(ImageRef),
    /// The video's URL.
    Video(String),
    /// Trailing sentinel representing the append point.
    Empty,
}

/// Payload-less discriminant of [`BlockContent`], used for conversion
/// targets, metrics lookup, and the stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    MainTitle,
    Title,
    Subtitle,
    Paragraph,
    Code,
    OrderedItem,
    BulletedItem,
    Quote,
    HighlightedQuote,
    LineBreak,
    Divider,
    Image,
    Video,
    Empty,
}

impl BlockKind {
    /// Stable tag consumed by UI affordance decisions.
    ///
    /// Main titles and titles deliberately share a tag; the surface offers
    /// the same actions for both.
    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::MainTitle => "title",
            BlockKind::Title => "title",
            BlockKind::Subtitle => "subtitle",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Code => "code_block",
            BlockKind::OrderedItem => "ordered_list_item",
            BlockKind::BulletedItem => "unordered_list_item",
            BlockKind::Quote => "quote",
            BlockKind::HighlightedQuote => "highlighted_quote",
            BlockKind::LineBreak => "line_break",
            BlockKind::Divider => "horizontal_line",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Empty => "empty",
        }
    }

    /// Whether markup ranges apply to this kind's text.
    pub fn is_markup_capable(self) -> bool {
        matches!(
            self,
            BlockKind::Title
                | BlockKind::Subtitle
                | BlockKind::Paragraph
                | BlockKind::OrderedItem
                | BlockKind::BulletedItem
                | BlockKind::Quote
                | BlockKind::HighlightedQuote
        )
    }

    /// Whether pressing return inside this kind splits the block. Code
    /// blocks keep their newlines; media and separators have no caret.
    pub fn supports_split(self) -> bool {
        self.is_markup_capable() || self == BlockKind::MainTitle
    }

    /// Kinds a backward-delete may remove together with a preceding image,
    /// video, or divider. Main titles and media blocks themselves are never
    /// merge targets.
    pub fn is_removable_on_merge(self) -> bool {
        !matches!(
            self,
            BlockKind::MainTitle | BlockKind::Image | BlockKind::Video
        )
    }
}

/// One addressable unit of document content.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub tracked_id: TrackedId,
    /// Dense zero-based position among siblings, re-derived after every
    /// structural edit while a leading main title exists.
    pub order: usize,
    pub content: BlockContent,
    /// At most one block in a document has this set.
    pub has_focus: bool,
    /// Render cache: last measured height. Not authoritative.
    pub height: f32,
    /// Render cache: last content width (code blocks only).
    pub width: f32,
}

impl Block {
    pub fn new(content: BlockContent) -> Self {
        Self {
            id: BlockId::new(),
            tracked_id: TrackedId::new(),
            order: 0,
            content,
            has_focus: false,
            height: 0.0,
            width: 0.0,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match &self.content {
            BlockContent::MainTitle(_) => BlockKind::MainTitle,
            BlockContent::Title(_) => BlockKind::Title,
            BlockContent::Subtitle(_) => BlockKind::Subtitle,
            BlockContent::Paragraph(_) => BlockKind::Paragraph,
            BlockContent::Code(_) => BlockKind::Code,
            BlockContent::OrderedItem(_) => BlockKind::OrderedItem,
            BlockContent::BulletedItem(_) => BlockKind::BulletedItem,
            BlockContent::Quote(_) => BlockKind::Quote,
            BlockContent::HighlightedQuote(_) => BlockKind::HighlightedQuote,
            BlockContent::LineBreak => BlockKind::LineBreak,
            BlockContent::Divider => BlockKind::Divider,
            BlockContent::Image(_) => BlockKind::Image,
            BlockContent::Video(_) => BlockKind::Video,
            BlockContent::Empty => BlockKind::Empty,
        }
    }

    /// Stable kind tag for UI affordance decisions.
    pub fn classify(&self) -> &'static str {
        self.kind().tag()
    }

    /// Plain-text projection. Never fails; variants without text project to
    /// a label or the empty string.
    pub fn extract_text(&self) -> &str {
        match &self.content {
            BlockContent::MainTitle(text) => text,
            BlockContent::Title(styled)
            | BlockContent::Subtitle(styled)
            | BlockContent::Paragraph(styled)
            | BlockContent::OrderedItem(styled)
            | BlockContent::BulletedItem(styled)
            | BlockContent::Quote(styled)
            | BlockContent::HighlightedQuote(styled) => styled.text(),
            BlockContent::Code(text) => text,
            BlockContent::LineBreak => "",
            BlockContent::Divider => DIVIDER_LABEL,
            BlockContent::Image(_) => "",
            BlockContent::Video(url) => url,
            BlockContent::Empty => "",
        }
    }

    /// Styled-text projection. `None` for every variant that does not carry
    /// rich text; intentional, not an error.
    pub fn styled_text(&self) -> Option<&StyledText> {
        match &self.content {
            BlockContent::Title(styled)
            | BlockContent::Subtitle(styled)
            | BlockContent::Paragraph(styled)
            | BlockContent::OrderedItem(styled)
            | BlockContent::BulletedItem(styled)
            | BlockContent::Quote(styled)
            | BlockContent::HighlightedQuote(styled) => Some(styled),
            _ => None,
        }
    }

    pub(crate) fn styled_text_mut(&mut self) -> Option<&mut StyledText> {
        match &mut self.content {
            BlockContent::Title(styled)
            | BlockContent::Subtitle(styled)
            | BlockContent::Paragraph(styled)
            | BlockContent::OrderedItem(styled)
            | BlockContent::BulletedItem(styled)
            | BlockContent::Quote(styled)
            | BlockContent::HighlightedQuote(styled) => Some(styled),
            _ => None,
        }
    }

    /// Whether an image insertion's cleanup pass may drop this block.
    ///
    /// Only blank titles, subtitles, and code blocks qualify; blank
    /// paragraphs are deliberately kept.
    pub(crate) fn is_blank_for_media_cleanup(&self) -> bool {
        match &self.content {
            BlockContent::Title(styled) | BlockContent::Subtitle(styled) => {
                styled.text().trim().is_empty()
            }
            BlockContent::Code(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ============ Kind tag tests ============

    #[rstest]
    #[case(BlockKind::MainTitle, "title")]
    #[case(BlockKind::Title, "title")]
    #[case(BlockKind::Subtitle, "subtitle")]
    #[case(BlockKind::Paragraph, "paragraph")]
    #[case(BlockKind::Code, "code_block")]
    #[case(BlockKind::OrderedItem, "ordered_list_item")]
    #[case(BlockKind::BulletedItem, "unordered_list_item")]
    #[case(BlockKind::Quote, "quote")]
    #[case(BlockKind::HighlightedQuote, "highlighted_quote")]
    #[case(BlockKind::LineBreak, "line_break")]
    #[case(BlockKind::Divider, "horizontal_line")]
    #[case(BlockKind::Image, "image")]
    #[case(BlockKind::Video, "video")]
    #[case(BlockKind::Empty, "empty")]
    fn test_kind_tags(#[case] kind: BlockKind, #[case] tag: &str) {
        assert_eq!(kind.tag(), tag);
    }

    #[test]
    fn test_main_title_and_title_share_tag() {
        assert_eq!(BlockKind::MainTitle.tag(), BlockKind::Title.tag());
    }

    // ============ Text projection tests ============

    #[test]
    fn test_extract_text_per_variant() {
        assert_eq!(
            Block::new(BlockContent::MainTitle("My Draft".into())).extract_text(),
            "My Draft"
        );
        assert_eq!(
            Block::new(BlockContent::Paragraph(StyledText::new("body"))).extract_text(),
            "body"
        );
        assert_eq!(
            Block::new(BlockContent::Code("fn main() {}".into())).extract_text(),
            "fn main() {}"
        );
        assert_eq!(Block::new(BlockContent::LineBreak).extract_text(), "");
        assert_eq!(Block::new(BlockContent::Divider).extract_text(), ". . .");
        assert_eq!(
            Block::new(BlockContent::Video("https://example.com/v.mp4".into())).extract_text(),
            "https://example.com/v.mp4"
        );
        assert_eq!(
            Block::new(BlockContent::Image(ImageRef {
                asset_id: Uuid::new_v4(),
                alt: "alt".into(),
                caption: String::new(),
            }))
            .extract_text(),
            ""
        );
        assert_eq!(Block::new(BlockContent::Empty).extract_text(), "");
    }

    #[test]
    fn test_styled_text_only_for_markup_capable_variants() {
        assert!(
            Block::new(BlockContent::Quote(StyledText::new("q")))
                .styled_text()
                .is_some()
        );
        assert!(
            Block::new(BlockContent::MainTitle("t".into()))
                .styled_text()
                .is_none()
        );
        assert!(
            Block::new(BlockContent::Code("c".into()))
                .styled_text()
                .is_none()
        );
        assert!(Block::new(BlockContent::Divider).styled_text().is_none());
    }

    // ============ Kind predicate tests ============

    #[test]
    fn test_markup_capable_set() {
        assert!(BlockKind::Paragraph.is_markup_capable());
        assert!(BlockKind::HighlightedQuote.is_markup_capable());
        assert!(!BlockKind::MainTitle.is_markup_capable());
        assert!(!BlockKind::Code.is_markup_capable());
        assert!(!BlockKind::Empty.is_markup_capable());
    }

    #[test]
    fn test_split_support_includes_main_title_but_not_code() {
        assert!(BlockKind::MainTitle.supports_split());
        assert!(BlockKind::Paragraph.supports_split());
        assert!(!BlockKind::Code.supports_split());
        assert!(!BlockKind::Image.supports_split());
    }

    #[test]
    fn test_merge_removable_excludes_media_and_main_title() {
        assert!(BlockKind::Paragraph.is_removable_on_merge());
        assert!(BlockKind::Divider.is_removable_on_merge());
        assert!(BlockKind::Empty.is_removable_on_merge());
        assert!(!BlockKind::MainTitle.is_removable_on_merge());
        assert!(!BlockKind::Image.is_removable_on_merge());
        assert!(!BlockKind::Video.is_removable_on_merge());
    }

    // ============ Media cleanup tests ============

    #[test]
    fn test_blank_cleanup_applies_to_titles_and_code_only() {
        assert!(
            Block::new(BlockContent::Title(StyledText::new("  "))).is_blank_for_media_cleanup()
        );
        assert!(Block::new(BlockContent::Code("\n".into())).is_blank_for_media_cleanup());
        // Blank paragraphs survive the cleanup pass
        assert!(
            !Block::new(BlockContent::Paragraph(StyledText::new("")))
                .is_blank_for_media_cleanup()
        );
        assert!(
            !Block::new(BlockContent::Title(StyledText::new("kept")))
                .is_blank_for_media_cleanup()
        );
    }

    #[test]
    fn test_new_block_gets_fresh_ids() {
        let a = Block::new(BlockContent::Empty);
        let b = Block::new(BlockContent::Empty);
        assert_ne!(a.id, b.id);
        assert_ne!(a.tracked_id, b.tracked_id);
    }
}
