//! Read-only render projection of a document.
//!
//! A [`Snapshot`] is what a rendering surface consumes: one
//! [`RenderBlock`] per document block, with the resolved spans, cached
//! sizes, and the per-block text alignment derived from its dominant
//! language. Snapshots borrow nothing, so a surface can hold one across
//! later edits.

use crate::editing::block::{Block, BlockId, BlockKind, ImageRef, TrackedId};
use crate::editing::styled::{LinkSpan, StyleSpan};
use crate::platform::LanguageClassifier;

/// Horizontal alignment of a block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// One block, flattened for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    pub id: BlockId,
    pub tracked_id: TrackedId,
    pub kind: BlockKind,
    /// Kind tag for UI affordance decisions, see [`BlockKind::tag`].
    pub tag: &'static str,
    pub order: usize,
    pub text: String,
    pub style_spans: Vec<StyleSpan>,
    pub link_spans: Vec<LinkSpan>,
    pub height: f32,
    pub width: f32,
    pub focused: bool,
    pub alignment: Alignment,
    pub image: Option<ImageRef>,
}

/// Immutable view of a whole document at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub blocks: Vec<RenderBlock>,
    pub cursor_index: usize,
    pub version: u64,
}

/// Right-to-left languages get right alignment; everything else, left.
pub(crate) fn alignment_for(classifier: &dyn LanguageClassifier, text: &str) -> Alignment {
    match classifier.dominant_language(text).as_deref() {
        Some("ar") | Some("ur") => Alignment::Right,
        _ => Alignment::Left,
    }
}

pub(crate) fn render_block(block: &Block, classifier: &dyn LanguageClassifier) -> RenderBlock {
    let text = block.extract_text().to_owned();
    let (style_spans, link_spans) = match block.styled_text() {
        Some(styled) => (styled.style_spans().to_vec(), styled.link_spans().to_vec()),
        None => (Vec::new(), Vec::new()),
    };
    let image = match &block.content {
        crate::editing::block::BlockContent::Image(image) => Some(image.clone()),
        _ => None,
    };
    let alignment = alignment_for(classifier, &text);
    RenderBlock {
        id: block.id,
        tracked_id: block.tracked_id,
        kind: block.kind(),
        tag: block.classify(),
        order: block.order,
        text,
        style_spans,
        link_spans,
        height: block.height,
        width: block.width,
        focused: block.has_focus,
        alignment,
        image,
    }
}
