//! Commands and the pure helpers their handlers share.

use crate::editing::block::{BlockId, BlockKind};
use crate::editing::markup::{MarkupKind, MarkupRange};

/// Prefix a bulleted item's text carries.
pub(crate) const BULLET_PREFIX: &str = "\u{2022} ";

/// Commands that can be applied to the document
///
/// Insertions land after the cursor block and move the caret into the new
/// block. The edit-shaped commands (`TextChanged`, `SelectionChanged`,
/// `ReturnPressed`, `DeleteBackward`) mirror what an editing surface
/// reports; offsets are UTF-16 code units. Commands addressing a block id
/// that no longer exists are observable no-ops.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertParagraph {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertTitle {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertSubtitle {
        text: String,
        markups: Vec<MarkupRange>,
    },
    /// Text is composed as `{n}. {text}`, where `n` continues the run the
    /// cursor sits in.
    InsertOrderedItem {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertBulletedItem {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertQuote {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertHighlightedQuote {
        text: String,
        markups: Vec<MarkupRange>,
    },
    InsertCode {
        text: String,
    },
    /// Inserts the separator plus the paragraph the caret lands in.
    InsertLineBreak,
    /// Inserts the divider plus the paragraph the caret lands in.
    InsertDivider,
    /// Bytes go to the media sink; the document keeps the asset reference.
    InsertImage {
        bytes: Vec<u8>,
        alt: String,
        caption: String,
    },
    InsertVideo {
        url: String,
    },
    SetMainTitleText {
        text: String,
    },
    /// Unified text update from the surface. A non-empty `markups` list
    /// replaces the block's stored ranges before replay.
    TextChanged {
        block_id: BlockId,
        text: String,
        markups: Vec<MarkupRange>,
    },
    SelectionChanged {
        block_id: BlockId,
        from: usize,
        to: usize,
    },
    /// Return pressed at `cursor_offset` within the block's text. Splits
    /// mid-text, appends a fresh block at the end of text.
    ReturnPressed {
        block_id: BlockId,
        cursor_offset: usize,
    },
    /// Backspace in an already-empty block. `insert_paragraph_after`
    /// requests a replacement paragraph once the block is gone.
    DeleteBackward {
        block_id: BlockId,
        insert_paragraph_after: bool,
    },
    /// Re-type the block in place, keeping its id and order.
    ConvertBlock {
        block_id: BlockId,
        target: BlockKind,
    },
    /// Toggle markup over the active selection.
    ApplyMarkup {
        kind: MarkupKind,
        url: Option<String>,
    },
    SetFocus {
        index: usize,
    },
    ViewportResized {
        width: f32,
    },
}

/// Leading `N.` ordinal of an ordered item's text, if it has one.
pub(crate) fn parse_leading_ordinal(text: &str) -> Option<u32> {
    use regex::Regex;
    use std::sync::OnceLock;

    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    let ordinal =
        ORDINAL.get_or_init(|| Regex::new(r"^(\d+)\.").expect("Invalid ordinal regex"));
    ordinal
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Ordinal for a new ordered item that follows `previous`'s text, `1` when
/// the run is broken or the previous ordinal is malformed.
pub(crate) fn next_ordinal(previous: Option<&str>) -> u32 {
    previous
        .and_then(parse_leading_ordinal)
        .map_or(1, |n| n + 1)
}

pub(crate) fn ordered_prefix(n: u32) -> String {
    format!("{n}. ")
}

/// Drop the list prefix a conversion away from a list kind leaves behind.
pub(crate) fn strip_list_prefix(kind: BlockKind, text: &str) -> &str {
    use regex::Regex;
    use std::sync::OnceLock;

    match kind {
        BlockKind::OrderedItem => {
            static PREFIX: OnceLock<Regex> = OnceLock::new();
            let prefix =
                PREFIX.get_or_init(|| Regex::new(r"^\d+\.\s?").expect("Invalid prefix regex"));
            match prefix.find(text) {
                Some(found) => &text[found.end()..],
                None => text,
            }
        }
        BlockKind::BulletedItem => text.strip_prefix(BULLET_PREFIX).unwrap_or(text),
        _ => text,
    }
}

/// Partition a block's markups across a split at `before_len` UTF-16
/// units.
///
/// Ranges ending at or before the boundary stay with the first half as-is;
/// ranges starting at or after it move to the second half, rebased and
/// shifted right by `prefix_len` (the list prefix the new block gains).
/// Ranges spanning the boundary belong to neither half and are dropped.
pub(crate) fn split_markups(
    markups: &[MarkupRange],
    before_len: usize,
    prefix_len: usize,
) -> (Vec<MarkupRange>, Vec<MarkupRange>) {
    let before = markups
        .iter()
        .filter(|m| m.to <= before_len)
        .cloned()
        .collect();
    let after = markups
        .iter()
        .filter(|m| m.from >= before_len)
        .map(|m| MarkupRange {
            kind: m.kind,
            from: m.from - before_len + prefix_len,
            to: m.to - before_len + prefix_len,
            url: m.url.clone(),
        })
        .collect();
    (before, after)
}

/// Whether a text change grew the block enough to count as a paste.
pub(crate) fn is_paste_sized(old_len: usize, new_len: usize, threshold: usize) -> bool {
    new_len > old_len && new_len - old_len > threshold
}
