//! Durable document schema and JSON codec.
//!
//! The stored form keeps what cannot be re-derived: block ids, kinds,
//! order, plain text, image references, and the markup table. Styled-text
//! presentation and measured sizes are rebuilt on restore, so a document
//! round-trips without persisting render state. Restore is deliberately
//! forgiving: rows it cannot rebuild are dropped, ranges that no longer
//! fit their text die at replay, a missing trailing sentinel is
//! re-appended, and only the first focused row keeps its focus.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::editing::block::{Block, BlockContent, BlockId, BlockKind, ImageRef};
use crate::editing::document::Document;
use crate::editing::markup::{MarkupRange, apply_ranges};
use crate::editing::selection::EngineOptions;
use crate::editing::styled::StyledText;
use crate::layout;
use crate::platform::{LanguageClassifier, MediaSink, TextMeasurer};

/// Schema version written by [`Document::to_stored`].
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("Malformed stored document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(u32),
}

/// One block in durable form. `text` is the plain projection; styled
/// presentation is rebuilt by replaying the document's markup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    pub order: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub focused: bool,
}

/// A whole document in durable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub version: u32,
    pub blocks: Vec<StoredBlock>,
    #[serde(default)]
    pub markups: HashMap<BlockId, Vec<MarkupRange>>,
}

impl StoredDocument {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, RestoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Document {
    /// Durable form of this document. The runtime version counter is not
    /// part of it; a restored document starts counting from zero.
    pub fn to_stored(&self) -> StoredDocument {
        StoredDocument {
            version: SCHEMA_VERSION,
            blocks: self.blocks.iter().map(stored_block).collect(),
            markups: self.markups.clone(),
        }
    }

    /// Rebuild a document from its durable form.
    ///
    /// Rows are taken in stored `order`, then orders are re-derived
    /// densely. Every text block is re-measured against the given options
    /// and measurer.
    pub fn from_stored(
        stored: StoredDocument,
        options: EngineOptions,
        measurer: Arc<dyn TextMeasurer>,
        classifier: Arc<dyn LanguageClassifier>,
        media: Arc<dyn MediaSink>,
    ) -> Result<Self, RestoreError> {
        if stored.version > SCHEMA_VERSION {
            return Err(RestoreError::UnsupportedVersion(stored.version));
        }

        let mut rows = stored.blocks;
        rows.sort_by_key(|row| row.order);

        let mut blocks: Vec<Block> = Vec::with_capacity(rows.len());
        let mut markups: HashMap<BlockId, Vec<MarkupRange>> = HashMap::new();
        let mut seen_focus = false;
        for row in rows {
            let Some(content) = rebuild_content(&row) else {
                tracing::warn!(id = ?row.id, kind = ?row.kind, "dropping stored row without a usable payload");
                continue;
            };
            let mut block = Block::new(content);
            block.id = row.id;
            block.height = layout::seed_height(row.kind);
            block.has_focus = row.focused && !seen_focus;
            seen_focus |= block.has_focus;
            if let Some(styled) = block.styled_text_mut() {
                let mut ranges = stored.markups.get(&row.id).cloned().unwrap_or_default();
                if !ranges.is_empty() {
                    apply_ranges(&mut ranges, styled);
                }
                if !ranges.is_empty() {
                    markups.insert(row.id, ranges);
                }
            }
            blocks.push(block);
        }

        if !matches!(blocks.last().map(|b| &b.content), Some(BlockContent::Empty)) {
            let mut sentinel = Block::new(BlockContent::Empty);
            sentinel.height = layout::seed_height(BlockKind::Empty);
            blocks.push(sentinel);
        }
        for (index, block) in blocks.iter_mut().enumerate() {
            block.order = index;
        }

        let cursor_index = blocks.iter().position(|b| b.has_focus).unwrap_or(0);
        let title_anchored = matches!(
            blocks.first().map(|b| &b.content),
            Some(BlockContent::MainTitle(_))
        ) && !matches!(
            blocks.get(1).map(|b| &b.content),
            Some(BlockContent::Image(_))
        );

        let mut doc = Document::new(options, measurer, classifier, media);
        doc.blocks = blocks;
        doc.markups = markups;
        doc.cursor_index = cursor_index;
        doc.is_title_anchor_set = title_anchored;
        doc.version = 0;
        doc.selection = None;
        for index in 0..doc.blocks.len() {
            doc.measure_block(index);
        }
        Ok(doc)
    }
}

fn stored_block(block: &Block) -> StoredBlock {
    let text = match &block.content {
        BlockContent::MainTitle(text)
        | BlockContent::Code(text)
        | BlockContent::Video(text) => text.clone(),
        _ => block
            .styled_text()
            .map(|styled| styled.text().to_owned())
            .unwrap_or_default(),
    };
    let image = match &block.content {
        BlockContent::Image(image) => Some(image.clone()),
        _ => None,
    };
    StoredBlock {
        id: block.id,
        kind: block.kind(),
        order: block.order,
        text,
        image,
        focused: block.has_focus,
    }
}

fn rebuild_content(row: &StoredBlock) -> Option<BlockContent> {
    let text = || row.text.clone();
    Some(match row.kind {
        BlockKind::MainTitle => BlockContent::MainTitle(text()),
        BlockKind::Title => BlockContent::Title(StyledText::new(text())),
        BlockKind::Subtitle => BlockContent::Subtitle(StyledText::new(text())),
        BlockKind::Paragraph => BlockContent::Paragraph(StyledText::new(text())),
        BlockKind::Code => BlockContent::Code(text()),
        BlockKind::OrderedItem => BlockContent::OrderedItem(StyledText::new(text())),
        BlockKind::BulletedItem => BlockContent::BulletedItem(StyledText::new(text())),
        BlockKind::Quote => BlockContent::Quote(StyledText::new(text())),
        BlockKind::HighlightedQuote => BlockContent::HighlightedQuote(StyledText::new(text())),
        BlockKind::LineBreak => BlockContent::LineBreak,
        BlockKind::Divider => BlockContent::Divider,
        BlockKind::Image => BlockContent::Image(row.image.clone()?),
        BlockKind::Video => BlockContent::Video(text()),
        BlockKind::Empty => BlockContent::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::commands::Cmd;
    use crate::editing::markup::MarkupKind;
    use crate::platform::{HeuristicMeasurer, NullMediaSink, ScriptClassifier};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn restore(stored: StoredDocument) -> Result<Document, RestoreError> {
        Document::from_stored(
            stored,
            EngineOptions::default(),
            Arc::new(HeuristicMeasurer),
            Arc::new(ScriptClassifier),
            Arc::new(NullMediaSink),
        )
    }

    fn row(id: BlockId, kind: BlockKind, order: usize, text: &str) -> StoredBlock {
        StoredBlock {
            id,
            kind,
            order,
            text: text.to_owned(),
            image: None,
            focused: false,
        }
    }

    fn fixed_id(tail: u32) -> BlockId {
        BlockId(Uuid::parse_str(&format!("0b0e7f8c-0000-4000-8000-{tail:012}")).unwrap())
    }

    // ============ Round-trip tests ============

    #[test]
    fn test_round_trip_preserves_content_ids_and_markups() {
        let mut doc = Document::with_defaults();
        doc.apply(Cmd::SetMainTitleText {
            text: "Launch notes".into(),
        });
        doc.apply(Cmd::InsertParagraph {
            text: "Hello world".into(),
            markups: vec![MarkupRange::new(MarkupKind::Bold, 0, 5)],
        });
        doc.apply(Cmd::InsertCode {
            text: "let x = 1;".into(),
        });

        let json = doc.to_stored().to_json().unwrap();
        let restored = restore(StoredDocument::from_json(&json).unwrap()).unwrap();

        let original: Vec<_> = doc
            .blocks()
            .iter()
            .map(|b| (b.id, b.kind(), b.extract_text().to_owned(), b.order))
            .collect();
        let rebuilt: Vec<_> = restored
            .blocks()
            .iter()
            .map(|b| (b.id, b.kind(), b.extract_text().to_owned(), b.order))
            .collect();
        assert_eq!(original, rebuilt);

        let paragraph_id = doc
            .blocks()
            .iter()
            .find(|b| b.kind() == BlockKind::Paragraph && !b.extract_text().is_empty())
            .unwrap()
            .id;
        assert_eq!(
            restored.markups_for(paragraph_id),
            doc.markups_for(paragraph_id)
        );
        let styled = restored
            .blocks()
            .iter()
            .find(|b| b.id == paragraph_id)
            .unwrap()
            .styled_text()
            .unwrap();
        assert_eq!(styled.style_spans().len(), 1);
    }

    #[test]
    fn test_round_trip_remeasures_heights() {
        let mut doc = Document::with_defaults();
        // Touch the title so both sides carry measured heights; restore
        // measures everything, while a live document keeps seed heights on
        // never-edited headings.
        doc.apply(Cmd::SetMainTitleText {
            text: "Launch notes".into(),
        });
        doc.apply(Cmd::InsertParagraph {
            text: "a".repeat(40),
            markups: vec![],
        });

        let restored = restore(doc.to_stored()).unwrap();

        let heights: Vec<f32> = doc.blocks().iter().map(|b| b.height).collect();
        let rebuilt: Vec<f32> = restored.blocks().iter().map(|b| b.height).collect();
        assert_eq!(heights, rebuilt);
    }

    #[test]
    fn test_round_trip_keeps_image_references() {
        let mut doc = Document::with_defaults();
        doc.apply(Cmd::SetFocus { index: 1 });
        doc.apply(Cmd::InsertImage {
            bytes: vec![1, 2, 3],
            alt: "sunset".into(),
            caption: "pier".into(),
        });
        let image_ref = doc
            .blocks()
            .iter()
            .find_map(|b| match &b.content {
                BlockContent::Image(image) => Some(image.clone()),
                _ => None,
            })
            .unwrap();

        let restored = restore(doc.to_stored()).unwrap();

        let rebuilt = restored
            .blocks()
            .iter()
            .find_map(|b| match &b.content {
                BlockContent::Image(image) => Some(image.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(rebuilt, image_ref);
    }

    // ============ Normalization tests ============

    #[test]
    fn test_restore_prunes_out_of_bounds_ranges() {
        let id = fixed_id(1);
        let mut markups = HashMap::new();
        markups.insert(id, vec![MarkupRange::new(MarkupKind::Bold, 0, 50)]);
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![row(id, BlockKind::Paragraph, 0, "short")],
            markups,
        };

        let restored = restore(stored).unwrap();

        assert!(restored.markups_for(id).is_empty());
        let styled = restored.blocks()[0].styled_text().unwrap();
        assert!(styled.style_spans().is_empty());
    }

    #[test]
    fn test_restore_reappends_a_missing_sentinel() {
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![
                row(fixed_id(1), BlockKind::MainTitle, 0, "Title"),
                row(fixed_id(2), BlockKind::Paragraph, 1, "Body"),
            ],
            markups: HashMap::new(),
        };

        let restored = restore(stored).unwrap();

        assert_eq!(restored.blocks().last().unwrap().kind(), BlockKind::Empty);
        assert_eq!(restored.blocks().len(), 3);
    }

    #[test]
    fn test_restore_orders_rows_and_rederives_dense_orders() {
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![
                row(fixed_id(2), BlockKind::Paragraph, 7, "second"),
                row(fixed_id(1), BlockKind::MainTitle, 2, "Title"),
                row(fixed_id(3), BlockKind::Empty, 9, ""),
            ],
            markups: HashMap::new(),
        };

        let restored = restore(stored).unwrap();

        let texts: Vec<&str> = restored.blocks().iter().map(|b| b.extract_text()).collect();
        assert_eq!(texts, vec!["Title", "second", ""]);
        let orders: Vec<usize> = restored.blocks().iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_restore_keeps_only_the_first_focused_row() {
        let mut first = row(fixed_id(1), BlockKind::MainTitle, 0, "Title");
        first.focused = true;
        let mut second = row(fixed_id(2), BlockKind::Paragraph, 1, "Body");
        second.focused = true;
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![first, second],
            markups: HashMap::new(),
        };

        let restored = restore(stored).unwrap();

        let focused: Vec<usize> = restored
            .blocks()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.has_focus)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(focused, vec![0]);
        assert_eq!(restored.cursor_index(), 0);
    }

    #[test]
    fn test_restore_drops_an_image_row_without_its_reference() {
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![
                row(fixed_id(1), BlockKind::MainTitle, 0, "Title"),
                row(fixed_id(2), BlockKind::Image, 1, ""),
            ],
            markups: HashMap::new(),
        };

        let restored = restore(stored).unwrap();

        assert!(
            restored
                .blocks()
                .iter()
                .all(|b| b.kind() != BlockKind::Image)
        );
    }

    // ============ Codec tests ============

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = StoredDocument::from_json("not a document").unwrap_err();
        assert!(matches!(err, RestoreError::Malformed(_)));
    }

    #[test]
    fn test_restore_rejects_a_newer_schema() {
        let stored = StoredDocument {
            version: SCHEMA_VERSION + 1,
            blocks: vec![],
            markups: HashMap::new(),
        };

        let err = restore(stored).unwrap_err();

        assert!(matches!(err, RestoreError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_wire_shape_is_pinned() {
        let id = fixed_id(1);
        let mut markups = HashMap::new();
        markups.insert(id, vec![MarkupRange::new(MarkupKind::Bold, 0, 6)]);
        let stored = StoredDocument {
            version: SCHEMA_VERSION,
            blocks: vec![StoredBlock {
                id,
                kind: BlockKind::Paragraph,
                order: 0,
                text: "Pinned wire shape".into(),
                image: None,
                focused: true,
            }],
            markups,
        };

        insta::assert_snapshot!(stored.to_json().unwrap(), @r#"
        {
          "version": 1,
          "blocks": [
            {
              "id": "0b0e7f8c-0000-4000-8000-000000000001",
              "kind": "paragraph",
              "order": 0,
              "text": "Pinned wire shape",
              "focused": true
            }
          ],
          "markups": {
            "0b0e7f8c-0000-4000-8000-000000000001": [
              {
                "type": "bold",
                "from": 0,
                "to": 6
              }
            ]
          }
        }
        "#);
    }
}
