use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::editing::block::{Block, BlockContent, BlockId, BlockKind, ImageRef, TrackedId};
use crate::editing::commands::{
    BULLET_PREFIX, Cmd, is_paste_sized, next_ordinal, ordered_prefix, split_markups,
    strip_list_prefix,
};
use crate::editing::markup::{
    MarkupKind, MarkupRange, apply_or_toggle, apply_ranges, resync_on_edit,
};
use crate::editing::patch::Patch;
use crate::editing::selection::{ActiveSelection, ActivitySignals, EngineOptions};
use crate::editing::snapshot::{Snapshot, render_block};
use crate::editing::styled::StyledText;
use crate::editing::text::{slice_utf16, trim_leading_whitespace, utf16_len, utf16_to_byte};
use crate::layout;
use crate::platform::{
    HeuristicMeasurer, LanguageClassifier, MediaSink, NullMediaSink, ScriptClassifier,
    TextMeasurer,
};

/// The document reducer: one ordered block sequence, one markup table, and
/// every editing command funnelled through [`Document::apply`].
///
/// ## Structure
///
/// A new document starts as a three-block skeleton: a main title, one body
/// paragraph, and the trailing empty sentinel that marks the append point.
/// Two invariants are reasserted after every structural edit:
///
/// - `order` is dense and contiguous while a leading main title exists
/// - exactly one trailing sentinel closes the sequence
///
/// ## Editing
///
/// Commands mirror what an editing surface reports (text changes, selection
/// moves, return and backspace keys) plus the toolbar-shaped insertions and
/// conversions. Each application returns a [`Patch`] naming the block
/// indices a renderer must refresh. Markup ranges live in an id-keyed table
/// beside the blocks, so they survive type conversion, which replaces the
/// block wholesale but keeps its id.
///
/// ## Collaborators
///
/// Text measurement, language detection, and media storage are injected
/// trait objects; [`Document::with_defaults`] wires the deterministic
/// headless implementations.
///
/// ```rust
/// # use draftloom_engine::editing::{Cmd, Document};
/// let mut doc = Document::with_defaults();
/// let patch = doc.apply(Cmd::InsertParagraph {
///     text: "Hello".into(),
///     markups: vec![],
/// });
/// assert_eq!(patch.new_focus, Some(1));
/// ```
#[derive(Clone)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    /// Markup ranges per block id. Entries outlive conversions and are
    /// pruned lazily on replay.
    pub(crate) markups: HashMap<BlockId, Vec<MarkupRange>>,
    pub(crate) cursor_index: usize,
    /// Cleared when an image claims the slot directly under the title or
    /// when a delete walks focus back onto index 0.
    pub(crate) is_title_anchor_set: bool,
    pub(crate) selection: Option<ActiveSelection>,
    pub(crate) version: u64,
    signals: ActivitySignals,
    pub(crate) options: EngineOptions,
    measurer: Arc<dyn TextMeasurer>,
    classifier: Arc<dyn LanguageClassifier>,
    media: Arc<dyn MediaSink>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // Collaborators and activity deadlines are runtime-only state.
        self.blocks == other.blocks
            && self.markups == other.markups
            && self.cursor_index == other.cursor_index
            && self.is_title_anchor_set == other.is_title_anchor_set
            && self.selection == other.selection
            && self.version == other.version
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Collaborators and activity deadlines are runtime-only state.
        f.debug_struct("Document")
            .field("blocks", &self.blocks)
            .field("markups", &self.markups)
            .field("cursor_index", &self.cursor_index)
            .field("is_title_anchor_set", &self.is_title_anchor_set)
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish()
    }
}

impl Document {
    /// New document with the standard skeleton and the given collaborators.
    pub fn new(
        options: EngineOptions,
        measurer: Arc<dyn TextMeasurer>,
        classifier: Arc<dyn LanguageClassifier>,
        media: Arc<dyn MediaSink>,
    ) -> Self {
        let mut title = Block::new(BlockContent::MainTitle(String::new()));
        title.height = layout::seed_height(BlockKind::MainTitle);
        title.width = options.viewport_width - 40.0;

        let paragraph = Block::new(BlockContent::Paragraph(StyledText::new("")));

        let mut sentinel = Block::new(BlockContent::Empty);
        sentinel.height = layout::seed_height(BlockKind::Empty);

        let mut doc = Self {
            blocks: vec![title, paragraph, sentinel],
            markups: HashMap::new(),
            cursor_index: 0,
            is_title_anchor_set: true,
            selection: None,
            version: 0,
            signals: ActivitySignals::default(),
            options,
            measurer,
            classifier,
            media,
        };
        doc.measure_block(1);
        doc.renumber();
        doc
    }

    /// New document backed by the deterministic headless collaborators.
    pub fn with_defaults() -> Self {
        Self::new(
            EngineOptions::default(),
            Arc::new(HeuristicMeasurer),
            Arc::new(ScriptClassifier),
            Arc::new(NullMediaSink),
        )
    }

    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        self.apply_at(cmd, Instant::now())
    }

    /// [`Document::apply`] with an injected clock. The activity windows
    /// gating markup resync are measured against `now`.
    pub fn apply_at(&mut self, cmd: Cmd, now: Instant) -> Patch {
        match cmd {
            Cmd::InsertParagraph { text, markups } => {
                let at = self
                    .insert_text_block(BlockContent::Paragraph(StyledText::new(text)), markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertTitle { text, markups } => {
                let at =
                    self.insert_text_block(BlockContent::Title(StyledText::new(text)), markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertSubtitle { text, markups } => {
                let at = self
                    .insert_text_block(BlockContent::Subtitle(StyledText::new(text)), markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertOrderedItem { text, markups } => {
                let at = self.insert_ordered_after_cursor(&text, markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertBulletedItem { text, markups } => {
                let at = self.insert_bulleted_after_cursor(&text, markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertQuote { text, markups } => {
                let at =
                    self.insert_text_block(BlockContent::Quote(StyledText::new(text)), markups);
                self.patch_all(Some(at))
            }
            Cmd::InsertHighlightedQuote { text, markups } => {
                let at = self.insert_text_block(
                    BlockContent::HighlightedQuote(StyledText::new(text)),
                    markups,
                );
                self.patch_all(Some(at))
            }
            Cmd::InsertCode { text } => {
                if self.blocks.len() < 2 {
                    self.cursor_index = 1;
                }
                let at = self.insert_text_block(BlockContent::Code(text), Vec::new());
                self.blocks[at].width = self.options.viewport_width - 40.0;
                self.patch_all(Some(at))
            }
            Cmd::InsertLineBreak => {
                let mut separator = Block::new(BlockContent::LineBreak);
                separator.height = layout::seed_height(BlockKind::LineBreak);
                self.insert_after_cursor(separator);
                self.reassert_invariants();
                // The separator never takes the caret, so the companion
                // paragraph lands ahead of it.
                let at = self
                    .insert_text_block(BlockContent::Paragraph(StyledText::new("")), Vec::new());
                self.patch_all(Some(at))
            }
            Cmd::InsertDivider => {
                let mut divider = Block::new(BlockContent::Divider);
                divider.height = layout::seed_height(BlockKind::Divider);
                let at = self.insert_after_cursor(divider);
                self.reassert_invariants();
                self.cursor_index = at;
                let paragraph = self
                    .insert_text_block(BlockContent::Paragraph(StyledText::new("")), Vec::new());
                self.patch_all(Some(paragraph))
            }
            Cmd::InsertImage {
                bytes,
                alt,
                caption,
            } => self.handle_insert_image(bytes, alt, caption),
            Cmd::InsertVideo { url } => self.handle_insert_video(url),
            Cmd::SetMainTitleText { text } => self.handle_set_main_title(text),
            Cmd::TextChanged {
                block_id,
                text,
                markups,
            } => self.handle_text_changed(block_id, text, markups, now),
            Cmd::SelectionChanged { block_id, from, to } => {
                self.handle_selection_changed(block_id, from, to)
            }
            Cmd::ReturnPressed {
                block_id,
                cursor_offset,
            } => self.handle_return(block_id, cursor_offset),
            Cmd::DeleteBackward {
                block_id,
                insert_paragraph_after,
            } => self.handle_delete(block_id, insert_paragraph_after),
            Cmd::ConvertBlock { block_id, target } => self.handle_convert(block_id, target),
            Cmd::ApplyMarkup { kind, url } => self.handle_apply_markup(kind, url),
            Cmd::SetFocus { index } => self.handle_set_focus(index),
            Cmd::ViewportResized { width } => {
                self.options.viewport_width = width;
                for index in 0..self.blocks.len() {
                    self.measure_block(index);
                }
                self.patch_all(None)
            }
        }
    }

    /// Render projection of the whole document at its current version.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self
                .blocks
                .iter()
                .map(|block| render_block(block, self.classifier.as_ref()))
                .collect(),
            cursor_index: self.cursor_index,
            version: self.version,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor_index
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.selection.as_ref()
    }

    pub fn is_title_anchor_set(&self) -> bool {
        self.is_title_anchor_set
    }

    /// Stored markup ranges for `block_id`, empty when none were applied.
    pub fn markups_for(&self, block_id: BlockId) -> &[MarkupRange] {
        self.markups.get(&block_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ---- command handlers ----

    fn handle_insert_image(&mut self, bytes: Vec<u8>, alt: String, caption: String) -> Patch {
        self.clear_focus_and_blank_scaffolding();
        let asset_id = Uuid::new_v4();
        let mut block = Block::new(BlockContent::Image(ImageRef {
            asset_id,
            alt: alt.clone(),
            caption: caption.clone(),
        }));
        block.height = layout::seed_height(BlockKind::Image);
        let at = self.insert_after_cursor(block);
        self.reassert_invariants();
        self.cursor_index = at;
        if at == 1 {
            self.is_title_anchor_set = false;
        }
        if let Err(err) = self.media.store_image(asset_id, &bytes, &alt, &caption) {
            tracing::warn!(%asset_id, error = %err, "image payload rejected by media sink");
        }
        self.patch_all(None)
    }

    fn handle_insert_video(&mut self, url: String) -> Patch {
        self.clear_focus_and_blank_scaffolding();
        let asset_id = Uuid::new_v4();
        let mut block = Block::new(BlockContent::Video(url.clone()));
        block.height = layout::seed_height(BlockKind::Video);
        let at = self.insert_after_cursor(block);
        self.reassert_invariants();
        self.cursor_index = at;
        if at == 1 {
            self.is_title_anchor_set = false;
        }
        if let Err(err) = self.media.store_video(asset_id, &url) {
            tracing::warn!(%asset_id, error = %err, "video url rejected by media sink");
        }
        self.patch_all(None)
    }

    fn handle_set_main_title(&mut self, text: String) -> Patch {
        let Some(index) = self
            .blocks
            .iter()
            .position(|block| matches!(block.content, BlockContent::MainTitle(_)))
        else {
            return Patch::unchanged(self.version);
        };
        self.blocks[index].content = BlockContent::MainTitle(text);
        self.measure_block(index);
        self.focus_exclusively(index);
        self.patch_one(index, Some(index))
    }

    fn handle_text_changed(
        &mut self,
        block_id: BlockId,
        text: String,
        markups: Vec<MarkupRange>,
        now: Instant,
    ) -> Patch {
        let Some(index) = self.index_of(block_id) else {
            return Patch::unchanged(self.version);
        };

        if let BlockContent::Code(code) = &mut self.blocks[index].content {
            *code = text;
            self.cursor_index = index;
            self.measure_block(index);
            return self.patch_one(index, None);
        }
        if self.blocks[index].styled_text().is_none() {
            // Main titles and non-text kinds have their own commands.
            return Patch::unchanged(self.version);
        }

        let old_len = utf16_len(self.blocks[index].extract_text());
        let new_len = utf16_len(&text);
        // Paste suppression covers this change; typing suppression starts
        // with the next one.
        if is_paste_sized(old_len, new_len, self.options.paste_len_threshold) {
            self.signals.note_paste(block_id, now, self.options.paste_window);
        }
        let resync = match &self.selection {
            Some(sel) if sel.block_id == block_id => self
                .signals
                .resync_allowed(block_id, now)
                .then_some((sel.from, sel.to)),
            _ => None,
        };

        let mut ranges = if markups.is_empty() {
            self.markups.get(&block_id).cloned().unwrap_or_default()
        } else {
            markups
        };
        if let Some(styled) = self.blocks[index].styled_text_mut() {
            styled.reset_text(text);
            match resync {
                Some((from, to)) => resync_on_edit(&mut ranges, styled, from, to),
                None => apply_ranges(&mut ranges, styled),
            }
        }
        self.markups.insert(block_id, ranges);
        self.signals
            .note_typing(block_id, now, self.options.typing_window);
        self.measure_block(index);
        self.patch_one(index, None)
    }

    fn handle_selection_changed(&mut self, block_id: BlockId, from: usize, to: usize) -> Patch {
        if from == to {
            self.selection = None;
        } else if let Some(index) = self.index_of(block_id) {
            let block = &self.blocks[index];
            self.selection = Some(ActiveSelection {
                block_id,
                from,
                to,
                kind_tag: block.classify(),
                text: slice_utf16(block.extract_text(), from, to).to_owned(),
            });
        } else {
            return Patch::unchanged(self.version);
        }
        self.version += 1;
        Patch {
            changed: Vec::new(),
            new_focus: None,
            version: self.version,
        }
    }

    fn handle_return(&mut self, block_id: BlockId, cursor_offset: usize) -> Patch {
        let Some(index) = self.index_of(block_id) else {
            return Patch::unchanged(self.version);
        };
        let kind = self.blocks[index].kind();
        if !kind.supports_split() {
            return Patch::unchanged(self.version);
        }
        // A return can only come from the block holding the caret.
        self.cursor_index = index;

        let full = self.blocks[index].extract_text().to_owned();
        if cursor_offset >= utf16_len(&full) {
            let at = match kind {
                BlockKind::OrderedItem => self.insert_ordered_after_cursor("", Vec::new()),
                BlockKind::BulletedItem => self.insert_bulleted_after_cursor("", Vec::new()),
                BlockKind::Quote => {
                    self.insert_text_block(BlockContent::Quote(StyledText::new("")), Vec::new())
                }
                BlockKind::HighlightedQuote => self.insert_text_block(
                    BlockContent::HighlightedQuote(StyledText::new("")),
                    Vec::new(),
                ),
                // Headings and paragraphs both continue with a fresh
                // paragraph at the end of their text.
                _ => self
                    .insert_text_block(BlockContent::Paragraph(StyledText::new("")), Vec::new()),
            };
            return self.patch_all(Some(at));
        }

        let boundary = utf16_to_byte(&full, cursor_offset);
        let before = trim_leading_whitespace(&full[..boundary]).to_owned();
        let after = trim_leading_whitespace(&full[boundary..]).to_owned();
        let before_len = utf16_len(&before);

        let stored = self.markups.remove(&block_id).unwrap_or_default();
        let prefix_len = match kind {
            BlockKind::BulletedItem => utf16_len(BULLET_PREFIX),
            BlockKind::OrderedItem => {
                utf16_len(&ordered_prefix(next_ordinal(Some(&before))))
            }
            _ => 0,
        };
        let (mut before_ranges, after_ranges) = split_markups(&stored, before_len, prefix_len);

        match &mut self.blocks[index].content {
            BlockContent::MainTitle(text) => *text = before,
            _ => {
                if let Some(styled) = self.blocks[index].styled_text_mut() {
                    styled.reset_text(before);
                    apply_ranges(&mut before_ranges, styled);
                }
            }
        }
        if self.blocks[index].styled_text().is_some() {
            self.markups.insert(block_id, before_ranges);
        }
        self.measure_block(index);

        let at = match kind {
            BlockKind::Title => {
                self.insert_text_block(BlockContent::Title(StyledText::new(after)), after_ranges)
            }
            BlockKind::Subtitle => self
                .insert_text_block(BlockContent::Subtitle(StyledText::new(after)), after_ranges),
            BlockKind::OrderedItem => self.insert_ordered_after_cursor(&after, after_ranges),
            BlockKind::BulletedItem => self.insert_bulleted_after_cursor(&after, after_ranges),
            BlockKind::Quote => {
                self.insert_text_block(BlockContent::Quote(StyledText::new(after)), after_ranges)
            }
            BlockKind::HighlightedQuote => self.insert_text_block(
                BlockContent::HighlightedQuote(StyledText::new(after)),
                after_ranges,
            ),
            // A split main title hands its remainder to a paragraph, as
            // does a paragraph itself.
            _ => self
                .insert_text_block(BlockContent::Paragraph(StyledText::new(after)), after_ranges),
        };
        self.patch_all(Some(at))
    }

    fn handle_delete(&mut self, block_id: BlockId, insert_paragraph_after: bool) -> Patch {
        let Some(index) = self.index_of(block_id) else {
            return Patch::unchanged(self.version);
        };
        if index == 0 {
            return Patch::unchanged(self.version);
        }

        // Close the order gap before touching the sequence.
        let deletion_point = self.blocks[index].order;
        for block in &mut self.blocks {
            if block.order >= deletion_point {
                block.order = block.order.saturating_sub(1);
            }
        }

        let merges = matches!(
            self.blocks[index - 1].content,
            BlockContent::Image(_) | BlockContent::Video(_) | BlockContent::Divider
        ) && self.blocks[index].kind().is_removable_on_merge();

        if merges {
            // Media and dividers are never left without their following
            // anchor block.
            let target = self.blocks.remove(index);
            let neighbor = self.blocks.remove(index - 1);
            self.markups.remove(&target.id);
            self.markups.remove(&neighbor.id);
            let focus = if index >= 2 {
                let landing = index - 2;
                self.focus_exclusively(landing);
                self.cursor_index = landing;
                if landing == 0 {
                    self.is_title_anchor_set = false;
                }
                Some(landing)
            } else {
                None
            };
            // The merge swallows any replacement-paragraph request.
            self.reassert_invariants();
            tracing::debug!(index, "removed block and its preceding media");
            return self.patch_all(focus);
        }

        let removed = self.blocks.remove(index);
        self.markups.remove(&removed.id);
        tracing::debug!(index, kind = ?removed.kind(), "removed block");
        self.adjust_focus_after_delete(index);

        if insert_paragraph_after {
            self.cursor_index = index.saturating_sub(1);
            let at =
                self.insert_text_block(BlockContent::Paragraph(StyledText::new("")), Vec::new());
            return self.patch_all(Some(at));
        }

        self.reassert_invariants();
        let focus = self.blocks.iter().position(|block| block.has_focus);
        self.patch_all(focus)
    }

    fn handle_convert(&mut self, block_id: BlockId, target: BlockKind) -> Patch {
        let Some(index) = self.index_of(block_id) else {
            return Patch::unchanged(self.version);
        };
        let current = self.blocks[index].kind();
        if current == target || !current.is_markup_capable() {
            return Patch::unchanged(self.version);
        }

        let raw = self.blocks[index].extract_text().to_owned();
        let stripped = strip_list_prefix(current, &raw).to_owned();

        let content = match target {
            BlockKind::Title => BlockContent::Title(StyledText::new(stripped)),
            BlockKind::Subtitle => BlockContent::Subtitle(StyledText::new(stripped)),
            BlockKind::Quote => BlockContent::Quote(StyledText::new(stripped)),
            BlockKind::HighlightedQuote => {
                BlockContent::HighlightedQuote(StyledText::new(stripped))
            }
            BlockKind::BulletedItem => {
                BlockContent::BulletedItem(StyledText::new(format!("{BULLET_PREFIX}{stripped}")))
            }
            BlockKind::OrderedItem => {
                // No run to continue once the block is the very last one.
                if index + 1 >= self.blocks.len() {
                    return Patch::unchanged(self.version);
                }
                let seed = index
                    .checked_sub(1)
                    .map(|i| self.blocks[i].extract_text().to_owned());
                let ordinal = next_ordinal(seed.as_deref());
                BlockContent::OrderedItem(StyledText::new(format!(
                    "{}{}",
                    ordered_prefix(ordinal),
                    stripped
                )))
            }
            _ => return Patch::unchanged(self.version),
        };

        let id = self.blocks[index].id;
        let order = self.blocks[index].order;
        let width = self.blocks[index].width;
        // Same id, fresh tracked id: markups survive, the view remounts.
        self.blocks[index] = Block {
            id,
            tracked_id: TrackedId::new(),
            order,
            content,
            has_focus: true,
            height: 0.0,
            width,
        };
        self.measure_block(index);
        self.focus_exclusively(index);
        self.cursor_index = index;
        tracing::debug!(index, from = ?current, to = ?target, "converted block");
        self.patch_one(index, Some(index))
    }

    fn handle_apply_markup(&mut self, kind: MarkupKind, url: Option<String>) -> Patch {
        let Some(sel) = self.selection.clone() else {
            return Patch::unchanged(self.version);
        };
        let Some(index) = self.index_of(sel.block_id) else {
            return Patch::unchanged(self.version);
        };
        let mut ranges = self.markups.remove(&sel.block_id).unwrap_or_default();
        let applied = match self.blocks[index].styled_text_mut() {
            Some(styled) => {
                apply_or_toggle(&mut ranges, styled, kind, url.as_deref(), sel.from, sel.to)
            }
            None => false,
        };
        self.markups.insert(sel.block_id, ranges);
        if !applied {
            return Patch::unchanged(self.version);
        }
        self.patch_one(index, None)
    }

    fn handle_set_focus(&mut self, index: usize) -> Patch {
        if index >= self.blocks.len() {
            return Patch::unchanged(self.version);
        }
        let previous = self.blocks.iter().position(|block| block.has_focus);
        self.focus_exclusively(index);
        self.cursor_index = index;
        self.version += 1;
        let mut changed: Vec<usize> = previous.into_iter().filter(|&p| p != index).collect();
        changed.push(index);
        changed.sort_unstable();
        Patch {
            changed,
            new_focus: Some(index),
            version: self.version,
        }
    }

    // ---- sequence plumbing ----

    /// Insert a fresh text-bearing block after the cursor and run the full
    /// insertion protocol: markups, measurement, invariants, focus.
    fn insert_text_block(&mut self, content: BlockContent, markups: Vec<MarkupRange>) -> usize {
        let mut block = Block::new(content);
        let kind = block.kind();
        block.height = layout::seed_height(kind);
        let at = self.insert_after_cursor(block);
        self.store_insert_markups(at, markups);
        // Headings and code keep their seed height until the first edit
        // measures them.
        if matches!(
            kind,
            BlockKind::Paragraph
                | BlockKind::OrderedItem
                | BlockKind::BulletedItem
                | BlockKind::Quote
                | BlockKind::HighlightedQuote
        ) {
            self.measure_block(at);
        }
        if matches!(
            kind,
            BlockKind::Paragraph | BlockKind::Title | BlockKind::Subtitle | BlockKind::Code
        ) {
            self.is_title_anchor_set = true;
        }
        self.reassert_invariants();
        self.focus_exclusively(at);
        self.cursor_index = at;
        tracing::debug!(index = at, ?kind, "inserted block");
        at
    }

    fn insert_ordered_after_cursor(&mut self, text: &str, markups: Vec<MarkupRange>) -> usize {
        let seed = self
            .blocks
            .get(self.cursor_index)
            .map(|block| block.extract_text().to_owned());
        let ordinal = next_ordinal(seed.as_deref());
        let composed = format!("{}{}", ordered_prefix(ordinal), text);
        self.insert_text_block(BlockContent::OrderedItem(StyledText::new(composed)), markups)
    }

    fn insert_bulleted_after_cursor(&mut self, text: &str, markups: Vec<MarkupRange>) -> usize {
        let composed = format!("{BULLET_PREFIX}{text}");
        self.insert_text_block(
            BlockContent::BulletedItem(StyledText::new(composed)),
            markups,
        )
    }

    /// Raw insertion after the cursor block, dropping the trailing sentinel
    /// first so new content never lands behind it. Returns the index the
    /// block landed at; past-the-end cursors append.
    fn insert_after_cursor(&mut self, block: Block) -> usize {
        if matches!(self.blocks.last().map(|b| &b.content), Some(BlockContent::Empty)) {
            self.blocks.pop();
        }
        let at = (self.cursor_index + 1).min(self.blocks.len());
        self.blocks.insert(at, block);
        at
    }

    fn store_insert_markups(&mut self, index: usize, markups: Vec<MarkupRange>) {
        if markups.is_empty() {
            return;
        }
        let id = self.blocks[index].id;
        let mut ranges = markups;
        if let Some(styled) = self.blocks[index].styled_text_mut() {
            apply_ranges(&mut ranges, styled);
        }
        self.markups.insert(id, ranges);
    }

    /// Image and video insertion clears every caret and drops blank
    /// heading and code scaffolding; blank paragraphs stay, and index 0 is
    /// never dropped.
    fn clear_focus_and_blank_scaffolding(&mut self) {
        let mut index = self.blocks.len();
        while index > 0 {
            index -= 1;
            self.blocks[index].has_focus = false;
            if index != 0 && self.blocks[index].is_blank_for_media_cleanup() {
                let removed = self.blocks.remove(index);
                self.markups.remove(&removed.id);
            }
        }
    }

    fn adjust_focus_after_delete(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        // Deleting the block that sat between the title row and an image
        // walks the caret back onto the title.
        if index == 1
            && index < self.blocks.len()
            && matches!(self.blocks[index].content, BlockContent::Image(_))
        {
            self.focus_exclusively(0);
            self.cursor_index = 0;
            self.is_title_anchor_set = false;
            return;
        }
        let target = index - 1;
        if target < self.blocks.len() {
            self.focus_exclusively(target);
            self.cursor_index = target;
            if target == 0 {
                self.is_title_anchor_set = false;
            }
        }
    }

    /// Reassert the two structural invariants: a single trailing sentinel,
    /// and dense `order` while a leading main title exists.
    fn reassert_invariants(&mut self) {
        if !matches!(self.blocks.last().map(|b| &b.content), Some(BlockContent::Empty)) {
            let mut sentinel = Block::new(BlockContent::Empty);
            sentinel.height = layout::seed_height(BlockKind::Empty);
            self.blocks.push(sentinel);
        }
        self.renumber();
    }

    fn renumber(&mut self) {
        if matches!(
            self.blocks.first().map(|b| &b.content),
            Some(BlockContent::MainTitle(_))
        ) {
            for (index, block) in self.blocks.iter_mut().enumerate() {
                block.order = index;
            }
        }
    }

    fn focus_exclusively(&mut self, index: usize) {
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.has_focus = i == index;
        }
    }

    pub(crate) fn measure_block(&mut self, index: usize) {
        let kind = self.blocks[index].kind();
        let text = self.blocks[index].extract_text().to_owned();
        match kind {
            BlockKind::Code => {
                let height =
                    layout::code_height(self.measurer.as_ref(), &text, self.options.viewport_width);
                let width = layout::code_width(self.measurer.as_ref(), &text);
                let block = &mut self.blocks[index];
                block.height = height;
                block.width = width;
            }
            _ => {
                if let Some(height) = layout::text_height(
                    self.measurer.as_ref(),
                    &text,
                    kind,
                    self.options.viewport_width,
                ) {
                    self.blocks[index].height = height;
                }
                if kind == BlockKind::MainTitle {
                    self.blocks[index].width = self.options.viewport_width - 40.0;
                }
            }
        }
    }

    fn index_of(&self, block_id: BlockId) -> Option<usize> {
        let index = self.blocks.iter().position(|block| block.id == block_id);
        if index.is_none() {
            tracing::warn!(?block_id, "command addressed an unknown block");
        }
        index
    }

    fn patch_all(&mut self, new_focus: Option<usize>) -> Patch {
        self.version += 1;
        Patch {
            changed: (0..self.blocks.len()).collect(),
            new_focus,
            version: self.version,
        }
    }

    fn patch_one(&mut self, index: usize, new_focus: Option<usize>) -> Patch {
        self.version += 1;
        Patch {
            changed: vec![index],
            new_focus,
            version: self.version,
        }
    }
}
