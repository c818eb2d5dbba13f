/*!
 * # Editing Core Module
 *
 * The document model and reducer behind a block-based rich-text editor.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the Block Sequence
 * - A document is one ordered `Vec` of **`Block`** values inside **`Document`**
 * - Each block owns its content payload; rich-text kinds carry a **`StyledText`**
 * - Two invariants are reasserted after every structural edit: dense `order`
 *   values (while a leading main title exists) and a single trailing empty
 *   sentinel marking the append point
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum) applied through
 *   `Document::apply`, which returns a **`Patch`** naming the block indices
 *   a renderer must refresh
 * - Commands mirror editing-surface events (text changes, selection moves,
 *   return and backspace keys) plus toolbar insertions and conversions
 * - Commands with nothing to do return an unchanged patch and leave the
 *   version alone
 *
 * ### 3. Markup as Data, Not as Text
 * - Styling lives in an id-keyed table of **`MarkupRange`** entries beside
 *   the blocks, in UTF-16 offsets; visible spans are rebuilt by replaying
 *   that list from a clean slate
 * - Ranges survive block type conversion, which replaces the block wholesale
 *   but keeps its id
 * - Invalid ranges die at replay time rather than at mutation time
 *
 * ### 4. Stable Block IDs
 * - **`BlockId`** identifies a block across its whole life, including type
 *   conversion; **`TrackedId`** changes whenever a rendering surface should
 *   remount the block's view
 *
 * ### 5. Read API: Immutable Snapshots
 * - `Document::snapshot` projects the whole document into a **`Snapshot`**
 *   of flattened **`RenderBlock`**s with resolved spans, cached sizes, and
 *   per-block text alignment
 * - Snapshots borrow nothing, so a surface can hold one across later edits
 *
 * ## Module Structure
 *
 * - **`document`**: core `Document` type, the command reducer, and the
 *   structural invariants
 * - **`block`**: `Block`, `BlockContent`, `BlockKind`, and the id types
 * - **`commands`**: `Cmd` enum and the list-prefix and split helpers
 * - **`markup`**: `MarkupRange` storage, toggling, and replay
 * - **`styled`**: `StyledText` with its style and link span presentation
 * - **`selection`**: active selection state and edit-activity signals
 * - **`snapshot`**: immutable view generation for UI consumption
 * - **`patch`**: edit result metadata
 * - **`text`**: UTF-16 offset arithmetic over Rust strings
 *
 * ## Usage Pattern
 *
 * ```rust
 * use draftloom_engine::editing::{Cmd, Document, MarkupKind};
 *
 * // 1. Create a document: main title, body paragraph, trailing sentinel
 * let mut doc = Document::with_defaults();
 *
 * // 2. Apply edits via commands
 * let patch = doc.apply(Cmd::InsertParagraph {
 *     text: "Hello world".to_string(),
 *     markups: vec![],
 * });
 * let block_id = doc.blocks()[patch.new_focus.unwrap()].id;
 *
 * // 3. Select and style
 * doc.apply(Cmd::SelectionChanged { block_id, from: 0, to: 5 });
 * doc.apply(Cmd::ApplyMarkup { kind: MarkupKind::Bold, url: None });
 *
 * // 4. Get an immutable snapshot for rendering
 * let snapshot = doc.snapshot();
 * assert_eq!(snapshot.blocks.len(), doc.blocks().len());
 * ```
 */

// Module exports
pub mod block;
pub mod commands;
pub mod document;
pub mod markup;
pub mod patch;
pub mod selection;
pub mod snapshot;
pub mod styled;
pub mod text;

// Public API re-exports
pub use block::{Block, BlockContent, BlockId, BlockKind, ImageRef, TrackedId};
pub use commands::Cmd;
pub use document::Document;
pub use markup::{MarkupKind, MarkupRange, PLACEHOLDER_URL};
pub use patch::Patch;
pub use selection::{ActiveSelection, EngineOptions};
pub use snapshot::{Alignment, RenderBlock, Snapshot};
pub use styled::{FontFace, LinkSpan, StyleSpan, StyledText};
