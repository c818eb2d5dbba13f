//! Active selection state and edit-activity signals.
//!
//! The engine is synchronous, so "the user is still typing" is modelled as
//! a deadline rather than a timer: every text change stamps a short typing
//! window (and a longer one for paste-sized changes), and markup resync is
//! allowed only once the stamped windows have passed. Callers inject the
//! current instant, which keeps the windows testable.

use std::time::{Duration, Instant};

use crate::editing::block::BlockId;

/// Tuning knobs for layout and activity tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Logical width the per-kind text widths are carved out of.
    pub viewport_width: f32,
    /// How long after a keystroke markup resync stays suppressed.
    pub typing_window: Duration,
    /// How long after a paste-sized change markup resync stays suppressed.
    pub paste_window: Duration,
    /// A single change growing the text by more than this many UTF-16
    /// units is treated as a paste.
    pub paste_len_threshold: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            typing_window: Duration::from_millis(100),
            paste_window: Duration::from_millis(1000),
            paste_len_threshold: 10,
        }
    }
}

/// The selection the editing surface last reported, kept only while it is
/// non-empty. Offsets are UTF-16 units into the block's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSelection {
    pub block_id: BlockId,
    pub from: usize,
    pub to: usize,
    /// Kind tag of the block at selection time, for UI affordances.
    pub kind_tag: &'static str,
    /// The selected text itself.
    pub text: String,
}

/// Deadline-based typing and paste suppression, scoped to the block that
/// was last edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ActivitySignals {
    typing_until: Option<Instant>,
    paste_until: Option<Instant>,
    last_edited: Option<BlockId>,
}

impl ActivitySignals {
    pub(crate) fn note_typing(&mut self, block_id: BlockId, now: Instant, window: Duration) {
        self.typing_until = Some(now + window);
        self.last_edited = Some(block_id);
    }

    pub(crate) fn note_paste(&mut self, block_id: BlockId, now: Instant, window: Duration) {
        self.paste_until = Some(now + window);
        self.last_edited = Some(block_id);
    }

    /// Whether markup resync may run against `block_id` right now.
    ///
    /// Activity in one block never suppresses resync in another.
    pub(crate) fn resync_allowed(&self, block_id: BlockId, now: Instant) -> bool {
        if self.last_edited != Some(block_id) {
            return true;
        }
        let typing = self.typing_until.is_some_and(|until| now < until);
        let pasting = self.paste_until.is_some_and(|until| now < until);
        !typing && !pasting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Activity signal tests ============

    #[test]
    fn test_typing_suppresses_resync_until_window_passes() {
        let mut signals = ActivitySignals::default();
        let block = BlockId::new();
        let start = Instant::now();

        signals.note_typing(block, start, Duration::from_millis(100));

        assert!(!signals.resync_allowed(block, start));
        assert!(!signals.resync_allowed(block, start + Duration::from_millis(99)));
        assert!(signals.resync_allowed(block, start + Duration::from_millis(100)));
    }

    #[test]
    fn test_paste_window_outlives_typing_window() {
        let mut signals = ActivitySignals::default();
        let block = BlockId::new();
        let start = Instant::now();

        signals.note_typing(block, start, Duration::from_millis(100));
        signals.note_paste(block, start, Duration::from_millis(1000));

        assert!(!signals.resync_allowed(block, start + Duration::from_millis(500)));
        assert!(signals.resync_allowed(block, start + Duration::from_millis(1000)));
    }

    #[test]
    fn test_activity_is_scoped_to_last_edited_block() {
        let mut signals = ActivitySignals::default();
        let edited = BlockId::new();
        let other = BlockId::new();
        let start = Instant::now();

        signals.note_typing(edited, start, Duration::from_millis(100));

        assert!(!signals.resync_allowed(edited, start));
        assert!(signals.resync_allowed(other, start));
    }

    #[test]
    fn test_fresh_signals_allow_resync() {
        let signals = ActivitySignals::default();
        assert!(signals.resync_allowed(BlockId::new(), Instant::now()));
    }

    // ============ Options tests ============

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.viewport_width, 390.0);
        assert_eq!(options.typing_window, Duration::from_millis(100));
        assert_eq!(options.paste_window, Duration::from_millis(1000));
        assert_eq!(options.paste_len_threshold, 10);
    }
}
