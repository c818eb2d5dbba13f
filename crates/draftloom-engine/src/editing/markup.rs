//! Markup range storage, toggling, and replay.
//!
//! Styling never lives in the text. Each block keeps a list of
//! [`MarkupRange`] entries (UTF-16 offsets into the block's text) and the
//! visible [`StyledText`] spans are rebuilt by replaying that list from a
//! clean slate, entry by entry in storage order. Replay is where invalid
//! ranges die: an entry that no longer fits the text is dropped rather than
//! clamped, after stripping any link presentation it left behind. No markup
//! operation is fatal; out-of-bounds requests degrade to observable no-ops.

use serde::{Deserialize, Serialize};

use crate::editing::styled::{FontFace, StyledText};

/// URL applied in place of a stored link target that fails validation.
pub const PLACEHOLDER_URL: &str = "https://www.draftloom.dev";

/// The four markup flavours a range can carry.
///
/// `Bold` and `Italic` combine into `BoldItalic` rather than stacking;
/// `Link` is independent of the font axis and coexists with any of the
/// other three on the same run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    Bold,
    Italic,
    BoldItalic,
    Link,
}

impl MarkupKind {
    /// Whether this kind lives on the font axis (everything but `Link`).
    pub fn is_style(self) -> bool {
        !matches!(self, MarkupKind::Link)
    }

    fn style_face(self) -> Option<FontFace> {
        match self {
            MarkupKind::Bold => Some(FontFace::Bold),
            MarkupKind::Italic => Some(FontFace::Italic),
            MarkupKind::BoldItalic => Some(FontFace::BoldItalic),
            MarkupKind::Link => None,
        }
    }
}

/// One styling instruction over a half-open run `[from, to)` of a block's
/// text, in UTF-16 code units.
///
/// The wire form is `{"type": "bold", "from": 0, "to": 4}` with an
/// optional `"url"` for links, which is also the shape persisted documents
/// carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupRange {
    #[serde(rename = "type")]
    pub kind: MarkupKind,
    pub from: usize,
    pub to: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MarkupRange {
    pub fn new(kind: MarkupKind, from: usize, to: usize) -> Self {
        Self {
            kind,
            from,
            to,
            url: None,
        }
    }

    pub fn link(from: usize, to: usize, url: impl Into<String>) -> Self {
        Self {
            kind: MarkupKind::Link,
            from,
            to,
            url: Some(url.into()),
        }
    }
}

/// Apply `kind` over the selection `[from, to)`, toggling when an entry
/// with identical bounds already exists on the same axis.
///
/// Toggling is subtractive per leg: bold applied over an identical
/// bold-italic range leaves italic, and vice versa. Applying one leg over
/// the other leg's range upgrades the entry to bold-italic. A fresh range
/// resolves the effective face at its start offset first, so selecting
/// inside already-bold text and requesting italic stores bold-italic.
///
/// Returns `false` when the selection is empty or past the end of the
/// text, in which case nothing changes.
pub(crate) fn apply_or_toggle(
    ranges: &mut Vec<MarkupRange>,
    styled: &mut StyledText,
    kind: MarkupKind,
    url: Option<&str>,
    from: usize,
    to: usize,
) -> bool {
    if from >= to || to > styled.len_utf16() {
        tracing::trace!(from, to, len = styled.len_utf16(), "markup selection out of bounds");
        return false;
    }

    let existing = ranges
        .iter()
        .position(|m| m.from == from && m.to == to && m.kind.is_style() == kind.is_style());

    match existing {
        Some(index) => toggle_existing(ranges, styled, index, kind, from, to),
        None => push_new(ranges, styled, kind, url, from, to),
    }
    true
}

fn toggle_existing(
    ranges: &mut Vec<MarkupRange>,
    styled: &mut StyledText,
    index: usize,
    kind: MarkupKind,
    from: usize,
    to: usize,
) {
    if kind == MarkupKind::Link {
        ranges.remove(index);
        styled.clear_link(from, to);
        return;
    }

    match toggled_style(ranges[index].kind, kind) {
        Some(next) => {
            ranges[index].kind = next;
            ranges[index].url = None;
            if let Some(face) = next.style_face() {
                styled.write_face(from, to, face);
            }
        }
        None => {
            ranges.remove(index);
            styled.write_face(from, to, FontFace::Regular);
        }
    }
}

/// Style-axis toggle table. `None` means the request removes the entry.
fn toggled_style(current: MarkupKind, requested: MarkupKind) -> Option<MarkupKind> {
    match (current, requested) {
        (MarkupKind::Bold, MarkupKind::Bold) => None,
        (MarkupKind::Italic, MarkupKind::Italic) => None,
        (MarkupKind::BoldItalic, MarkupKind::BoldItalic) => None,
        (MarkupKind::BoldItalic, MarkupKind::Bold) => Some(MarkupKind::Italic),
        (MarkupKind::BoldItalic, MarkupKind::Italic) => Some(MarkupKind::Bold),
        (MarkupKind::Bold, MarkupKind::Italic) => Some(MarkupKind::BoldItalic),
        (MarkupKind::Italic, MarkupKind::Bold) => Some(MarkupKind::BoldItalic),
        (MarkupKind::Bold, MarkupKind::BoldItalic) => Some(MarkupKind::BoldItalic),
        (MarkupKind::Italic, MarkupKind::BoldItalic) => Some(MarkupKind::BoldItalic),
        _ => None,
    }
}

fn push_new(
    ranges: &mut Vec<MarkupRange>,
    styled: &mut StyledText,
    kind: MarkupKind,
    url: Option<&str>,
    from: usize,
    to: usize,
) {
    if kind == MarkupKind::Link {
        styled.write_link(from, to, resolve_link_url(url));
        ranges.push(MarkupRange {
            kind: MarkupKind::Link,
            from,
            to,
            url: url.map(str::to_owned),
        });
        return;
    }

    // Fold the requested leg into whatever face the selection start
    // already carries, so the stored kind reflects the combined state.
    let (mut bold, mut italic) = match styled.face_at(from) {
        FontFace::Regular => (false, false),
        FontFace::Bold => (true, false),
        FontFace::Italic => (false, true),
        FontFace::BoldItalic => (true, true),
    };
    match kind {
        MarkupKind::Bold => bold = true,
        MarkupKind::Italic => italic = true,
        MarkupKind::BoldItalic => {
            bold = true;
            italic = true;
        }
        MarkupKind::Link => unreachable!("link handled above"),
    }
    let stored = match (bold, italic) {
        (true, true) => MarkupKind::BoldItalic,
        (true, false) => MarkupKind::Bold,
        (false, true) => MarkupKind::Italic,
        (false, false) => kind,
    };
    if let Some(face) = stored.style_face() {
        styled.write_face(from, to, face);
    }
    ranges.push(MarkupRange::new(stored, from, to));
}

/// Rebind every stored range the active selection touches to the
/// selection's own bounds, then replay the whole list.
///
/// The intersection test is closed at both ends, matching how an editing
/// surface reports a caret sitting exactly on a range boundary. A
/// selection strictly enclosing a range does not rebind it.
pub(crate) fn resync_on_edit(
    ranges: &mut Vec<MarkupRange>,
    styled: &mut StyledText,
    sel_from: usize,
    sel_to: usize,
) {
    if ranges.is_empty() {
        return;
    }
    for m in ranges.iter_mut() {
        let touches = (sel_from >= m.from && sel_from <= m.to)
            || (sel_to >= m.from && sel_to <= m.to);
        if touches && (m.from != sel_from || m.to != sel_to) {
            tracing::trace!(
                old_from = m.from,
                old_to = m.to,
                sel_from,
                sel_to,
                "rebinding markup range to selection"
            );
            m.from = sel_from;
            m.to = sel_to;
        }
    }
    apply_ranges(ranges, styled);
}

/// Replay the range list onto `styled` from a clean slate, pruning entries
/// that no longer fit the text.
///
/// An out-of-bounds link first has its presentation stripped from the part
/// of its run that still exists, then the entry is dropped; other invalid
/// kinds are dropped outright. Surviving entries are applied destructively
/// in storage order, later entries winning overlaps.
pub(crate) fn apply_ranges(ranges: &mut Vec<MarkupRange>, styled: &mut StyledText) {
    let text = styled.text().to_owned();
    styled.reset_text(text);
    let total = styled.len_utf16();

    ranges.retain(|m| {
        let valid = m.from <= m.to && m.to <= total;
        if !valid {
            if m.kind == MarkupKind::Link {
                let loc = m.from.min(total.saturating_sub(1));
                let len = m.to.saturating_sub(m.from).min(total.saturating_sub(m.from));
                styled.clear_link(loc, loc.saturating_add(len));
            }
            tracing::warn!(
                kind = ?m.kind,
                from = m.from,
                to = m.to,
                total,
                "dropping markup range that no longer fits the text"
            );
            return false;
        }
        match m.kind {
            MarkupKind::Link => {
                styled.write_link(m.from, m.to, resolve_link_url(m.url.as_deref()));
            }
            style => {
                if let Some(face) = style.style_face() {
                    styled.write_face(m.from, m.to, face);
                }
            }
        }
        true
    });
}

fn resolve_link_url(url: Option<&str>) -> String {
    match url {
        Some(raw) if is_valid_url(raw) => normalize_url(raw),
        _ => PLACEHOLDER_URL.to_owned(),
    }
}

/// Whether `raw` normalizes into a usable `http(s)` URL.
pub fn is_valid_url(raw: &str) -> bool {
    use std::sync::OnceLock;
    use regex::Regex;

    static URL_SHAPE: OnceLock<Regex> = OnceLock::new();
    let shape = URL_SHAPE
        .get_or_init(|| Regex::new(r"^https?://[^\s<>\[\]]+$").expect("Invalid URL regex"));
    shape.is_match(&normalize_url(raw))
}

/// Make a user-entered link target fetchable: bare hosts gain a scheme,
/// and a `www.` prefix when they have neither.
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        raw.to_owned()
    } else if lowered.starts_with("www.") {
        format!("https://{raw}")
    } else {
        format!("https://www.{raw}")
    }
}
