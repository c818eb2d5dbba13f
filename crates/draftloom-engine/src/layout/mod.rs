//! Per-kind layout metrics and height estimation.
//!
//! Every text-bearing kind owns a horizontal inset (how much of the
//! viewport its text may use), a bottom margin, and a font face. Measured
//! heights are cached on blocks so a rendering surface can size rows
//! without running layout itself. Code blocks use their own rule: a
//! wrapped-line count feeds a banded correction instead of a fixed margin,
//! and the block also caches the width its content wants for horizontal
//! scrolling.

use crate::editing::block::BlockKind;
use crate::platform::TextMeasurer;

/// Floor for a code block's height, even when empty.
pub(crate) const CODE_MIN_HEIGHT: f32 = 40.0;

/// Font parameters a measurer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMetrics {
    pub point_size: f32,
    pub bold: bool,
    pub monospace: bool,
}

/// Layout parameters of one text-bearing block kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindMetrics {
    /// Points subtracted from the viewport width before wrapping.
    pub width_inset: f32,
    /// Points added below the measured text. Unused for code, which
    /// applies the banded correction instead.
    pub margin: f32,
    pub face: FaceMetrics,
}

const fn kind_metrics(width_inset: f32, margin: f32, point_size: f32, bold: bool) -> KindMetrics {
    KindMetrics {
        width_inset,
        margin,
        face: FaceMetrics {
            point_size,
            bold,
            monospace: false,
        },
    }
}

/// Metrics for `kind`, or `None` for kinds without measurable text.
pub fn metrics(kind: BlockKind) -> Option<KindMetrics> {
    match kind {
        BlockKind::MainTitle => Some(kind_metrics(40.0, 10.0, 30.0, true)),
        BlockKind::Title => Some(kind_metrics(65.0, 10.0, 28.0, true)),
        BlockKind::Subtitle => Some(kind_metrics(60.0, 10.0, 24.0, true)),
        BlockKind::Paragraph => Some(kind_metrics(60.0, 10.0, 20.0, false)),
        BlockKind::OrderedItem => Some(kind_metrics(80.0, 10.0, 20.0, false)),
        BlockKind::BulletedItem => Some(kind_metrics(80.0, 10.0, 20.0, false)),
        BlockKind::Quote => Some(kind_metrics(80.0, 10.0, 20.0, false)),
        BlockKind::HighlightedQuote => Some(kind_metrics(112.0, 50.0, 20.0, false)),
        BlockKind::Code => Some(KindMetrics {
            width_inset: 40.0,
            margin: 0.0,
            face: FaceMetrics {
                point_size: 14.0,
                bold: false,
                monospace: true,
            },
        }),
        BlockKind::LineBreak
        | BlockKind::Divider
        | BlockKind::Image
        | BlockKind::Video
        | BlockKind::Empty => None,
    }
}

/// Height a freshly inserted block starts with, before any measurement.
pub fn seed_height(kind: BlockKind) -> f32 {
    match kind {
        BlockKind::MainTitle => 52.0,
        BlockKind::Title => 50.0,
        BlockKind::Subtitle => 38.0,
        BlockKind::Paragraph
        | BlockKind::OrderedItem
        | BlockKind::BulletedItem
        | BlockKind::Quote
        | BlockKind::HighlightedQuote => 38.0,
        BlockKind::Code => 50.0,
        BlockKind::LineBreak => 20.0,
        BlockKind::Divider => 38.0,
        BlockKind::Image | BlockKind::Video => 0.0,
        BlockKind::Empty => 300.0,
    }
}

/// Measured height for a margin-kind block, `None` for code and non-text
/// kinds.
pub fn text_height(
    measurer: &dyn TextMeasurer,
    text: &str,
    kind: BlockKind,
    viewport_width: f32,
) -> Option<f32> {
    if kind == BlockKind::Code {
        return None;
    }
    let m = metrics(kind)?;
    let measured = measurer.measure_height(text, &m.face, viewport_width - m.width_inset);
    Some(measured.ceil() + m.margin)
}

/// Banded height rule for code blocks.
///
/// The raw measurement over-counts because code rows render tighter than
/// body text, so a per-line correction that shrinks as blocks grow is
/// subtracted before flooring at [`CODE_MIN_HEIGHT`].
pub fn code_height(measurer: &dyn TextMeasurer, text: &str, viewport_width: f32) -> f32 {
    let face = FaceMetrics {
        point_size: 14.0,
        bold: false,
        monospace: true,
    };
    let width = viewport_width - 40.0;
    let measured = measurer.measure_height(text, &face, width);
    let lines = measurer.wrapped_lines(text, &face, width);
    (measured + 20.0 - line_adjustment(lines)).ceil().max(CODE_MIN_HEIGHT)
}

fn line_adjustment(lines: usize) -> f32 {
    let per_line = match lines {
        0..8 => 12.0,
        8..15 => 10.0,
        15..25 => 9.0,
        25..40 => 8.0,
        _ => 7.0,
    };
    lines as f32 * per_line
}

/// Content width a code block wants, for horizontal scrolling. The widest
/// unwrapped line plus padding.
pub fn code_width(measurer: &dyn TextMeasurer, text: &str) -> f32 {
    let face = FaceMetrics {
        point_size: 14.0,
        bold: false,
        monospace: true,
    };
    let widest = text
        .split('\n')
        .map(|line| measurer.line_width(line, &face))
        .fold(0.0f32, f32::max);
    (widest + 10.0).ceil()
}
