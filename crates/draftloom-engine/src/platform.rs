//! Collaborator traits between the engine and its host.
//!
//! The engine stays free of UI and storage concerns by delegating three
//! jobs to the host: measuring text, guessing the dominant language of a
//! block (for right-to-left layout), and receiving media payloads. Each
//! trait ships with a headless implementation good enough for servers and
//! tests, so the engine is fully usable without a rendering surface.

use uuid::Uuid;

use crate::layout::FaceMetrics;

/// Error a media sink may report. The engine logs and carries on; a failed
/// store never blocks the edit that triggered it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MediaError(pub String);

impl From<&str> for MediaError {
    fn from(s: &str) -> Self {
        MediaError(s.to_string())
    }
}

impl From<String> for MediaError {
    fn from(s: String) -> Self {
        MediaError(s)
    }
}

/// Text measurement as the rendering surface would perform it.
///
/// Heights returned here end up in block render caches, so a host backed
/// by a real text stack should implement this against that stack. Face
/// spans never move vertical metrics in the reference surface, so all
/// methods take plain text.
pub trait TextMeasurer: Send + Sync {
    /// Height of `text` laid out in `metrics` within `max_width` points.
    fn measure_height(&self, text: &str, metrics: &FaceMetrics, max_width: f32) -> f32;

    /// Number of visual lines `text` occupies within `max_width` points.
    fn wrapped_lines(&self, text: &str, metrics: &FaceMetrics, max_width: f32) -> usize;

    /// Unwrapped width of `text` on a single line.
    fn line_width(&self, text: &str, metrics: &FaceMetrics) -> f32;
}

/// Dominant-language detection for alignment decisions.
pub trait LanguageClassifier: Send + Sync {
    /// BCP 47 language code of the text's dominant script, or `None` when
    /// there is nothing to classify.
    fn dominant_language(&self, text: &str) -> Option<String>;
}

/// Receiver for media payloads stripped out of the document.
///
/// Image bytes and video URLs are handed over at insertion time; the
/// document keeps only the asset id.
pub trait MediaSink: Send + Sync {
    fn store_image(
        &self,
        asset_id: Uuid,
        bytes: &[u8],
        alt: &str,
        caption: &str,
    ) -> Result<(), MediaError>;

    fn store_video(&self, asset_id: Uuid, url: &str) -> Result<(), MediaError>;
}

/// Deterministic character-count measurer for headless use.
///
/// Estimates with a fixed advance per character (wider for monospace) and
/// a 1.2 line-height factor. Not pixel-accurate, but stable across
/// platforms, which is what layout tests need.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl HeuristicMeasurer {
    fn advance(metrics: &FaceMetrics) -> f32 {
        if metrics.monospace {
            metrics.point_size * 0.6
        } else {
            metrics.point_size * 0.5
        }
    }
}

impl TextMeasurer for HeuristicMeasurer {
    fn measure_height(&self, text: &str, metrics: &FaceMetrics, max_width: f32) -> f32 {
        let lines = self.wrapped_lines(text, metrics, max_width) as f32;
        lines * metrics.point_size * 1.2
    }

    fn wrapped_lines(&self, text: &str, metrics: &FaceMetrics, max_width: f32) -> usize {
        let max_width = max_width.max(Self::advance(metrics));
        text.split('\n')
            .map(|line| {
                let width = self.line_width(line, metrics);
                (width / max_width).ceil().max(1.0) as usize
            })
            .sum::<usize>()
            .max(1)
    }

    fn line_width(&self, text: &str, metrics: &FaceMetrics) -> f32 {
        text.chars().count() as f32 * Self::advance(metrics)
    }
}

/// Script-counting language classifier for headless use.
///
/// Counts letters per script and reports the majority script's language
/// code. Arabic script reports `ar`, which the alignment rules treat the
/// same as `ur`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptClassifier;

impl LanguageClassifier for ScriptClassifier {
    fn dominant_language(&self, text: &str) -> Option<String> {
        let mut arabic = 0usize;
        let mut hebrew = 0usize;
        let mut latin = 0usize;
        for ch in text.chars() {
            match ch {
                '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}' => arabic += 1,
                '\u{0590}'..='\u{05FF}' => hebrew += 1,
                ch if ch.is_ascii_alphabetic() => latin += 1,
                _ => {}
            }
        }
        let top = arabic.max(hebrew).max(latin);
        if top == 0 {
            return None;
        }
        if top == arabic {
            Some("ar".to_string())
        } else if top == hebrew {
            Some("he".to_string())
        } else {
            Some("en".to_string())
        }
    }
}

/// Media sink that drops everything, for hosts without storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMediaSink;

impl MediaSink for NullMediaSink {
    fn store_image(
        &self,
        _asset_id: Uuid,
        _bytes: &[u8],
        _alt: &str,
        _caption: &str,
    ) -> Result<(), MediaError> {
        Ok(())
    }

    fn store_video(&self, _asset_id: Uuid, _url: &str) -> Result<(), MediaError> {
        Ok(())
    }
}
