// Benchmark helper functions - Rust's dead code analysis doesn't see uses
// from sibling benchmark files, hence the allows.
use draftloom_engine::editing::{Cmd, Document, MarkupKind, MarkupRange};

#[allow(dead_code)]
pub fn filler_sentence(seed: usize) -> String {
    format!(
        "Paragraph {seed} filled with enough words to wrap across a couple of \
         measured lines in the default viewport."
    )
}

/// Document with a set title and `paragraphs` body paragraphs, each carrying
/// one bold range, the shape a mid-sized draft settles into.
#[allow(dead_code)]
pub fn seeded_document(paragraphs: usize) -> Document {
    let mut doc = Document::with_defaults();
    doc.apply(Cmd::SetMainTitleText {
        text: "Benchmark fixture".to_string(),
    });
    for index in 0..paragraphs {
        doc.apply(Cmd::InsertParagraph {
            text: filler_sentence(index),
            markups: vec![MarkupRange::new(MarkupKind::Bold, 0, 9)],
        });
    }
    doc
}

/// Dense non-overlapping bold ranges over a 120-unit run of text.
#[allow(dead_code)]
pub fn many_ranges(count: usize) -> Vec<MarkupRange> {
    (0..count)
        .map(|i| MarkupRange::new(MarkupKind::Bold, i * 3, i * 3 + 2))
        .collect()
}
